//! # Actors 模块
//!
//! 无界面演出层：把角色状态写成文字记录，并用模拟时钟驱动过渡。
//!
//! - 舞台的定时等待、幕布放下会返回 [`PendingTransition`]，计时结束后完成
//! - 对话框逐字显示台词，显示期间拒绝前进（第一次前进只会补全文字）
//! - 暂停时计时器和打字效果都停止

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};
use vn_script::{Actor, PendingTransition, RoleState, TransitionSignal, pending_transition};

/// 逐字显示速度（字/秒）
const TYPING_SPEED: f32 = 40.0;

/// 文字记录，所有 Actor 共享
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    /// 取出尚未输出的记录
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }
}

/// 进行中的计时过渡
#[derive(Debug)]
struct Timer {
    remaining: f32,
    signal: TransitionSignal,
}

/// 逐字显示进度
#[derive(Debug, Clone, Copy)]
struct Typing {
    shown: f32,
    total: usize,
}

impl Typing {
    fn is_done(&self) -> bool {
        self.shown >= self.total as f32
    }
}

/// 控制台 Actor
#[derive(Debug)]
pub struct ConsoleActor {
    name: String,
    transcript: Transcript,
    transition_secs: f32,
    last: Option<RoleState>,
    timer: Option<Timer>,
    typing: Option<Typing>,
    paused: bool,
}

impl ConsoleActor {
    pub fn new(name: impl Into<String>, transcript: Transcript, transition_secs: f32) -> Self {
        Self {
            name: name.into(),
            transcript,
            transition_secs,
            last: None,
            timer: None,
            typing: None,
            paused: false,
        }
    }

    /// 开始计时过渡（替换旧的计时，旧信号随之完成）
    fn start_timer(&mut self, seconds: f32) -> PendingTransition {
        let (pending, signal) = pending_transition();
        self.timer = Some(Timer {
            remaining: seconds,
            signal,
        });
        pending
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_some_and(|t| !t.is_done())
    }

    /// 相对上一次呈现的状态，生成一行描述
    fn describe(&self, state: &RoleState) -> Option<String> {
        let name = &self.name;
        match state {
            RoleState::Stage(stage) => stage.wait.map(|secs| format!("（等待 {secs} 秒）")),
            RoleState::Curtain(curtain) if curtain.lowered => {
                Some(format!("[{name}] 幕布落下 {}", curtain.color))
            }
            RoleState::Mural(mural) if mural.visible => Some(format!("== {} ==", mural.text)),
            RoleState::DialogueBox(dialogue) if !dialogue.phrase.is_empty() => {
                Some(match &dialogue.speaker {
                    Some(speaker) => format!("{speaker}：「{}」", dialogue.phrase),
                    None => dialogue.phrase.clone(),
                })
            }
            RoleState::Jukebox(_) | RoleState::PictureFrame(_) => {
                let now = summary(state);
                let before = self.last.as_ref().and_then(summary);
                (now != before)
                    .then_some(now)
                    .flatten()
                    .map(|line| format!("[{name}] {line}"))
            }
            _ => None,
        }
    }
}

/// 持续性状态的摘要，只在变化时输出
fn summary(state: &RoleState) -> Option<String> {
    match state {
        RoleState::Jukebox(jukebox) => Some(match &jukebox.track {
            Some(track) => format!("♪ {track}（音量 {:.0}%）", jukebox.volume * 100.0),
            None => "♪ 停止".to_string(),
        }),
        RoleState::PictureFrame(frame) => Some(match &frame.pose {
            Some(pose) => format!("{pose} @ {:?}", frame.position),
            None => "隐藏".to_string(),
        }),
        _ => None,
    }
}

impl Actor for ConsoleActor {
    fn apply_state(&mut self, state: &RoleState) -> Option<PendingTransition> {
        if let Some(line) = self.describe(state) {
            info!(role = %self.name, "{line}");
            self.transcript.push(line);
        }

        // 新状态取代进行中的过渡
        self.timer = None;
        let pending = match state {
            // 零时长的等待直接视为已结束
            RoleState::Stage(stage) => stage.wait.map(|secs| {
                if secs > 0.0 {
                    self.start_timer(secs as f32)
                } else {
                    PendingTransition::settled()
                }
            }),
            RoleState::Curtain(curtain) if curtain.lowered => {
                Some(self.start_timer(self.transition_secs))
            }
            _ => None,
        };

        if let RoleState::DialogueBox(dialogue) = state {
            self.typing = (!dialogue.phrase.is_empty()).then(|| Typing {
                shown: 0.0,
                total: dialogue.phrase.chars().count(),
            });
        }

        self.last = Some(state.clone());
        pending
    }

    fn advance(&mut self) -> bool {
        if let Some(typing) = self.typing.as_mut()
            && !typing.is_done()
        {
            typing.shown = typing.total as f32;
            debug!(role = %self.name, "补全台词");
            return false;
        }
        true
    }

    fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        if let Some(typing) = self.typing.as_mut() {
            typing.shown += dt * TYPING_SPEED;
        }
        if let Some(timer) = self.timer.as_mut() {
            timer.remaining -= dt;
            if timer.remaining <= 0.0
                && let Some(timer) = self.timer.take()
            {
                debug!(role = %self.name, "过渡结束");
                timer.signal.complete();
            }
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn unpause(&mut self) {
        self.paused = false;
    }
}
