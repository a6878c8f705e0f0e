//! # Director 模块
//!
//! 播放控制器：持有 Beat 序列上的游标，把 Beat 中的角色状态分派给 Actor，
//! 实现前进、回退、跳转和暂停。
//!
//! ## 状态机
//!
//! ```text
//! Idle --jump/advance--> Busy(i) --所有过渡结束--> AtBeat(i)
//!                          │                         │
//!                          │ Beat 为 AutoWait         │ advance
//!                          └─────> advance ───────────┘
//! ```
//!
//! 跳转分两个阶段：分派（所有 Actor 的 `apply_state`）和等待（轮询返回的
//! [`PendingTransition`]）。没有未完成的过渡时立即进入第二阶段。
//! 等待中的 `advance` 是空操作；`jump` 不受限制，新的跳转会丢弃旧的等待集合。
//!
//! Director 不持有 Script，每次调用时传入；编辑后调用 [`Director::refresh`] 重新呈现。

mod actor;
mod pending;

pub use actor::Actor;
pub use pending::{PendingTransition, TransitionSignal, pending_transition};

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::DirectorError;
use crate::role::RoleId;
use crate::script::Script;
use crate::step_kind::PauseKind;

/// Director 发出的通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorEvent {
    /// 游标移动到了新的 Beat（不论是否有过渡）
    BeatChanged(usize),
    /// 开始等待过渡
    Busy(usize),
    /// 过渡全部结束
    Settled(usize),
    /// 从 AutoWait Beat 自动前进
    AutoAdvance(usize),
}

/// 对外可见的播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorState {
    /// 尚未开始播放
    Idle,
    /// 停在某个 Beat
    AtBeat(usize),
    /// 正在等待某个 Beat 的过渡
    Busy(usize),
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Ready,
    Busy {
        beat: usize,
        pending: Vec<PendingTransition>,
        auto_advance: bool,
        announced: bool,
    },
}

/// 播放控制器
#[derive(Default)]
pub struct Director {
    cursor: Option<usize>,
    phase: Phase,
    paused: bool,
    actors: BTreeMap<RoleId, Box<dyn Actor>>,
    events: Vec<DirectorEvent>,
}

impl Director {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为角色绑定 Actor，返回之前绑定的 Actor
    pub fn attach(&mut self, role: RoleId, actor: impl Actor + 'static) -> Option<Box<dyn Actor>> {
        self.actors.insert(role, Box::new(actor))
    }

    /// 解除角色的 Actor
    pub fn detach(&mut self, role: RoleId) -> Option<Box<dyn Actor>> {
        self.actors.remove(&role)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Busy { .. })
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn state(&self) -> DirectorState {
        match (&self.phase, self.cursor) {
            (Phase::Busy { beat, .. }, _) => DirectorState::Busy(*beat),
            (Phase::Ready, Some(index)) => DirectorState::AtBeat(index),
            (Phase::Ready, None) => DirectorState::Idle,
        }
    }

    /// 取出累积的通知
    pub fn take_events(&mut self) -> Vec<DirectorEvent> {
        std::mem::take(&mut self.events)
    }

    //=========================================================================
    // 导航
    //=========================================================================

    /// 跳转到第 `index` 个 Beat
    ///
    /// 不受忙碌状态限制；仍在等待的旧过渡不再被跟踪。
    pub fn jump(&mut self, script: &Script, index: usize) -> Result<(), DirectorError> {
        self.dispatch(script, index)?;
        self.poll(script)
    }

    /// 前进到下一个 Beat，返回是否移动了游标
    ///
    /// 忙碌、任一 Actor 拒绝、或已经在最后一个 Beat 时不移动。
    pub fn advance(&mut self, script: &Script) -> Result<bool, DirectorError> {
        let Some(next) = self.next_beat(script) else {
            return Ok(false);
        };
        self.dispatch(script, next)?;
        self.poll(script)?;
        Ok(true)
    }

    /// 回退到上一个可停留的 Beat，返回是否移动了游标
    ///
    /// 跳过 AutoWait Beat（Beat 0 除外）。
    pub fn backtrack(&mut self, script: &Script) -> Result<bool, DirectorError> {
        let beats = script.beats();
        let Some(cursor) = self.cursor.filter(|&cursor| cursor > 0) else {
            return Ok(false);
        };
        if beats.is_empty() {
            return Ok(false);
        }

        let mut target = (cursor - 1).min(beats.len() - 1);
        while target > 0 && beats[target].pause() == PauseKind::AutoWait {
            target -= 1;
        }
        debug!(from = cursor, to = target, "回退");
        self.jump(script, target)?;
        Ok(true)
    }

    /// 跳转到书签所在的 Beat
    pub fn jump_to_bookmark(&mut self, script: &Script, label: &str) -> Result<(), DirectorError> {
        let Some(bookmark) = script.find_bookmark(label) else {
            return Err(DirectorError::UnknownBookmark {
                label: label.to_string(),
            });
        };
        self.jump(script, bookmark.beat_index)
    }

    /// 脚本被编辑后重新呈现当前 Beat
    ///
    /// Beat 数量减少时游标夹到最后一个 Beat；脚本为空时回到 Idle。
    pub fn refresh(&mut self, script: &Script) -> Result<(), DirectorError> {
        let Some(cursor) = self.cursor else {
            return Ok(());
        };
        match script.beats().len() {
            0 => {
                self.cursor = None;
                self.phase = Phase::Ready;
                Ok(())
            }
            len => self.jump(script, cursor.min(len - 1)),
        }
    }

    //=========================================================================
    // 时间与暂停
    //=========================================================================

    /// 向所有 Actor 转发时间增量，然后检查过渡是否结束
    pub fn update(&mut self, script: &Script, dt: f32) -> Result<(), DirectorError> {
        for actor in self.actors.values_mut() {
            actor.update(dt);
        }
        self.poll(script)
    }

    /// 检查等待中的过渡；全部结束后解除忙碌，必要时自动前进
    pub fn poll(&mut self, script: &Script) -> Result<(), DirectorError> {
        loop {
            let Phase::Busy {
                beat,
                pending,
                auto_advance,
                announced,
            } = &mut self.phase
            else {
                return Ok(());
            };
            pending.retain(|transition| !transition.is_settled());
            if !pending.is_empty() {
                return Ok(());
            }

            let (beat, auto_advance, announced) = (*beat, *auto_advance, *announced);
            self.phase = Phase::Ready;
            if announced {
                debug!(beat, "过渡全部结束");
                self.events.push(DirectorEvent::Settled(beat));
            }
            if !auto_advance {
                return Ok(());
            }

            let Some(next) = self.next_beat(script) else {
                return Ok(());
            };
            debug!(from = beat, to = next, "自动前进");
            self.events.push(DirectorEvent::AutoAdvance(beat));
            self.dispatch(script, next)?;
        }
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        for actor in self.actors.values_mut() {
            actor.pause();
        }
    }

    pub fn unpause(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        for actor in self.actors.values_mut() {
            actor.unpause();
        }
    }

    //=========================================================================
    // 内部
    //=========================================================================

    /// 可以前进时返回下一个 Beat
    fn next_beat(&mut self, script: &Script) -> Option<usize> {
        if self.is_busy() {
            return None;
        }

        // 每个 Actor 都要收到询问，拒绝的副作用（如跳过打字效果）不能被短路
        let mut accepted = true;
        for actor in self.actors.values_mut() {
            accepted &= actor.advance();
        }
        if !accepted {
            debug!(cursor = ?self.cursor, "Actor 拒绝前进");
            return None;
        }

        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        (next < script.beats().len()).then_some(next)
    }

    /// 分派 Beat 状态并进入等待阶段
    fn dispatch(&mut self, script: &Script, index: usize) -> Result<(), DirectorError> {
        let beat = script
            .beat(index)
            .ok_or_else(|| DirectorError::BeatOutOfRange {
                index,
                len: script.beats().len(),
            })?;

        if let Some((role_id, _)) = beat.iter().find(|(id, _)| !self.actors.contains_key(id)) {
            let role = match script.role(role_id) {
                Some(role) => role.name().to_string(),
                None => format!("#{}", role_id.index()),
            };
            return Err(DirectorError::MissingActor { role });
        }

        if let Phase::Busy { beat, pending, .. } = &self.phase
            && !pending.is_empty()
        {
            debug!(beat, dropped = pending.len(), "新的跳转取代了未完成的过渡");
        }

        let mut pending = Vec::new();
        for (role_id, state) in beat.iter() {
            if let Some(actor) = self.actors.get_mut(&role_id)
                && let Some(transition) = actor.apply_state(state)
                && !transition.is_settled()
            {
                pending.push(transition);
            }
        }

        self.cursor = Some(index);
        self.events.push(DirectorEvent::BeatChanged(index));
        let announced = !pending.is_empty();
        if announced {
            self.events.push(DirectorEvent::Busy(index));
        }
        debug!(beat = index, pending = pending.len(), pause = ?beat.pause(), "跳转到 Beat");

        self.phase = Phase::Busy {
            beat: index,
            pending,
            auto_advance: beat.pause() == PauseKind::AutoWait,
            announced,
        };
        Ok(())
    }
}

impl std::fmt::Debug for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("cursor", &self.cursor)
            .field("phase", &self.phase)
            .field("paused", &self.paused)
            .field("actors", &self.actors.keys().collect::<Vec<_>>())
            .finish()
    }
}
