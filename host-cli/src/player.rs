//! # Player 模块
//!
//! 驱动 Director 播放剧本：交互模式从输入逐行读取命令，自动模式按模拟时钟前进。
//! 时间完全由帧间隔模拟，不依赖真实时钟，因此可以在测试中确定地运行。

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, bail};
use tracing::{debug, info};
use vn_script::{Director, DirectorEvent, DirectorState, Script};

use crate::actors::{ConsoleActor, Transcript};
use crate::config::PlayerConfig;

/// 自动播放时每个 Beat 的停留时间（秒）
const AUTO_PLAY_DWELL: f32 = 1.5;

/// 等待过渡的最大帧数
const MAX_SETTLE_FRAMES: usize = 100_000;

/// 交互命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// 前进
    Next,
    /// 回退
    Back,
    /// 跳转到 Beat
    Jump(usize),
    /// 跳转到书签
    Bookmark(String),
    /// 切换暂停
    TogglePause,
    /// 显示状态
    Status,
    /// 显示帮助
    Help,
    /// 退出
    Quit,
}

impl PlayerCommand {
    /// 解析一行输入，空行视为前进
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match head {
            "" | "n" | "next" => Ok(Self::Next),
            "b" | "back" => Ok(Self::Back),
            "j" | "jump" => rest
                .parse()
                .map(Self::Jump)
                .map_err(|_| format!("无效的 Beat 索引: '{rest}'")),
            "g" | "goto" if !rest.is_empty() => Ok(Self::Bookmark(rest.to_string())),
            "g" | "goto" => Err("需要书签名".to_string()),
            "p" | "pause" => Ok(Self::TogglePause),
            "s" | "status" => Ok(Self::Status),
            "h" | "help" | "?" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("未知命令: '{other}'，输入 h 查看帮助")),
        }
    }
}

const HELP: &str = "\
命令:
  <回车> / n      前进（文字显示中时先补全文字）
  b               回退
  j <索引>        跳转到 Beat
  g <书签>        跳转到书签
  p               暂停 / 继续
  s               显示状态
  q               退出";

/// 无界面播放器
pub struct Player {
    script: Script,
    director: Director,
    transcript: Transcript,
    config: PlayerConfig,
}

impl Player {
    /// 为每个角色绑定控制台 Actor
    pub fn new(script: Script, config: PlayerConfig) -> Self {
        let transcript = Transcript::new();
        let mut director = Director::new();
        for role in script.roles() {
            if let Some(id) = script.role_id(role.name()) {
                director.attach(
                    id,
                    ConsoleActor::new(role.name(), transcript.clone(), config.transition_secs()),
                );
            }
        }
        Self {
            script,
            director,
            transcript,
            config,
        }
    }

    /// 读取并加载配置中的剧本
    pub fn load(config: PlayerConfig) -> anyhow::Result<Self> {
        let script = load_script(&config.script_path)?;
        info!(
            path = %config.script_path.display(),
            roles = script.roles().len(),
            steps = script.len(),
            beats = script.beats().len(),
            "剧本加载完成"
        );
        Ok(Self::new(script, config))
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    /// 自动播放到最后一个 Beat
    pub fn run_auto<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        if self.script.beats().is_empty() {
            writeln!(out, "（剧本为空）")?;
            return Ok(());
        }
        let last = self.script.beats().len() - 1;
        let dt = self.config.frame_secs();
        let mut dwell = AUTO_PLAY_DWELL;
        let mut frames = 0usize;

        loop {
            if !self.director.is_busy() {
                if self.director.cursor() == Some(last) {
                    break;
                }
                if dwell >= AUTO_PLAY_DWELL {
                    self.director.advance(&self.script)?;
                }
            }
            self.director.update(&self.script, dt)?;
            if self.flush(out)? {
                dwell = 0.0;
            } else {
                dwell += dt;
            }

            frames += 1;
            if frames > MAX_SETTLE_FRAMES {
                bail!("自动播放超过 {MAX_SETTLE_FRAMES} 帧仍未结束");
            }
        }

        writeln!(out, "（完）")?;
        Ok(())
    }

    /// 交互播放，直到输入结束或收到退出命令
    pub fn run_interactive<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
    ) -> anyhow::Result<()> {
        writeln!(out, "{HELP}")?;
        self.execute(PlayerCommand::Next, out)?;

        for line in input.lines() {
            let line = line.context("读取输入失败")?;
            match PlayerCommand::parse(&line) {
                Ok(PlayerCommand::Quit) => break,
                Ok(command) => self.execute(command, out)?,
                Err(message) => writeln!(out, "{message}")?,
            }
        }
        Ok(())
    }

    /// 执行一条命令并等待过渡结束
    pub fn execute<W: Write>(&mut self, cmd: PlayerCommand, out: &mut W) -> anyhow::Result<()> {
        debug!(command = ?cmd, "执行命令");
        let result = match &cmd {
            PlayerCommand::Next => self.director.advance(&self.script).map(|moved| {
                if !moved && !self.director.is_busy() {
                    Some(self.blocked_reason())
                } else {
                    None
                }
            }),
            PlayerCommand::Back => self
                .director
                .backtrack(&self.script)
                .map(|moved| (!moved).then(|| "（已经在开头）".to_string())),
            PlayerCommand::Jump(index) => self.director.jump(&self.script, *index).map(|_| None),
            PlayerCommand::Bookmark(label) => self
                .director
                .jump_to_bookmark(&self.script, label)
                .map(|_| None),
            PlayerCommand::TogglePause => {
                if self.director.is_paused() {
                    self.director.unpause();
                    Ok(Some("（继续）".to_string()))
                } else {
                    self.director.pause();
                    Ok(Some("（暂停）".to_string()))
                }
            }
            PlayerCommand::Status => Ok(Some(self.status())),
            PlayerCommand::Help => Ok(Some(HELP.to_string())),
            PlayerCommand::Quit => Ok(None),
        };

        match result {
            Ok(Some(message)) => writeln!(out, "{message}")?,
            Ok(None) => {}
            // 导航错误只影响这一条命令
            Err(err) => writeln!(out, "错误: {err}")?,
        }

        self.settle()?;
        self.flush(out)?;
        Ok(())
    }

    /// 推进模拟时钟，直到没有进行中的过渡
    fn settle(&mut self) -> anyhow::Result<()> {
        if self.director.is_paused() {
            return Ok(());
        }
        let dt = self.config.frame_secs();
        let mut frames = 0;
        while self.director.is_busy() {
            self.director.update(&self.script, dt)?;
            frames += 1;
            if frames > MAX_SETTLE_FRAMES {
                bail!("过渡超过 {MAX_SETTLE_FRAMES} 帧仍未结束");
            }
        }
        Ok(())
    }

    /// 输出文字记录并处理 Director 通知，返回是否切换了 Beat
    fn flush<W: Write>(&mut self, out: &mut W) -> anyhow::Result<bool> {
        for line in self.transcript.drain() {
            writeln!(out, "{line}")?;
        }
        let mut changed = false;
        for event in self.director.take_events() {
            match event {
                DirectorEvent::BeatChanged(index) => {
                    changed = true;
                    debug!(beat = index, "Beat 切换");
                }
                DirectorEvent::Busy(index) => debug!(beat = index, "等待过渡"),
                DirectorEvent::Settled(index) => debug!(beat = index, "过渡结束"),
                DirectorEvent::AutoAdvance(index) => debug!(beat = index, "自动前进"),
            }
        }
        Ok(changed)
    }

    fn blocked_reason(&self) -> String {
        let last = self.script.beats().len().checked_sub(1);
        if self.director.cursor() == last {
            "（已经是最后一个 Beat）".to_string()
        } else {
            "（文字已显示完整，再次前进继续）".to_string()
        }
    }

    fn status(&self) -> String {
        let total = self.script.beats().len();
        let position = match self.director.state() {
            DirectorState::Idle => "未开始".to_string(),
            DirectorState::AtBeat(index) => format!("Beat {}/{}", index, total),
            DirectorState::Busy(index) => format!("Beat {}/{}（过渡中）", index, total),
        };
        let mut status = position;
        if self.director.is_paused() {
            status.push_str("（暂停）");
        }
        let bookmarks: Vec<_> = self
            .script
            .bookmarks()
            .iter()
            .map(|b| format!("{}@{}", b.label, b.beat_index))
            .collect();
        if bookmarks.is_empty() {
            format!("{status} | 书签: 无")
        } else {
            format!("{status} | 书签: {}", bookmarks.join(", "))
        }
    }
}

/// 从文件加载剧本
pub fn load_script(path: &Path) -> anyhow::Result<Script> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取剧本: {}", path.display()))?;
    Script::from_json(&content).with_context(|| format!("无法加载剧本: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(PlayerCommand::parse(""), Ok(PlayerCommand::Next));
        assert_eq!(PlayerCommand::parse(" b "), Ok(PlayerCommand::Back));
        assert_eq!(PlayerCommand::parse("j 3"), Ok(PlayerCommand::Jump(3)));
        assert_eq!(
            PlayerCommand::parse("g 第二幕"),
            Ok(PlayerCommand::Bookmark("第二幕".to_string()))
        );
        assert_eq!(PlayerCommand::parse("q"), Ok(PlayerCommand::Quit));
        assert!(PlayerCommand::parse("j x").is_err());
        assert!(PlayerCommand::parse("g").is_err());
        assert!(PlayerCommand::parse("dance").is_err());
    }
}
