//! # host-cli
//!
//! 无界面剧本播放器：从磁盘加载剧本，绑定控制台 Actor，
//! 通过标准输入命令或自动播放驱动 Director。
//!
//! ## 模块结构
//!
//! - [`config`]：播放器配置
//! - [`actors`]：控制台 Actor 与文字记录
//! - [`player`]：播放循环

pub mod actors;
pub mod config;
pub mod player;

pub use actors::{ConsoleActor, Transcript};
pub use config::{ConfigError, PlayerConfig};
pub use player::{Player, PlayerCommand, load_script};
