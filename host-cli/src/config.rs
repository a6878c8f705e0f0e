//! # Config 模块
//!
//! 播放器配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

/// 播放器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// 入口剧本路径
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,

    /// 是否自动播放（不等待输入）
    #[serde(default)]
    pub auto_play: bool,

    /// 模拟的帧间隔（毫秒）
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,

    /// 幕布等大型过渡的时长（毫秒）
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    /// 日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_script_path() -> PathBuf {
    PathBuf::from("assets/scripts/demo.json")
}

fn default_frame_ms() -> u64 {
    16
}

fn default_transition_ms() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            script_path: default_script_path(),
            auto_play: false,
            frame_ms: default_frame_ms(),
            transition_ms: default_transition_ms(),
            log_level: default_log_level(),
        }
    }
}

impl PlayerConfig {
    /// 加载配置文件
    ///
    /// 文件不存在时返回默认配置；存在但无法解析时报错。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("必须配置 script_path（入口剧本路径）".into()));
        }
        if self.frame_ms == 0 {
            return Err(ConfigError::Invalid("frame_ms 必须大于 0".into()));
        }
        self.level()?;
        Ok(())
    }

    /// 解析日志级别
    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("无效的日志级别: {}", self.log_level)))
    }

    /// 帧间隔（秒）
    pub fn frame_secs(&self) -> f32 {
        self.frame_ms as f32 / 1000.0
    }

    /// 大型过渡时长（秒）
    pub fn transition_secs(&self) -> f32 {
        self.transition_ms as f32 / 1000.0
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置验证失败: {0}")]
    Invalid(String),
}
