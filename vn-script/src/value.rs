//! # Value 模块
//!
//! 步骤参数的值类型与语义标签。
//!
//! ## 设计说明
//!
//! - `ArgValue` 是步骤实际携带的参数值，序列化时不带标签（字符串 / 数字 / 布尔）
//! - `ArgType` 是参数的语义标签，只给编辑层使用；运行时仅用它做形状校验
//! - apply 函数读取参数时使用宽松的访问器，遇到不合法参数退化为空值

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 步骤参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// 布尔参数
    Bool(bool),
    /// 数字参数
    Number(f64),
    /// 文本参数
    Text(String),
}

impl ArgValue {
    /// 创建文本参数
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// 获取文本值
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 获取数字值
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// 获取布尔值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 值类型名称（用于诊断信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// 参数语义标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgType {
    /// 任意文本
    Text,
    /// 数字
    Number,
    /// 布尔
    Boolean,
    /// 颜色（`#rrggbb`）
    Color,
    /// 书签名
    Label,
    /// 曲目名（对应 Jukebox 的曲目表）
    Track,
    /// 姿势名（对应 PictureFrame 的姿势表）
    Pose,
    /// 位置名
    Position,
}

impl ArgType {
    /// 检查参数值的形状是否匹配
    pub fn accepts(self, value: &ArgValue) -> bool {
        match self {
            Self::Number => matches!(value, ArgValue::Number(_)),
            Self::Boolean => matches!(value, ArgValue::Bool(_)),
            _ => matches!(value, ArgValue::Text(_)),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Color => "color",
            Self::Label => "label",
            Self::Track => "track",
            Self::Pose => "pose",
            Self::Position => "position",
        };
        f.write_str(name)
    }
}

/// 读取文本参数，缺失或类型不符时返回空串
pub(crate) fn text_arg(args: &[ArgValue], index: usize) -> &str {
    args.get(index).and_then(ArgValue::as_text).unwrap_or("")
}

/// 读取数字参数
pub(crate) fn number_arg(args: &[ArgValue], index: usize) -> Option<f64> {
    args.get(index).and_then(ArgValue::as_number)
}

/// 检查 `#rrggbb` / `#rrggbbaa` 颜色格式
pub(crate) fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// 画框位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    /// 左侧
    Left,
    /// 右侧
    Right,
    /// 中央
    #[default]
    Center,
    /// 近左
    NearLeft,
    /// 近右
    NearRight,
    /// 远左
    FarLeft,
    /// 远右
    FarRight,
}

impl Position {
    /// 从字符串解析位置（便捷方法）
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }
}

impl FromStr for Position {
    type Err = ();

    /// 从字符串解析位置（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "center" | "middle" => Ok(Self::Center),
            "nearleft" => Ok(Self::NearLeft),
            "nearright" => Ok(Self::NearRight),
            "farleft" => Ok(Self::FarLeft),
            "farright" => Ok(Self::FarRight),
            _ => Err(()),
        }
    }
}
