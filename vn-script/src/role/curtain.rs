//! # Curtain 角色
//!
//! 幕布：降下时遮住整个舞台，每个 Beat 自动升起。

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::role::Role;
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind, no_check};
use crate::value::{ArgType, ArgValue, is_hex_color, text_arg};

/// 幕布配置
#[derive(Debug, Clone, PartialEq)]
pub struct CurtainConfig {
    /// 初始颜色
    pub color: String,
}

impl Default for CurtainConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

pub(crate) fn default_color() -> String {
    "#000000".to_string()
}

/// 幕布状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurtainState {
    /// 是否降下，每个 Beat 重置为 `false`
    pub lowered: bool,
    /// 幕布颜色
    pub color: String,
}

state_variant!(CurtainState, Curtain);

impl CurtainState {
    pub(crate) fn initial(config: &CurtainConfig) -> Self {
        Self {
            lowered: false,
            color: config.color.clone(),
        }
    }

    pub(crate) fn propagate(&self) -> Self {
        Self {
            lowered: false,
            color: self.color.clone(),
        }
    }
}

pub(crate) static STEP_KINDS: &[StepKind] = &[
    StepKind {
        name: "lower",
        args: &[],
        pause: PauseKind::AutoWait,
        major_transition: true,
        check: no_check,
        apply: apply_lower,
    },
    StepKind {
        name: "set_color",
        args: &[ArgSpec::new("color", ArgType::Color)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_color,
        apply: apply_set_color,
    },
];

fn apply_lower(ctx: &mut StepContext<'_>, _args: &[ArgValue]) -> Result<(), StepError> {
    ctx.state::<CurtainState>()?.lowered = true;
    Ok(())
}

fn apply_set_color(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let color = text_arg(args, 0);
    if is_hex_color(color) {
        ctx.state::<CurtainState>()?.color = color.to_string();
    }
    Ok(())
}

fn check_color(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    let color = text_arg(args, 0);
    if is_hex_color(color) {
        Vec::new()
    } else {
        vec![format!("无效的颜色 '{color}'，应为 #rrggbb")]
    }
}
