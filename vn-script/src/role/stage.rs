//! # Stage 角色
//!
//! 舞台指令：暂停、书签和定时等待。

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::role::Role;
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind, no_check};
use crate::value::{ArgType, ArgValue, number_arg, text_arg};

/// 书签步骤的名称
pub const BOOKMARK: &str = "bookmark";

/// 舞台状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    /// 本 Beat 的定时等待（秒），每个 Beat 重置
    pub wait: Option<f64>,
}

state_variant!(StageState, Stage);

impl StageState {
    pub(crate) fn propagate(&self) -> Self {
        Self { wait: None }
    }
}

pub(crate) static STEP_KINDS: &[StepKind] = &[
    StepKind {
        name: "pause",
        args: &[],
        pause: PauseKind::Hold,
        major_transition: false,
        check: no_check,
        apply: apply_nothing,
    },
    StepKind {
        name: BOOKMARK,
        args: &[ArgSpec::new("label", ArgType::Label)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_bookmark,
        apply: apply_nothing,
    },
    StepKind {
        name: "wait",
        args: &[ArgSpec::new("seconds", ArgType::Number)],
        pause: PauseKind::AutoWait,
        major_transition: false,
        check: check_wait,
        apply: apply_wait,
    },
];

// pause 与 bookmark 只影响 Beat 划分和书签列表
fn apply_nothing(_ctx: &mut StepContext<'_>, _args: &[ArgValue]) -> Result<(), StepError> {
    Ok(())
}

fn apply_wait(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let seconds = number_arg(args, 0).unwrap_or(0.0).max(0.0);
    ctx.state::<StageState>()?.wait = Some(seconds);
    Ok(())
}

fn check_bookmark(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    if text_arg(args, 0).trim().is_empty() {
        vec!["书签名不能为空".to_string()]
    } else {
        Vec::new()
    }
}

fn check_wait(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    match number_arg(args, 0) {
        Some(seconds) if seconds < 0.0 => vec![format!("等待时长不能为负数: {seconds}")],
        _ => Vec::new(),
    }
}
