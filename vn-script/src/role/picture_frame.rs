//! # PictureFrame 角色
//!
//! 立绘画框。姿势名通过配置中的姿势表映射到图片路径。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StepError;
use crate::role::{Role, RoleKind};
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind, no_check};
use crate::value::{ArgType, ArgValue, Position, text_arg};

/// 画框配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PictureFrameConfig {
    /// 姿势名 -> 图片路径
    pub poses: BTreeMap<String, String>,
}

/// 画框状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PictureFrameState {
    /// 当前姿势（None 表示隐藏）
    pub pose: Option<String>,
    /// 显示位置
    pub position: Position,
}

state_variant!(PictureFrameState, PictureFrame);

pub(crate) static STEP_KINDS: &[StepKind] = &[
    StepKind {
        name: "show",
        args: &[ArgSpec::new("pose", ArgType::Pose)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_pose,
        apply: apply_show,
    },
    StepKind {
        name: "hide",
        args: &[],
        pause: PauseKind::None,
        major_transition: false,
        check: no_check,
        apply: apply_hide,
    },
    StepKind {
        name: "move",
        args: &[ArgSpec::new("position", ArgType::Position)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_position,
        apply: apply_move,
    },
];

fn apply_show(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let pose = text_arg(args, 0);
    ctx.state::<PictureFrameState>()?.pose = (!pose.is_empty()).then(|| pose.to_string());
    Ok(())
}

fn apply_hide(ctx: &mut StepContext<'_>, _args: &[ArgValue]) -> Result<(), StepError> {
    ctx.state::<PictureFrameState>()?.pose = None;
    Ok(())
}

fn apply_move(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    if let Some(position) = Position::parse(text_arg(args, 0)) {
        ctx.state::<PictureFrameState>()?.position = position;
    }
    Ok(())
}

fn check_pose(role: &Role, args: &[ArgValue]) -> Vec<String> {
    let pose = text_arg(args, 0);
    match role.kind() {
        RoleKind::PictureFrame(config) if config.poses.contains_key(pose) => Vec::new(),
        _ => vec![format!("姿势 '{pose}' 不在 '{}' 的姿势表中", role.name())],
    }
}

fn check_position(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    let position = text_arg(args, 0);
    match Position::parse(position) {
        Some(_) => Vec::new(),
        None => vec![format!("无效的位置 '{position}'")],
    }
}
