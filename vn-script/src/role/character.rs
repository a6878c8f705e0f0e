//! # Character 角色
//!
//! 说话的角色。`say` 步骤在同一个 Beat 内写入关联对话框的状态，
//! 这是角色状态之间唯一的跨角色写入。

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::role::{DialogueBoxState, Role, RoleId, RoleKind, RoleType};
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind};
use crate::value::{ArgType, ArgValue, is_hex_color, text_arg};

/// 角色配置
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterConfig {
    /// 对话框中显示的名字
    pub display_name: String,
    /// 名字颜色
    pub color: String,
    /// 关联的对话框（加载时解析，不持有所有权）
    pub dialogue_box: Option<RoleId>,
}

pub(crate) fn default_color() -> String {
    "#ffffff".to_string()
}

/// 角色状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    /// 本 Beat 是否在说话，每个 Beat 重置
    pub speaking: bool,
}

state_variant!(CharacterState, Character);

impl CharacterState {
    pub(crate) fn propagate(&self) -> Self {
        Self { speaking: false }
    }
}

pub(crate) static STEP_KINDS: &[StepKind] = &[StepKind {
    name: "say",
    args: &[ArgSpec::new("text", ArgType::Text)],
    pause: PauseKind::Hold,
    major_transition: false,
    check: check_say,
    apply: apply_say,
}];

fn apply_say(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let role = ctx.role;
    let RoleKind::Character(config) = role.kind() else {
        return Err(StepError::StateMismatch {
            role: role.name().to_string(),
            expected: RoleType::Character,
        });
    };
    let dialogue_box = config
        .dialogue_box
        .ok_or_else(|| StepError::MissingDialogueBox {
            character: role.name().to_string(),
        })?;

    ctx.state::<CharacterState>()?.speaking = true;

    let state = ctx.state_of::<DialogueBoxState>(dialogue_box)?;
    state.speaker = Some(config.display_name.clone());
    state.color = config.color.clone();
    state.phrase = text_arg(args, 0).to_string();
    Ok(())
}

fn check_say(role: &Role, args: &[ArgValue]) -> Vec<String> {
    let mut problems = Vec::new();
    if let RoleKind::Character(config) = role.kind() {
        if config.dialogue_box.is_none() {
            problems.push(format!("角色 '{}' 没有关联对话框", role.name()));
        }
        if !is_hex_color(&config.color) {
            problems.push(format!("角色 '{}' 的颜色 '{}' 无效", role.name(), config.color));
        }
    }
    if text_arg(args, 0).is_empty() {
        problems.push("台词不能为空".to_string());
    }
    problems
}
