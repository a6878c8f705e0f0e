//! # DialogueBox 角色
//!
//! 对话框。旁白直接写入本角色；Character 的 `say` 步骤也会写入关联的对话框。
//!
//! `phrase` 每个 Beat 清空，`speaker` / `color` / `position` 保留到被覆盖为止，
//! 演出层依赖仍然可见的说话者标签做差异比较。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StepError;
use crate::role::{Role, RoleKind};
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind};
use crate::value::{ArgType, ArgValue, text_arg};

/// 对话框位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxPosition {
    Top,
    #[default]
    Bottom,
}

impl FromStr for BoxPosition {
    type Err = ();

    /// 从字符串解析位置（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(()),
        }
    }
}

/// 对话框配置
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueBoxConfig {
    /// 初始位置
    pub position: BoxPosition,
    /// 旁白文字颜色
    pub color: String,
}

impl Default for DialogueBoxConfig {
    fn default() -> Self {
        Self {
            position: BoxPosition::default(),
            color: default_color(),
        }
    }
}

pub(crate) fn default_color() -> String {
    "#ffffff".to_string()
}

/// 对话框状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueBoxState {
    /// 说话者显示名（None 表示旁白）
    pub speaker: Option<String>,
    /// 文字颜色
    pub color: String,
    /// 对话框位置
    pub position: BoxPosition,
    /// 本 Beat 的台词，每个 Beat 清空
    pub phrase: String,
}

state_variant!(DialogueBoxState, DialogueBox);

impl DialogueBoxState {
    pub(crate) fn initial(config: &DialogueBoxConfig) -> Self {
        Self {
            speaker: None,
            color: config.color.clone(),
            position: config.position,
            phrase: String::new(),
        }
    }

    pub(crate) fn propagate(&self) -> Self {
        Self {
            phrase: String::new(),
            ..self.clone()
        }
    }
}

pub(crate) static STEP_KINDS: &[StepKind] = &[
    StepKind {
        name: "say",
        args: &[ArgSpec::new("text", ArgType::Text)],
        pause: PauseKind::Hold,
        major_transition: false,
        check: check_say,
        apply: apply_say,
    },
    StepKind {
        name: "set_position",
        args: &[ArgSpec::new("position", ArgType::Position)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_position,
        apply: apply_set_position,
    },
];

/// 旁白：清除说话者，恢复旁白颜色
fn apply_say(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let role = ctx.role;
    let color = match role.kind() {
        RoleKind::DialogueBox(config) => config.color.clone(),
        _ => default_color(),
    };
    let state = ctx.state::<DialogueBoxState>()?;
    state.speaker = None;
    state.color = color;
    state.phrase = text_arg(args, 0).to_string();
    Ok(())
}

fn apply_set_position(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    if let Ok(position) = BoxPosition::from_str(text_arg(args, 0)) {
        ctx.state::<DialogueBoxState>()?.position = position;
    }
    Ok(())
}

fn check_say(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    if text_arg(args, 0).is_empty() {
        vec!["台词不能为空".to_string()]
    } else {
        Vec::new()
    }
}

fn check_position(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    let position = text_arg(args, 0);
    match BoxPosition::from_str(position) {
        Ok(_) => Vec::new(),
        Err(()) => vec![format!("无效的对话框位置 '{position}'，应为 top 或 bottom")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::Beat;
    use crate::role::RoleId;

    #[test]
    fn test_phrase_resets_speaker_persists() {
        let state = DialogueBoxState {
            speaker: Some("Alice".to_string()),
            color: "#ff8800".to_string(),
            position: BoxPosition::Top,
            phrase: "你好".to_string(),
        };
        let next = state.propagate();
        assert_eq!(next.phrase, "");
        assert_eq!(next.speaker.as_deref(), Some("Alice"));
        assert_eq!(next.color, "#ff8800");
        assert_eq!(next.position, BoxPosition::Top);
    }

    #[test]
    fn test_narration_clears_speaker() {
        let role = Role::dialogue_box("box");
        let mut beat = Beat::initial(std::slice::from_ref(&role));
        let mut ctx = StepContext::new(&role, RoleId::new(0), &mut beat);
        {
            let state = ctx.state::<DialogueBoxState>().unwrap();
            state.speaker = Some("Bob".to_string());
            state.color = "#00ff00".to_string();
        }
        apply_say(&mut ctx, &[ArgValue::text("夜深了。")]).unwrap();
        let state = ctx.state::<DialogueBoxState>().unwrap();
        assert_eq!(state.speaker, None);
        assert_eq!(state.color, default_color());
        assert_eq!(state.phrase, "夜深了。");
    }

    #[test]
    fn test_position_check() {
        let role = Role::dialogue_box("box");
        assert!(check_position(&role, &[ArgValue::text("TOP")]).is_empty());
        assert_eq!(check_position(&role, &[ArgValue::text("left")]).len(), 1);
    }
}
