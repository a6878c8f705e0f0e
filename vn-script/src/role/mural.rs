//! # Mural 角色
//!
//! 整屏文字（章节标题、字幕卡）。只在设置它的 Beat 中可见。

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::role::Role;
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind};
use crate::value::{ArgType, ArgValue, text_arg};

/// 壁画状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MuralState {
    /// 是否可见，每个 Beat 重置为 `false`
    pub visible: bool,
    /// 最近一次显示的文字
    pub text: String,
}

state_variant!(MuralState, Mural);

impl MuralState {
    pub(crate) fn propagate(&self) -> Self {
        Self {
            visible: false,
            text: self.text.clone(),
        }
    }
}

pub(crate) static STEP_KINDS: &[StepKind] = &[StepKind {
    name: "show",
    args: &[ArgSpec::new("text", ArgType::Text)],
    pause: PauseKind::None,
    major_transition: false,
    check: check_text,
    apply: apply_show,
}];

fn apply_show(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let state = ctx.state::<MuralState>()?;
    state.visible = true;
    state.text = text_arg(args, 0).to_string();
    Ok(())
}

fn check_text(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    if text_arg(args, 0).is_empty() {
        vec!["文字不能为空".to_string()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_resets() {
        let state = MuralState {
            visible: true,
            text: "第一章".to_string(),
        };
        let next = state.propagate();
        assert!(!next.visible);
        assert_eq!(next.text, "第一章");
    }
}
