//! # Role 模块
//!
//! 剧目参与者的类型化描述。
//!
//! ## 设计说明
//!
//! - 角色类型是封闭集合，每种类型一个变体，按变体分派而不是动态查找
//! - 每种类型声明自己的状态结构、跨 Beat 的传递规则和步骤类型表
//! - 角色之间唯一的引用是 Character -> DialogueBox，以 [`RoleId`] 表示
//!
//! ## 模块结构
//!
//! - [`stage`]：舞台指令（暂停、书签、等待）
//! - [`curtain`]：幕布
//! - [`mural`]：壁画（整屏文字）
//! - [`dialogue_box`]：对话框
//! - [`jukebox`]：点唱机
//! - [`picture_frame`]：画框
//! - [`character`]：角色

/// 为状态结构实现 [`StateVariant`](crate::step_kind::StateVariant)
macro_rules! state_variant {
    ($state:ty, $variant:ident) => {
        impl $crate::step_kind::StateVariant for $state {
            const ROLE_TYPE: $crate::role::RoleType = $crate::role::RoleType::$variant;

            fn from_state_mut(state: &mut $crate::role::RoleState) -> Option<&mut Self> {
                match state {
                    $crate::role::RoleState::$variant(s) => Some(s),
                    _ => None,
                }
            }
        }
    };
}

pub mod character;
pub mod curtain;
pub mod dialogue_box;
pub mod jukebox;
pub mod mural;
pub mod picture_frame;
pub mod stage;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ScriptError;
use crate::step_kind::StepKind;

pub use character::{CharacterConfig, CharacterState};
pub use curtain::{CurtainConfig, CurtainState};
pub use dialogue_box::{BoxPosition, DialogueBoxConfig, DialogueBoxState};
pub use jukebox::{JukeboxConfig, JukeboxState};
pub use mural::MuralState;
pub use picture_frame::{PictureFrameConfig, PictureFrameState};
pub use stage::StageState;

/// 角色在脚本中的标识（角色列表中的位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(usize);

impl RoleId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// 在角色列表中的位置
    pub fn index(self) -> usize {
        self.0
    }
}

/// 角色类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Stage,
    Curtain,
    Mural,
    DialogueBox,
    Jukebox,
    PictureFrame,
    Character,
}

impl RoleType {
    /// 该类型注册的全部步骤类型
    pub fn step_kinds(self) -> &'static [StepKind] {
        match self {
            Self::Stage => stage::STEP_KINDS,
            Self::Curtain => curtain::STEP_KINDS,
            Self::Mural => mural::STEP_KINDS,
            Self::DialogueBox => dialogue_box::STEP_KINDS,
            Self::Jukebox => jukebox::STEP_KINDS,
            Self::PictureFrame => picture_frame::STEP_KINDS,
            Self::Character => character::STEP_KINDS,
        }
    }

    /// 按名称查找步骤类型
    pub fn step_kind(self, name: &str) -> Option<&'static StepKind> {
        self.step_kinds().iter().find(|kind| kind.name == name)
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stage => "stage",
            Self::Curtain => "curtain",
            Self::Mural => "mural",
            Self::DialogueBox => "dialogue_box",
            Self::Jukebox => "jukebox",
            Self::PictureFrame => "picture_frame",
            Self::Character => "character",
        };
        f.write_str(name)
    }
}

/// 角色类型及其专属配置
#[derive(Debug, Clone, PartialEq)]
pub enum RoleKind {
    Stage,
    Curtain(CurtainConfig),
    Mural,
    DialogueBox(DialogueBoxConfig),
    Jukebox(JukeboxConfig),
    PictureFrame(PictureFrameConfig),
    Character(CharacterConfig),
}

impl RoleKind {
    /// 类型标签
    pub fn role_type(&self) -> RoleType {
        match self {
            Self::Stage => RoleType::Stage,
            Self::Curtain(_) => RoleType::Curtain,
            Self::Mural => RoleType::Mural,
            Self::DialogueBox(_) => RoleType::DialogueBox,
            Self::Jukebox(_) => RoleType::Jukebox,
            Self::PictureFrame(_) => RoleType::PictureFrame,
            Self::Character(_) => RoleType::Character,
        }
    }
}

/// 剧目参与者
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    name: String,
    kind: RoleKind,
}

impl Role {
    /// 创建角色
    pub fn new(name: impl Into<String>, kind: RoleKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn stage(name: impl Into<String>) -> Self {
        Self::new(name, RoleKind::Stage)
    }

    pub fn curtain(name: impl Into<String>) -> Self {
        Self::new(name, RoleKind::Curtain(CurtainConfig::default()))
    }

    pub fn mural(name: impl Into<String>) -> Self {
        Self::new(name, RoleKind::Mural)
    }

    pub fn dialogue_box(name: impl Into<String>) -> Self {
        Self::new(name, RoleKind::DialogueBox(DialogueBoxConfig::default()))
    }

    pub fn jukebox(name: impl Into<String>, tracks: BTreeMap<String, String>) -> Self {
        Self::new(name, RoleKind::Jukebox(JukeboxConfig { tracks }))
    }

    pub fn picture_frame(name: impl Into<String>, poses: BTreeMap<String, String>) -> Self {
        Self::new(name, RoleKind::PictureFrame(PictureFrameConfig { poses }))
    }

    /// 创建角色，`dialogue_box` 为其说话时写入的对话框
    pub fn character(
        name: impl Into<String>,
        display_name: impl Into<String>,
        dialogue_box: Option<RoleId>,
    ) -> Self {
        Self::new(
            name,
            RoleKind::Character(CharacterConfig {
                display_name: display_name.into(),
                color: character::default_color(),
                dialogue_box,
            }),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &RoleKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut RoleKind {
        &mut self.kind
    }

    pub fn role_type(&self) -> RoleType {
        self.kind.role_type()
    }

    /// 查找本角色类型上的步骤类型
    pub fn step_kind(&self, name: &str) -> Result<&'static StepKind, ScriptError> {
        self.role_type()
            .step_kind(name)
            .ok_or_else(|| ScriptError::UnknownStepKind {
                role_type: self.role_type(),
                kind: name.to_string(),
            })
    }

    /// 初始状态（第一个 Beat 使用）
    pub fn generate_initial_state(&self) -> RoleState {
        match &self.kind {
            RoleKind::Stage => RoleState::Stage(StageState::default()),
            RoleKind::Curtain(config) => RoleState::Curtain(CurtainState::initial(config)),
            RoleKind::Mural => RoleState::Mural(MuralState::default()),
            RoleKind::DialogueBox(config) => {
                RoleState::DialogueBox(DialogueBoxState::initial(config))
            }
            RoleKind::Jukebox(_) => RoleState::Jukebox(JukeboxState::default()),
            RoleKind::PictureFrame(_) => RoleState::PictureFrame(PictureFrameState::default()),
            RoleKind::Character(_) => RoleState::Character(CharacterState::default()),
        }
    }

    /// 由上一个 Beat 的状态生成下一个 Beat 的初始状态
    ///
    /// 状态类型与角色类型不符时回退到初始状态。
    pub fn propagate_state(&self, prev: &RoleState) -> RoleState {
        if prev.role_type() != self.role_type() {
            return self.generate_initial_state();
        }
        prev.propagate()
    }
}

/// 角色在某个 Beat 中的状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoleState {
    Stage(StageState),
    Curtain(CurtainState),
    Mural(MuralState),
    DialogueBox(DialogueBoxState),
    Jukebox(JukeboxState),
    PictureFrame(PictureFrameState),
    Character(CharacterState),
}

impl RoleState {
    pub fn role_type(&self) -> RoleType {
        match self {
            Self::Stage(_) => RoleType::Stage,
            Self::Curtain(_) => RoleType::Curtain,
            Self::Mural(_) => RoleType::Mural,
            Self::DialogueBox(_) => RoleType::DialogueBox,
            Self::Jukebox(_) => RoleType::Jukebox,
            Self::PictureFrame(_) => RoleType::PictureFrame,
            Self::Character(_) => RoleType::Character,
        }
    }

    /// 跨 Beat 传递：默认浅拷贝，部分字段每个 Beat 重置
    fn propagate(&self) -> RoleState {
        match self {
            Self::Stage(s) => Self::Stage(s.propagate()),
            Self::Curtain(s) => Self::Curtain(s.propagate()),
            Self::Mural(s) => Self::Mural(s.propagate()),
            Self::DialogueBox(s) => Self::DialogueBox(s.propagate()),
            Self::Jukebox(s) => Self::Jukebox(s.clone()),
            Self::PictureFrame(s) => Self::PictureFrame(s.clone()),
            Self::Character(s) => Self::Character(s.propagate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_kind_lookup() {
        let stage = Role::stage("stage");
        assert_eq!(stage.step_kind("pause").unwrap().name, "pause");
        assert_eq!(
            stage.step_kind("fly").unwrap_err(),
            ScriptError::UnknownStepKind {
                role_type: RoleType::Stage,
                kind: "fly".to_string(),
            }
        );
    }

    #[test]
    fn test_every_role_type_has_unique_kind_names() {
        let types = [
            RoleType::Stage,
            RoleType::Curtain,
            RoleType::Mural,
            RoleType::DialogueBox,
            RoleType::Jukebox,
            RoleType::PictureFrame,
            RoleType::Character,
        ];
        for role_type in types {
            let kinds = role_type.step_kinds();
            assert!(!kinds.is_empty(), "{role_type} 没有步骤类型");
            for (i, kind) in kinds.iter().enumerate() {
                assert!(
                    kinds[i + 1..].iter().all(|other| other.name != kind.name),
                    "{role_type}.{} 重复注册",
                    kind.name
                );
            }
        }
    }

    #[test]
    fn test_initial_state_matches_role_type() {
        let roles = [
            Role::stage("a"),
            Role::curtain("b"),
            Role::mural("c"),
            Role::dialogue_box("d"),
            Role::jukebox("e", BTreeMap::new()),
            Role::picture_frame("f", BTreeMap::new()),
            Role::character("g", "G", None),
        ];
        for role in &roles {
            let state = role.generate_initial_state();
            assert_eq!(state.role_type(), role.role_type());
            // 初始状态经过传递后保持不变
            assert_eq!(role.propagate_state(&state), state);
        }
    }

    #[test]
    fn test_propagate_mismatched_state_falls_back_to_initial() {
        let curtain = Role::curtain("curtain");
        let foreign = Role::mural("mural").generate_initial_state();
        assert_eq!(
            curtain.propagate_state(&foreign),
            curtain.generate_initial_state()
        );
    }

    #[test]
    fn test_role_state_serialization_tag() {
        let state = Role::stage("stage").generate_initial_state();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "stage");
    }
}
