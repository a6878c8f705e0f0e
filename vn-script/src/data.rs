//! # Data 模块
//!
//! 剧本的序列化形态。
//!
//! ```json
//! {
//!   "roles": [
//!     { "type": "dialogue_box", "name": "box" },
//!     { "type": "character", "name": "alice", "display_name": "Alice", "dialogue_box": "box" }
//!   ],
//!   "steps": [
//!     ["alice", "say", ["你好"]],
//!     ["stage", "wait", [1.5]]
//!   ]
//! }
//! ```
//!
//! 加载分两遍：先登记全部角色，再解析角色之间的引用；步骤全部就位后只编译一次。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::LoadError;
use crate::role::{
    BoxPosition, CharacterConfig, CurtainConfig, DialogueBoxConfig, JukeboxConfig,
    PictureFrameConfig, Role, RoleKind, RoleType,
};
use crate::script::Script;
use crate::value::ArgValue;

/// 剧本文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptData {
    #[serde(default)]
    pub roles: Vec<RoleData>,
    #[serde(default)]
    pub steps: Vec<StepData>,
}

/// 角色定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoleData {
    Stage { name: String },
    Curtain {
        name: String,
        #[serde(default = "crate::role::curtain::default_color")]
        color: String,
    },
    Mural { name: String },
    DialogueBox {
        name: String,
        #[serde(default)]
        position: BoxPosition,
        #[serde(default = "crate::role::dialogue_box::default_color")]
        color: String,
    },
    Jukebox {
        name: String,
        #[serde(default)]
        tracks: BTreeMap<String, String>,
    },
    PictureFrame {
        name: String,
        #[serde(default)]
        poses: BTreeMap<String, String>,
    },
    Character {
        name: String,
        display_name: String,
        #[serde(default = "crate::role::character::default_color")]
        color: String,
        /// 对话框的角色名
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dialogue_box: Option<String>,
    },
}

impl RoleData {
    pub fn name(&self) -> &str {
        match self {
            Self::Stage { name }
            | Self::Curtain { name, .. }
            | Self::Mural { name }
            | Self::DialogueBox { name, .. }
            | Self::Jukebox { name, .. }
            | Self::PictureFrame { name, .. }
            | Self::Character { name, .. } => name,
        }
    }

    /// 转换为角色，引用留空等待第二遍解析
    fn to_role(&self) -> Role {
        let kind = match self {
            Self::Stage { .. } => RoleKind::Stage,
            Self::Curtain { color, .. } => RoleKind::Curtain(CurtainConfig {
                color: color.clone(),
            }),
            Self::Mural { .. } => RoleKind::Mural,
            Self::DialogueBox {
                position, color, ..
            } => RoleKind::DialogueBox(DialogueBoxConfig {
                position: *position,
                color: color.clone(),
            }),
            Self::Jukebox { tracks, .. } => RoleKind::Jukebox(JukeboxConfig {
                tracks: tracks.clone(),
            }),
            Self::PictureFrame { poses, .. } => RoleKind::PictureFrame(PictureFrameConfig {
                poses: poses.clone(),
            }),
            Self::Character {
                display_name,
                color,
                ..
            } => RoleKind::Character(CharacterConfig {
                display_name: display_name.clone(),
                color: color.clone(),
                dialogue_box: None,
            }),
        };
        Role::new(self.name(), kind)
    }

    fn from_role(script: &Script, role: &Role) -> Self {
        let name = role.name().to_string();
        match role.kind() {
            RoleKind::Stage => Self::Stage { name },
            RoleKind::Curtain(config) => Self::Curtain {
                name,
                color: config.color.clone(),
            },
            RoleKind::Mural => Self::Mural { name },
            RoleKind::DialogueBox(config) => Self::DialogueBox {
                name,
                position: config.position,
                color: config.color.clone(),
            },
            RoleKind::Jukebox(config) => Self::Jukebox {
                name,
                tracks: config.tracks.clone(),
            },
            RoleKind::PictureFrame(config) => Self::PictureFrame {
                name,
                poses: config.poses.clone(),
            },
            RoleKind::Character(config) => Self::Character {
                name,
                display_name: config.display_name.clone(),
                color: config.color.clone(),
                dialogue_box: config
                    .dialogue_box
                    .and_then(|id| script.role(id))
                    .map(|target| target.name().to_string()),
            },
        }
    }
}

/// 步骤：`[角色名, 步骤类型, [参数...]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData(pub String, pub String, pub Vec<ArgValue>);

impl Script {
    /// 从序列化形态构建剧本
    pub fn from_data(data: &ScriptData) -> Result<Self, LoadError> {
        let mut script = Script::new();

        // 第一遍：登记角色
        for role in &data.roles {
            script.insert_role(role.to_role())?;
        }

        // 第二遍：解析角色引用
        for role in &data.roles {
            let RoleData::Character {
                name,
                dialogue_box: Some(target),
                ..
            } = role
            else {
                continue;
            };
            let target_id = script
                .role_id(target)
                .filter(|&id| script.role(id).map(Role::role_type) == Some(RoleType::DialogueBox))
                .ok_or_else(|| LoadError::UnresolvedReference {
                    role: name.clone(),
                    target: target.clone(),
                })?;
            let id = script.role_id(name);
            if let Some(RoleKind::Character(config)) = id
                .and_then(|id| script.role_mut(id))
                .map(Role::kind_mut)
            {
                config.dialogue_box = Some(target_id);
            }
        }

        let mut steps = Vec::with_capacity(data.steps.len());
        for StepData(role, kind, args) in &data.steps {
            steps.push(script.make_step(role, kind, args.clone())?);
        }
        script.extend_steps(steps);
        script.rebuild()?;

        debug!(
            roles = script.roles().len(),
            steps = script.len(),
            beats = script.beats().len(),
            "剧本加载完成"
        );
        Ok(script)
    }

    /// 导出为序列化形态
    pub fn to_data(&self) -> ScriptData {
        ScriptData {
            roles: self
                .roles()
                .iter()
                .map(|role| RoleData::from_role(self, role))
                .collect(),
            steps: self
                .steps()
                .iter()
                .map(|step| {
                    StepData(
                        step.role_name().to_string(),
                        step.kind_name().to_string(),
                        step.args().to_vec(),
                    )
                })
                .collect(),
        }
    }

    /// 从 JSON 文本加载
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let data: ScriptData = serde_json::from_str(json)?;
        Self::from_data(&data)
    }

    /// 导出为 JSON 文本
    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(&self.to_data())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use crate::step_kind::PauseKind;

    const SAMPLE: &str = r##"{
        "roles": [
            { "type": "stage", "name": "stage" },
            { "type": "character", "name": "alice", "display_name": "Alice", "dialogue_box": "box" },
            { "type": "dialogue_box", "name": "box", "position": "top" },
            { "type": "jukebox", "name": "music", "tracks": { "theme": "audio/theme.ogg" } }
        ],
        "steps": [
            ["music", "play", ["theme"]],
            ["alice", "say", ["你好"]],
            ["stage", "wait", [0.5]],
            ["box", "say", ["风停了"]]
        ]
    }"##;

    #[test]
    fn test_load_resolves_forward_reference() {
        let script = Script::from_json(SAMPLE).unwrap();
        assert_eq!(script.roles().len(), 4);
        assert_eq!(script.len(), 4);

        let RoleKind::Character(config) = script.role_by_name("alice").unwrap().kind() else {
            panic!("expected character");
        };
        assert_eq!(config.dialogue_box, script.role_id("box"));
        assert_eq!(config.color, "#ffffff");

        let pauses: Vec<_> = script.beats().iter().map(|b| b.pause()).collect();
        assert_eq!(
            pauses,
            vec![PauseKind::Hold, PauseKind::AutoWait, PauseKind::Hold]
        );
    }

    #[test]
    fn test_data_round_trip_preserves_script() {
        let script = Script::from_json(SAMPLE).unwrap();
        let data = script.to_data();
        let reloaded = Script::from_data(&data).unwrap();

        assert_eq!(reloaded.to_data(), data);
        assert_eq!(reloaded.beats(), script.beats());
        assert_eq!(reloaded.steps(), script.steps());
    }

    #[test]
    fn test_step_data_is_a_tuple() {
        let step = StepData("stage".into(), "wait".into(), vec![ArgValue::from(2.0)]);
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"["stage","wait",[2.0]]"#);
    }

    #[test]
    fn test_unresolved_reference() {
        let json = r#"{
            "roles": [
                { "type": "mural", "name": "mural" },
                { "type": "character", "name": "bob", "display_name": "Bob", "dialogue_box": "mural" }
            ]
        }"#;
        let Err(LoadError::UnresolvedReference { role, target }) = Script::from_json(json) else {
            panic!("expected unresolved reference");
        };
        assert_eq!(role, "bob");
        assert_eq!(target, "mural");
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(Script::from_json("{"), Err(LoadError::Json(_))));

        let duplicate = r#"{ "roles": [
            { "type": "stage", "name": "a" },
            { "type": "mural", "name": "a" }
        ] }"#;
        assert!(matches!(
            Script::from_json(duplicate),
            Err(LoadError::Script(ScriptError::DuplicateRole { .. }))
        ));

        let unknown_kind = r#"{
            "roles": [{ "type": "mural", "name": "m" }],
            "steps": [["m", "pause", []]]
        }"#;
        assert!(matches!(
            Script::from_json(unknown_kind),
            Err(LoadError::Script(ScriptError::UnknownStepKind { .. }))
        ));

        let speechless = r#"{
            "roles": [{ "type": "character", "name": "c", "display_name": "C" }],
            "steps": [["c", "say", ["……"]]]
        }"#;
        assert!(matches!(
            Script::from_json(speechless),
            Err(LoadError::Script(ScriptError::Compilation { step_index: 0, .. }))
        ));
    }
}
