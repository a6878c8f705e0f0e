//! # VN Script
//!
//! 视觉小说的剧本编译与播放核心库。
//!
//! ## 架构概述
//!
//! `vn-script` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 编辑层修改步骤列表，编译器把步骤重放为 Beat 序列，
//! Director 沿 Beat 序列播放并把角色状态交给演出层的 Actor：
//!
//! ```text
//! 编辑层 ──► Script(steps) ──► compiler ──► Beats ──► Director ──► Actor
//!                                                        ▲            │
//!                                                        └─ 过渡结束 ─┘
//! ```
//!
//! ## 核心类型
//!
//! - [`Role`]：剧目参与者（舞台、幕布、对话框、角色……）
//! - [`StepKind`]：某种角色上可用的一种动作
//! - [`Step`]：一条创作命令
//! - [`Beat`]：某一时刻所有角色的状态快照
//! - [`Script`]：角色 + 步骤 + 编译结果
//! - [`Director`]：播放控制器
//!
//! ## 使用示例
//!
//! ```ignore
//! use vn_script::{Director, Script};
//!
//! let script = Script::from_json(&text)?;
//! let mut director = Director::new();
//! for role in script.roles() {
//!     director.attach(script.role_id(role.name()).unwrap(), make_actor(role));
//! }
//!
//! director.advance(&script)?;
//! loop {
//!     director.update(&script, dt)?;
//!     for event in director.take_events() {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`role`]：角色类型、配置和状态
//! - [`step_kind`]：步骤类型描述
//! - [`step`]：创作步骤
//! - [`beat`]：Beat 快照
//! - [`script`]：剧本与增量编译
//! - [`director`]：播放状态机
//! - [`data`]：序列化形态
//! - [`diagnostic`]：静态检查
//! - [`error`]：错误类型定义

pub mod beat;
pub mod data;
pub mod diagnostic;
pub mod director;
pub mod error;
pub mod role;
pub mod script;
pub mod step;
pub mod step_kind;
pub mod value;

// 重导出核心类型
pub use beat::Beat;
pub use data::{RoleData, ScriptData, StepData};
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, ResourceReference, ResourceType, analyze_script,
    extract_resource_references, get_bookmark_labels,
};
pub use director::{
    Actor, Director, DirectorEvent, DirectorState, PendingTransition, TransitionSignal,
    pending_transition,
};
pub use error::{DirectorError, LoadError, ScriptError, StepError, VnError, VnResult};
pub use role::{Role, RoleId, RoleKind, RoleState, RoleType};
pub use script::{Bookmark, Script};
pub use step::Step;
pub use step_kind::{ArgSpec, PauseKind, StepKind};
pub use value::{ArgType, ArgValue, Position};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let mut script = Script::new();
        let stage = script.add_role(Role::stage("stage")).unwrap();
        let step = script.make_step("stage", "pause", vec![]).unwrap();
        script.push_step(step).unwrap();

        let _director = Director::new();
        let _state: &RoleState = script.beats()[0].state(stage).unwrap();
        assert_eq!(script.beats()[0].pause(), PauseKind::Hold);
    }
}
