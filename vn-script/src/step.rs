//! # Step 模块
//!
//! 一条创作命令：目标角色、步骤类型和具体参数。
//!
//! 构造时校验步骤类型必须在角色类型上注册，因此不存在引用无效类型的步骤。
//! `index` 与 `beat_index` 只由编译器写入。

use crate::error::ScriptError;
use crate::role::{Role, RoleType, stage};
use crate::step_kind::{PauseKind, StepKind};
use crate::value::{ArgValue, text_arg};

/// 创作步骤
#[derive(Debug, Clone)]
pub struct Step {
    /// 目标角色名
    role: String,
    /// 目标角色类型
    role_type: RoleType,
    /// 步骤类型
    kind: &'static StepKind,
    /// 参数（按声明顺序）
    args: Vec<ArgValue>,
    /// 在步骤列表中的位置（编译器写入）
    index: Option<usize>,
    /// 所属 Beat（编译器写入）
    beat_index: Option<usize>,
}

impl Step {
    /// 创建步骤
    ///
    /// 步骤类型未在角色类型上注册时返回 [`ScriptError::UnknownStepKind`]。
    pub fn new(role: &Role, kind: &str, args: Vec<ArgValue>) -> Result<Self, ScriptError> {
        let kind = role.step_kind(kind)?;
        Ok(Self {
            role: role.name().to_string(),
            role_type: role.role_type(),
            kind,
            args,
            index: None,
            beat_index: None,
        })
    }

    pub fn role_name(&self) -> &str {
        &self.role
    }

    pub fn role_type(&self) -> RoleType {
        self.role_type
    }

    pub fn kind(&self) -> &'static StepKind {
        self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name
    }

    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    pub fn pause(&self) -> PauseKind {
        self.kind.pause
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn beat_index(&self) -> Option<usize> {
        self.beat_index
    }

    /// 书签名（仅 stage 的 bookmark 步骤）
    pub fn bookmark_label(&self) -> Option<&str> {
        (self.role_type == RoleType::Stage && self.kind.name == stage::BOOKMARK)
            .then(|| text_arg(&self.args, 0))
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub(crate) fn set_beat_index(&mut self, beat_index: usize) {
        self.beat_index = Some(beat_index);
    }

    pub(crate) fn detach(&mut self) {
        self.index = None;
        self.beat_index = None;
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.role_type == other.role_type
            && std::ptr::eq(self.kind, other.kind)
            && self.args == other.args
            && self.index == other.index
            && self.beat_index == other.beat_index
    }
}
