//! # StepKind 模块
//!
//! 步骤类型的声明式描述：参数列表、暂停分类、校验函数与 apply 函数。
//!
//! ## 设计说明
//!
//! - 每种角色类型在各自的模块里定义一张静态的 `StepKind` 表
//! - apply 函数通过 [`StepContext`] 访问正在编译的 Beat，
//!   作用域仅限一次 apply 调用，角色之间不互相持有状态引用
//! - 校验是建议性的：apply 函数必须对未通过校验的参数保持合理行为

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::beat::Beat;
use crate::error::StepError;
use crate::role::{Role, RoleId, RoleState, RoleType};
use crate::value::{ArgType, ArgValue};

/// 暂停分类
///
/// ```text
/// None     -> 继续向同一个 Beat 编译
/// Hold     -> 结束当前 Beat，等待观众推进
/// AutoWait -> 结束当前 Beat，异步过渡完成后自动推进
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseKind {
    /// 不暂停
    #[default]
    None,
    /// 等待推进
    Hold,
    /// 过渡完成后自动推进
    AutoWait,
}

impl PauseKind {
    /// 是否结束当前 Beat
    pub fn is_pause(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// 参数描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// 参数名
    pub name: &'static str,
    /// 语义标签
    pub ty: ArgType,
}

impl ArgSpec {
    pub const fn new(name: &'static str, ty: ArgType) -> Self {
        Self { name, ty }
    }
}

/// 步骤类型专属的校验函数
pub type CheckFn = fn(&Role, &[ArgValue]) -> Vec<String>;

/// 步骤类型的 apply 函数
pub type ApplyFn = fn(&mut StepContext<'_>, &[ArgValue]) -> Result<(), StepError>;

/// 步骤类型
///
/// 由 (角色类型, 动作名) 唯一确定，运行期间不会创建或销毁。
pub struct StepKind {
    /// 动作名
    pub name: &'static str,
    /// 参数描述（按声明顺序）
    pub args: &'static [ArgSpec],
    /// 暂停分类
    pub pause: PauseKind,
    /// 是否是大型过渡（编辑层用于标记）
    pub major_transition: bool,
    /// 专属校验
    pub check: CheckFn,
    /// 状态变更
    pub apply: ApplyFn,
}

impl StepKind {
    /// 检查参数个数与值类型
    pub fn check_args(&self, args: &[ArgValue]) -> Vec<String> {
        let mut problems = Vec::new();
        if args.len() != self.args.len() {
            problems.push(format!(
                "'{}' 需要 {} 个参数，实际 {} 个",
                self.name,
                self.args.len(),
                args.len()
            ));
        }
        for (spec, value) in self.args.iter().zip(args) {
            if !spec.ty.accepts(value) {
                problems.push(format!(
                    "参数 '{}' 应为 {}，实际为 {}",
                    spec.name,
                    spec.ty,
                    value.type_name()
                ));
            }
        }
        problems
    }

    /// 完整校验：先检查参数形状，形状正确时再运行专属校验
    pub fn validate(&self, role: &Role, args: &[ArgValue]) -> Vec<String> {
        let problems = self.check_args(args);
        if !problems.is_empty() {
            return problems;
        }
        (self.check)(role, args)
    }
}

impl fmt::Debug for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepKind")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("pause", &self.pause)
            .field("major_transition", &self.major_transition)
            .finish_non_exhaustive()
    }
}

/// 无专属校验
pub(crate) fn no_check(_role: &Role, _args: &[ArgValue]) -> Vec<String> {
    Vec::new()
}

/// 角色状态的具体类型
///
/// 由各角色模块的状态结构实现，用于在 [`StepContext`] 中取得强类型状态。
pub trait StateVariant: Sized {
    /// 对应的角色类型
    const ROLE_TYPE: RoleType;

    /// 从通用状态中取出具体状态
    fn from_state_mut(state: &mut RoleState) -> Option<&mut Self>;
}

/// apply 函数的执行上下文
///
/// 持有正在编译的 Beat 的可变引用，仅在一次 apply 调用期间存在。
pub struct StepContext<'a> {
    /// 步骤所属角色
    pub role: &'a Role,
    /// 角色 ID
    pub role_id: RoleId,
    /// 正在编译的 Beat
    pub beat: &'a mut Beat,
}

impl<'a> StepContext<'a> {
    pub fn new(role: &'a Role, role_id: RoleId, beat: &'a mut Beat) -> Self {
        Self {
            role,
            role_id,
            beat,
        }
    }

    /// 当前角色的状态
    pub fn state<S: StateVariant>(&mut self) -> Result<&mut S, StepError> {
        let name = self.role.name().to_string();
        Self::downcast(self.beat, self.role_id, name)
    }

    /// 同一 Beat 中其他角色的状态
    pub fn state_of<S: StateVariant>(&mut self, role_id: RoleId) -> Result<&mut S, StepError> {
        let name = format!("#{}", role_id.index());
        Self::downcast(self.beat, role_id, name)
    }

    fn downcast<S: StateVariant>(
        beat: &mut Beat,
        role_id: RoleId,
        name: String,
    ) -> Result<&mut S, StepError> {
        let state = beat.state_mut(role_id).ok_or(StepError::MissingState {
            role_id: role_id.index(),
        })?;
        S::from_state_mut(state).ok_or(StepError::StateMismatch {
            role: name,
            expected: S::ROLE_TYPE,
        })
    }
}
