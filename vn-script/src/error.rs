//! # Error 模块
//!
//! 定义 vn-script 中使用的错误类型。
//!
//! - 结构性错误（未知步骤类型、步骤归属错误）立即返回，调用方不得继续
//! - 校验问题是建议性的，见 [`crate::diagnostic`]，不会出现在这里

use thiserror::Error;

use crate::role::RoleType;

/// 步骤 apply 函数执行失败
///
/// 在编译过程中产生，由 [`ScriptError::Compilation`] 包装后向上传播。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// 当前 Beat 中缺少角色状态
    #[error("Beat 中缺少角色 #{role_id} 的状态")]
    MissingState { role_id: usize },

    /// 角色状态与期望的角色类型不符
    #[error("角色 '{role}' 的状态类型不符：期望 {expected}")]
    StateMismatch { role: String, expected: RoleType },

    /// 角色没有关联对话框
    #[error("角色 '{character}' 没有关联对话框")]
    MissingDialogueBox { character: String },
}

/// 脚本错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// 步骤类型未在角色类型上注册
    #[error("角色类型 {role_type} 没有名为 '{kind}' 的步骤")]
    UnknownStepKind { role_type: RoleType, kind: String },

    /// 步骤不属于当前脚本的步骤列表
    #[error("步骤 {index:?} 不属于当前脚本")]
    OwnershipViolation { index: Option<usize> },

    /// 角色不存在
    #[error("角色 '{name}' 不存在")]
    UnknownRole { name: String },

    /// 角色重名
    #[error("角色 '{name}' 已存在")]
    DuplicateRole { name: String },

    /// 角色引用了不合法的目标角色
    #[error("角色 '{role}' 引用了无效的角色 #{target}")]
    InvalidRoleReference { role: String, target: usize },

    /// 插入位置越界
    #[error("无效的步骤位置 {index}，有效范围是 0..={len}")]
    InvalidIndex { index: usize, len: usize },

    /// 编译失败（apply 函数报错）
    #[error("编译第 {step_index} 个步骤失败: {source}")]
    Compilation {
        step_index: usize,
        #[source]
        source: StepError,
    },
}

/// 播放控制错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectorError {
    /// Beat 索引越界
    #[error("Beat 索引 {index} 越界，共 {len} 个 Beat")]
    BeatOutOfRange { index: usize, len: usize },

    /// 角色没有绑定 Actor
    #[error("角色 '{role}' 没有绑定 Actor")]
    MissingActor { role: String },

    /// 书签不存在
    #[error("书签 '{label}' 不存在")]
    UnknownBookmark { label: String },
}

/// 脚本加载错误
#[derive(Error, Debug)]
pub enum LoadError {
    /// JSON 解析失败
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 角色引用无法解析
    #[error("角色 '{role}' 引用的对话框 '{target}' 不存在")]
    UnresolvedReference { role: String, target: String },

    /// 构建脚本失败
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// vn-script 统一错误类型
#[derive(Error, Debug)]
pub enum VnError {
    /// 脚本错误
    #[error("脚本错误: {0}")]
    Script(#[from] ScriptError),

    /// 播放错误
    #[error("播放错误: {0}")]
    Director(#[from] DirectorError),

    /// 加载错误
    #[error("加载错误: {0}")]
    Load(#[from] LoadError),
}

/// Result 类型别名
pub type VnResult<T> = Result<T, VnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compilation_error_keeps_source() {
        let err = ScriptError::Compilation {
            step_index: 3,
            source: StepError::MissingDialogueBox {
                character: "alice".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("3"));
        assert!(message.contains("alice"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_vn_error_from() {
        let err: VnError = DirectorError::UnknownBookmark {
            label: "ch1".to_string(),
        }
        .into();
        assert!(matches!(err, VnError::Director(_)));
    }
}
