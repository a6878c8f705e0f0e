//! # Script 模块
//!
//! 持有角色集合、步骤列表和编译后的 Beat 序列。
//!
//! ## 设计说明
//!
//! - Beat 序列始终是 (角色集合, 步骤列表) 的纯函数
//! - 每个修改入口（`insert_step`、`delete_step`、`update_steps`、`add_role`）
//!   在返回前完成一次编译；编译失败时整个脚本回滚到修改前的状态
//! - 书签总是完整重算
//!
//! ## 模块结构
//!
//! - [`compiler`]：步骤 -> Beat 的增量编译

pub mod compiler;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::beat::Beat;
use crate::diagnostic::{DiagnosticResult, analyze_script};
use crate::error::ScriptError;
use crate::role::{Role, RoleId, RoleKind, RoleType};
use crate::step::Step;
use crate::value::ArgValue;

/// 书签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// 书签所在 Beat
    pub beat_index: usize,
    /// 书签名
    pub label: String,
}

/// 剧本
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// 角色列表（RoleId 即位置）
    roles: Vec<Role>,
    /// 角色名 -> RoleId
    role_index: HashMap<String, RoleId>,
    /// 步骤列表
    steps: Vec<Step>,
    /// 编译结果
    beats: Vec<Beat>,
    /// 书签列表
    bookmarks: Vec<Bookmark>,
}

impl Script {
    /// 创建空剧本
    pub fn new() -> Self {
        Self::default()
    }

    //=========================================================================
    // 角色
    //=========================================================================

    /// 添加角色
    ///
    /// 添加后从头重新编译，新角色的历史状态通过完整重放得到。
    pub fn add_role(&mut self, role: Role) -> Result<RoleId, ScriptError> {
        if let RoleKind::Character(config) = role.kind()
            && let Some(target) = config.dialogue_box
            && self.role(target).map(Role::role_type) != Some(RoleType::DialogueBox)
        {
            return Err(ScriptError::InvalidRoleReference {
                role: role.name().to_string(),
                target: target.index(),
            });
        }
        self.commit(0, |script| script.insert_role(role))?
    }

    /// 登记角色，不编译
    pub(crate) fn insert_role(&mut self, role: Role) -> Result<RoleId, ScriptError> {
        if self.role_index.contains_key(role.name()) {
            return Err(ScriptError::DuplicateRole {
                name: role.name().to_string(),
            });
        }
        let id = RoleId::new(self.roles.len());
        self.role_index.insert(role.name().to_string(), id);
        self.roles.push(role);
        Ok(id)
    }

    pub(crate) fn role_mut(&mut self, id: RoleId) -> Option<&mut Role> {
        self.roles.get_mut(id.index())
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(id.index())
    }

    pub fn role_id(&self, name: &str) -> Option<RoleId> {
        self.role_index.get(name).copied()
    }

    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.role_id(name).and_then(|id| self.role(id))
    }

    //=========================================================================
    // 步骤
    //=========================================================================

    /// 按角色名创建步骤（不插入）
    pub fn make_step(
        &self,
        role_name: &str,
        kind: &str,
        args: Vec<ArgValue>,
    ) -> Result<Step, ScriptError> {
        let role = self
            .role_by_name(role_name)
            .ok_or_else(|| ScriptError::UnknownRole {
                name: role_name.to_string(),
            })?;
        Step::new(role, kind, args)
    }

    /// 在 `index` 处插入步骤并重新编译
    pub fn insert_step(&mut self, index: usize, step: Step) -> Result<(), ScriptError> {
        if index > self.steps.len() {
            return Err(ScriptError::InvalidIndex {
                index,
                len: self.steps.len(),
            });
        }
        self.ensure_role(&step)?;
        self.commit(index, |script| script.steps.insert(index, step))
    }

    /// 在末尾追加步骤
    pub fn push_step(&mut self, step: Step) -> Result<(), ScriptError> {
        self.insert_step(self.steps.len(), step)
    }

    /// 删除步骤并返回它
    pub fn delete_step(&mut self, step: &Step) -> Result<Step, ScriptError> {
        let index = self.locate(step)?;
        self.commit(index, |script| {
            let mut removed = script.steps.remove(index);
            removed.detach();
            removed
        })
    }

    /// 用 `replacement` 替换 `target`
    pub fn update_step(&mut self, target: &Step, replacement: Step) -> Result<(), ScriptError> {
        self.update_steps(vec![(target.clone(), replacement)])
    }

    /// 批量替换步骤，只编译一次
    ///
    /// 每一项为 (脚本中现有的步骤, 替换后的步骤)。
    pub fn update_steps(&mut self, updates: Vec<(Step, Step)>) -> Result<(), ScriptError> {
        let mut located = Vec::with_capacity(updates.len());
        for (target, replacement) in updates {
            let index = self.locate(&target)?;
            self.ensure_role(&replacement)?;
            located.push((index, replacement));
        }
        let Some(from_step) = located.iter().map(|(index, _)| *index).min() else {
            return Ok(());
        };
        self.commit(from_step, |script| {
            for (index, replacement) in located {
                script.steps[index] = replacement;
            }
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// 步骤数量
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 是否没有步骤
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    //=========================================================================
    // 编译结果
    //=========================================================================

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn beat(&self, index: usize) -> Option<&Beat> {
        self.beats.get(index)
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// 按名称查找书签（同名时取第一个）
    pub fn find_bookmark(&self, label: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.label == label)
    }

    /// 步骤所属的 Beat
    pub fn beat_of_step(&self, step_index: usize) -> Option<usize> {
        self.steps.get(step_index).and_then(Step::beat_index)
    }

    /// 静态检查（建议性）
    pub fn check(&self) -> DiagnosticResult {
        analyze_script(self)
    }

    //=========================================================================
    // 内部
    //=========================================================================

    /// 追加步骤但不编译，调用方负责随后 `rebuild`
    pub(crate) fn extend_steps(&mut self, steps: impl IntoIterator<Item = Step>) {
        self.steps.extend(steps);
    }

    /// 确认步骤属于当前步骤列表，返回其位置
    fn locate(&self, step: &Step) -> Result<usize, ScriptError> {
        let owned = step
            .index()
            .filter(|&index| self.steps.get(index) == Some(step));
        owned.ok_or(ScriptError::OwnershipViolation {
            index: step.index(),
        })
    }

    /// 确认步骤的目标角色在本剧本中
    fn ensure_role(&self, step: &Step) -> Result<(), ScriptError> {
        match self.role_by_name(step.role_name()) {
            Some(role) if role.role_type() == step.role_type() => Ok(()),
            _ => Err(ScriptError::UnknownRole {
                name: step.role_name().to_string(),
            }),
        }
    }

    /// 执行修改并从 `from_step` 重新编译，失败时回滚
    fn commit<T>(
        &mut self,
        from_step: usize,
        edit: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, ScriptError> {
        let snapshot = self.clone();
        let value = edit(self);
        match self.refresh_beats(from_step) {
            Ok(()) => Ok(value),
            Err(err) => {
                warn!(error = %err, "编译失败，脚本已回滚");
                *self = snapshot;
                Err(err)
            }
        }
    }
}
