//! # Beat 模块
//!
//! 某一时刻的快照：每个角色应当呈现的状态，加上暂停分类和产生它的步骤区间。
//!
//! ## 设计说明
//!
//! - 状态按 [`RoleId`] 顺序存放，键集合恒等于编译时脚本的角色集合
//! - 第一个 Beat 由各角色的初始状态构成，之后每个 Beat 由前一个经 `create_next` 得到
//! - 编译完成后 Beat 不再被修改，只会被重新编译替换

use serde::Serialize;
use std::ops::RangeInclusive;

use crate::role::{Role, RoleId, RoleState};
use crate::step_kind::PauseKind;

/// 播放快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Beat {
    /// 各角色状态（按 RoleId 排列）
    states: Vec<RoleState>,
    /// 暂停分类
    pub(crate) pause: PauseKind,
    /// 第一个步骤索引
    pub(crate) first_step_index: usize,
    /// 最后一个步骤索引（含）
    pub(crate) last_step_index: usize,
}

impl Beat {
    /// 由各角色的初始状态构成的第一个 Beat
    pub fn initial(roles: &[Role]) -> Self {
        Self {
            states: roles.iter().map(Role::generate_initial_state).collect(),
            pause: PauseKind::None,
            first_step_index: 0,
            last_step_index: 0,
        }
    }

    /// 生成下一个 Beat，各角色状态经 `propagate_state` 传递
    pub fn create_next(&self, roles: &[Role]) -> Self {
        let states = roles
            .iter()
            .enumerate()
            .map(|(index, role)| match self.states.get(index) {
                Some(prev) => role.propagate_state(prev),
                None => role.generate_initial_state(),
            })
            .collect();
        let first = self.last_step_index + 1;
        Self {
            states,
            pause: PauseKind::None,
            first_step_index: first,
            last_step_index: first,
        }
    }

    /// 角色状态
    pub fn state(&self, role_id: RoleId) -> Option<&RoleState> {
        self.states.get(role_id.index())
    }

    pub(crate) fn state_mut(&mut self, role_id: RoleId) -> Option<&mut RoleState> {
        self.states.get_mut(role_id.index())
    }

    /// 全部角色状态（按 RoleId 排列）
    pub fn states(&self) -> &[RoleState] {
        &self.states
    }

    /// 遍历 (RoleId, 状态)
    pub fn iter(&self) -> impl Iterator<Item = (RoleId, &RoleState)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (RoleId::new(index), state))
    }

    pub fn pause(&self) -> PauseKind {
        self.pause
    }

    pub fn first_step_index(&self) -> usize {
        self.first_step_index
    }

    pub fn last_step_index(&self) -> usize {
        self.last_step_index
    }

    /// 产生本 Beat 的步骤区间
    pub fn step_range(&self) -> RangeInclusive<usize> {
        self.first_step_index..=self.last_step_index
    }
}
