//! # Actor 模块
//!
//! 演出层接口。每个角色对应一个 Actor，负责把角色状态呈现出来。
//! Director 只调用这些方法，从不检查 Actor 的内部状态。

use super::pending::PendingTransition;
use crate::role::RoleState;

/// 演出层对象
pub trait Actor {
    /// 呈现角色状态
    ///
    /// 开始了一段需要等待的过渡时返回 [`PendingTransition`]。
    fn apply_state(&mut self, state: &RoleState) -> Option<PendingTransition>;

    /// 是否允许前进（例如文字仍在逐字显示时返回 `false`，并借此跳过打字效果）
    fn advance(&mut self) -> bool {
        true
    }

    /// 每帧时间推进（秒）
    fn update(&mut self, _dt: f32) {}

    /// 暂停计时器、音频等
    fn pause(&mut self) {}

    /// 恢复
    fn unpause(&mut self) {}
}
