//! # Compiler 模块
//!
//! 把步骤列表编译为 Beat 序列。
//!
//! ## 增量编译
//!
//! ```text
//! from_step = k
//!   ├─ k <= 1 或没有旧结果     -> 从 Beat 0 完整重建
//!   └─ 否则                    -> 从第 k-1 个步骤所在的 Beat 重建
//!
//! 截断 Beat 序列到恢复点 -> 以前一个 Beat 的 create_next 作为种子
//! -> 恢复点之前的步骤只做书签记录，之后的步骤逐个 apply
//! ```
//!
//! 任意合法恢复点的结果，从恢复点起与完整重建完全一致。

use tracing::debug;

use super::{Bookmark, Script};
use crate::beat::Beat;
use crate::error::ScriptError;
use crate::step_kind::StepContext;

impl Script {
    /// 从第 `from_step` 个步骤开始重新编译 Beat
    ///
    /// 调用方需保证 `from_step` 之前的步骤自上次编译以来没有变化。
    /// apply 函数失败时返回 [`ScriptError::Compilation`]，此时 Beat 序列处于不可用状态；
    /// 修改入口会在这种情况下回滚整个脚本。
    pub fn refresh_beats(&mut self, from_step: usize) -> Result<(), ScriptError> {
        let Self {
            roles,
            role_index,
            steps,
            beats,
            bookmarks,
        } = self;

        bookmarks.clear();

        if steps.is_empty() {
            beats.clear();
            debug!("步骤列表为空，清空 Beat");
            return Ok(());
        }

        let first_beat_index = if from_step <= 1 || beats.is_empty() {
            0
        } else {
            steps
                .get(from_step.min(steps.len()) - 1)
                .and_then(|step| step.beat_index())
                .filter(|&index| index < beats.len())
                .unwrap_or(0)
        };

        beats.truncate(first_beat_index);
        let (mut beat, resume_step) = match beats.last() {
            Some(prev) => (prev.create_next(roles), prev.last_step_index + 1),
            None => (Beat::initial(roles), 0),
        };
        debug!(from_step, first_beat_index, resume_step, "开始编译 Beat");

        let last_step = steps.len() - 1;
        let mut beat_index = first_beat_index;
        let mut trailing = true;

        for (index, step) in steps.iter_mut().enumerate() {
            step.set_index(index);

            if index < resume_step {
                // 前缀中的步骤已经体现在保留的 Beat 中
                if let (Some(label), Some(step_beat)) = (step.bookmark_label(), step.beat_index()) {
                    bookmarks.push(Bookmark {
                        beat_index: step_beat,
                        label: label.to_string(),
                    });
                }
                continue;
            }

            step.set_beat_index(beat_index);

            let Some(role_id) = role_index.get(step.role_name()).copied() else {
                return Err(ScriptError::UnknownRole {
                    name: step.role_name().to_string(),
                });
            };
            let role = &roles[role_id.index()];

            let mut ctx = StepContext::new(role, role_id, &mut beat);
            (step.kind().apply)(&mut ctx, step.args()).map_err(|source| {
                ScriptError::Compilation {
                    step_index: index,
                    source,
                }
            })?;

            if let Some(label) = step.bookmark_label() {
                bookmarks.push(Bookmark {
                    beat_index,
                    label: label.to_string(),
                });
            }

            beat.last_step_index = index;

            let pause = step.pause();
            if pause.is_pause() {
                beat.pause = pause;
                if index == last_step {
                    trailing = false;
                    break;
                }
                let next = beat.create_next(roles);
                beats.push(std::mem::replace(&mut beat, next));
                beat_index += 1;
            }
        }

        beats.push(beat);
        debug!(
            beats = beats.len(),
            bookmarks = bookmarks.len(),
            trailing,
            "Beat 编译完成"
        );
        Ok(())
    }

    /// 从头完整重建
    pub fn rebuild(&mut self) -> Result<(), ScriptError> {
        self.refresh_beats(0)
    }
}
