//! # Pending 模块
//!
//! 异步过渡的完成句柄。
//!
//! Actor 在 `apply_state` 中开始一段过渡时调用 [`pending_transition`]，
//! 把 [`PendingTransition`] 交给 Director，自己保留 [`TransitionSignal`]，
//! 过渡结束时调用 `complete()`。信号被丢弃同样视为完成，
//! 因此 Actor 被替换或过渡被打断时不会让 Director 永远处于忙碌状态。

use std::cell::Cell;
use std::rc::Rc;

/// Director 持有的一半：查询过渡是否结束
#[derive(Debug, Clone)]
pub struct PendingTransition {
    settled: Rc<Cell<bool>>,
}

impl PendingTransition {
    /// 已经结束的过渡
    pub fn settled() -> Self {
        Self {
            settled: Rc::new(Cell::new(true)),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled.get()
    }
}

/// Actor 持有的一半：通知过渡结束
#[derive(Debug)]
pub struct TransitionSignal {
    settled: Rc<Cell<bool>>,
}

impl TransitionSignal {
    /// 标记过渡结束
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for TransitionSignal {
    fn drop(&mut self) {
        self.settled.set(true);
    }
}

/// 创建一对过渡句柄
pub fn pending_transition() -> (PendingTransition, TransitionSignal) {
    let settled = Rc::new(Cell::new(false));
    (
        PendingTransition {
            settled: Rc::clone(&settled),
        },
        TransitionSignal { settled },
    )
}
