use std::cell::RefCell;
use std::time::Duration;

use tracing::trace;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// One-shot timer source used for the readiness fallback.
pub trait Scheduler {
    /// Run `task` once, no earlier than `delay` from now.
    fn schedule(&self, delay: Duration, task: Task);
}

/// Virtual-time scheduler driven explicitly with [`ManualScheduler::advance`].
///
/// Timers fire in deadline order; timers with equal deadlines fire in the
/// order they were scheduled.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    timers: Vec<Timer>,
}

struct Timer {
    deadline: Duration,
    seq: u64,
    task: Task,
}

impl ManualScheduler {
    /// Create a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of timers that have not fired.
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Move virtual time forward by `by`, firing every timer that comes due.
    ///
    /// Timers scheduled by a firing task are honored within the same call if
    /// their deadline falls inside the window. Returns the number fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut fired = 0usize;

        while let Some(task) = self.pop_due(target) {
            task();
            fired += 1;
        }

        self.state.borrow_mut().now = target;
        fired
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        let index = state
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= target)
            .min_by_key(|(_, timer)| (timer.deadline, timer.seq))
            .map(|(index, _)| index)?;

        let timer = state.timers.swap_remove(index);
        state.now = timer.deadline;
        trace!(deadline = ?timer.deadline, seq = timer.seq, "firing timer");
        Some(timer.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.state.borrow_mut();
        let deadline = state.now.saturating_add(delay);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(Timer {
            deadline,
            seq,
            task,
        });
    }
}

/// Scheduler backed by the tokio timer.
///
/// Tasks are spawned with [`tokio::task::spawn_local`], so `schedule` must
/// be called from within a [`tokio::task::LocalSet`].
#[cfg(feature = "async")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[cfg(feature = "async")]
impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}
