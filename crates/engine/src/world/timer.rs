use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerTask {
    /// One refresh interval after construction; builds the grid.
    WarmUp,
    Update,
}

/// Single-shot timer holding at most one pending task.
#[derive(Debug, Default)]
pub(crate) struct Timer {
    pending: Option<(Instant, TimerTask)>,
}

impl Timer {
    /// Replaces any pending task.
    pub(crate) fn schedule(&mut self, now: Instant, delay: Duration, task: TimerTask) {
        let deadline = now.checked_add(delay).unwrap_or(now);
        self.pending = Some((deadline, task));
    }

    pub(crate) fn cancel(&mut self) {
        self.pending = None;
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(deadline, _)| deadline)
    }

    /// Removes and returns the pending task once its deadline has passed.
    pub(crate) fn take_due(&mut self, now: Instant) -> Option<TimerTask> {
        match self.pending {
            Some((deadline, task)) if now >= deadline => {
                self.pending = None;
                Some(task)
            }
            _ => None,
        }
    }
}
