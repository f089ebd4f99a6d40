use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::traits::executor::{Executor, Task};

/// Executor whose tasks run when the owner calls [`run_pending`](Self::run_pending).
///
/// Suits hosts with their own UI loop: post from anywhere, pump from the UI
/// thread.
#[derive(Default)]
pub struct QueueExecutor {
    tasks: Mutex<VecDeque<Task>>,
}

impl QueueExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run queued tasks in order, including ones posted while draining.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the lock before running so tasks can post.
            let Some(task) = self.tasks.lock().pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl Executor for QueueExecutor {
    fn post(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }
}
