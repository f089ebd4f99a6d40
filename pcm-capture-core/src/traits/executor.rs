/// A unit of work posted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-threaded, in-order task queue (the UI/notification context).
///
/// `post` must never block on the task's execution.
pub trait Executor: Send + Sync {
    fn post(&self, task: Task);
}
