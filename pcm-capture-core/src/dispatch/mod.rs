//! Ready-made [`Executor`](crate::traits::executor::Executor) implementations.
//!
//! - [`SerialExecutor`] runs tasks on its own dispatch thread.
//! - [`QueueExecutor`] buffers tasks until the host pumps them from its own
//!   event loop with [`QueueExecutor::run_pending`].

pub mod queue;
pub mod serial;

pub use queue::QueueExecutor;
pub use serial::SerialExecutor;
