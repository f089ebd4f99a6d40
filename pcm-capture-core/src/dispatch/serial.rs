use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread;

use parking_lot::Mutex;

use crate::traits::executor::{Executor, Task};

/// Executor backed by a dedicated thread that runs tasks in post order.
///
/// A panicking task is logged and does not take the thread down. Dropping
/// the executor drains the queue and joins the thread.
pub struct SerialExecutor {
    sender: Mutex<Option<Sender<Task>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SerialExecutor {
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Task>();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            for task in rx {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    log::error!("dispatched task panicked");
                }
            }
        })?;

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            handle: Some(handle),
        })
    }
}

impl Executor for SerialExecutor {
    fn post(&self, task: Task) {
        let guard = self.sender.lock();
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(task).is_err() {
                    log::warn!("dispatch thread is gone, task dropped");
                }
            }
            None => log::warn!("executor shut down, task dropped"),
        }
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        self.sender.lock().take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
