//! UI-thread dispatcher for one-shot background work
//!
//! Each user action is split in two phases: an `execute` future that runs on
//! the tokio runtime with no access to UI objects, and a `finalize` callback
//! that runs on the thread owning the [`UiDispatcher`] once the host pumps it.
//! Callbacks are kept on the UI side, so they may capture non-`Send` handles
//! such as the editor host.
//!
//! Every submitted task is finalized exactly once. A task that panics still
//! reaches its callback, as `Err(TaskFailed)`.
//!
//! Independently submitted tasks complete in no particular order, and nothing
//! de-duplicates or cancels tasks already in flight.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::TaskFailed;

type TaskOutput = Box<dyn Any + Send>;
type Finalizer = Box<dyn FnOnce(Result<TaskOutput, TaskFailed>, &mut UiDispatcher)>;

/// Work that runs off the UI thread and produces a typed result.
pub trait BackgroundTask: Send + 'static {
    type Output: Send + 'static;

    /// Label used in logs.
    const NAME: &'static str;

    fn execute(self) -> impl Future<Output = Self::Output> + Send;
}

struct Completion {
    task_id: Uuid,
    result: Result<TaskOutput, TaskFailed>,
}

struct PendingTask {
    name: &'static str,
    finalize: Finalizer,
}

/// Owns the finalize callbacks of in-flight tasks. Must stay on the UI thread.
pub struct UiDispatcher {
    runtime: Handle,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
    pending: HashMap<Uuid, PendingTask>,
}

impl UiDispatcher {
    /// Create a dispatcher that runs background work on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            runtime,
            sender,
            receiver,
            pending: HashMap::new(),
        }
    }

    /// Submit a [`BackgroundTask`]; `finalize` receives its output on the UI thread.
    pub fn submit<T, F>(&mut self, task: T, finalize: F) -> Uuid
    where
        T: BackgroundTask,
        F: FnOnce(Result<T::Output, TaskFailed>, &mut UiDispatcher) + 'static,
    {
        self.run_background(T::NAME, task.execute(), finalize)
    }

    /// Run `work` in the background and queue `on_done` for the UI thread.
    ///
    /// A panic inside `work` is caught here and handed to `on_done` as
    /// `Err(TaskFailed)`.
    pub fn run_background<T, Fut, F>(&mut self, name: &'static str, work: Fut, on_done: F) -> Uuid
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        F: FnOnce(Result<T, TaskFailed>, &mut UiDispatcher) + 'static,
    {
        let task_id = Uuid::new_v4();

        let finalize: Finalizer = Box::new(move |result: Result<TaskOutput, TaskFailed>, dispatcher: &mut UiDispatcher| {
            let result = result.and_then(|output| {
                output
                    .downcast::<T>()
                    .map(|output| *output)
                    .map_err(|_| TaskFailed::new(name, "unexpected output type"))
            });
            on_done(result, dispatcher)
        });
        self.pending.insert(task_id, PendingTask { name, finalize });

        let sender = self.sender.clone();
        let work = self.runtime.spawn(work.map(|output| Box::new(output) as TaskOutput));
        self.runtime.spawn(async move {
            let result = work.await.map_err(|e| TaskFailed::new(name, e.to_string()));
            // The receiver only goes away with the dispatcher itself.
            let _ = sender.send(Completion { task_id, result });
        });

        debug!(task = name, task_id = %task_id, "Background task submitted");
        task_id
    }

    /// Number of tasks whose finalize step has not run yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Run the finalize step of every task that has already completed.
    /// Never blocks. Returns how many callbacks ran.
    pub fn pump(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            self.finish(completion);
            ran += 1;
        }
        ran
    }

    /// Block the calling (UI) thread until every pending task, including
    /// tasks submitted by finalize callbacks, has been finalized.
    ///
    /// Must not be called from inside the tokio runtime.
    pub fn run_until_idle(&mut self) {
        while !self.pending.is_empty() {
            match self.receiver.blocking_recv() {
                Some(completion) => self.finish(completion),
                None => break,
            }
        }
    }

    fn finish(&mut self, completion: Completion) {
        let Some(task) = self.pending.remove(&completion.task_id) else {
            debug!(task_id = %completion.task_id, "Completion for unknown task");
            return;
        };

        match &completion.result {
            Ok(_) => debug!(task = task.name, task_id = %completion.task_id, "Finalizing background task"),
            Err(e) => error!(task = task.name, task_id = %completion.task_id, error = %e, "Background task failed"),
        }
        (task.finalize)(completion.result, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Double(u32);

    impl BackgroundTask for Double {
        type Output = u32;
        const NAME: &'static str = "double";

        fn execute(self) -> impl Future<Output = u32> + Send {
            async move { self.0 * 2 }
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_finalize_runs_on_calling_thread() {
        let rt = runtime();
        let mut dispatcher = UiDispatcher::new(rt.handle().clone());
        let ui_thread = std::thread::current().id();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        dispatcher.submit(Double(21), move |value, _| {
            assert_eq!(std::thread::current().id(), ui_thread);
            sink.borrow_mut().push(value.unwrap());
        });
        assert_eq!(dispatcher.pending(), 1);

        dispatcher.run_until_idle();
        assert_eq!(*seen.borrow(), vec![42]);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_finalize_can_chain_tasks() {
        let rt = runtime();
        let mut dispatcher = UiDispatcher::new(rt.handle().clone());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        dispatcher.submit(Double(1), move |first, dispatcher| {
            let first = first.unwrap();
            sink.borrow_mut().push(first);
            let sink = sink.clone();
            dispatcher.submit(Double(first), move |second, _| sink.borrow_mut().push(second.unwrap()));
        });

        dispatcher.run_until_idle();
        assert_eq!(*seen.borrow(), vec![2, 4]);
    }

    #[test]
    fn test_panicking_task_still_finalizes() {
        let rt = runtime();
        let mut dispatcher = UiDispatcher::new(rt.handle().clone());
        let outcome = Rc::new(RefCell::new(None));

        let sink = outcome.clone();
        dispatcher.run_background(
            "explodes",
            async {
                if true {
                    panic!("boom");
                }
                1u8
            },
            move |result, _| *sink.borrow_mut() = Some(result),
        );

        dispatcher.run_until_idle();
        let failure = outcome.borrow_mut().take().unwrap().unwrap_err();
        assert_eq!(failure.task, "explodes");
        assert!(failure.reason.contains("panic"));
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_pump_does_not_block() {
        let rt = runtime();
        let _guard = rt.enter();
        let mut dispatcher = UiDispatcher::new(rt.handle().clone());
        dispatcher.run_background("slow", tokio::time::sleep(std::time::Duration::from_secs(5)), |_, _| {});
        assert_eq!(dispatcher.pump(), 0);
        assert_eq!(dispatcher.pending(), 1);
    }
}
