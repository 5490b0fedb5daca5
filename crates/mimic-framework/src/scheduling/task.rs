//! Tasks and their cancellation state.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::scheduling::Schedule;

/// Whether a task must run on the host's main thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Runs on the host's main thread.
    Sync,
    /// Runs wherever the backend likes.
    #[default]
    Async,
}

/// A backend-side handle to a scheduled job.
pub trait ScheduledHandle: Send + Sync {
    /// Stops future executions of the job.
    fn cancel(&self);

    fn is_cancelled(&self) -> bool;
}

type Work = Box<dyn Fn() + Send + Sync>;
type Condition = Box<dyn Fn() -> bool + Send + Sync>;

/// A unit of work with a schedule and self-cancellation rules.
///
/// Once cancelled, a task never runs its work item again.
pub struct Task {
    kind: TaskKind,
    delay: Schedule,
    repeat: Schedule,
    work: Work,
    cancel_after: Option<u32>,
    cancel_when: Option<Condition>,
    executions: AtomicU32,
    cancelled: AtomicBool,
    scheduled: AtomicBool,
    handle: Mutex<Option<Arc<dyn ScheduledHandle>>>,
}

impl Task {
    /// Starts building a task around `work`.
    pub fn builder<F>(work: F) -> TaskBuilder
    where
        F: Fn() + Send + Sync + 'static,
    {
        TaskBuilder {
            kind: TaskKind::default(),
            delay: Schedule::none(),
            repeat: Schedule::none(),
            work: Box::new(work),
            cancel_after: None,
            cancel_when: None,
        }
    }

    /// A one-shot task for the main thread.
    pub fn sync<F>(work: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::builder(work).sync().build()
    }

    /// A one-shot asynchronous task.
    pub fn asynchronous<F>(work: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::builder(work).asynchronous().build()
    }

    /// Runs the work item once, unless the task is cancelled, then applies the
    /// cancellation rules.
    pub fn run(&self) {
        if self.is_cancelled() {
            return;
        }

        let last = match self.cancel_after {
            Some(limit) => {
                let reserved =
                    self.executions
                        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                            (n < limit).then_some(n + 1)
                        });
                match reserved {
                    Ok(previous) => previous + 1 >= limit,
                    Err(_) => {
                        self.cancel();
                        return;
                    }
                }
            }
            None => {
                self.executions.fetch_add(1, Ordering::AcqRel);
                false
            }
        };

        (self.work)();

        if last || self.cancel_when.as_ref().is_some_and(|condition| condition()) {
            self.cancel();
        }
    }

    /// Cancels the task and the backend job it is attached to.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.handle.lock().take() {
            handle.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Number of times the work item has started.
    pub fn executions(&self) -> u32 {
        self.executions.load(Ordering::Acquire)
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_async(&self) -> bool {
        self.kind == TaskKind::Async
    }

    pub fn delay(&self) -> Schedule {
        self.delay
    }

    pub fn repeat(&self) -> Schedule {
        self.repeat
    }

    /// Returns `true` once the task has been handed to a backend.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Acquire)
    }

    /// Marks the task as scheduled. Returns `false` if it already was.
    pub(crate) fn claim(&self) -> bool {
        !self.scheduled.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn release(&self) {
        self.scheduled.store(false, Ordering::Release);
    }

    pub(crate) fn attach(&self, handle: Arc<dyn ScheduledHandle>) {
        let mut slot = self.handle.lock();
        if self.is_cancelled() {
            handle.cancel();
        } else {
            *slot = Some(handle);
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind)
            .field("delay", &self.delay)
            .field("repeat", &self.repeat)
            .field("cancel_after", &self.cancel_after)
            .field("executions", &self.executions())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Task`].
pub struct TaskBuilder {
    kind: TaskKind,
    delay: Schedule,
    repeat: Schedule,
    work: Work,
    cancel_after: Option<u32>,
    cancel_when: Option<Condition>,
}

impl TaskBuilder {
    pub fn sync(mut self) -> Self {
        self.kind = TaskKind::Sync;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.kind = TaskKind::Async;
        self
    }

    pub fn delay(mut self, delay: Schedule) -> Self {
        self.delay = delay;
        self
    }

    /// Repeat interval. [`Schedule::none`] makes the task one-shot.
    pub fn repeat(mut self, repeat: Schedule) -> Self {
        self.repeat = repeat;
        self
    }

    /// Cancels the task after its `executions`-th run.
    pub fn cancel_after(mut self, executions: u32) -> Self {
        self.cancel_after = Some(executions);
        self
    }

    /// Cancels the task after any run that leaves `condition` true.
    pub fn cancel_when<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.cancel_when = Some(Box::new(condition));
        self
    }

    pub fn build(self) -> Arc<Task> {
        Arc::new(Task {
            kind: self.kind,
            delay: self.delay,
            repeat: self.repeat,
            work: self.work,
            cancel_after: self.cancel_after,
            cancel_when: self.cancel_when,
            executions: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            scheduled: AtomicBool::new(false),
            handle: Mutex::new(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let work = {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        (count, work)
    }

    #[test]
    fn test_defaults() {
        let task = Task::builder(|| {}).build();
        assert_eq!(task.kind(), TaskKind::Async);
        assert!(task.delay().is_none());
        assert!(task.repeat().is_none());
        assert!(!task.is_cancelled());
    }

    #[test]
    fn test_cancel_after_one() {
        let (count, work) = counter();
        let task = Task::builder(work).sync().cancel_after(1).build();

        task.run();
        assert!(task.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        task.run();
        task.run();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(task.executions(), 1);
    }

    #[test]
    fn test_cancel_after_bound_holds_across_threads() {
        let (count, work) = counter();
        let task = Task::builder(work).cancel_after(5).build();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let task = Arc::clone(&task);
                scope.spawn(move || {
                    for _ in 0..10 {
                        task.run();
                    }
                });
            }
        });

        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(task.is_cancelled());
    }

    #[test]
    fn test_cancel_when_checked_after_run() {
        let (count, work) = counter();
        let observed = Arc::clone(&count);
        let task = Task::builder(work)
            .cancel_when(move || observed.load(Ordering::SeqCst) == 3)
            .build();

        for _ in 0..5 {
            task.run();
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(task.is_cancelled());
    }

    struct Flag(AtomicBool);

    impl ScheduledHandle for Flag {
        fn cancel(&self) {
            self.0.store(true, Ordering::SeqCst);
        }

        fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_cancel_propagates_to_handle() {
        let task = Task::builder(|| {}).build();
        let handle = Arc::new(Flag(AtomicBool::new(false)));
        task.attach(handle.clone());
        task.cancel();
        assert!(handle.is_cancelled());

        let late = Arc::new(Flag(AtomicBool::new(false)));
        task.attach(late.clone());
        assert!(late.is_cancelled());
    }
}
