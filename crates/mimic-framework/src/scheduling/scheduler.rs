//! The seam between tasks and whatever actually runs them.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::scheduling::task::{ScheduledHandle, Task, TaskKind};
use crate::scheduling::Schedule;

/// A job handed to a backend.
pub type Job = Arc<dyn Fn() + Send + Sync>;

/// Executes jobs on a host's timers or event loop.
///
/// Backends receive the resolved delay and repeat and convert them to their
/// native unit with [`Schedule::to_ticks`] or [`Schedule::to_duration`]. A
/// `none` delay means "now", a `none` repeat means "once".
pub trait SchedulerBackend: Send + Sync {
    /// Schedules a job on the host's main thread.
    fn schedule_sync(
        &self,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>>;

    /// Schedules a job off the main thread.
    fn schedule_async(
        &self,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>>;
}

/// Submits [`Task`]s to a [`SchedulerBackend`].
#[derive(Clone)]
pub struct Scheduler {
    backend: Arc<dyn SchedulerBackend>,
}

impl Scheduler {
    pub fn new(backend: Arc<dyn SchedulerBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn SchedulerBackend> {
        &self.backend
    }

    /// Hands `task` to the backend and attaches the returned handle, so that
    /// cancelling the task also stops the backend job.
    ///
    /// A task is scheduled at most once; a second call fails with
    /// [`ScheduleError::AlreadyScheduled`].
    pub fn schedule(&self, task: &Arc<Task>) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
        if task.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }
        if !task.claim() {
            return Err(ScheduleError::AlreadyScheduled);
        }

        let runner = Arc::clone(task);
        let job: Job = Arc::new(move || runner.run());
        let (delay, repeat) = (task.delay(), task.repeat());

        let submitted = match task.kind() {
            TaskKind::Sync => self.backend.schedule_sync(job, delay, repeat),
            TaskKind::Async => self.backend.schedule_async(job, delay, repeat),
        };
        let handle = submitted.inspect_err(|_| task.release())?;
        task.attach(Arc::clone(&handle));

        debug!(kind = ?task.kind(), %delay, %repeat, "Scheduled task");
        Ok(handle)
    }

    /// Runs `work` once on the main thread after `delay`.
    pub fn run_later<F>(&self, work: F, delay: Schedule) -> ScheduleResult<Arc<Task>>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = Task::builder(work).sync().delay(delay).build();
        self.schedule(&task)?;
        Ok(task)
    }

    /// Runs `work` off the main thread every `period`.
    pub fn run_repeating<F>(&self, work: F, period: Schedule) -> ScheduleResult<Arc<Task>>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = Task::builder(work).repeat(period).build();
        self.schedule(&task)?;
        Ok(task)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubHandle(AtomicBool);

    impl ScheduledHandle for StubHandle {
        fn cancel(&self) {
            self.0.store(true, Ordering::SeqCst);
        }

        fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Submitted {
        kind: TaskKind,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
        handle: Arc<StubHandle>,
    }

    /// Records jobs and runs them when asked, dropping one-shot jobs.
    #[derive(Default)]
    struct StubBackend {
        jobs: Mutex<Vec<Submitted>>,
    }

    impl StubBackend {
        fn submit(
            &self,
            kind: TaskKind,
            job: Job,
            delay: Schedule,
            repeat: Schedule,
        ) -> Arc<dyn ScheduledHandle> {
            let handle = Arc::new(StubHandle::default());
            self.jobs.lock().push(Submitted {
                kind,
                job,
                delay,
                repeat,
                handle: Arc::clone(&handle),
            });
            handle
        }

        fn execute(&self) {
            let due: Vec<Job> = {
                let mut jobs = self.jobs.lock();
                jobs.retain(|job| !job.handle.is_cancelled());
                let due = jobs.iter().map(|job| Arc::clone(&job.job)).collect();
                jobs.retain(|job| !job.repeat.is_none());
                due
            };
            for job in due {
                job();
            }
            self.jobs.lock().retain(|job| !job.handle.is_cancelled());
        }

        fn task_count(&self) -> usize {
            self.jobs.lock().len()
        }
    }

    impl SchedulerBackend for StubBackend {
        fn schedule_sync(
            &self,
            job: Job,
            delay: Schedule,
            repeat: Schedule,
        ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
            Ok(self.submit(TaskKind::Sync, job, delay, repeat))
        }

        fn schedule_async(
            &self,
            job: Job,
            delay: Schedule,
            repeat: Schedule,
        ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
            Ok(self.submit(TaskKind::Async, job, delay, repeat))
        }
    }

    fn setup() -> (Arc<StubBackend>, Scheduler) {
        let backend = Arc::new(StubBackend::default());
        let scheduler = Scheduler::new(backend.clone());
        (backend, scheduler)
    }

    #[test]
    fn test_none_repeat_runs_once() {
        let (backend, scheduler) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = Task::builder(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();
        scheduler.schedule(&task).unwrap();

        {
            let jobs = backend.jobs.lock();
            assert!(jobs[0].delay.is_none());
            assert!(jobs[0].repeat.is_none());
            assert_eq!(jobs[0].kind, TaskKind::Async);
        }

        backend.execute();
        backend.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(backend.task_count(), 0);
    }

    #[test]
    fn test_cancel_after_removes_backend_job() {
        let (backend, scheduler) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = Task::builder(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .repeat(Schedule::next_tick())
        .cancel_after(1)
        .build();
        scheduler.schedule(&task).unwrap();

        backend.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        backend.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(backend.task_count(), 0);
    }

    #[test]
    fn test_cancel_when_removes_backend_job() {
        let (backend, scheduler) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let observed = Arc::clone(&count);
        let task = Task::builder(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .repeat(Schedule::seconds(1))
        .cancel_when(move || observed.load(Ordering::SeqCst) == 1)
        .build();
        scheduler.schedule(&task).unwrap();

        backend.execute();
        backend.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(backend.task_count(), 0);
    }

    #[test]
    fn test_sync_kind_and_resolved_schedules() {
        let (backend, scheduler) = setup();
        let task = scheduler.run_later(|| {}, Schedule::ticks(20)).unwrap();
        assert_eq!(task.kind(), TaskKind::Sync);

        let jobs = backend.jobs.lock();
        assert_eq!(jobs[0].kind, TaskKind::Sync);
        assert_eq!(jobs[0].delay.to_ticks(), 20);
        assert_eq!(jobs[0].delay.to_millis(), 1000);
    }

    #[test]
    fn test_task_is_scheduled_once() {
        let (backend, scheduler) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = Task::builder(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .repeat(Schedule::seconds(1))
        .build();

        tokio_test::assert_ok!(scheduler.schedule(&task));
        assert!(task.is_scheduled());
        assert_eq!(
            scheduler.schedule(&task).err(),
            Some(ScheduleError::AlreadyScheduled)
        );
        assert_eq!(backend.task_count(), 1);

        backend.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        task.cancel();
        backend.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(backend.task_count(), 0);
    }

    #[test]
    fn test_rejected_task_can_be_resubmitted() {
        let refusing = Scheduler::new(Arc::new(RefusingBackend));
        let (backend, scheduler) = setup();
        let task = Task::asynchronous(|| {});

        assert_eq!(
            refusing.schedule(&task).err(),
            Some(ScheduleError::rejected("full"))
        );
        assert!(!task.is_scheduled());
        tokio_test::assert_ok!(scheduler.schedule(&task));
        assert_eq!(backend.task_count(), 1);
    }

    struct RefusingBackend;

    impl SchedulerBackend for RefusingBackend {
        fn schedule_sync(
            &self,
            _: Job,
            _: Schedule,
            _: Schedule,
        ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
            Err(ScheduleError::rejected("full"))
        }

        fn schedule_async(
            &self,
            _: Job,
            _: Schedule,
            _: Schedule,
        ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
            Err(ScheduleError::rejected("full"))
        }
    }

    #[test]
    fn test_cancelled_task_is_rejected() {
        let (_, scheduler) = setup();
        let task = Task::asynchronous(|| {});
        tokio_test::assert_ok!(scheduler.schedule(&task));
        task.cancel();
        assert_eq!(scheduler.schedule(&task).err(), Some(ScheduleError::Cancelled));
    }
}
