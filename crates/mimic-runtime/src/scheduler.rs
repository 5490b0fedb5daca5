//! A [`SchedulerBackend`] on top of tokio.
//!
//! Async jobs run on tokio tasks. Sync jobs are funnelled through one bounded
//! queue drained by a single task, which stands in for the host's main
//! thread: they never run concurrently with each other and run in the order
//! they became due.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use mimic_framework::{
    Job, Schedule, ScheduleError, ScheduleResult, ScheduledHandle, SchedulerBackend, panic_message,
};

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Debug)]
struct TokioHandle {
    token: CancellationToken,
}

impl ScheduledHandle for TokioHandle {
    fn cancel(&self) {
        self.token.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

fn run_job(job: &Job, queue: &'static str) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| job())) {
        error!(queue, panic = panic_message(payload.as_ref()), "Scheduled job panicked");
    }
}

/// Runs jobs on the current tokio runtime.
pub struct TokioScheduler {
    runtime: Handle,
    sync_queue: mpsc::Sender<Job>,
    shutdown: CancellationToken,
}

impl TokioScheduler {
    /// Creates a scheduler on the current tokio runtime.
    ///
    /// `sync_queue_capacity` bounds the number of sync jobs that are due but
    /// not yet run; timers wait for room when it is full.
    pub fn new(sync_queue_capacity: usize) -> RuntimeResult<Self> {
        let runtime = Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;
        Ok(Self::with_handle(runtime, sync_queue_capacity))
    }

    /// Creates a scheduler on the given runtime.
    pub fn with_handle(runtime: Handle, sync_queue_capacity: usize) -> Self {
        let (sync_queue, receiver) = mpsc::channel(sync_queue_capacity.max(1));
        let shutdown = CancellationToken::new();
        runtime.spawn(drain_sync_queue(receiver, shutdown.clone()));
        debug!(capacity = sync_queue_capacity, "Started sync job queue");
        Self {
            runtime,
            sync_queue,
            shutdown,
        }
    }

    /// Stops every scheduled job and the sync queue. Later submissions fail
    /// with [`ScheduleError::Shutdown`].
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Shutting down tokio scheduler");
            self.shutdown.cancel();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn spawn_timer<F>(
        &self,
        delay: Schedule,
        repeat: Schedule,
        fire: F,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>>
    where
        F: Fn(CancellationToken) -> Fire + Send + 'static,
    {
        if self.is_shutdown() {
            return Err(ScheduleError::Shutdown);
        }

        let token = self.shutdown.child_token();
        let handle = Arc::new(TokioHandle {
            token: token.clone(),
        });

        self.runtime.spawn(async move {
            if !delay.is_none() {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = sleep(delay.to_duration()) => {}
                }
            }
            loop {
                if token.is_cancelled() || !fire(token.clone()).await {
                    break;
                }
                if repeat.is_none() {
                    break;
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep(repeat.to_duration()) => {}
                }
            }
            trace!("Timer finished");
        });

        Ok(handle)
    }
}

/// One firing of a timer. Resolves to `false` when the job can no longer run.
type Fire = std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send>>;

async fn drain_sync_queue(mut receiver: mpsc::Receiver<Job>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            job = receiver.recv() => match job {
                Some(job) => run_job(&job, "sync"),
                None => break,
            },
        }
    }
    debug!("Sync job queue stopped");
}

impl SchedulerBackend for TokioScheduler {
    fn schedule_sync(
        &self,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
        let queue = self.sync_queue.clone();
        self.spawn_timer(delay, repeat, move |token| -> Fire {
            let job = Arc::clone(&job);
            let queue = queue.clone();
            Box::pin(async move {
                // The job may sit in the queue after its handle is cancelled.
                let guarded: Job = Arc::new(move || {
                    if !token.is_cancelled() {
                        job();
                    }
                });
                queue.send(guarded).await.is_ok()
            })
        })
    }

    fn schedule_async(
        &self,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
        self.spawn_timer(delay, repeat, move |_| -> Fire {
            let job = Arc::clone(&job);
            Box::pin(async move {
                run_job(&job, "async");
                true
            })
        })
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("sync_queue_capacity", &self.sync_queue.max_capacity())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
