//! A backend for hosts driven by a game loop.
//!
//! The host calls [`TickScheduler::tick`] once per game tick on its main
//! thread. Sync and async jobs both run there; a host that has worker threads
//! should use a backend that owns them instead.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{error, trace};

use crate::error::{ScheduleResult, panic_message};
use crate::scheduling::scheduler::{Job, SchedulerBackend};
use crate::scheduling::task::{ScheduledHandle, TaskKind};
use crate::scheduling::Schedule;

#[derive(Debug, Default)]
struct TickHandle {
    cancelled: AtomicBool,
}

impl ScheduledHandle for TickHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct Entry {
    job: Job,
    kind: TaskKind,
    due: u64,
    period: Option<u64>,
    handle: Arc<TickHandle>,
}

#[derive(Default)]
struct State {
    tick: u64,
    entries: Vec<Entry>,
}

/// A [`SchedulerBackend`] advanced by the host's game loop.
#[derive(Default)]
pub struct TickScheduler {
    state: Mutex<State>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances one tick and runs every job that became due. Returns the number
    /// of jobs run.
    ///
    /// Jobs run outside the internal lock and may schedule further jobs; those
    /// are considered from the next tick on.
    pub fn tick(&self) -> usize {
        let due: Vec<(Job, TaskKind)> = {
            let mut state = self.state.lock();
            state.tick += 1;
            let now = state.tick;

            state.entries.retain(|entry| !entry.handle.is_cancelled());
            let mut due = Vec::new();
            state.entries.retain_mut(|entry| {
                if entry.due > now {
                    return true;
                }
                due.push((Arc::clone(&entry.job), entry.kind));
                match entry.period {
                    Some(period) => {
                        entry.due = now + period;
                        true
                    }
                    None => false,
                }
            });
            due
        };

        for (job, kind) in &due {
            trace!(?kind, "Running scheduled job");
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| job())) {
                error!(
                    ?kind,
                    panic = panic_message(panic.as_ref()),
                    "Scheduled job panicked"
                );
            }
        }
        due.len()
    }

    /// Number of ticks elapsed.
    pub fn current_tick(&self) -> u64 {
        self.state.lock().tick
    }

    /// Number of jobs that have not been cancelled or finished.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| !entry.handle.is_cancelled())
            .count()
    }

    fn submit(
        &self,
        job: Job,
        kind: TaskKind,
        delay: Schedule,
        repeat: Schedule,
    ) -> Arc<dyn ScheduledHandle> {
        let handle = Arc::new(TickHandle::default());
        let mut state = self.state.lock();
        let due = state.tick + delay.to_ticks().max(1);
        let period = (!repeat.is_none()).then(|| repeat.to_ticks().max(1));
        state.entries.push(Entry {
            job,
            kind,
            due,
            period,
            handle: Arc::clone(&handle),
        });
        handle
    }
}

impl SchedulerBackend for TickScheduler {
    fn schedule_sync(
        &self,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
        Ok(self.submit(job, TaskKind::Sync, delay, repeat))
    }

    fn schedule_async(
        &self,
        job: Job,
        delay: Schedule,
        repeat: Schedule,
    ) -> ScheduleResult<Arc<dyn ScheduledHandle>> {
        Ok(self.submit(job, TaskKind::Async, delay, repeat))
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TickScheduler")
            .field("tick", &state.tick)
            .field("entries", &state.entries.len())
            .finish()
    }
}
