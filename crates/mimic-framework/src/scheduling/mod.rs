//! Host-independent scheduling.
//!
//! A [`Task`] carries its timing as [`Schedule`]s and its own cancellation
//! rules. Running it is up to a [`SchedulerBackend`] supplied by the host; the
//! [`Scheduler`] only hands tasks over.
//!
//! ```rust,ignore
//! let reminder = Task::builder(|| info!("Remember to vote!"))
//!     .delay(Schedule::minutes(1))
//!     .repeat(Schedule::minutes(10))
//!     .cancel_after(6)
//!     .build();
//! scheduler.schedule(&reminder)?;
//! ```

mod schedule;
mod scheduler;
mod task;
mod tick;

pub use schedule::{MILLIS_PER_TICK, Schedule};
pub use scheduler::{Job, Scheduler, SchedulerBackend};
pub use task::{ScheduledHandle, Task, TaskBuilder, TaskKind};
pub use tick::TickScheduler;
