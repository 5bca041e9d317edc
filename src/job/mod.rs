//! Time-sliced cooperative job engine.
//!
//! A [`Job`] exposes one atomic `step`; [`ResumableJob`] wraps it in the
//! `Pending → Running → {Completed | Failed | Cancelled}` state machine with
//! a per-resume time budget and a cancellation token. [`JobRunner`] resumes a
//! single job once per host tick, [`JobQueue`] shares one tick budget between
//! many jobs.

mod phase;
mod queue;
mod report;
mod resumable;
mod runner;

pub use phase::{JobStatus, Phase};
pub use queue::JobQueue;
pub use report::JobReport;
pub use resumable::{Job, ResumableJob, Step};
pub use runner::{FixedTicks, JobRunner, SleepTicks, TickSource, Unbounded};
