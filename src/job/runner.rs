use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::phase::Phase;
use super::resumable::{Job, ResumableJob};
use crate::clock::Clock;
use crate::log::Logger;
use crate::{log_debug, log_trace};

/// Smallest period accepted by [`JobRunner::run_async`].
const MIN_TICK_PERIOD: Duration = Duration::from_micros(1);

/// The host's notion of "the next frame".
pub trait TickSource {
    /// Wait for the next tick. `false` means the host stopped ticking.
    fn next_tick(&mut self) -> bool;
}

/// Every call is a tick; the job runs back to back.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl TickSource for Unbounded {
    fn next_tick(&mut self) -> bool {
        true
    }
}

/// At most `n` ticks, then the source is exhausted.
#[derive(Debug, Clone, Copy)]
pub struct FixedTicks {
    remaining: usize,
}

impl FixedTicks {
    pub fn new(n: usize) -> Self {
        Self { remaining: n }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl TickSource for FixedTicks {
    fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Sleeps the calling thread for `period` between ticks.
#[derive(Debug, Clone, Copy)]
pub struct SleepTicks {
    period: Duration,
    started: bool,
}

impl SleepTicks {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            started: false,
        }
    }
}

impl TickSource for SleepTicks {
    fn next_tick(&mut self) -> bool {
        if self.started {
            std::thread::sleep(self.period);
        }
        self.started = true;
        true
    }
}

/// Drives jobs to a terminal phase, one budgeted resume per tick.
///
/// The runner never retries and never enforces an overall deadline; both are
/// caller policy. Terminal phases are handed back exactly as the job left
/// them.
#[derive(Clone)]
pub struct JobRunner {
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
}

impl JobRunner {
    pub fn new(clock: Arc<dyn Clock>, logger: Arc<dyn Logger>) -> Self {
        Self { clock, logger }
    }

    /// Resume `job` once per tick until it is terminal or `ticks` runs dry.
    pub fn run_to_completion<'a, J: Job>(
        &self,
        job: &'a mut ResumableJob<J>,
        ticks: &mut dyn TickSource,
    ) -> &'a Phase<J::Output> {
        self.run_observed(job, ticks, |_| {})
    }

    /// Like [`run_to_completion`](Self::run_to_completion), calling `observe`
    /// after every resume (progress displays hook in here).
    pub fn run_observed<'a, J, F>(
        &self,
        job: &'a mut ResumableJob<J>,
        ticks: &mut dyn TickSource,
        mut observe: F,
    ) -> &'a Phase<J::Output>
    where
        J: Job,
        F: FnMut(&ResumableJob<J>),
    {
        while !job.is_terminal() {
            if !ticks.next_tick() {
                log_debug!(
                    self.logger,
                    "{} suspended after {} resumes: tick source exhausted",
                    job.name(),
                    job.resumes()
                );
                return job.phase();
            }
            job.resume(self.clock.as_ref());
            log_trace!(
                self.logger,
                "{} resume #{} -> {}",
                job.name(),
                job.resumes(),
                job.status()
            );
            observe(job);
        }

        self.log_terminal(job);
        job.phase()
    }

    /// Async variant ticking on a `tokio` interval of `period`.
    ///
    /// Missed ticks are delayed rather than bursted, so a slow host never
    /// sees several resumes back to back.
    pub async fn run_async<'a, J: Job>(
        &self,
        job: &'a mut ResumableJob<J>,
        period: Duration,
    ) -> &'a Phase<J::Output> {
        let mut interval = tokio::time::interval(period.max(MIN_TICK_PERIOD));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !job.is_terminal() {
            interval.tick().await;
            job.resume(self.clock.as_ref());
            log_trace!(
                self.logger,
                "{} resume #{} -> {}",
                job.name(),
                job.resumes(),
                job.status()
            );
        }

        self.log_terminal(job);
        job.phase()
    }

    fn log_terminal<J: Job>(&self, job: &ResumableJob<J>) {
        match job.phase().cause() {
            Some(cause) => log_debug!(
                self.logger,
                "{} {} after {} resumes: {cause}",
                job.name(),
                job.status(),
                job.resumes()
            ),
            None => log_debug!(
                self.logger,
                "{} {} after {} resumes ({} steps)",
                job.name(),
                job.status(),
                job.resumes(),
                job.steps()
            ),
        }
    }
}
