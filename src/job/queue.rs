use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use super::resumable::{Job, ResumableJob};
use crate::clock::Clock;
use crate::error::JobError;
use crate::log::Logger;
use crate::log_debug;

/// Type-erased queue entry.
trait QueuedJob: Send {
    fn name(&self) -> &str;

    /// Resume once; `true` when the job reached a terminal phase.
    fn resume(&mut self, clock: &dyn Clock) -> bool;

    /// Hand the terminal result to whoever holds the receiver.
    fn deliver(self: Box<Self>);
}

struct Entry<J: Job> {
    job: ResumableJob<J>,
    reply: oneshot::Sender<Result<J::Output, JobError>>,
}

impl<J> QueuedJob for Entry<J>
where
    J: Job + Send,
    J::Output: Send,
{
    fn name(&self) -> &str {
        self.job.name()
    }

    fn resume(&mut self, clock: &dyn Clock) -> bool {
        self.job.resume(clock).is_terminal()
    }

    fn deliver(self: Box<Self>) {
        let Entry { job, reply } = *self;
        if let Some(result) = job.into_result() {
            // The caller may have dropped the receiver; nothing to do then.
            let _ = reply.send(result);
        }
    }
}

/// Processes many jobs per host tick under a shared tick budget.
///
/// Each call to [`process`](Self::process) resumes queued jobs in FIFO
/// order, each at most once, until the tick budget is spent. Unfinished jobs
/// rotate to the back so no job starves.
pub struct JobQueue {
    clock: Arc<dyn Clock>,
    tick_budget: Duration,
    logger: Arc<dyn Logger>,
    pending: VecDeque<Box<dyn QueuedJob>>,
}

impl JobQueue {
    pub fn new(clock: Arc<dyn Clock>, tick_budget: Duration, logger: Arc<dyn Logger>) -> Self {
        Self {
            clock,
            tick_budget,
            logger,
            pending: VecDeque::new(),
        }
    }

    /// Queue a job; its terminal result arrives on the returned receiver.
    ///
    /// Cancelled jobs deliver `Err(JobError::Cancelled)`.
    pub fn enqueue<J>(
        &mut self,
        job: ResumableJob<J>,
    ) -> oneshot::Receiver<Result<J::Output, JobError>>
    where
        J: Job + Send + 'static,
        J::Output: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.pending.push_back(Box::new(Entry { job, reply }));
        rx
    }

    /// Run one host tick. Returns how many jobs finished during it.
    pub fn process(&mut self) -> usize {
        let started = self.clock.elapsed();
        let queued = self.pending.len();
        let mut finished = 0;

        for visited in 0..queued {
            if visited > 0 && self.clock.elapsed().saturating_sub(started) >= self.tick_budget {
                break;
            }
            let Some(mut entry) = self.pending.pop_front() else {
                break;
            };
            if entry.resume(self.clock.as_ref()) {
                log_debug!(
                    self.logger,
                    "{} finished, {} left in queue",
                    entry.name(),
                    self.pending.len()
                );
                entry.deliver();
                finished += 1;
            } else {
                self.pending.push_back(entry);
            }
        }

        finished
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::job::resumable::tests::Counter;
    use crate::log::NoOpLogger;
    use tokio_util::sync::CancellationToken;

    fn test_queue(clock: ManualClock, tick_budget: Duration) -> JobQueue {
        JobQueue::new(Arc::new(clock), tick_budget, Arc::new(NoOpLogger))
    }

    fn counter(target: u32, budget_ms: u64) -> ResumableJob<Counter> {
        ResumableJob::new(
            Counter::to(target),
            Duration::from_millis(budget_ms),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn delivers_results_for_every_job() {
        let clock = ManualClock::new();
        let mut queue = test_queue(clock, Duration::from_secs(1));
        let a = queue.enqueue(counter(3, 1_000));
        let b = queue.enqueue(counter(5, 1_000));

        assert_eq!(queue.process(), 2);
        assert!(queue.is_empty());
        assert_eq!(a.await.unwrap(), Ok(3));
        assert_eq!(b.await.unwrap(), Ok(5));
    }

    #[tokio::test]
    async fn tick_budget_limits_jobs_resumed_per_tick() {
        // Each clock query costs 1ms; the tick budget fits roughly one job.
        let clock = ManualClock::auto_advance(Duration::from_millis(1));
        let mut queue = test_queue(clock, Duration::from_millis(2));
        let rx = queue.enqueue(counter(0, 1));
        let _slow = queue.enqueue(counter(50, 1));
        let _third = queue.enqueue(counter(0, 1));

        assert_eq!(queue.process(), 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(rx.await.unwrap(), Ok(0));
    }

    #[tokio::test]
    async fn cancelled_job_delivers_cancelled_error() {
        let clock = ManualClock::new();
        let mut queue = test_queue(clock, Duration::from_secs(1));
        let job = counter(10, 1_000);
        job.cancel();
        let rx = queue.enqueue(job);

        queue.process();
        assert_eq!(rx.await.unwrap(), Err(JobError::Cancelled));
    }

    #[test]
    fn unfinished_jobs_rotate_to_the_back() {
        let clock = ManualClock::auto_advance(Duration::from_millis(1));
        let mut queue = test_queue(clock, Duration::from_secs(1));
        let _long = queue.enqueue(counter(10, 1));
        let mut short = queue.enqueue(counter(1, 1));

        // Tick 1: long advances, short advances. Tick 2: short finishes.
        assert_eq!(queue.process(), 0);
        assert_eq!(queue.process(), 1);
        assert_eq!(short.try_recv().unwrap(), Ok(1));
        assert_eq!(queue.len(), 1);
    }
}
