use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::phase::{JobStatus, Phase};
use crate::clock::Clock;
use crate::error::JobError;

/// Outcome of a single atomic unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// More work remains.
    Continue,
    /// The job produced its result.
    Done(T),
}

/// A unit of cooperative work, advanced one indivisible step at a time.
///
/// Implementors keep their own cursor; [`ResumableJob`] decides how many
/// steps fit into a budget and when cancellation is honored.
pub trait Job {
    type Output;

    fn name(&self) -> &str;

    /// Perform one atomic unit of work. Errors end the job as `Failed`.
    fn step(&mut self) -> Result<Step<Self::Output>, JobError>;

    /// Optional `(done, total)` hint for progress displays.
    fn progress(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Budgeted, cancellable state machine wrapped around a [`Job`].
pub struct ResumableJob<J: Job> {
    id: Uuid,
    job: J,
    budget: Duration,
    cancellation: CancellationToken,
    phase: Phase<J::Output>,
    resumes: u32,
    steps: u64,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl<J: Job> ResumableJob<J> {
    pub fn new(job: J, budget: Duration, cancellation: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            job,
            budget,
            cancellation,
            phase: Phase::Pending,
            resumes: 0,
            steps: 0,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Advance the job for at most `budget` as measured by `clock`.
    ///
    /// At least one step runs per call (unless cancelled), so a budget
    /// shorter than one step still makes progress; the overrun is bounded by
    /// that single step. Terminal phases are returned unchanged.
    pub fn resume(&mut self, clock: &dyn Clock) -> &Phase<J::Output> {
        if self.phase.is_terminal() {
            return &self.phase;
        }

        self.resumes += 1;
        self.phase = Phase::Running;
        let started = clock.elapsed();

        loop {
            if self.cancellation.is_cancelled() {
                self.finish(Phase::Cancelled);
                break;
            }

            self.steps += 1;
            match self.job.step() {
                Ok(Step::Continue) => {
                    if clock.elapsed().saturating_sub(started) >= self.budget {
                        break;
                    }
                }
                Ok(Step::Done(output)) => {
                    self.finish(Phase::Completed(output));
                    break;
                }
                Err(cause) => {
                    self.finish(Phase::Failed(cause));
                    break;
                }
            }
        }

        &self.phase
    }

    fn finish(&mut self, phase: Phase<J::Output>) {
        self.phase = phase;
        self.finished_at = Some(Utc::now());
    }

    /// Request cooperative cancellation; honored at the next suspension point.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// A clone of the job's cancellation token, for other threads or tasks.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn phase(&self) -> &Phase<J::Output> {
        &self.phase
    }

    pub fn status(&self) -> JobStatus {
        self.phase.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The wrapped job, e.g. to inspect its cursor or partial side effects.
    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn resumes(&self) -> u32 {
        self.resumes
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn into_phase(self) -> Phase<J::Output> {
        self.phase
    }

    /// `None` while the job is still in flight.
    pub fn into_result(self) -> Option<Result<J::Output, JobError>> {
        self.phase.into_result()
    }
}

impl<J> fmt::Debug for ResumableJob<J>
where
    J: Job + fmt::Debug,
    J::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumableJob")
            .field("id", &self.id)
            .field("job", &self.job)
            .field("budget", &self.budget)
            .field("phase", &self.phase)
            .field("resumes", &self.resumes)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::ManualClock;

    /// Counts to `target`, one increment per step.
    #[derive(Debug)]
    pub(crate) struct Counter {
        pub(crate) count: u32,
        pub(crate) target: u32,
        pub(crate) fail_at: Option<u32>,
    }

    impl Counter {
        pub(crate) fn to(target: u32) -> Self {
            Self {
                count: 0,
                target,
                fail_at: None,
            }
        }
    }

    impl Job for Counter {
        type Output = u32;

        fn name(&self) -> &str {
            "counter"
        }

        fn step(&mut self) -> Result<Step<u32>, JobError> {
            if self.fail_at == Some(self.count) {
                return Err(JobError::Registry("counter broke".into()));
            }
            if self.count >= self.target {
                return Ok(Step::Done(self.count));
            }
            self.count += 1;
            Ok(Step::Continue)
        }
    }

    fn job(target: u32, budget: Duration) -> ResumableJob<Counter> {
        ResumableJob::new(Counter::to(target), budget, CancellationToken::new())
    }

    #[test]
    fn new_job_is_pending() {
        let job = job(3, Duration::from_millis(1));
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.resumes(), 0);
        assert!(job.finished_at().is_none());
    }

    #[test]
    fn generous_budget_finishes_in_one_resume() {
        let clock = ManualClock::new();
        let mut job = job(10, Duration::from_secs(1));

        assert_eq!(job.resume(&clock), &Phase::Completed(10));
        assert_eq!(job.resumes(), 1);
        assert_eq!(job.steps(), 11);
        assert!(job.finished_at().is_some());
    }

    #[test]
    fn budget_smaller_than_a_step_still_progresses() {
        // Every clock query costs 10ms against a 1ms budget.
        let clock = ManualClock::auto_advance(Duration::from_millis(10));
        let mut job = job(5, Duration::from_millis(1));

        let mut resumes = 0;
        while !job.is_terminal() {
            let phase = job.resume(&clock);
            resumes += 1;
            if resumes <= 5 {
                assert_eq!(phase, &Phase::Running);
            }
        }

        assert_eq!(resumes, 6);
        assert_eq!(job.into_result(), Some(Ok(5)));
    }

    #[test]
    fn budget_bounds_steps_per_resume() {
        let clock = ManualClock::auto_advance(Duration::from_millis(1));
        let mut job = job(100, Duration::from_millis(4));

        job.resume(&clock);
        assert_eq!(job.job().count, 4);
        job.resume(&clock);
        assert_eq!(job.job().count, 8);
    }

    #[test]
    fn cancel_before_first_resume_never_runs_a_step() {
        let clock = ManualClock::new();
        let mut job = job(3, Duration::from_secs(1));
        job.cancel();

        assert_eq!(job.resume(&clock), &Phase::Cancelled);
        assert_eq!(job.steps(), 0);
        assert_eq!(job.job().count, 0);
    }

    #[test]
    fn cancel_mid_flight_is_honored_on_next_resume() {
        let clock = ManualClock::auto_advance(Duration::from_millis(1));
        let mut job = job(100, Duration::from_millis(2));
        let token = job.cancellation();

        assert_eq!(job.resume(&clock), &Phase::Running);
        let partial = job.job().count;
        token.cancel();

        assert_eq!(job.resume(&clock), &Phase::Cancelled);
        assert_eq!(job.job().count, partial);
    }

    #[test]
    fn step_error_becomes_failed_phase() {
        let clock = ManualClock::new();
        let mut counter = Counter::to(10);
        counter.fail_at = Some(2);
        let mut job = ResumableJob::new(counter, Duration::from_secs(1), CancellationToken::new());

        assert_eq!(
            job.resume(&clock),
            &Phase::Failed(JobError::Registry("counter broke".into()))
        );
    }

    #[test]
    fn terminal_phase_is_sticky() {
        let clock = ManualClock::new();
        let mut job = job(1, Duration::from_secs(1));
        job.resume(&clock);
        let steps = job.steps();

        job.cancel();
        assert_eq!(job.resume(&clock), &Phase::Completed(1));
        assert_eq!(job.steps(), steps);
        assert_eq!(job.resumes(), 1);
    }

    #[test]
    fn independent_jobs_run_on_separate_threads() {
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                std::thread::spawn(move || {
                    let clock = ManualClock::auto_advance(Duration::from_millis(1));
                    let mut job = job(n * 10, Duration::from_millis(3));
                    while !job.is_terminal() {
                        job.resume(&clock);
                    }
                    job.into_result()
                })
            })
            .collect();

        for (n, handle) in (1..=4).zip(handles) {
            assert_eq!(handle.join().unwrap(), Some(Ok(n * 10)));
        }
    }
}
