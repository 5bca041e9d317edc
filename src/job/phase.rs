use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Execution phase of a job.
///
/// `Pending → Running → {Completed | Failed | Cancelled}`. The last three are
/// terminal; a result exists only in `Completed` and a cause only in `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Pending,
    Running,
    Completed(T),
    Failed(JobError),
    Cancelled,
}

impl<T> Phase<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed(_) | Phase::Failed(_) | Phase::Cancelled)
    }

    pub fn status(&self) -> JobStatus {
        match self {
            Phase::Pending => JobStatus::Pending,
            Phase::Running => JobStatus::Running,
            Phase::Completed(_) => JobStatus::Completed,
            Phase::Failed(_) => JobStatus::Failed,
            Phase::Cancelled => JobStatus::Cancelled,
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Phase::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&JobError> {
        match self {
            Phase::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    /// Collapse a terminal phase into a `Result`; `None` while still in flight.
    ///
    /// Cancellation maps to `Err(JobError::Cancelled)`.
    pub fn into_result(self) -> Option<Result<T, JobError>> {
        match self {
            Phase::Pending | Phase::Running => None,
            Phase::Completed(value) => Some(Ok(value)),
            Phase::Failed(cause) => Some(Err(cause)),
            Phase::Cancelled => Some(Err(JobError::Cancelled)),
        }
    }
}

/// Payload-free mirror of [`Phase`], cheap to copy and serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_right_hand_phases_are_terminal() {
        assert!(!Phase::<u8>::Pending.is_terminal());
        assert!(!Phase::<u8>::Running.is_terminal());
        assert!(Phase::Completed(1u8).is_terminal());
        assert!(Phase::<u8>::Failed(JobError::Cancelled).is_terminal());
        assert!(Phase::<u8>::Cancelled.is_terminal());
    }

    #[test]
    fn result_and_cause_are_exclusive() {
        let done = Phase::Completed("map");
        assert_eq!(done.result(), Some(&"map"));
        assert!(done.cause().is_none());

        let failed: Phase<&str> = Phase::Failed(JobError::UnknownTileKind("Lava".into()));
        assert!(failed.result().is_none());
        assert_eq!(
            failed.cause(),
            Some(&JobError::UnknownTileKind("Lava".into()))
        );
    }

    #[test]
    fn into_result_maps_terminal_phases() {
        assert_eq!(Phase::<u8>::Running.into_result(), None);
        assert_eq!(Phase::Completed(3u8).into_result(), Some(Ok(3)));
        assert_eq!(
            Phase::<u8>::Cancelled.into_result(),
            Some(Err(JobError::Cancelled))
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(JobStatus::Pending.to_string(), "PENDING");
        assert_eq!(JobStatus::Running.to_string(), "RUNNING");
        assert_eq!(JobStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(JobStatus::Failed.to_string(), "FAILED");
        assert_eq!(JobStatus::Cancelled.to_string(), "CANCELLED");
    }
}
