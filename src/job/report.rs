use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::JobStatus;
use super::resumable::{Job, ResumableJob};
use crate::error::ShadowmapError;

/// Structured record of a job run, produced once it settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub name: String,
    pub status: JobStatus,
    pub cause: Option<String>,
    pub budget_ms: f64,
    pub resumes: u32,
    pub steps: u64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: i64,
}

impl JobReport {
    /// Snapshot a job. Non-terminal jobs are measured up to now.
    pub fn from_job<J: Job>(job: &ResumableJob<J>) -> Self {
        let end = job.finished_at().unwrap_or_else(Utc::now);
        let duration = end - job.created_at();

        Self {
            job_id: job.id(),
            name: job.name().to_string(),
            status: job.status(),
            cause: job.phase().cause().map(ToString::to_string),
            budget_ms: job.budget().as_secs_f64() * 1_000.0,
            resumes: job.resumes(),
            steps: job.steps(),
            created_at: job.created_at(),
            finished_at: job.finished_at(),
            duration_ms: duration.num_milliseconds(),
        }
    }

    pub fn to_json(&self) -> Result<String, ShadowmapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
