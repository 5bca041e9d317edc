//! Terminal output for the demo host: a spinner while a job is in flight and
//! colored outcome lines once it settles.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use shadowmap::error::ShadowmapError;
use shadowmap::job::{Job, JobReport, JobStatus, Phase, ResumableJob};

/// Spinner tracking one job across ticks.
pub struct JobProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl JobProgress {
    pub fn start(name: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(format!("PENDING: {name}"));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Refresh the spinner after a resume.
    pub fn update<J: Job>(&self, job: &ResumableJob<J>) {
        let progress = match job.job().progress() {
            Some((done, total)) => format!(" {done}/{total}"),
            None => String::new(),
        };
        self.pb.set_message(format!(
            "{}: {}{progress} (resume #{}, {} steps)",
            job.status(),
            job.name(),
            job.resumes(),
            job.steps()
        ));
    }

    /// Clear the spinner and print the outcome.
    pub fn complete<T>(&self, phase: &Phase<T>) {
        self.pb.finish_and_clear();
        match phase {
            Phase::Completed(_) => {
                println!("  {} Job completed", self.green.apply_to("✓"));
            }
            Phase::Failed(cause) => {
                println!("  {} Job failed: {cause}", self.red.apply_to("✗"));
            }
            Phase::Cancelled => {
                println!("  {} Job cancelled", self.yellow.apply_to("■"));
            }
            Phase::Pending | Phase::Running => {
                println!(
                    "  {} Job suspended while still in flight",
                    self.yellow.apply_to("…")
                );
            }
        }
    }

    pub fn note(&self, message: &str) {
        println!("  {} {message}", self.yellow.apply_to("↻"));
    }

    /// Pretty-print a job report, header colored by status.
    pub fn print_report(&self, report: &JobReport) -> Result<(), ShadowmapError> {
        let style = match report.status {
            JobStatus::Completed => &self.green,
            JobStatus::Failed => &self.red,
            _ => &self.yellow,
        };
        let json = report.to_json()?;
        println!();
        println!("{}", style.apply_to("─── Job Report ───"));
        println!("{json}");
        Ok(())
    }
}
