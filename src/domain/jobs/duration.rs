use chrono::{DateTime, Utc};

use crate::domain::jobs::job::Job;

pub const NOT_AVAILABLE: &str = "N/A";

/// `45s`, `2m 5s`, `2h 2m`. Negative input counts as zero.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Seconds from creation until completion, or until `now` for unfinished jobs.
pub fn job_duration_seconds(job: &Job, now: DateTime<Utc>) -> Option<i64> {
    let created_at = job.created_at?;
    let end = job.completed_at.map_or(now, |completed_at| completed_at.min(now));
    Some((end - created_at).num_seconds().max(0))
}

pub fn display_duration(job: &Job, now: DateTime<Utc>) -> String {
    job_duration_seconds(job, now).map_or_else(|| NOT_AVAILABLE.to_string(), format_duration)
}
