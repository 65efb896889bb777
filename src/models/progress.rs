//! Batch progress snapshot types.

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Lifecycle state of a batch job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Statements are still being checked.
    ///
    /// Older service builds report this state as `in_progress`.
    #[serde(alias = "in_progress")]
    Running,
    /// Every statement has been checked.
    Completed,
}

/// One polled observation of a batch job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchProgress {
    /// Job identifier.
    pub batch_id: String,
    /// Number of statements in the batch.
    pub total_count: u32,
    /// Statements checked so far (success + failed).
    pub completed_count: u32,
    /// Statements that checked successfully.
    pub success_count: u32,
    /// Statements whose check failed.
    pub failed_count: u32,
    /// Completion percentage, 0–100.
    pub progress: u8,
    /// Estimated seconds until completion, when the service can tell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u64>,
    /// Current lifecycle state.
    pub status: BatchState,
}

impl BatchProgress {
    /// Whether the job has finished.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == BatchState::Completed
    }
}

/// Validate that a progress snapshot is internally consistent.
///
/// # Errors
///
/// Returns `AppError::Api` when counts contradict each other or the
/// percentage is out of range.
pub fn validate_progress(progress: &BatchProgress) -> Result<()> {
    if progress.completed_count > progress.total_count {
        return Err(AppError::Api(format!(
            "batch {}: completed_count {} exceeds total_count {}",
            progress.batch_id, progress.completed_count, progress.total_count
        )));
    }
    if progress.success_count + progress.failed_count > progress.completed_count {
        return Err(AppError::Api(format!(
            "batch {}: success {} + failed {} exceeds completed {}",
            progress.batch_id,
            progress.success_count,
            progress.failed_count,
            progress.completed_count
        )));
    }
    if progress.progress > 100 {
        return Err(AppError::Api(format!(
            "batch {}: progress {} out of range",
            progress.batch_id, progress.progress
        )));
    }
    Ok(())
}
