//! Health check: fresh, last outcome succeeded, no recent logged errors.

use {
    chrono::{DateTime, Utc},
    serde::Serialize,
};

use crate::{Result, pipeline::PublishPipeline};

/// The three conditions behind [`PublishPipeline::is_healthy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// An outcome was created within the expected update period.
    pub fresh: bool,
    /// The most recent outcome has `success: true`.
    pub last_succeeded: bool,
    /// The error log has entries within the error window.
    pub recent_errors: bool,
    pub last_outcome_at: Option<DateTime<Utc>>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.fresh && self.last_succeeded && !self.recent_errors
    }
}

impl PublishPipeline {
    /// Evaluate health as of `now`. Read-only.
    pub async fn health_report(&self, now: DateTime<Utc>) -> Result<HealthReport> {
        let latest = self.store.latest_outcome(self.agent_id).await?;
        // A period reaching past the earliest representable time covers everything.
        let cutoff = now.checked_sub_signed(self.expected_update_period);

        let (fresh, last_succeeded, last_outcome_at) = match &latest {
            Some(stored) => (
                cutoff.is_none_or(|cutoff| stored.event.created_at >= cutoff),
                stored.event.is_success(),
                Some(stored.event.created_at),
            ),
            None => (false, false, None),
        };

        Ok(HealthReport {
            fresh,
            last_succeeded,
            recent_errors: self.error_log.has_recent_errors(self.error_window, now),
            last_outcome_at,
        })
    }

    pub async fn is_healthy(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.health_report(now).await?.is_healthy())
    }

    /// Health as of the pipeline's clock.
    pub async fn is_healthy_now(&self) -> Result<bool> {
        self.is_healthy(self.clock.now()).await
    }
}
