//! Watch (daemon) use case: sync delivery trackers periodically and report
//! transitions; failed deliveries optionally become follow-up task cards.
//!
//! Orchestrates TrackerSyncService and TaskTrackerPort. Does not block the
//! main thread between cycles; uses tokio::time::sleep.

use crate::domain::{DeliveryStatus, DomainError, TrackerUpdate};
use crate::ports::TaskTrackerPort;
use crate::usecases::tracker_sync_service::TrackerSyncService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Watch service. Runs a loop: sync trackers -> report Opened/Failed
/// transitions -> create follow-up cards for failures -> sleep.
pub struct WatchService {
    sync_service: Arc<TrackerSyncService>,
    task_tracker: Option<Arc<dyn TaskTrackerPort>>,
    /// Sleep duration between cycles.
    cycle_sleep: Duration,
}

impl WatchService {
    pub fn new(
        sync_service: Arc<TrackerSyncService>,
        task_tracker: Option<Arc<dyn TaskTrackerPort>>,
        cycle_sleep: Duration,
    ) -> Self {
        Self {
            sync_service,
            task_tracker,
            cycle_sleep,
        }
    }

    /// Run the watch loop. Syncs, reports, sleeps; runs until the user stops
    /// the process. A failed cycle is logged and the loop keeps going.
    pub async fn run_loop(&self) -> Result<(), DomainError> {
        info!(
            cycle_secs = self.cycle_sleep.as_secs(),
            follow_up_cards = self.task_tracker.is_some(),
            "watch mode started"
        );

        loop {
            if let Err(e) = self.run_cycle().await {
                warn!(error = %e, "watch cycle failed; will retry next cycle");
            }

            tokio::time::sleep(self.cycle_sleep).await;
        }
    }

    /// One cycle: sync (waiting out rate limits), then report transitions.
    async fn run_cycle(&self) -> Result<(), DomainError> {
        let stats = self.sync_service.sync_waiting_out_rate_limits().await?;

        for update in &stats.transitions {
            match update.status {
                DeliveryStatus::Opened => {
                    info!(
                        lead = %update.lead,
                        communication = %update.communication_id,
                        "email opened"
                    );
                }
                DeliveryStatus::Failed => {
                    warn!(
                        lead = %update.lead,
                        communication = %update.communication_id,
                        error = update.error.as_deref().unwrap_or("unknown"),
                        "delivery failed"
                    );
                    self.create_follow_up(update).await;
                }
                _ => {}
            }
        }

        info!(
            fetched = stats.fetched,
            applied = stats.applied,
            "watch cycle complete; sleeping"
        );
        Ok(())
    }

    /// Create a follow-up card for a failed delivery. Card creation errors
    /// are logged, never fatal to the loop.
    async fn create_follow_up(&self, update: &TrackerUpdate) {
        let Some(tracker) = self.task_tracker.as_ref() else {
            return;
        };
        let title = format!("Follow up with lead {}", update.lead);
        let description = format!(
            "Email delivery failed (communication {}): {}",
            update.communication_id,
            update.error.as_deref().unwrap_or("no error recorded")
        );
        if let Err(e) = tracker.create_task(&title, &description).await {
            warn!(lead = %update.lead, error = %e, "failed to create follow-up card");
        } else {
            info!(lead = %update.lead, "follow-up card created");
        }
    }
}
