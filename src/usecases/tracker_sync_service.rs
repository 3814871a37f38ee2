//! Tracker sync logic: page tracker updates from the CRM -> apply status
//! transitions to the local delivery log -> advance the cursor.
//!
//! - Reads the cursor (last applied server `modified` timestamp) from StatePort
//! - Fetches ONLY rows modified after the cursor, oldest first
//! - Advances the cursor only after a page is applied, so a crash re-syncs
//!   instead of losing updates (re-applying is a no-op)

use crate::domain::{DomainError, TrackerUpdate};
use crate::ports::{CrmGateway, DeliveryLogPort, StatePort};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Result of a single sync run.
#[derive(Debug, Default)]
pub struct SyncStats {
    pub fetched: usize,
    pub applied: usize,
    /// Updates that actually changed a delivery row, in apply order.
    /// Watch mode inspects these for transitions worth reporting.
    pub transitions: Vec<TrackerUpdate>,
}

/// Tracker sync service. Coordinates incremental tracker sync between the
/// CRM API and the local delivery log.
pub struct TrackerSyncService {
    crm: Arc<dyn CrmGateway>,
    log: Arc<dyn DeliveryLogPort>,
    state: Arc<dyn StatePort>,
    page_size: u32,
    page_delay: Duration,
}

impl TrackerSyncService {
    pub fn new(
        crm: Arc<dyn CrmGateway>,
        log: Arc<dyn DeliveryLogPort>,
        state: Arc<dyn StatePort>,
        page_size: u32,
        page_delay: Duration,
    ) -> Self {
        Self {
            crm,
            log,
            state,
            page_size,
            page_delay,
        }
    }

    /// Run one sync pass. Pages until the server returns a short page.
    pub async fn sync(&self) -> Result<SyncStats, DomainError> {
        let mut cursor = self.state.get_tracker_cursor().await?;
        let mut stats = SyncStats::default();

        loop {
            let mut page = self
                .crm
                .fetch_tracker_updates(cursor.as_deref(), self.page_size)
                .await?;

            // Defensive: only keep rows strictly after the cursor (API may
            // return the boundary row)
            if let Some(ref c) = cursor {
                page.retain(|u| u.modified.as_str() > c.as_str());
            }

            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let mut page_max = cursor.clone().unwrap_or_default();
            for update in page {
                if update.modified > page_max {
                    page_max = update.modified.clone();
                }
                if self.log.apply_tracker_update(&update).await? {
                    stats.applied += 1;
                    stats.transitions.push(update);
                }
                stats.fetched += 1;
            }

            // Cursor for next iteration: newest timestamp applied so far
            self.state.set_tracker_cursor(&page_max).await?;
            cursor = Some(page_max);

            if page_len < self.page_size as usize {
                break;
            }

            // Small delay between pages to stay under the API rate limits
            tokio::time::sleep(self.page_delay).await;
        }

        if stats.fetched > 0 {
            info!(
                fetched = stats.fetched,
                applied = stats.applied,
                cursor = cursor.as_deref().unwrap_or("-"),
                "tracker sync complete"
            );
        } else {
            info!("tracker sync complete; no new updates");
        }

        Ok(stats)
    }

    /// Like [`sync`](Self::sync), but waits out rate limits instead of
    /// surfacing them. Used by watch mode, which must keep cycling.
    pub async fn sync_waiting_out_rate_limits(&self) -> Result<SyncStats, DomainError> {
        loop {
            match self.sync().await {
                Err(DomainError::RateLimited { seconds }) => {
                    warn!(seconds, "rate limited; pausing tracker sync");
                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crm::mock_gateway::MockCrmGateway;
    use crate::adapters::persistence::memory::{MemoryDeliveryLog, MemoryState};
    use crate::domain::{BroadcastOutcome, BroadcastStatus, DeliveryStatus};

    fn update(comm: &str, status: DeliveryStatus, modified: &str) -> TrackerUpdate {
        TrackerUpdate {
            communication_id: comm.to_string(),
            lead: "CRM-LEAD-2025-00001".to_string(),
            status,
            error: None,
            modified: modified.to_string(),
        }
    }

    async fn seeded_log() -> Arc<MemoryDeliveryLog> {
        let log = Arc::new(MemoryDeliveryLog::new());
        log.record_outcomes(
            "seg1",
            "Hello",
            &[BroadcastOutcome {
                lead: "CRM-LEAD-2025-00001".to_string(),
                email: Some("ada@example.com".to_string()),
                status: BroadcastStatus::Success,
                communication_id: Some("COMM-1".to_string()),
                message: "ok".to_string(),
            }],
        )
        .await
        .unwrap();
        log
    }

    #[tokio::test]
    async fn applies_updates_and_advances_cursor() {
        let crm = Arc::new(MockCrmGateway::new().with_tracker_updates(vec![update(
            "COMM-1",
            DeliveryStatus::Sent,
            "2025-06-01 10:00:00.000001",
        )]));
        let log = seeded_log().await;
        let state = Arc::new(MemoryState::new());
        let service = TrackerSyncService::new(
            crm,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
            Arc::clone(&state) as Arc<dyn StatePort>,
            100,
            Duration::from_millis(0),
        );

        let stats = service.sync().await.unwrap();

        assert_eq!(stats.fetched, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(
            state.get_tracker_cursor().await.unwrap().as_deref(),
            Some("2025-06-01 10:00:00.000001")
        );
        assert_eq!(log.records()[0].status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let crm = Arc::new(MockCrmGateway::new().with_tracker_updates(vec![update(
            "COMM-1",
            DeliveryStatus::Sent,
            "2025-06-01 10:00:00.000001",
        )]));
        let log = seeded_log().await;
        let state = Arc::new(MemoryState::new());
        let service = TrackerSyncService::new(
            crm,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
            Arc::clone(&state) as Arc<dyn StatePort>,
            100,
            Duration::from_millis(0),
        );

        service.sync().await.unwrap();
        let stats = service.sync().await.unwrap();

        // Cursor excludes the already-applied row entirely
        assert_eq!(stats.fetched, 0);
        assert_eq!(stats.applied, 0);
    }

    #[tokio::test]
    async fn regressions_count_as_fetched_but_not_applied() {
        let crm = Arc::new(MockCrmGateway::new().with_tracker_updates(vec![
            update("COMM-1", DeliveryStatus::Opened, "2025-06-01 10:00:00.000001"),
            update("COMM-1", DeliveryStatus::Sent, "2025-06-01 10:00:00.000002"),
        ]));
        let log = seeded_log().await;
        let state = Arc::new(MemoryState::new());
        let service = TrackerSyncService::new(
            crm,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
            Arc::clone(&state) as Arc<dyn StatePort>,
            100,
            Duration::from_millis(0),
        );

        let stats = service.sync().await.unwrap();

        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.applied, 1);
        assert_eq!(log.records()[0].status, DeliveryStatus::Opened);
        // Cursor still advanced past the ignored row
        assert_eq!(
            state.get_tracker_cursor().await.unwrap().as_deref(),
            Some("2025-06-01 10:00:00.000002")
        );
    }

    #[tokio::test]
    async fn unknown_communication_is_ignored() {
        let crm = Arc::new(MockCrmGateway::new().with_tracker_updates(vec![update(
            "COMM-UNKNOWN",
            DeliveryStatus::Sent,
            "2025-06-01 10:00:00.000001",
        )]));
        let log = seeded_log().await;
        let state = Arc::new(MemoryState::new());
        let service = TrackerSyncService::new(
            crm,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
            Arc::clone(&state) as Arc<dyn StatePort>,
            100,
            Duration::from_millis(0),
        );

        let stats = service.sync().await.unwrap();

        assert_eq!(stats.fetched, 1);
        assert_eq!(stats.applied, 0);
        assert_eq!(log.records()[0].status, DeliveryStatus::Queued);
    }
}
