//! Broadcast logic: validate input -> invoke the server-side send loop ->
//! mirror the per-lead outcomes into the local delivery log.
//!
//! Email delivery itself is owned by the CRM server; a partial failure there
//! is reported per lead and never retried from here.

use crate::domain::{BroadcastOutcome, BroadcastStatus, DomainError};
use crate::ports::{CrmGateway, DeliveryLogPort};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one segment broadcast, tallied from the server's outcomes.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<BroadcastOutcome>,
}

impl BroadcastReport {
    fn tally(outcomes: Vec<BroadcastOutcome>) -> Self {
        let mut report = BroadcastReport::default();
        for outcome in &outcomes {
            match outcome.status {
                BroadcastStatus::Success => report.sent += 1,
                BroadcastStatus::Skipped => report.skipped += 1,
                BroadcastStatus::Error => report.failed += 1,
            }
        }
        report.outcomes = outcomes;
        report
    }
}

/// Broadcast service. One remote call per broadcast; outcomes land in the
/// delivery log so tracker sync can follow them afterwards.
pub struct BroadcastService {
    crm: Arc<dyn CrmGateway>,
    log: Arc<dyn DeliveryLogPort>,
}

impl BroadcastService {
    pub fn new(crm: Arc<dyn CrmGateway>, log: Arc<dyn DeliveryLogPort>) -> Self {
        Self { crm, log }
    }

    /// Send an email to every lead in `segment_name`.
    ///
    /// All four fields are required; validation happens before the remote
    /// call. On a gateway error nothing is written to the delivery log.
    pub async fn broadcast(
        &self,
        segment_name: &str,
        subject: &str,
        message: &str,
        sender_email: &str,
    ) -> Result<BroadcastReport, DomainError> {
        for (value, field) in [
            (segment_name, "segment"),
            (subject, "subject"),
            (message, "message"),
            (sender_email, "sender email"),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{} is required", field)));
            }
        }

        let outcomes = self
            .crm
            .broadcast_to_segment(segment_name, subject, message, sender_email)
            .await?;

        self.log
            .record_outcomes(segment_name, subject, &outcomes)
            .await?;

        let report = BroadcastReport::tally(outcomes);
        if report.failed > 0 {
            warn!(
                segment = segment_name,
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "broadcast finished with failures"
            );
        } else {
            info!(
                segment = segment_name,
                sent = report.sent,
                skipped = report.skipped,
                "broadcast finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crm::mock_gateway::MockCrmGateway;
    use crate::adapters::persistence::memory::MemoryDeliveryLog;

    fn outcome(lead: &str, status: BroadcastStatus, comm: Option<&str>) -> BroadcastOutcome {
        BroadcastOutcome {
            lead: lead.to_string(),
            email: Some(format!("{}@example.com", lead)),
            status,
            message: "ok".to_string(),
            communication_id: comm.map(String::from),
        }
    }

    #[tokio::test]
    async fn blank_subject_rejected_before_any_call() {
        let crm = Arc::new(MockCrmGateway::new());
        let log = Arc::new(MemoryDeliveryLog::new());
        let service = BroadcastService::new(
            Arc::clone(&crm) as Arc<dyn CrmGateway>,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
        );

        let err = service
            .broadcast("seg1", "  ", "body", "sales@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(crm.broadcasts().is_empty());
        assert!(log.records().is_empty());
    }

    #[tokio::test]
    async fn outcomes_are_tallied_and_logged() {
        let crm = Arc::new(MockCrmGateway::new().with_broadcast_outcomes(vec![
            outcome("CRM-LEAD-2025-00001", BroadcastStatus::Success, Some("COMM-1")),
            outcome("CRM-LEAD-2025-00002", BroadcastStatus::Skipped, None),
            outcome("CRM-LEAD-2025-00003", BroadcastStatus::Error, None),
            outcome("CRM-LEAD-2025-00004", BroadcastStatus::Success, Some("COMM-2")),
        ]));
        let log = Arc::new(MemoryDeliveryLog::new());
        let service = BroadcastService::new(
            Arc::clone(&crm) as Arc<dyn CrmGateway>,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
        );

        let report = service
            .broadcast("seg1", "Hello", "body", "sales@example.com")
            .await
            .unwrap();

        assert_eq!(report.sent, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(log.records().len(), 4);
    }

    #[tokio::test]
    async fn gateway_error_leaves_the_log_untouched() {
        let crm = Arc::new(MockCrmGateway::new().failing("permission denied"));
        let log = Arc::new(MemoryDeliveryLog::new());
        let service = BroadcastService::new(
            Arc::clone(&crm) as Arc<dyn CrmGateway>,
            Arc::clone(&log) as Arc<dyn DeliveryLogPort>,
        );

        let err = service
            .broadcast("seg1", "Hello", "body", "sales@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::CrmGateway(_)));
        assert!(log.records().is_empty());
    }
}
