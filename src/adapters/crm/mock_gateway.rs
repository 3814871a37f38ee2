//! Mock CRM gateway for testing and for running without a server.
//!
//! Returns canned leads and segments, records every mutating call, and
//! simulates network latency with a configurable delay. Used as the demo
//! fallback when the CRM API is not configured.

use crate::domain::{
    BroadcastOutcome, BroadcastStatus, CampaignSchedule, CreatedSegment, DomainError, Lead,
    LeadSegment, NewLead, TrackerUpdate,
};
use crate::ports::CrmGateway;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// A recorded `create_segment` / `create_segment_from_data` invocation.
#[derive(Debug, Clone)]
pub struct CreateSegmentCall {
    pub segmentname: String,
    pub lead_names: Vec<String>,
    pub leads_data: Vec<NewLead>,
    pub description: Option<String>,
}

/// A recorded `broadcast_to_segment` invocation.
#[derive(Debug, Clone)]
pub struct BroadcastCall {
    pub segment_name: String,
    pub subject: String,
    pub message: String,
    pub sender_email: String,
}

/// Mock CRM gateway.
///
/// Canned data, no network. Mutating calls are recorded so tests can assert
/// exactly what would have reached the server.
pub struct MockCrmGateway {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
    /// When set, every call fails with this gateway error.
    failure: Option<String>,
    leads: Vec<Lead>,
    segments: Vec<LeadSegment>,
    broadcast_outcomes: Option<Vec<BroadcastOutcome>>,
    tracker_updates: Vec<TrackerUpdate>,
    created: Mutex<Vec<CreateSegmentCall>>,
    broadcasts: Mutex<Vec<BroadcastCall>>,
}

impl MockCrmGateway {
    /// Create a mock with demo leads/segments and no simulated latency.
    pub fn new() -> Self {
        Self {
            delay_ms: 0,
            failure: None,
            leads: demo_leads(),
            segments: demo_segments(),
            broadcast_outcomes: None,
            tracker_updates: Vec::new(),
            created: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Demo-mode mock: simulated latency so the TUI feels like a real server.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new()
        }
    }

    /// Every subsequent call fails with `message` as a gateway error.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Replace the canned broadcast outcomes.
    pub fn with_broadcast_outcomes(mut self, outcomes: Vec<BroadcastOutcome>) -> Self {
        self.broadcast_outcomes = Some(outcomes);
        self
    }

    /// Replace the canned tracker updates served by `fetch_tracker_updates`.
    pub fn with_tracker_updates(mut self, updates: Vec<TrackerUpdate>) -> Self {
        self.tracker_updates = updates;
        self
    }

    /// Recorded segment-creation calls, in invocation order.
    pub fn created_segments(&self) -> Vec<CreateSegmentCall> {
        self.created.lock().expect("mock lock poisoned").clone()
    }

    /// Recorded broadcast calls, in invocation order.
    pub fn broadcasts(&self) -> Vec<BroadcastCall> {
        self.broadcasts.lock().expect("mock lock poisoned").clone()
    }

    async fn simulate(&self, what: &str) -> Result<(), DomainError> {
        if self.delay_ms > 0 {
            info!(what, "[MOCK] simulating CRM API call");
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        match &self.failure {
            Some(message) => Err(DomainError::CrmGateway(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockCrmGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CrmGateway for MockCrmGateway {
    async fn list_leads(&self) -> Result<Vec<Lead>, DomainError> {
        self.simulate("list_leads").await?;
        Ok(self.leads.clone())
    }

    async fn list_segments(&self) -> Result<Vec<LeadSegment>, DomainError> {
        self.simulate("list_segments").await?;
        Ok(self.segments.clone())
    }

    async fn create_segment(
        &self,
        segmentname: &str,
        lead_names: &[String],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError> {
        self.simulate("create_segment").await?;
        self.created
            .lock()
            .expect("mock lock poisoned")
            .push(CreateSegmentCall {
                segmentname: segmentname.to_string(),
                lead_names: lead_names.to_vec(),
                leads_data: Vec::new(),
                description: description.map(String::from),
            });
        Ok(CreatedSegment {
            name: segmentname.to_string(),
            segmentname: segmentname.to_string(),
            leads: lead_names.to_vec(),
        })
    }

    async fn create_segment_from_data(
        &self,
        segmentname: &str,
        leads_data: &[NewLead],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError> {
        self.simulate("create_segment_from_data").await?;
        self.created
            .lock()
            .expect("mock lock poisoned")
            .push(CreateSegmentCall {
                segmentname: segmentname.to_string(),
                lead_names: Vec::new(),
                leads_data: leads_data.to_vec(),
                description: description.map(String::from),
            });
        // The server would create-or-reuse leads; the mock invents IDs.
        let leads = (1..=leads_data.len())
            .map(|i| format!("CRM-LEAD-MOCK-{:05}", i))
            .collect();
        Ok(CreatedSegment {
            name: segmentname.to_string(),
            segmentname: segmentname.to_string(),
            leads,
        })
    }

    async fn broadcast_to_segment(
        &self,
        segment_name: &str,
        subject: &str,
        message: &str,
        sender_email: &str,
    ) -> Result<Vec<BroadcastOutcome>, DomainError> {
        self.simulate("broadcast_to_segment").await?;
        self.broadcasts
            .lock()
            .expect("mock lock poisoned")
            .push(BroadcastCall {
                segment_name: segment_name.to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
                sender_email: sender_email.to_string(),
            });
        if let Some(ref outcomes) = self.broadcast_outcomes {
            return Ok(outcomes.clone());
        }
        // Default: one success per demo lead with an email, skips otherwise.
        Ok(self
            .leads
            .iter()
            .enumerate()
            .map(|(i, lead)| match &lead.email {
                Some(email) => BroadcastOutcome {
                    lead: lead.name.clone(),
                    email: Some(email.clone()),
                    status: BroadcastStatus::Success,
                    message: "Email sent via SMTP and logged".to_string(),
                    communication_id: Some(format!("COMM-MOCK-{:05}", i + 1)),
                },
                None => BroadcastOutcome {
                    lead: lead.name.clone(),
                    email: None,
                    status: BroadcastStatus::Skipped,
                    message: "Lead has no email address".to_string(),
                    communication_id: None,
                },
            })
            .collect())
    }

    async fn fetch_tracker_updates(
        &self,
        modified_after: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TrackerUpdate>, DomainError> {
        self.simulate("fetch_tracker_updates").await?;
        let mut updates: Vec<TrackerUpdate> = self
            .tracker_updates
            .iter()
            .filter(|u| match modified_after {
                Some(cursor) => u.modified.as_str() > cursor,
                None => true,
            })
            .cloned()
            .collect();
        updates.sort_by(|a, b| a.modified.cmp(&b.modified));
        updates.truncate(limit as usize);
        Ok(updates)
    }

    async fn add_campaign_schedule(
        &self,
        campaign_name: &str,
        schedule: &CampaignSchedule,
    ) -> Result<(), DomainError> {
        self.simulate("add_campaign_schedule").await?;
        info!(
            campaign = campaign_name,
            template = %schedule.email_template,
            "[MOCK] schedule added"
        );
        Ok(())
    }

    async fn remove_campaign_schedule(
        &self,
        campaign_name: &str,
        schedule_idx: u32,
    ) -> Result<(), DomainError> {
        self.simulate("remove_campaign_schedule").await?;
        info!(
            campaign = campaign_name,
            schedule_idx, "[MOCK] schedule removed"
        );
        Ok(())
    }
}

fn demo_leads() -> Vec<Lead> {
    vec![
        Lead {
            name: "CRM-LEAD-2025-00001".into(),
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            company_name: Some("Analytical Engines".into()),
        },
        Lead {
            name: "CRM-LEAD-2025-00002".into(),
            first_name: "Grace".into(),
            last_name: Some("Hopper".into()),
            email: Some("grace@example.com".into()),
            company_name: Some("Compilers Inc".into()),
        },
        Lead {
            name: "CRM-LEAD-2025-00003".into(),
            first_name: "Nikola".into(),
            last_name: Some("Tesla".into()),
            email: None,
            company_name: Some("Wardenclyffe".into()),
        },
    ]
}

fn demo_segments() -> Vec<LeadSegment> {
    vec![LeadSegment {
        name: "LS-0001".into(),
        segmentname: "Early adopters".into(),
        description: Some("Demo segment".into()),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_created_segments() {
        let mock = MockCrmGateway::new();
        mock.create_segment("seg1", &["CRM-LEAD-2025-00001".into()], Some("d"))
            .await
            .unwrap();

        let calls = mock.created_segments();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].segmentname, "seg1");
    }

    #[tokio::test]
    async fn default_broadcast_skips_leads_without_email() {
        let mock = MockCrmGateway::new();
        let outcomes = mock
            .broadcast_to_segment("seg1", "s", "m", "sales@example.com")
            .await
            .unwrap();

        let skipped = outcomes
            .iter()
            .filter(|o| o.status == BroadcastStatus::Skipped)
            .count();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn tracker_updates_respect_cursor_and_limit() {
        let updates = vec![
            TrackerUpdate {
                communication_id: "COMM-1".into(),
                lead: "CRM-LEAD-2025-00001".into(),
                status: crate::domain::DeliveryStatus::Sent,
                error: None,
                modified: "2025-06-01 10:00:00.000001".into(),
            },
            TrackerUpdate {
                communication_id: "COMM-2".into(),
                lead: "CRM-LEAD-2025-00002".into(),
                status: crate::domain::DeliveryStatus::Sent,
                error: None,
                modified: "2025-06-01 10:00:00.000002".into(),
            },
        ];
        let mock = MockCrmGateway::new().with_tracker_updates(updates);

        let page = mock
            .fetch_tracker_updates(Some("2025-06-01 10:00:00.000001"), 100)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].communication_id, "COMM-2");

        let limited = mock.fetch_tracker_updates(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].communication_id, "COMM-1");
    }
}
