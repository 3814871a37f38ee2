//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    BroadcastOutcome, CampaignSchedule, CreatedSegment, DeliveryRecord, DomainError, Lead,
    LeadSegment, NewLead, TrackerUpdate,
};

/// CRM API gateway. Leads, segments, broadcasts, trackers, campaign schedules.
#[async_trait::async_trait]
pub trait CrmGateway: Send + Sync {
    /// Fetch all leads visible to the configured API user.
    async fn list_leads(&self) -> Result<Vec<Lead>, DomainError>;

    /// Fetch all lead segments.
    async fn list_segments(&self) -> Result<Vec<LeadSegment>, DomainError>;

    /// Create a segment grouping existing leads. `lead_names` is forwarded
    /// verbatim: same IDs, same order, no deduplication.
    async fn create_segment(
        &self,
        segmentname: &str,
        lead_names: &[String],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError>;

    /// Create a segment from lead data. The server creates each lead or
    /// reuses an existing one matched by email.
    async fn create_segment_from_data(
        &self,
        segmentname: &str,
        leads_data: &[NewLead],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError>;

    /// Broadcast an email to every lead in a segment. Returns one outcome
    /// per member; per-lead failures do not abort the server-side loop.
    async fn broadcast_to_segment(
        &self,
        segment_name: &str,
        subject: &str,
        message: &str,
        sender_email: &str,
    ) -> Result<Vec<BroadcastOutcome>, DomainError>;

    /// Fetch tracker rows modified strictly after `modified_after`
    /// (all rows when `None`), oldest first, at most `limit` per call.
    async fn fetch_tracker_updates(
        &self,
        modified_after: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TrackerUpdate>, DomainError>;

    /// Append an email schedule to a campaign.
    async fn add_campaign_schedule(
        &self,
        campaign_name: &str,
        schedule: &CampaignSchedule,
    ) -> Result<(), DomainError>;

    /// Remove a campaign's schedule by index. Index validation is the
    /// server's; its error is surfaced verbatim.
    async fn remove_campaign_schedule(
        &self,
        campaign_name: &str,
        schedule_idx: u32,
    ) -> Result<(), DomainError>;
}

/// Local delivery log. One row per broadcast recipient; tracker sync moves
/// rows through the delivery status machine.
#[async_trait::async_trait]
pub trait DeliveryLogPort: Send + Sync {
    /// Record the outcomes of one broadcast. Rows already present (same
    /// communication ID) are left untouched.
    async fn record_outcomes(
        &self,
        segment: &str,
        subject: &str,
        outcomes: &[BroadcastOutcome],
    ) -> Result<(), DomainError>;

    /// Apply one tracker update. Returns true when a status transition was
    /// applied; false for unknown communications, regressions, and repeats.
    async fn apply_tracker_update(&self, update: &TrackerUpdate) -> Result<bool, DomainError>;

    /// Read back recorded deliveries, newest first.
    async fn get_deliveries(
        &self,
        segment: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DeliveryRecord>, DomainError>;
}

/// State port. Tracks the tracker-sync cursor (last server modification
/// timestamp applied) for incremental sync.
#[async_trait::async_trait]
pub trait StatePort: Send + Sync {
    /// Last applied cursor. None on a fresh install (full sync).
    async fn get_tracker_cursor(&self) -> Result<Option<String>, DomainError>;

    /// Advance the cursor after a page of updates has been applied.
    async fn set_tracker_cursor(&self, cursor: &str) -> Result<(), DomainError>;
}
