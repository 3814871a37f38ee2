//! Map CRM API rows to domain entities.
//!
//! The API returns loosely-typed document rows; everything defensive about
//! missing or unexpected fields lives here.

use crate::domain::{
    BroadcastOutcome, BroadcastStatus, DeliveryStatus, Lead, LeadSegment, TrackerUpdate,
};
use serde::Deserialize;

/// Envelope for `/api/method/...` responses.
#[derive(Debug, Deserialize)]
pub(crate) struct MethodEnvelope<T> {
    pub message: T,
}

/// Envelope for `/api/resource/...` list responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeadRow {
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SegmentRow {
    pub name: String,
    pub segmentname: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutcomeRow {
    pub lead: String,
    pub email: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub communication_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackerRow {
    pub communication: Option<String>,
    pub lead: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub modified: String,
}

pub(crate) fn lead_from_row(row: LeadRow) -> Lead {
    Lead {
        name: row.name,
        first_name: row.first_name.unwrap_or_default(),
        last_name: none_if_blank(row.last_name),
        email: none_if_blank(row.email),
        company_name: none_if_blank(row.company_name),
    }
}

/// Segments saved without an explicit segmentname fall back to the document
/// ID, mirroring how the server fills the field on save.
pub(crate) fn segment_from_row(row: SegmentRow) -> LeadSegment {
    let segmentname = match none_if_blank(row.segmentname) {
        Some(s) => s,
        None => row.name.clone(),
    };
    LeadSegment {
        name: row.name,
        segmentname,
        description: none_if_blank(row.description),
    }
}

/// Unknown outcome statuses are treated as errors rather than dropped, so a
/// broadcast report never silently under-counts.
pub(crate) fn outcome_from_row(row: OutcomeRow) -> BroadcastOutcome {
    let status = match row.status.as_str() {
        "success" => BroadcastStatus::Success,
        "skipped" => BroadcastStatus::Skipped,
        _ => BroadcastStatus::Error,
    };
    BroadcastOutcome {
        lead: row.lead,
        email: none_if_blank(row.email),
        status,
        message: row.message.unwrap_or_default(),
        communication_id: none_if_blank(row.communication_id),
    }
}

/// Tracker rows with no communication or an unknown status carry nothing we
/// can apply; they are skipped.
pub(crate) fn tracker_update_from_row(row: TrackerRow) -> Option<TrackerUpdate> {
    let communication_id = none_if_blank(row.communication)?;
    let status = DeliveryStatus::parse(&row.status)?;
    Some(TrackerUpdate {
        communication_id,
        lead: row.lead.unwrap_or_default(),
        status,
        error: none_if_blank(row.error),
        modified: row.modified,
    })
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_row_maps_blank_email_to_none() {
        let lead = lead_from_row(LeadRow {
            name: "CRM-LEAD-2025-00001".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            email: Some("  ".into()),
            company_name: Some("Analytical Engines".into()),
        });
        assert_eq!(lead.email, None);
        assert_eq!(lead.company_name.as_deref(), Some("Analytical Engines"));
    }

    #[test]
    fn segment_row_falls_back_to_document_id() {
        let segment = segment_from_row(SegmentRow {
            name: "LS-0007".into(),
            segmentname: None,
            description: None,
        });
        assert_eq!(segment.segmentname, "LS-0007");
    }

    #[test]
    fn unknown_outcome_status_becomes_error() {
        let outcome = outcome_from_row(OutcomeRow {
            lead: "CRM-LEAD-2025-00001".into(),
            email: None,
            status: "bounced".into(),
            message: Some("mailbox full".into()),
            communication_id: None,
        });
        assert_eq!(outcome.status, BroadcastStatus::Error);
        assert_eq!(outcome.message, "mailbox full");
    }

    #[test]
    fn tracker_row_without_communication_is_dropped() {
        let update = tracker_update_from_row(TrackerRow {
            communication: None,
            lead: Some("CRM-LEAD-2025-00001".into()),
            status: "Sent".into(),
            error: None,
            modified: "2025-06-01 10:00:00.000001".into(),
        });
        assert!(update.is_none());
    }

    #[test]
    fn tracker_row_with_unknown_status_is_dropped() {
        let update = tracker_update_from_row(TrackerRow {
            communication: Some("COMM-1".into()),
            lead: None,
            status: "Expired".into(),
            error: None,
            modified: "2025-06-01 10:00:00.000001".into(),
        });
        assert!(update.is_none());
    }

    #[test]
    fn tracker_row_maps_fully() {
        let update = tracker_update_from_row(TrackerRow {
            communication: Some("COMM-1".into()),
            lead: Some("CRM-LEAD-2025-00001".into()),
            status: "Failed".into(),
            error: Some("SMTP 550".into()),
            modified: "2025-06-01 10:00:00.000001".into(),
        })
        .unwrap();
        assert_eq!(update.communication_id, "COMM-1");
        assert_eq!(update.status, DeliveryStatus::Failed);
        assert_eq!(update.error.as_deref(), Some("SMTP 550"));
    }
}
