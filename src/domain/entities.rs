//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here — these are mapped from adapters.

use serde::{Deserialize, Serialize};

/// A CRM lead (prospect record). Read-only mirror of the server document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Server document ID (e.g. "CRM-LEAD-2025-00134").
    pub name: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
}

impl Lead {
    /// Human-readable name: "First Last", falling back to the document ID
    /// when both name parts are blank.
    pub fn display_name(&self) -> String {
        let full = match self.last_name.as_deref() {
            Some(last) if !last.trim().is_empty() => {
                format!("{} {}", self.first_name.trim(), last.trim())
            }
            _ => self.first_name.trim().to_string(),
        };
        if full.is_empty() {
            self.name.clone()
        } else {
            full
        }
    }
}

/// Lead data submitted to the server, which creates the lead or reuses an
/// existing one matched by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLead {
    pub first_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// A named grouping of leads, used as a broadcast audience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSegment {
    /// Server document ID.
    pub name: String,
    pub segmentname: String,
    pub description: Option<String>,
}

/// Server response to segment creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSegment {
    pub name: String,
    pub segmentname: String,
    /// Member lead IDs, in the order the segment stores them.
    pub leads: Vec<String>,
}

/// Per-lead result of a segment broadcast, as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastOutcome {
    /// Lead document ID.
    pub lead: String,
    pub email: Option<String>,
    pub status: BroadcastStatus,
    pub message: String,
    /// Communication record created for a successful send; used to track
    /// delivery afterwards.
    pub communication_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    /// Email handed to the server's outgoing queue.
    Success,
    /// Lead has no email address; nothing was sent.
    Skipped,
    /// Server-side send error for this lead; the loop continued.
    Error,
}

/// Delivery state of a broadcast recipient. Moves forward only:
/// Queued -> Sent | Failed, Sent -> Opened | Failed. Skipped is local-only
/// (the lead had no email address; nothing was ever queued).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Queued,
    Sent,
    Failed,
    Opened,
    Skipped,
}

impl DeliveryStatus {
    /// Whether a tracker update may move a delivery from `self` to `next`.
    /// Failed, Opened and Skipped are terminal; regressions are ignored.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        match self {
            DeliveryStatus::Queued => matches!(
                next,
                DeliveryStatus::Sent | DeliveryStatus::Failed | DeliveryStatus::Opened
            ),
            DeliveryStatus::Sent => {
                matches!(next, DeliveryStatus::Failed | DeliveryStatus::Opened)
            }
            DeliveryStatus::Failed | DeliveryStatus::Opened | DeliveryStatus::Skipped => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Queued => "Queued",
            DeliveryStatus::Sent => "Sent",
            DeliveryStatus::Failed => "Failed",
            DeliveryStatus::Opened => "Opened",
            DeliveryStatus::Skipped => "Skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Queued" => Some(DeliveryStatus::Queued),
            "Sent" => Some(DeliveryStatus::Sent),
            "Failed" => Some(DeliveryStatus::Failed),
            "Opened" => Some(DeliveryStatus::Opened),
            "Skipped" => Some(DeliveryStatus::Skipped),
            _ => None,
        }
    }
}

/// One tracker row fetched from the server during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerUpdate {
    /// Communication record the tracker points at.
    pub communication_id: String,
    /// Lead document ID.
    pub lead: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    /// Server-side modification timestamp ("%Y-%m-%d %H:%M:%S.%6f").
    /// Lexicographic order equals chronological order; used as sync cursor.
    pub modified: String,
}

/// A delivery mirrored in the local log: one row per broadcast recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub communication_id: Option<String>,
    pub segment: String,
    pub lead: String,
    pub email: Option<String>,
    pub subject: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    /// Unix seconds of the last local update.
    pub updated_at: i64,
}

/// One email-schedule entry attached to a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSchedule {
    pub email_template: String,
    pub send_after_days: i64,
    pub send_after_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_parts() {
        let lead = Lead {
            name: "CRM-LEAD-2025-00001".into(),
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            email: None,
            company_name: None,
        };
        assert_eq!(lead.display_name(), "Ada Lovelace");
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let lead = Lead {
            name: "CRM-LEAD-2025-00002".into(),
            first_name: "  ".into(),
            last_name: None,
            email: None,
            company_name: None,
        };
        assert_eq!(lead.display_name(), "CRM-LEAD-2025-00002");
    }

    #[test]
    fn delivery_status_forward_transitions() {
        use DeliveryStatus::*;
        assert!(Queued.can_transition_to(Sent));
        assert!(Queued.can_transition_to(Failed));
        assert!(Queued.can_transition_to(Opened));
        assert!(Sent.can_transition_to(Opened));
        assert!(Sent.can_transition_to(Failed));
    }

    #[test]
    fn delivery_status_terminal_and_regressions() {
        use DeliveryStatus::*;
        assert!(!Sent.can_transition_to(Queued));
        assert!(!Sent.can_transition_to(Sent));
        assert!(!Failed.can_transition_to(Sent));
        assert!(!Failed.can_transition_to(Opened));
        assert!(!Opened.can_transition_to(Failed));
        assert!(!Skipped.can_transition_to(Sent));
    }

    #[test]
    fn delivery_status_round_trips_as_str() {
        for s in [
            DeliveryStatus::Queued,
            DeliveryStatus::Sent,
            DeliveryStatus::Failed,
            DeliveryStatus::Opened,
            DeliveryStatus::Skipped,
        ] {
            assert_eq!(DeliveryStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(DeliveryStatus::parse("Cancelled"), None);
    }
}
