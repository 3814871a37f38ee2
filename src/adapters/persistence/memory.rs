//! In-memory DeliveryLogPort/StatePort implementations.
//!
//! Used by unit tests and by demo mode (no CRM configured), so mock
//! broadcasts never pollute the real delivery database.

use crate::domain::{
    BroadcastOutcome, BroadcastStatus, DeliveryRecord, DeliveryStatus, DomainError, TrackerUpdate,
};
use crate::ports::{DeliveryLogPort, StatePort};
use std::sync::Mutex;

/// In-memory delivery log. Same transition rules as the SQLite log.
pub struct MemoryDeliveryLog {
    rows: Mutex<Vec<DeliveryRecord>>,
}

impl MemoryDeliveryLog {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all rows, insertion order. Test/demo helper.
    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.rows.lock().expect("memory log lock poisoned").clone()
    }

    fn now_unix() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl Default for MemoryDeliveryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeliveryLogPort for MemoryDeliveryLog {
    async fn record_outcomes(
        &self,
        segment: &str,
        subject: &str,
        outcomes: &[BroadcastOutcome],
    ) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().expect("memory log lock poisoned");
        for outcome in outcomes {
            if let Some(ref comm) = outcome.communication_id {
                let seen = rows
                    .iter()
                    .any(|r| r.communication_id.as_deref() == Some(comm.as_str()));
                if seen {
                    continue;
                }
            }
            let (status, error) = match outcome.status {
                BroadcastStatus::Success => (DeliveryStatus::Queued, None),
                BroadcastStatus::Skipped => (DeliveryStatus::Skipped, None),
                BroadcastStatus::Error => {
                    (DeliveryStatus::Failed, Some(outcome.message.clone()))
                }
            };
            rows.push(DeliveryRecord {
                communication_id: outcome.communication_id.clone(),
                segment: segment.to_string(),
                lead: outcome.lead.clone(),
                email: outcome.email.clone(),
                subject: subject.to_string(),
                status,
                error,
                updated_at: Self::now_unix(),
            });
        }
        Ok(())
    }

    async fn apply_tracker_update(&self, update: &TrackerUpdate) -> Result<bool, DomainError> {
        let mut rows = self.rows.lock().expect("memory log lock poisoned");
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.communication_id.as_deref() == Some(update.communication_id.as_str()))
        else {
            return Ok(false);
        };
        if !row.status.can_transition_to(update.status) {
            return Ok(false);
        }
        row.status = update.status;
        if update.error.is_some() {
            row.error = update.error.clone();
        }
        row.updated_at = Self::now_unix();
        Ok(true)
    }

    async fn get_deliveries(
        &self,
        segment: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DeliveryRecord>, DomainError> {
        let rows = self.rows.lock().expect("memory log lock poisoned");
        Ok(rows
            .iter()
            .rev()
            .filter(|r| segment.is_none_or(|s| r.segment == s))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// In-memory StatePort.
pub struct MemoryState {
    cursor: Mutex<Option<String>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self {
            cursor: Mutex::new(None),
        }
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StatePort for MemoryState {
    async fn get_tracker_cursor(&self) -> Result<Option<String>, DomainError> {
        Ok(self.cursor.lock().expect("state lock poisoned").clone())
    }

    async fn set_tracker_cursor(&self, cursor: &str) -> Result<(), DomainError> {
        *self.cursor.lock().expect("state lock poisoned") = Some(cursor.to_string());
        Ok(())
    }
}
