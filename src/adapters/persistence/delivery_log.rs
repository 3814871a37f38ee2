//! SQLite-backed delivery log via libsql. Implements DeliveryLogPort.
//!
//! One `deliveries` table, one row per broadcast recipient. Successful sends
//! are keyed by their communication ID so tracker sync can move them through
//! the status machine; skipped/failed rows have no communication and stay
//! terminal. All broadcasts share one database file: data/deliveries.db

use crate::domain::{
    BroadcastOutcome, BroadcastStatus, DeliveryRecord, DeliveryStatus, DomainError, TrackerUpdate,
};
use crate::ports::DeliveryLogPort;
use libsql::{Database, params};
use std::path::{Path, PathBuf};
use tracing::info;

const DELIVERIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS deliveries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    communication_id TEXT UNIQUE,
    segment TEXT NOT NULL,
    lead TEXT NOT NULL,
    email TEXT,
    subject TEXT NOT NULL,
    status TEXT NOT NULL,
    error TEXT,
    updated_at INTEGER NOT NULL
)"#;
const DELIVERIES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_deliveries_segment ON deliveries (segment, updated_at DESC)";

/// SQLite delivery log. One database file (deliveries.db) in the given base
/// directory.
pub struct SqliteDeliveryLog {
    db: Database,
    db_path: PathBuf,
}

impl SqliteDeliveryLog {
    /// Connect to (or create) the SQLite database and ensure the schema
    /// exists. Call this once at startup; the returned log is safe to share
    /// via Arc.
    ///
    /// WAL mode and synchronous=NORMAL: concurrent reads during watch mode
    /// without losing durability.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let db_path = base.join("deliveries.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;

        // PRAGMA returns a row (new value); use query and consume rows
        // (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::DeliveryLog(format!("WAL pragma failed: {}", e)))?;
        while wal_rows
            .next()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?
            .is_some()
        {}
        let mut sync_rows = conn
            .query("PRAGMA synchronous=NORMAL", ())
            .await
            .map_err(|e| DomainError::DeliveryLog(format!("synchronous pragma failed: {}", e)))?;
        while sync_rows
            .next()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?
            .is_some()
        {}

        conn.execute(DELIVERIES_TABLE, ())
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        conn.execute(DELIVERIES_INDEX, ())
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;

        info!(path = %db_path.display(), "delivery log connected (WAL mode)");

        Ok(Self {
            db,
            db_path: db_path.to_path_buf(),
        })
    }

    fn now_unix() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Initial local status for a broadcast outcome: successes enter the
    /// queue, skips and errors are terminal from the start.
    fn initial_status(outcome: &BroadcastOutcome) -> DeliveryStatus {
        match outcome.status {
            BroadcastStatus::Success => DeliveryStatus::Queued,
            BroadcastStatus::Skipped => DeliveryStatus::Skipped,
            BroadcastStatus::Error => DeliveryStatus::Failed,
        }
    }
}

#[async_trait::async_trait]
impl DeliveryLogPort for SqliteDeliveryLog {
    async fn record_outcomes(
        &self,
        segment: &str,
        subject: &str,
        outcomes: &[BroadcastOutcome],
    ) -> Result<(), DomainError> {
        if outcomes.is_empty() {
            return Ok(());
        }
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let now = Self::now_unix();
        for outcome in outcomes {
            let status = Self::initial_status(outcome);
            let error = match outcome.status {
                BroadcastStatus::Error => Some(outcome.message.clone()),
                _ => None,
            };
            tx.execute(
                r#"
                INSERT INTO deliveries (communication_id, segment, lead, email, subject, status, error, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (communication_id) DO NOTHING
                "#,
                params![
                    outcome.communication_id.clone(),
                    segment,
                    outcome.lead.as_str(),
                    outcome.email.clone(),
                    subject,
                    status.as_str(),
                    error,
                    now
                ],
            )
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let abs_path = self
            .db_path
            .canonicalize()
            .unwrap_or_else(|_| self.db_path.clone());
        info!(
            path = %abs_path.display(),
            segment,
            count = outcomes.len(),
            "recorded broadcast outcomes"
        );
        Ok(())
    }

    async fn apply_tracker_update(&self, update: &TrackerUpdate) -> Result<bool, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;

        let mut rows = conn
            .query(
                "SELECT status FROM deliveries WHERE communication_id = ?1",
                params![update.communication_id.as_str()],
            )
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?
        else {
            // Unknown communication: broadcast from another machine or a
            // pre-install send. Nothing to update.
            return Ok(false);
        };
        let current_str: String = row.get(0).map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let Some(current) = DeliveryStatus::parse(&current_str) else {
            return Err(DomainError::DeliveryLog(format!(
                "corrupt status '{}' for communication {}",
                current_str, update.communication_id
            )));
        };
        if !current.can_transition_to(update.status) {
            return Ok(false);
        }

        // Guard on the old status so a concurrent writer can't double-apply.
        let affected = conn
            .execute(
                r#"
                UPDATE deliveries
                SET status = ?1, error = COALESCE(?2, error), updated_at = ?3
                WHERE communication_id = ?4 AND status = ?5
                "#,
                params![
                    update.status.as_str(),
                    update.error.clone(),
                    Self::now_unix(),
                    update.communication_id.as_str(),
                    current.as_str()
                ],
            )
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        Ok(affected > 0)
    }

    async fn get_deliveries(
        &self,
        segment: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DeliveryRecord>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
        let mut rows = match segment {
            Some(seg) => conn
                .query(
                    r#"
                    SELECT communication_id, segment, lead, email, subject, status, error, updated_at
                    FROM deliveries
                    WHERE segment = ?1
                    ORDER BY updated_at DESC, id DESC
                    LIMIT ?2 OFFSET ?3
                    "#,
                    params![seg, limit as i64, offset as i64],
                )
                .await ,
            None => conn
                .query(
                    r#"
                    SELECT communication_id, segment, lead, email, subject, status, error, updated_at
                    FROM deliveries
                    ORDER BY updated_at DESC, id DESC
                    LIMIT ?1 OFFSET ?2
                    "#,
                    params![limit as i64, offset as i64],
                )
                .await,
        }
        .map_err(|e| DomainError::DeliveryLog(e.to_string()))?;

        let mut deliveries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::DeliveryLog(e.to_string()))?
        {
            let communication_id: Option<String> = row.get(0).ok();
            let segment: String = row.get(1).map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
            let lead: String = row.get(2).map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
            let email: Option<String> = row.get(3).ok();
            let subject: String = row.get::<String>(4).unwrap_or_default();
            let status_str: String = row.get(5).map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
            let error: Option<String> = row.get(6).ok();
            let updated_at: i64 = row.get(7).map_err(|e| DomainError::DeliveryLog(e.to_string()))?;
            let status = DeliveryStatus::parse(&status_str).ok_or_else(|| {
                DomainError::DeliveryLog(format!("corrupt status '{}' in delivery log", status_str))
            })?;
            deliveries.push(DeliveryRecord {
                communication_id,
                segment,
                lead,
                email,
                subject,
                status,
                error,
                updated_at,
            });
        }
        Ok(deliveries)
    }
}
