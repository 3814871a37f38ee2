//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("CRM gateway error: {0}")]
    CrmGateway(String),

    /// Local input validation (empty selection, blank required field).
    /// Raised before any remote call is made.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("delivery log error: {0}")]
    DeliveryLog(String),

    #[error("state error: {0}")]
    State(String),

    #[error("CSV import error: {0}")]
    CsvImport(String),

    #[error("task tracker error: {0}")]
    TaskTracker(String),

    /// Rate limit from the CRM API (HTTP 429): caller should retry after
    /// `seconds` seconds. The gateway retries a few times before surfacing this.
    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },

    #[error("prompt error: {0}")]
    Prompt(String),
}
