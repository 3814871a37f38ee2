//! Task tracker outbound port. Create follow-up tasks in external systems
//! (e.g. Trello).

use crate::domain::DomainError;

/// Port for creating follow-up tasks in an external task tracker.
///
/// Implemented by adapters (e.g. Trello). When not configured, watch mode
/// still reports failed deliveries in the log but creates no tasks.
#[async_trait::async_trait]
pub trait TaskTrackerPort: Send + Sync {
    /// Create a single task in the tracker.
    ///
    /// # Arguments
    /// * `title` - Short task title (e.g. card name)
    /// * `description` - Longer description (e.g. the delivery error)
    ///
    /// # Errors
    /// Returns `DomainError` if the API call fails.
    async fn create_task(&self, title: &str, description: &str) -> Result<(), DomainError>;
}
