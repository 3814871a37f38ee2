//! Application use cases. Orchestrate domain logic via ports.

pub mod broadcast_service;
pub mod segment_service;
pub mod tracker_sync_service;
pub mod watch_service;

pub use broadcast_service::{BroadcastReport, BroadcastService};
pub use segment_service::SegmentService;
pub use tracker_sync_service::{SyncStats, TrackerSyncService};
pub use watch_service::WatchService;
