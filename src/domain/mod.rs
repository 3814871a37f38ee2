//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    BroadcastOutcome, BroadcastStatus, CampaignSchedule, CreatedSegment, DeliveryRecord,
    DeliveryStatus, Lead, LeadSegment, NewLead, TrackerUpdate,
};
pub use errors::DomainError;
