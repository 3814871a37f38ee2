//! Infrastructure adapters. Implement outbound ports.
//!
//! CRM API, local persistence, external integrations, UI. Map errors to
//! DomainError.

pub mod crm;
pub mod integrations;
pub mod persistence;
pub mod tools;
pub mod ui;
