//! crm-sync: Lead segmentation and broadcast companion for a Frappe-style
//! CRM, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
