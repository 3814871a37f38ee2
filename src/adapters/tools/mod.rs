//! Local tooling adapters (CSV import).

pub mod csv_leads;
