//! CSV lead import. Uses the `csv` crate for safe parsing.
//!
//! Reads `first_name,email[,last_name][,company_name]` rows into NewLead
//! values for the segment-from-data path; the server creates each lead or
//! reuses an existing one matched by email.

use crate::domain::{DomainError, NewLead};
use serde::Deserialize;
use std::path::Path;

/// Raw CSV row. Header names match the server's lead fields.
#[derive(Debug, Deserialize)]
struct LeadCsvRow {
    first_name: String,
    email: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
}

/// Parse leads from a CSV file.
pub async fn read_leads_file(path: impl AsRef<Path>) -> Result<Vec<NewLead>, DomainError> {
    let content = tokio::fs::read_to_string(path.as_ref())
        .await
        .map_err(|e| {
            DomainError::CsvImport(format!("read {}: {}", path.as_ref().display(), e))
        })?;
    parse_leads(&content)
}

/// Parse leads from CSV text. Every row needs a first name and an email;
/// the row number in errors is 1-based and counts the header.
pub fn parse_leads(content: &str) -> Result<Vec<NewLead>, DomainError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut leads = Vec::new();
    for (i, result) in reader.deserialize::<LeadCsvRow>().enumerate() {
        let line = i + 2; // 1-based, after the header row
        let row: LeadCsvRow =
            result.map_err(|e| DomainError::CsvImport(format!("row {}: {}", line, e)))?;
        if row.first_name.is_empty() {
            return Err(DomainError::CsvImport(format!(
                "row {}: first_name is required",
                line
            )));
        }
        if row.email.is_empty() {
            return Err(DomainError::CsvImport(format!(
                "row {}: email is required",
                line
            )));
        }
        leads.push(NewLead {
            first_name: row.first_name,
            email: row.email,
            last_name: row.last_name.filter(|v| !v.is_empty()),
            company_name: row.company_name.filter(|v| !v.is_empty()),
        });
    }

    if leads.is_empty() {
        return Err(DomainError::CsvImport(
            "no lead rows found (expected header: first_name,email,last_name,company_name)"
                .to_string(),
        ));
    }

    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_partial_rows() {
        let csv = "\
first_name,email,last_name,company_name
Ada,ada@example.com,Lovelace,Analytical Engines
Grace,grace@example.com,,
";
        let leads = parse_leads(csv).unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].first_name, "Ada");
        assert_eq!(leads[0].company_name.as_deref(), Some("Analytical Engines"));
        assert_eq!(leads[1].last_name, None);
        assert_eq!(leads[1].company_name, None);
    }

    #[test]
    fn missing_email_names_the_row() {
        let csv = "\
first_name,email
Ada,ada@example.com
Grace,
";
        let err = parse_leads(csv).unwrap_err();
        match err {
            DomainError::CsvImport(msg) => assert!(msg.contains("row 3")),
            other => panic!("expected CsvImport, got {:?}", other),
        }
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = parse_leads("first_name,email\n").unwrap_err();
        assert!(matches!(err, DomainError::CsvImport(_)));
    }

    #[test]
    fn values_are_trimmed() {
        let csv = "first_name,email\n  Ada  ,  ada@example.com  \n";
        let leads = parse_leads(csv).unwrap();
        assert_eq!(leads[0].first_name, "Ada");
        assert_eq!(leads[0].email, "ada@example.com");
    }
}
