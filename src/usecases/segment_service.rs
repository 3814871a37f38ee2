//! Segment creation logic: validate input -> forward to the CRM -> return
//! the created segment.
//!
//! - Rejects an empty selection before any remote call
//! - Rejects a blank segment name before any remote call
//! - Forwards the selected lead IDs verbatim (same order, no dedup)

use crate::domain::{CreatedSegment, DomainError, NewLead};
use crate::ports::CrmGateway;
use std::sync::Arc;
use tracing::info;

/// Segment service. Creates lead segments from a selection or imported data.
pub struct SegmentService {
    crm: Arc<dyn CrmGateway>,
}

impl SegmentService {
    pub fn new(crm: Arc<dyn CrmGateway>) -> Self {
        Self { crm }
    }

    /// Create a segment from selected lead IDs.
    ///
    /// The IDs reach the gateway exactly as given: presentation order, no
    /// duplicates introduced or removed.
    pub async fn create_from_selection(
        &self,
        segmentname: &str,
        lead_names: &[String],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError> {
        let name = validated_name(segmentname)?;
        if lead_names.is_empty() {
            return Err(DomainError::Validation(
                "select at least one lead".to_string(),
            ));
        }

        let segment = self
            .crm
            .create_segment(&name, lead_names, normalized_description(description))
            .await?;

        info!(
            segment = %segment.segmentname,
            leads = segment.leads.len(),
            "segment created"
        );
        Ok(segment)
    }

    /// Create a segment from lead data (e.g. a CSV import). The server
    /// creates each lead or reuses an existing one matched by email.
    pub async fn create_from_lead_data(
        &self,
        segmentname: &str,
        leads_data: &[NewLead],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError> {
        let name = validated_name(segmentname)?;
        if leads_data.is_empty() {
            return Err(DomainError::Validation(
                "the import contains no leads".to_string(),
            ));
        }

        let segment = self
            .crm
            .create_segment_from_data(&name, leads_data, normalized_description(description))
            .await?;

        info!(
            segment = %segment.segmentname,
            leads = segment.leads.len(),
            "segment created from lead data"
        );
        Ok(segment)
    }
}

/// Trimmed, non-empty segment name or a validation error.
fn validated_name(segmentname: &str) -> Result<String, DomainError> {
    let name = segmentname.trim();
    if name.is_empty() {
        return Err(DomainError::Validation(
            "segment name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Empty descriptions collapse to None so the server field stays unset.
fn normalized_description(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crm::mock_gateway::MockCrmGateway;

    #[tokio::test]
    async fn empty_selection_never_reaches_the_gateway() {
        let crm = Arc::new(MockCrmGateway::new());
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);

        let err = service
            .create_from_selection("seg1", &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(crm.created_segments().is_empty());
    }

    #[tokio::test]
    async fn blank_name_rejected_before_any_call() {
        let crm = Arc::new(MockCrmGateway::new());
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);

        let err = service
            .create_from_selection("   ", &["CRM-LEAD-2025-00001".into()], None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(crm.created_segments().is_empty());
    }

    #[tokio::test]
    async fn selection_is_forwarded_in_order() {
        let crm = Arc::new(MockCrmGateway::new());
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);
        let ids = vec![
            "CRM-LEAD-2025-00002".to_string(),
            "CRM-LEAD-2025-00001".to_string(),
            "CRM-LEAD-2025-00003".to_string(),
        ];

        let created = service
            .create_from_selection("seg1", &ids, Some("Test Segment"))
            .await
            .unwrap();

        assert_eq!(created.segmentname, "seg1");
        let calls = crm.created_segments();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].segmentname, "seg1");
        assert_eq!(calls[0].lead_names, ids);
        assert_eq!(calls[0].description.as_deref(), Some("Test Segment"));
    }

    #[tokio::test]
    async fn empty_description_collapses_to_none() {
        let crm = Arc::new(MockCrmGateway::new());
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);

        service
            .create_from_selection("seg1", &["CRM-LEAD-2025-00001".into()], Some("  "))
            .await
            .unwrap();

        assert_eq!(crm.created_segments()[0].description, None);
    }

    #[tokio::test]
    async fn gateway_error_propagates() {
        let crm = Arc::new(MockCrmGateway::new().failing("segment quota exceeded"));
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);

        let err = service
            .create_from_selection("seg1", &["CRM-LEAD-2025-00001".into()], None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::CrmGateway(_)));
    }

    #[tokio::test]
    async fn lead_data_is_forwarded() {
        let crm = Arc::new(MockCrmGateway::new());
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);
        let leads = vec![NewLead {
            first_name: "Ada".into(),
            email: "ada@example.com".into(),
            last_name: Some("Lovelace".into()),
            company_name: None,
        }];

        service
            .create_from_lead_data("imported", &leads, None)
            .await
            .unwrap();

        let calls = crm.created_segments();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].leads_data.len(), 1);
        assert_eq!(calls[0].leads_data[0].email, "ada@example.com");
    }

    #[tokio::test]
    async fn empty_lead_data_rejected() {
        let crm = Arc::new(MockCrmGateway::new());
        let service = SegmentService::new(Arc::clone(&crm) as Arc<dyn CrmGateway>);

        let err = service
            .create_from_lead_data("seg1", &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }
}
