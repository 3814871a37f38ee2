//! Implements CrmGateway against a Frappe-style HTTP API.
//!
//! Token auth ("token key:secret"), JSON bodies, and the framework's
//! response envelopes ({"message": ...} for methods, {"data": ...} for
//! resource listings). Handles HTTP 429 by sleeping out Retry-After and
//! retrying a few times before surfacing RateLimited.

use crate::adapters::crm::mapper;
use crate::domain::{
    BroadcastOutcome, CampaignSchedule, CreatedSegment, DomainError, Lead, LeadSegment, NewLead,
    TrackerUpdate,
};
use crate::ports::CrmGateway;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const METHOD_CREATE_SEGMENT: &str = "crm_override.api.create_lead_segment";
const METHOD_BROADCAST: &str = "crm_override.api.broadcast_to_segment";
const METHOD_ADD_SCHEDULE: &str = "crm_override.campaign_utils.add_schedule_to_campaign";
const METHOD_REMOVE_SCHEDULE: &str = "crm_override.campaign_utils.remove_schedule_from_campaign";

/// Retry attempts for HTTP 429 before surfacing the rate limit to the caller.
const RATE_LIMIT_ATTEMPTS: u32 = 3;
/// Fallback wait when the 429 response has no usable Retry-After header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Frappe CRM gateway adapter. Plain reqwest client; one instance shared
/// via Arc across services.
pub struct FrappeCrmGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    /// If set, sleep this many ms before each API request (rate limiting).
    request_delay_ms: Option<u64>,
}

impl FrappeCrmGateway {
    /// Create a gateway for `base_url` (no trailing slash) with token auth.
    /// `request_delay_ms`: optional delay in ms before each request
    /// (e.g. 200 for throttling).
    pub fn new(
        base_url: String,
        api_key: String,
        api_secret: String,
        request_delay_ms: Option<u64>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            request_delay_ms,
        }
    }

    fn auth_value(&self) -> String {
        format!("token {}:{}", self.api_key, self.api_secret)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }

    fn resource_url(&self, doctype: &str) -> String {
        // Doctype names contain spaces ("CRM Lead"); encode them for the path.
        format!(
            "{}/api/resource/{}",
            self.base_url,
            doctype.replace(' ', "%20")
        )
    }

    async fn throttle(&self) {
        if let Some(ms) = self.request_delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    /// POST an RPC method and unwrap the {"message": ...} envelope.
    async fn post_method<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, DomainError> {
        let url = self.method_url(method);
        let mut retry_after = DEFAULT_RETRY_AFTER_SECS;

        for attempt in 0..RATE_LIMIT_ATTEMPTS {
            self.throttle().await;
            let response = self
                .client
                .post(&url)
                .header("Authorization", self.auth_value())
                .json(body)
                .send()
                .await
                .map_err(|e| DomainError::CrmGateway(format!("request failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retry_after = retry_after_secs(&response);
                warn!(method, attempt, retry_after, "CRM API rate limited");
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(api_error(method, response).await);
            }

            let envelope: mapper::MethodEnvelope<T> = response
                .json()
                .await
                .map_err(|e| DomainError::CrmGateway(format!("malformed response: {}", e)))?;
            return Ok(envelope.message);
        }

        Err(DomainError::RateLimited {
            seconds: retry_after,
        })
    }

    /// GET a resource listing and unwrap the {"data": [...]} envelope.
    async fn get_list<T: DeserializeOwned>(
        &self,
        doctype: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DomainError> {
        let url = self.resource_url(doctype);
        let mut retry_after = DEFAULT_RETRY_AFTER_SECS;

        for attempt in 0..RATE_LIMIT_ATTEMPTS {
            self.throttle().await;
            let response = self
                .client
                .get(&url)
                .header("Authorization", self.auth_value())
                .query(query)
                .send()
                .await
                .map_err(|e| DomainError::CrmGateway(format!("request failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retry_after = retry_after_secs(&response);
                warn!(doctype, attempt, retry_after, "CRM API rate limited");
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(api_error(doctype, response).await);
            }

            let envelope: mapper::ListEnvelope<T> = response
                .json()
                .await
                .map_err(|e| DomainError::CrmGateway(format!("malformed response: {}", e)))?;
            return Ok(envelope.data);
        }

        Err(DomainError::RateLimited {
            seconds: retry_after,
        })
    }
}

/// Parse Retry-After (seconds form); fall back to a short default.
fn retry_after_secs(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

async fn api_error(context: &str, response: reqwest::Response) -> DomainError {
    let status = response.status();
    let text = response.text().await.unwrap_or_else(|_| "unknown".into());
    DomainError::CrmGateway(format!(
        "{}: API error {}: {}",
        context,
        status,
        text.chars().take(200).collect::<String>()
    ))
}

#[async_trait]
impl CrmGateway for FrappeCrmGateway {
    async fn list_leads(&self) -> Result<Vec<Lead>, DomainError> {
        let fields = r#"["name","first_name","last_name","email","company_name"]"#;
        let rows: Vec<mapper::LeadRow> = self
            .get_list(
                "CRM Lead",
                &[
                    ("fields", fields.to_string()),
                    ("order_by", "name asc".to_string()),
                    // 0 = no page limit; lead lists are small enough to load whole
                    ("limit_page_length", "0".to_string()),
                ],
            )
            .await?;
        debug!(count = rows.len(), "fetched leads");
        Ok(rows.into_iter().map(mapper::lead_from_row).collect())
    }

    async fn list_segments(&self) -> Result<Vec<LeadSegment>, DomainError> {
        let fields = r#"["name","segmentname","description"]"#;
        let rows: Vec<mapper::SegmentRow> = self
            .get_list(
                "Lead Segment",
                &[
                    ("fields", fields.to_string()),
                    ("order_by", "modified desc".to_string()),
                    ("limit_page_length", "0".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(mapper::segment_from_row).collect())
    }

    async fn create_segment(
        &self,
        segmentname: &str,
        lead_names: &[String],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError> {
        let body = serde_json::json!({
            "segmentname": segmentname,
            "lead_names": lead_names,
            "description": description,
        });
        self.post_method(METHOD_CREATE_SEGMENT, &body).await
    }

    async fn create_segment_from_data(
        &self,
        segmentname: &str,
        leads_data: &[NewLead],
        description: Option<&str>,
    ) -> Result<CreatedSegment, DomainError> {
        let body = serde_json::json!({
            "segmentname": segmentname,
            "leads_data": leads_data,
            "description": description,
        });
        self.post_method(METHOD_CREATE_SEGMENT, &body).await
    }

    async fn broadcast_to_segment(
        &self,
        segment_name: &str,
        subject: &str,
        message: &str,
        sender_email: &str,
    ) -> Result<Vec<BroadcastOutcome>, DomainError> {
        let body = serde_json::json!({
            "segment_name": segment_name,
            "subject": subject,
            "message": message,
            "sender_email": sender_email,
        });
        let rows: Vec<mapper::OutcomeRow> = self.post_method(METHOD_BROADCAST, &body).await?;
        Ok(rows.into_iter().map(mapper::outcome_from_row).collect())
    }

    async fn fetch_tracker_updates(
        &self,
        modified_after: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TrackerUpdate>, DomainError> {
        let fields = r#"["communication","lead","status","error","modified"]"#;
        let mut query = vec![
            ("fields", fields.to_string()),
            ("order_by", "modified asc".to_string()),
            ("limit_page_length", limit.to_string()),
        ];
        if let Some(cursor) = modified_after {
            let filters = serde_json::json!([["modified", ">", cursor]]);
            query.push(("filters", filters.to_string()));
        }
        let rows: Vec<mapper::TrackerRow> = self.get_list("Lead Email Tracker", &query).await?;
        Ok(rows
            .into_iter()
            .filter_map(mapper::tracker_update_from_row)
            .collect())
    }

    async fn add_campaign_schedule(
        &self,
        campaign_name: &str,
        schedule: &CampaignSchedule,
    ) -> Result<(), DomainError> {
        let body = serde_json::json!({
            "campaign_name": campaign_name,
            "email_template": schedule.email_template,
            "send_after_days": schedule.send_after_days,
            "send_after_minutes": schedule.send_after_minutes,
        });
        let _: serde_json::Value = self.post_method(METHOD_ADD_SCHEDULE, &body).await?;
        Ok(())
    }

    async fn remove_campaign_schedule(
        &self,
        campaign_name: &str,
        schedule_idx: u32,
    ) -> Result<(), DomainError> {
        let body = serde_json::json!({
            "campaign_name": campaign_name,
            "schedule_idx": schedule_idx,
        });
        let _: serde_json::Value = self.post_method(METHOD_REMOVE_SCHEDULE, &body).await?;
        Ok(())
    }
}
