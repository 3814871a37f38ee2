//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Menu loop dispatching to the use cases: create segments (from a
//! selection or a CSV import), broadcast to a segment, campaign schedules,
//! tracker sync, watch mode. Flow errors are rendered here, once, and the
//! menu continues.

use crate::adapters::tools::csv_leads;
use crate::adapters::ui::progress;
use crate::domain::{BroadcastStatus, CampaignSchedule, CreatedSegment, DomainError, Lead};
use crate::ports::{CrmGateway, DeliveryLogPort, InputPort};
use crate::usecases::{BroadcastService, SegmentService, TrackerSyncService, WatchService};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, InquireError, MultiSelect, Select, Text};
use std::sync::Arc;

const MENU_CREATE: &str = "Create segment from selected leads";
const MENU_IMPORT: &str = "Create segment from a CSV file";
const MENU_BROADCAST: &str = "Broadcast email to a segment";
const MENU_DELIVERIES: &str = "Show recent deliveries";
const MENU_SYNC: &str = "Sync delivery trackers";
const MENU_WATCH: &str = "Watch delivery trackers";
const MENU_SCHEDULES: &str = "Campaign schedules";
const MENU_QUIT: &str = "Quit";

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    let render_config = RenderConfig::default_colored()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightCyan))
        .with_answered_prompt_prefix(Styled::new("✔").with_fg(Color::LightGreen))
        .with_highlighted_option_prefix(Styled::new("➤").with_fg(Color::LightCyan));
    inquire::set_global_render_config(render_config);
}

/// Confirmation shown after a segment is created.
fn success_message(segment: &CreatedSegment) -> String {
    format!("Lead Segment {} created successfully", segment.name)
}

/// One multi-select line per lead: "Name <email> (ID)".
fn lead_option(lead: &Lead) -> String {
    match &lead.email {
        Some(email) => format!("{} <{}> ({})", lead.display_name(), email, lead.name),
        None => format!("{} (no email) ({})", lead.display_name(), lead.name),
    }
}

fn required(field: &'static str) -> impl Fn(&str) -> Result<Validation, inquire::CustomUserError> + Clone {
    move |input: &str| {
        if input.trim().is_empty() {
            Ok(Validation::Invalid(format!("{} is required", field).into()))
        } else {
            Ok(Validation::Valid)
        }
    }
}

fn prompt_err(e: InquireError) -> DomainError {
    DomainError::Prompt(e.to_string())
}

/// The user backing out of a prompt (Esc / Ctrl-C) cancels the flow, not
/// the program.
fn cancelled(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// TUI adapter. Inquire prompts over the use cases.
pub struct TuiInputPort {
    crm: Arc<dyn CrmGateway>,
    log: Arc<dyn DeliveryLogPort>,
    segment_service: Arc<SegmentService>,
    broadcast_service: Arc<BroadcastService>,
    sync_service: Arc<TrackerSyncService>,
    watch_service: Arc<WatchService>,
}

impl TuiInputPort {
    pub fn new(
        crm: Arc<dyn CrmGateway>,
        log: Arc<dyn DeliveryLogPort>,
        segment_service: Arc<SegmentService>,
        broadcast_service: Arc<BroadcastService>,
        sync_service: Arc<TrackerSyncService>,
        watch_service: Arc<WatchService>,
    ) -> Self {
        Self {
            crm,
            log,
            segment_service,
            broadcast_service,
            sync_service,
            watch_service,
        }
    }

    /// Segment creation flow: select leads -> name/description -> create ->
    /// confirm and refresh the lead list.
    async fn run_create_segment(&self) -> Result<(), DomainError> {
        let leads = self.crm.list_leads().await?;
        if leads.is_empty() {
            println!("No leads found in the CRM.");
            return Ok(());
        }

        let options: Vec<String> = leads.iter().map(lead_option).collect();
        let selected = match MultiSelect::new("Select leads for the segment", options).prompt() {
            Ok(s) => s,
            Err(e) if cancelled(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };

        // Map selected display strings back to lead IDs. Filtering the
        // original list keeps presentation order and drops nothing else.
        let lead_names: Vec<String> = leads
            .iter()
            .filter(|l| selected.contains(&lead_option(l)))
            .map(|l| l.name.clone())
            .collect();

        if lead_names.is_empty() {
            println!("Select at least one lead to create a segment.");
            return Ok(());
        }

        let (segmentname, description) = self.prompt_segment_fields()?;
        let created = self
            .segment_service
            .create_from_selection(&segmentname, &lead_names, description.as_deref())
            .await?;

        println!("{}", success_message(&created));
        self.refresh_lead_list().await?;
        Ok(())
    }

    /// CSV import flow: file path -> parse -> name/description -> create.
    async fn run_import_segment(&self) -> Result<(), DomainError> {
        let path = match Text::new("CSV file path:")
            .with_validator(required("file path"))
            .prompt()
        {
            Ok(p) => p,
            Err(e) if cancelled(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };

        let leads = csv_leads::read_leads_file(path.trim()).await?;
        println!("Parsed {} leads from the file.", leads.len());

        let (segmentname, description) = self.prompt_segment_fields()?;
        let created = self
            .segment_service
            .create_from_lead_data(&segmentname, &leads, description.as_deref())
            .await?;

        println!("{}", success_message(&created));
        println!("Segment members: {}", created.leads.len());
        Ok(())
    }

    fn prompt_segment_fields(&self) -> Result<(String, Option<String>), DomainError> {
        let segmentname = Text::new("Segment name:")
            .with_validator(required("segment name"))
            .prompt()
            .map_err(prompt_err)?;
        let description = Text::new("Description (optional):")
            .prompt()
            .map_err(prompt_err)?;
        let description = Some(description).filter(|d| !d.trim().is_empty());
        Ok((segmentname, description))
    }

    /// Broadcast flow: pick a segment -> subject/body/sender -> confirm ->
    /// send and render the per-lead report.
    async fn run_broadcast(&self) -> Result<(), DomainError> {
        let segments = self.crm.list_segments().await?;
        if segments.is_empty() {
            println!("No segments found; create one first.");
            return Ok(());
        }

        let options: Vec<String> = segments
            .iter()
            .map(|s| format!("{} ({})", s.segmentname, s.name))
            .collect();
        let picked = match Select::new("Segment to broadcast to", options).prompt() {
            Ok(p) => p,
            Err(e) if cancelled(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };
        let segment = segments
            .iter()
            .find(|s| format!("{} ({})", s.segmentname, s.name) == picked)
            .ok_or_else(|| DomainError::Prompt("selected segment disappeared".into()))?;

        let subject = Text::new("Subject:")
            .with_validator(required("subject"))
            .prompt()
            .map_err(prompt_err)?;
        let message = Text::new("Message (HTML or text):")
            .with_validator(required("message"))
            .prompt()
            .map_err(prompt_err)?;
        let sender = Text::new("Sender email:")
            .with_validator(required("sender email"))
            .prompt()
            .map_err(prompt_err)?;

        let go = Confirm::new(&format!(
            "Send \"{}\" to every lead in '{}'?",
            subject, segment.segmentname
        ))
        .with_default(false)
        .prompt()
        .map_err(prompt_err)?;
        if !go {
            println!("Broadcast cancelled.");
            return Ok(());
        }

        let pb = progress::spinner("Broadcasting...");
        let result = self
            .broadcast_service
            .broadcast(&segment.name, &subject, &message, &sender)
            .await;
        let report = match result {
            Ok(report) => {
                progress::finish_spinner(&pb, "Broadcast complete.");
                report
            }
            Err(e) => {
                progress::finish_spinner(&pb, "Broadcast failed.");
                return Err(e);
            }
        };

        println!(
            "Sent: {}   Skipped (no email): {}   Failed: {}",
            report.sent, report.skipped, report.failed
        );
        for outcome in report
            .outcomes
            .iter()
            .filter(|o| o.status == BroadcastStatus::Error)
        {
            println!("  failed {}: {}", outcome.lead, outcome.message);
        }
        if report.sent > 0 {
            println!("Run \"{}\" later to follow delivery status.", MENU_SYNC);
        }
        Ok(())
    }

    async fn run_show_deliveries(&self) -> Result<(), DomainError> {
        let records = self.log.get_deliveries(None, 20, 0).await?;
        if records.is_empty() {
            println!("No deliveries recorded yet.");
            return Ok(());
        }
        for r in &records {
            let when = DateTime::<Utc>::from_timestamp(r.updated_at, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| r.updated_at.to_string());
            println!(
                "{} {:<8} {:<24} {:<28} {}",
                when,
                r.status.as_str(),
                r.segment,
                r.lead,
                r.error.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    async fn run_tracker_sync(&self) -> Result<(), DomainError> {
        let pb = progress::spinner("Syncing delivery trackers...");
        let result = self.sync_service.sync().await;
        match result {
            Ok(stats) => {
                progress::finish_spinner(
                    &pb,
                    &format!(
                        "Tracker sync complete: {} updates fetched, {} applied.",
                        stats.fetched, stats.applied
                    ),
                );
                Ok(())
            }
            Err(e) => {
                progress::finish_spinner(&pb, "Tracker sync failed.");
                Err(e)
            }
        }
    }

    async fn run_watch(&self) -> Result<(), DomainError> {
        println!("Watch mode: syncing trackers on a cycle. Ctrl-C to stop.");
        self.watch_service.run_loop().await
    }

    /// Campaign schedule flow: add or remove one schedule entry.
    async fn run_campaign_schedules(&self) -> Result<(), DomainError> {
        let action = match Select::new(
            "Campaign schedules",
            vec!["Add schedule", "Remove schedule"],
        )
        .prompt()
        {
            Ok(a) => a,
            Err(e) if cancelled(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };

        let campaign = Text::new("Campaign name:")
            .with_validator(required("campaign name"))
            .prompt()
            .map_err(prompt_err)?;

        if action == "Add schedule" {
            let email_template = Text::new("Email template:")
                .with_validator(required("email template"))
                .prompt()
                .map_err(prompt_err)?;
            let send_after_days = CustomType::<i64>::new("Send after days:")
                .with_error_message("enter a whole number")
                .prompt()
                .map_err(prompt_err)?;
            let send_after_minutes = CustomType::<i64>::new("Send after minutes:")
                .with_error_message("enter a whole number")
                .prompt()
                .map_err(prompt_err)?;
            self.crm
                .add_campaign_schedule(
                    &campaign,
                    &CampaignSchedule {
                        email_template,
                        send_after_days,
                        send_after_minutes,
                    },
                )
                .await?;
            println!("Schedule added to campaign {}.", campaign);
        } else {
            let schedule_idx = CustomType::<u32>::new("Schedule index to remove:")
                .with_error_message("enter a non-negative number")
                .prompt()
                .map_err(prompt_err)?;
            self.crm
                .remove_campaign_schedule(&campaign, schedule_idx)
                .await?;
            println!("Schedule {} removed from campaign {}.", schedule_idx, campaign);
        }
        Ok(())
    }

    /// Re-fetch leads after a successful segment creation so the list the
    /// user sees next reflects the server.
    async fn refresh_lead_list(&self) -> Result<(), DomainError> {
        let leads = self.crm.list_leads().await?;
        println!("Lead list refreshed ({} leads).", leads.len());
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let options = vec![
                MENU_CREATE,
                MENU_IMPORT,
                MENU_BROADCAST,
                MENU_DELIVERIES,
                MENU_SYNC,
                MENU_WATCH,
                MENU_SCHEDULES,
                MENU_QUIT,
            ];
            let choice = match Select::new("What would you like to do?", options).prompt() {
                Ok(c) => c,
                Err(e) if cancelled(&e) => return Ok(()),
                Err(e) => return Err(prompt_err(e)),
            };

            let result = match choice {
                MENU_CREATE => self.run_create_segment().await,
                MENU_IMPORT => self.run_import_segment().await,
                MENU_BROADCAST => self.run_broadcast().await,
                MENU_DELIVERIES => self.run_show_deliveries().await,
                MENU_SYNC => self.run_tracker_sync().await,
                MENU_WATCH => self.run_watch().await,
                MENU_SCHEDULES => self.run_campaign_schedules().await,
                _ => return Ok(()),
            };

            // One error line per failed flow; the menu keeps going.
            if let Err(e) = result {
                eprintln!("Error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_message_uses_the_returned_name() {
        let created = CreatedSegment {
            name: "seg1".into(),
            segmentname: "seg1".into(),
            leads: vec!["CRM-LEAD-2025-00001".into(), "CRM-LEAD-2025-00002".into()],
        };
        assert_eq!(
            success_message(&created),
            "Lead Segment seg1 created successfully"
        );
    }

    #[test]
    fn lead_option_shows_email_when_present() {
        let lead = Lead {
            name: "CRM-LEAD-2025-00001".into(),
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            company_name: None,
        };
        assert_eq!(
            lead_option(&lead),
            "Ada Lovelace <ada@example.com> (CRM-LEAD-2025-00001)"
        );
    }

    #[test]
    fn required_validator_rejects_blank_input() {
        let validate = required("segment name");
        assert!(matches!(validate("  ").unwrap(), Validation::Invalid(_)));
        assert!(matches!(validate("seg1").unwrap(), Validation::Valid));
    }
}
