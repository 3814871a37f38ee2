//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use crm_sync::adapters::crm::{FrappeCrmGateway, MockCrmGateway};
use crm_sync::adapters::integrations::TrelloAdapter;
use crm_sync::adapters::persistence::{MemoryDeliveryLog, MemoryState, SqliteDeliveryLog, StateJson};
use crm_sync::adapters::ui::tui::TuiInputPort;
use crm_sync::ports::{CrmGateway, DeliveryLogPort, InputPort, StatePort, TaskTrackerPort};
use crm_sync::usecases::{BroadcastService, SegmentService, TrackerSyncService, WatchService};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found (check CWD)"),
    }

    crm_sync::adapters::ui::init_ui();

    let cfg = crm_sync::shared::config::AppConfig::load().unwrap_or_default();

    let data_dir = cfg.data_dir.as_deref().unwrap_or("./data").to_string();
    let data_path = PathBuf::from(&data_dir);
    let state_path = data_path.join("state.json");

    // --- CRM gateway + persistence ---
    // Demo mode (no CRM configured) keeps everything in memory so mock
    // broadcasts never land in the real delivery log.
    let (crm, log, state): (
        Arc<dyn CrmGateway>,
        Arc<dyn DeliveryLogPort>,
        Arc<dyn StatePort>,
    ) = if cfg.is_crm_configured() {
        let base_url = cfg.base_url().unwrap_or_default();
        info!(url = %base_url, "CRM gateway configured");
        let crm: Arc<dyn CrmGateway> = Arc::new(FrappeCrmGateway::new(
            base_url,
            cfg.api_key().unwrap_or_default(),
            cfg.api_secret().unwrap_or_default(),
            cfg.request_delay_ms,
        ));

        let log = SqliteDeliveryLog::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("delivery log connect failed: {}", e))?;

        let state_impl = StateJson::new(&state_path);
        state_impl
            .load()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        (crm, Arc::new(log), Arc::new(state_impl))
    } else {
        warn!(
            "CRM_SYNC_BASE_URL / CRM_SYNC_API_KEY / CRM_SYNC_API_SECRET not set; \
             running in demo mode with a mock CRM"
        );
        (
            Arc::new(MockCrmGateway::with_delay(100)),
            Arc::new(MemoryDeliveryLog::new()),
            Arc::new(MemoryState::new()),
        )
    };

    // --- Services ---
    let segment_service = Arc::new(SegmentService::new(Arc::clone(&crm)));
    let broadcast_service = Arc::new(BroadcastService::new(Arc::clone(&crm), Arc::clone(&log)));

    let sync_service = Arc::new(TrackerSyncService::new(
        Arc::clone(&crm),
        Arc::clone(&log),
        Arc::clone(&state),
        cfg.tracker_page_size_or_default(),
        Duration::from_millis(cfg.tracker_page_delay_ms_or_default()),
    ));

    let task_tracker: Option<Arc<dyn TaskTrackerPort>> = if cfg.is_trello_configured() {
        info!("Trello follow-up cards enabled (TRELLO_KEY, TRELLO_TOKEN, TRELLO_LIST_ID)");
        Some(Arc::new(TrelloAdapter::new(
            cfg.trello_key().unwrap_or_default(),
            cfg.trello_token().unwrap_or_default(),
            cfg.trello_list_id().unwrap_or_default(),
        )))
    } else {
        None
    };

    let watch_service = Arc::new(WatchService::new(
        Arc::clone(&sync_service),
        task_tracker,
        Duration::from_secs(cfg.watch_cycle_secs_or_default()),
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        Arc::clone(&crm),
        Arc::clone(&log),
        segment_service,
        broadcast_service,
        sync_service,
        watch_service,
    ));

    // --- Run (main menu -> segments / broadcast / trackers) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
