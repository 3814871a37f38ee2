//! Application configuration. CRM API credentials, paths, sync tuning.

use serde::Deserialize;

/// Default tracker rows fetched per sync page.
pub const DEFAULT_TRACKER_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// CRM base URL (e.g. "https://crm.example.com"). Read from CRM_SYNC_BASE_URL.
    pub base_url: Option<String>,

    /// API key for token auth. Read from CRM_SYNC_API_KEY.
    pub api_key: Option<String>,

    /// API secret for token auth. Read from CRM_SYNC_API_SECRET.
    pub api_secret: Option<String>,

    /// Local data directory (delivery log, state file). Read from CRM_SYNC_DATA_DIR.
    pub data_dir: Option<String>,

    /// Optional delay in ms before each CRM API request (rate limiting). Read from CRM_SYNC_REQUEST_DELAY_MS.
    #[serde(default)]
    pub request_delay_ms: Option<u64>,

    /// Tracker rows fetched per sync page. Read from CRM_SYNC_TRACKER_PAGE_SIZE.
    #[serde(default)]
    pub tracker_page_size: Option<u32>,

    /// Delay in ms between tracker sync pages. Read from CRM_SYNC_TRACKER_PAGE_DELAY_MS.
    #[serde(default)]
    pub tracker_page_delay_ms: Option<u64>,

    /// Watch mode cycle sleep in seconds (default 300). Read from CRM_SYNC_WATCH_CYCLE_SECS.
    #[serde(default)]
    pub watch_cycle_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Task Tracker (Trello) Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Trello API key. Read from TRELLO_KEY.
    #[serde(default)]
    pub trello_key: Option<String>,

    /// Trello API token. Read from TRELLO_TOKEN.
    #[serde(default)]
    pub trello_token: Option<String>,

    /// Trello list ID where follow-up cards are created. Read from TRELLO_LIST_ID.
    #[serde(default)]
    pub trello_list_id: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("CRM_SYNC"));
        if let Ok(path) = std::env::var("CRM_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let cfg: Self = c.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Returns the CRM base URL without a trailing slash, if configured.
    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| std::env::var("CRM_SYNC_BASE_URL").ok())
            .map(|u| u.trim_end_matches('/').to_string())
    }

    /// Returns the API key from config or CRM_SYNC_API_KEY env.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("CRM_SYNC_API_KEY").ok())
    }

    /// Returns the API secret from config or CRM_SYNC_API_SECRET env.
    pub fn api_secret(&self) -> Option<String> {
        self.api_secret
            .clone()
            .or_else(|| std::env::var("CRM_SYNC_API_SECRET").ok())
    }

    /// Returns true if the CRM gateway is fully configured.
    pub fn is_crm_configured(&self) -> bool {
        self.base_url().is_some() && self.api_key().is_some() && self.api_secret().is_some()
    }

    /// Returns watch cycle sleep in seconds. Defaults to 300 if unset.
    pub fn watch_cycle_secs_or_default(&self) -> u64 {
        self.watch_cycle_secs.unwrap_or(300)
    }

    /// Returns tracker page size. Defaults to DEFAULT_TRACKER_PAGE_SIZE if unset.
    pub fn tracker_page_size_or_default(&self) -> u32 {
        self.tracker_page_size.unwrap_or(DEFAULT_TRACKER_PAGE_SIZE)
    }

    /// Returns delay between tracker sync pages in milliseconds. Defaults to 500.
    pub fn tracker_page_delay_ms_or_default(&self) -> u64 {
        self.tracker_page_delay_ms.unwrap_or(500)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Trello Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns Trello API key from config or TRELLO_KEY env.
    pub fn trello_key(&self) -> Option<String> {
        self.trello_key
            .clone()
            .or_else(|| std::env::var("TRELLO_KEY").ok())
    }

    /// Returns Trello API token from config or TRELLO_TOKEN env.
    pub fn trello_token(&self) -> Option<String> {
        self.trello_token
            .clone()
            .or_else(|| std::env::var("TRELLO_TOKEN").ok())
    }

    /// Returns Trello list ID from config or TRELLO_LIST_ID env.
    pub fn trello_list_id(&self) -> Option<String> {
        self.trello_list_id
            .clone()
            .or_else(|| std::env::var("TRELLO_LIST_ID").ok())
    }

    /// Returns true if the Trello task tracker is fully configured.
    pub fn is_trello_configured(&self) -> bool {
        self.trello_key().is_some()
            && self.trello_token().is_some()
            && self.trello_list_id().is_some()
    }
}
