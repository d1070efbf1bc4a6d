//! Application state management for regdash.
//!
//! This module contains the `App` struct that owns the dashboard state:
//! the current tab and selections, the loaded records and their summary,
//! and the background fetch channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use regdash_core::cache::CachedOutcome;
use regdash_core::snapshot::{self, Tally};
use regdash_core::{ApiClient, Config, FetchOutcome, Headers, Record, RecordCache, Summary};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background fetch channel.
/// Only one fetch runs at a time, a handful of slots is plenty.
const CHANNEL_BUFFER_SIZE: usize = 4;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    AgeGroups,
    Gender,
    Affiliations,
    Registrants,
    /// Only tab of a pre-aggregated snapshot
    Tally,
}

impl Tab {
    /// Tabs shown for record data, in key order (1-5)
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::AgeGroups,
        Tab::Gender,
        Tab::Affiliations,
        Tab::Registrants,
    ];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::AgeGroups => "Age Groups",
            Tab::Gender => "Gender",
            Tab::Affiliations => "Affiliations",
            Tab::Registrants => "Registrants",
            Tab::Tally => "Tally",
        }
    }
}

/// Application state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Quitting,
}

/// Where records come from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// The table API, fetched through the record cache
    Api { url: String, headers: Headers },
    /// A CSV export on disk
    Snapshot(PathBuf),
    /// A pre-aggregated CSV, `value_column` summed per `key_column`
    Tally {
        path: PathBuf,
        key_column: String,
        value_column: String,
    },
}

impl DataSource {
    /// Tabs available for this source
    pub fn tabs(&self) -> &'static [Tab] {
        match self {
            DataSource::Tally { .. } => &[Tab::Tally],
            _ => &Tab::ALL,
        }
    }
}

/// State of the most recent load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded,
    /// Loaded successfully, but there were no rows
    Empty,
    Failed(String),
}

/// Result sent back from a background fetch, tagged with the load that started it
pub enum LoadResult {
    Fetched { seq: u64, outcome: CachedOutcome },
}

pub struct App {
    pub config: Config,
    api: ApiClient,
    cache: Arc<RecordCache>,
    pub source: DataSource,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub affiliation_selection: usize,
    pub registrant_selection: usize,
    pub tally_selection: usize,

    // Data
    pub records: Vec<Record>,
    pub summary: Summary,
    pub tally: Option<Tally>,
    pub load_state: LoadState,
    /// Bumped by every `load`; results from older loads are dropped
    load_seq: u64,
    /// When the shown data was fetched, e.g. "5m ago"
    pub last_updated: Option<String>,

    // Background task channel
    refresh_rx: mpsc::Receiver<LoadResult>,
    refresh_tx: mpsc::Sender<LoadResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, source: DataSource, cache: Arc<RecordCache>) -> Result<Self> {
        let api = ApiClient::new(config.fetch_options())?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let current_tab = source.tabs()[0];

        Ok(Self {
            config,
            api,
            cache,
            source,

            state: AppState::Normal,
            current_tab,
            affiliation_selection: 0,
            registrant_selection: 0,
            tally_selection: 0,

            records: Vec::new(),
            summary: Summary::from_records(&[]),
            tally: None,
            load_state: LoadState::Loading,
            load_seq: 0,
            last_updated: None,

            refresh_rx: rx,
            refresh_tx: tx,

            status_message: None,
        })
    }

    // =========================================================================
    // Data Loading
    // =========================================================================

    /// Start loading records from the configured source.
    ///
    /// API fetches run on a background task and go through the record cache,
    /// so a repeated load without `refresh` is answered from memory.
    pub fn load(&mut self) {
        self.load_seq += 1;
        self.load_state = LoadState::Loading;
        self.status_message = Some("Fetching data from database...".to_string());

        match self.source.clone() {
            DataSource::Api { url, headers } => {
                let api = self.api.clone();
                let cache = self.cache.clone();
                let tx = self.refresh_tx.clone();
                let seq = self.load_seq;

                tokio::spawn(async move {
                    let outcome = cache.fetch_records(&api, &url, &headers).await;
                    if let Err(e) = tx.send(LoadResult::Fetched { seq, outcome }).await {
                        error!(error = %e, "Failed to send fetch result - channel closed");
                    }
                });
            }
            DataSource::Snapshot(path) => match snapshot::load_records(&path) {
                Ok(records) => {
                    info!(path = %path.display(), count = records.len(), "Loaded snapshot");
                    self.last_updated = None;
                    self.set_records(records);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load snapshot");
                    self.set_failure(e.to_string());
                }
            },
            DataSource::Tally {
                path,
                key_column,
                value_column,
            } => match snapshot::load_tally(&path, &key_column, &value_column) {
                Ok(tally) => {
                    info!(path = %path.display(), groups = tally.totals.len(), "Loaded tally");
                    self.last_updated = None;
                    self.set_tally(tally);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load tally");
                    self.set_failure(e.to_string());
                }
            },
        }
    }

    /// Drop every cached fetch and load again
    pub fn refresh(&mut self) {
        info!("Refresh requested, clearing record cache");
        self.cache.clear();
        self.load();
    }

    /// Apply any finished background fetches
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }

        for result in results {
            match result {
                LoadResult::Fetched { seq, outcome } if seq == self.load_seq => {
                    self.apply_outcome(&outcome)
                }
                LoadResult::Fetched { seq, .. } => {
                    debug!(seq, current = self.load_seq, "Dropping result of a superseded load");
                }
            }
        }
    }

    /// Update the dashboard from a fetch outcome
    pub fn apply_outcome(&mut self, cached: &CachedOutcome) {
        self.last_updated = Some(cached.age_display());
        match &cached.data {
            FetchOutcome::Records(records) => self.set_records(records.clone()),
            FetchOutcome::Failed(e) => self.set_failure(format!("Error fetching data: {}", e)),
        }
    }

    fn set_records(&mut self, records: Vec<Record>) {
        self.summary = Summary::from_records(&records);
        self.records = records;
        self.clamp_selections();

        if self.records.is_empty() {
            self.load_state = LoadState::Empty;
            self.status_message = Some("No data found.".to_string());
        } else {
            self.load_state = LoadState::Loaded;
            self.status_message = None;
        }
    }

    fn set_tally(&mut self, tally: Tally) {
        self.records.clear();
        self.summary = Summary::from_records(&[]);

        if tally.is_empty() {
            self.load_state = LoadState::Empty;
            self.status_message = Some("No data found.".to_string());
        } else {
            self.load_state = LoadState::Loaded;
            self.status_message = None;
        }
        self.tally = Some(tally);
        self.clamp_selections();
    }

    fn set_failure(&mut self, message: String) {
        self.records.clear();
        self.summary = Summary::from_records(&[]);
        self.tally = None;
        self.clamp_selections();
        self.status_message = Some(message.clone());
        self.load_state = LoadState::Failed(message);
    }

    fn clamp_selections(&mut self) {
        let affiliations = self.summary.affiliations.len();
        self.affiliation_selection = self.affiliation_selection.min(affiliations.saturating_sub(1));
        self.registrant_selection = self.registrant_selection.min(self.records.len().saturating_sub(1));
        let groups = self.tally.as_ref().map_or(0, |t| t.totals.len());
        self.tally_selection = self.tally_selection.min(groups.saturating_sub(1));
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn tabs(&self) -> &'static [Tab] {
        self.source.tabs()
    }

    /// Switch to the tab at `index` (0-based), if this source has one
    pub fn select_tab(&mut self, index: usize) {
        if let Some(tab) = self.tabs().get(index) {
            self.current_tab = *tab;
        }
    }

    /// Move to the next (`step` = 1) or previous (`step` = -1) tab, wrapping
    pub fn cycle_tab(&mut self, step: isize) {
        let tabs = self.tabs();
        let len = tabs.len() as isize;
        let current = tabs.iter().position(|t| *t == self.current_tab).unwrap_or(0) as isize;
        self.current_tab = tabs[(current + step).rem_euclid(len) as usize];
    }

    /// Number of selectable rows in the current tab
    fn current_len(&self) -> usize {
        match self.current_tab {
            Tab::Affiliations => self.summary.affiliations.len(),
            Tab::Registrants => self.records.len(),
            Tab::Tally => self.tally.as_ref().map_or(0, |t| t.totals.len()),
            _ => 0,
        }
    }

    fn current_selection_mut(&mut self) -> Option<&mut usize> {
        match self.current_tab {
            Tab::Affiliations => Some(&mut self.affiliation_selection),
            Tab::Registrants => Some(&mut self.registrant_selection),
            Tab::Tally => Some(&mut self.tally_selection),
            _ => None,
        }
    }

    /// Move the selection in the current tab by `delta` rows, clamped
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        if let Some(selection) = self.current_selection_mut() {
            let max = len.saturating_sub(1) as isize;
            *selection = (*selection as isize + delta).clamp(0, max) as usize;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(selection) = self.current_selection_mut() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        if let Some(selection) = self.current_selection_mut() {
            *selection = len.saturating_sub(1);
        }
    }

    /// Human-readable name of the data source for the title bar
    pub fn source_label(&self) -> String {
        match &self.source {
            DataSource::Api { url, .. } => url.clone(),
            DataSource::Snapshot(path) => format!("snapshot: {}", path.display()),
            DataSource::Tally {
                path,
                key_column,
                value_column,
            } => format!("tally: {} ({} by {})", path.display(), value_column, key_column),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
