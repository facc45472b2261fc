// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the console and
// LLM streaming events. Owns the current roster and every piece of session
// state, and pushes UI updates to the console render loop.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::client::{LlmClient, RequestParams};
use crate::llm::prompt::{self, CompactPlayer};
use crate::llm::recommendation::{parse_recommendation, GatewayError, Recommendation};
use crate::protocol::{FilterUpdate, LlmEvent, LlmStatus, UiUpdate, UserCommand};
use crate::reference::ReferenceMap;
use crate::roster::{ingest, Diagnostic, ImportError, Roster, RosterEntry, RosterId};
use crate::session::{self, KeyValueStore, SavedSession};
use crate::view::{self, ClubStats, FilterCriteria, SortCriteria};

/// Default file name recorded when CSV text arrives without one.
pub const DEFAULT_FILE_NAME: &str = "saved_club.csv";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a recommendation request could not be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Please upload your club CSV file first.")]
    NoRoster,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    /// Loaded once at startup and never mutated.
    pub reference: Arc<ReferenceMap>,
    pub roster: Option<Roster>,
    /// Diagnostics from the import that produced `roster`.
    pub diagnostics: Vec<Diagnostic>,
    pub filters: FilterCriteria,
    pub sort: SortCriteria,
    pub coins: u64,
    pub file_name: String,
    /// Raw text of the last successful import, kept for session saves.
    pub csv_text: Option<String>,
    pub recommendation: Option<Recommendation>,
    pub recommendation_status: LlmStatus,
    /// Text streamed so far for the in-flight request.
    pub llm_text: String,
    /// Monotonically increasing counter identifying the current LLM task.
    /// Events from other generations are discarded in `handle_llm_event`.
    pub llm_generation: u64,
    /// Roster the in-flight request was built from.
    pub pending_roster: Option<RosterId>,
    pub current_llm_task: Option<tokio::task::JoinHandle<()>>,
    /// Wrapped in Arc for sharing with spawned tasks.
    pub llm_client: Arc<LlmClient>,
    /// Spawned tasks stream events back to the main loop through clones of
    /// this sender.
    pub llm_tx: mpsc::Sender<LlmEvent>,
    pub store: Arc<dyn KeyValueStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        reference: Arc<ReferenceMap>,
        llm_client: LlmClient,
        llm_tx: mpsc::Sender<LlmEvent>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let coins = config.session.default_coins;
        AppState {
            config,
            reference,
            roster: None,
            diagnostics: Vec::new(),
            filters: FilterCriteria::default(),
            sort: SortCriteria::default(),
            coins,
            file_name: String::new(),
            csv_text: None,
            recommendation: None,
            recommendation_status: LlmStatus::Idle,
            llm_text: String::new(),
            llm_generation: 0,
            pending_roster: None,
            current_llm_task: None,
            llm_client: Arc::new(llm_client),
            llm_tx,
            store,
        }
    }

    /// Ingest CSV text and, on success, replace the roster.
    ///
    /// A structurally rejected file (empty, header only, missing columns)
    /// leaves the previous roster in place. A file whose every data row was
    /// rejected empties the roster and keeps the per-row diagnostics so they
    /// can still be listed. Either successful outcome supersedes any
    /// in-flight recommendation.
    pub fn import_csv(
        &mut self,
        text: String,
        file_name: String,
    ) -> Result<UiUpdate, ImportError> {
        let file_name = if file_name.trim().is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            file_name
        };

        let outcome = match ingest(&text, &self.reference) {
            Ok(outcome) => outcome,
            Err(ImportError::NoValidRows { diagnostics }) => {
                warn!(
                    "Import of {} rejected every row ({} diagnostics); roster cleared",
                    file_name,
                    diagnostics.len()
                );
                self.supersede_recommendation();
                self.roster = None;
                self.diagnostics = diagnostics.clone();
                self.csv_text = None;
                self.file_name = file_name;
                return Err(ImportError::NoValidRows { diagnostics });
            }
            Err(e) => return Err(e),
        };

        self.supersede_recommendation();

        let update = UiUpdate::Imported {
            file_name: file_name.clone(),
            players: outcome.roster.len(),
            skipped: outcome.diagnostics.len(),
            enriched: outcome.enriched,
        };

        info!(
            "Imported {} ({} players, {} skipped, roster {})",
            file_name,
            outcome.roster.len(),
            outcome.diagnostics.len(),
            outcome.roster.id().value()
        );

        self.roster = Some(outcome.roster);
        self.diagnostics = outcome.diagnostics;
        self.csv_text = Some(text);
        self.file_name = file_name;
        Ok(update)
    }

    /// Cancel the current LLM task if one is running.
    pub fn cancel_llm_task(&mut self) {
        if let Some(handle) = self.current_llm_task.take() {
            handle.abort();
            info!("Cancelled previous LLM task");
        }
    }

    /// Abort the in-flight request, advance the generation and drop the old
    /// result. Called whenever the roster is replaced.
    fn supersede_recommendation(&mut self) {
        self.cancel_llm_task();
        self.llm_generation += 1;
        self.pending_roster = None;
        self.recommendation = None;
        self.recommendation_status = LlmStatus::Idle;
        self.llm_text.clear();
    }

    /// Start a recommendation request for the current roster.
    ///
    /// Fails before any request is made when there is no roster or no API
    /// key. Otherwise cancels any in-flight task and spawns a streaming task
    /// tagged with a fresh generation and the roster's identity.
    pub fn request_recommendation(
        &mut self,
        formation: Option<&str>,
    ) -> Result<(), RequestError> {
        let roster = self.roster.as_ref().ok_or(RequestError::NoRoster)?;
        if !self.llm_client.is_available() {
            return Err(GatewayError::Unavailable.into());
        }

        let players: Vec<CompactPlayer> = roster
            .entries()
            .iter()
            .map(CompactPlayer::from_entry)
            .collect();
        let system = prompt::system_prompt();
        let user_content = prompt::build_recommendation_prompt(&players, self.coins, formation);
        let roster_id = roster.id();

        self.cancel_llm_task();
        self.llm_generation += 1;
        let generation = self.llm_generation;
        self.pending_roster = Some(roster_id);
        self.recommendation = None;
        self.recommendation_status = LlmStatus::Streaming;
        self.llm_text.clear();

        let params = RequestParams {
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
        };
        let client = Arc::clone(&self.llm_client);
        let tx = self.llm_tx.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = client
                .stream_message(&system, &user_content, params, tx, generation)
                .await
            {
                warn!("Recommendation task failed: {}", e);
            }
        });
        self.current_llm_task = Some(handle);

        info!(
            "Requested squad recommendation ({} players, budget {}, gen: {})",
            players.len(),
            self.coins,
            generation
        );
        Ok(())
    }

    /// Apply one filter change.
    pub fn apply_filter(&mut self, update: FilterUpdate) {
        let f = &mut self.filters;
        match update {
            FilterUpdate::Name(text) => f.name = text,
            FilterUpdate::Position(text) => f.position = text,
            FilterUpdate::Club(text) => f.club = text,
            FilterUpdate::Rarity(text) => f.rarity = text,
            FilterUpdate::Nation(text) => f.nation = text,
            FilterUpdate::Rating { min, max } => {
                f.min_rating = min.min(max);
                f.max_rating = max.max(min);
            }
            FilterUpdate::Price { min, max } => {
                // The configured ceiling is the top of the full range.
                let max = max.filter(|m| *m < self.config.filters.max_price);
                f.min_price = min;
                f.max_price = max.map(|m| m.max(min));
            }
            FilterUpdate::Trade(trade) => f.trade = trade,
        }
    }

    /// The filtered, sorted view of the current roster.
    pub fn visible_entries(&self) -> Vec<&RosterEntry> {
        match &self.roster {
            Some(roster) => view::project(roster, &self.filters, &self.sort),
            None => Vec::new(),
        }
    }

    fn save_session(&self) -> anyhow::Result<bool> {
        let Some(csv) = &self.csv_text else {
            return Ok(false);
        };
        let saved = SavedSession::new(csv.clone(), self.coins, self.file_name.clone());
        session::save_session(self.store.as_ref(), &saved)?;
        Ok(true)
    }
}

/// Look a player up by definition id, then by case-insensitive name.
fn find_player<'a>(roster: &'a Roster, key: &str) -> Option<&'a RosterEntry> {
    roster.find(key).or_else(|| {
        let key = key.trim().to_lowercase();
        roster
            .entries()
            .iter()
            .find(|e| e.name.to_lowercase() == key)
    })
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on two channels using `tokio::select!`:
/// 1. LLM streaming events
/// 2. User commands from the console
///
/// Pushes UI updates through `ui_tx`.
pub async fn run(
    mut llm_rx: mpsc::Receiver<LlmEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    // When the LLM channel closes, stop polling it so select! never spins.
    let mut llm_open = true;

    loop {
        tokio::select! {
            // --- LLM events (only poll when channel is open) ---
            llm_event = llm_rx.recv(), if llm_open => {
                match llm_event {
                    Some(event) => {
                        handle_llm_event(&mut state, event, &ui_tx).await;
                    }
                    None => {
                        info!("LLM channel closed");
                        llm_open = false;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    state.cancel_llm_task();
    info!("Application event loop exiting");
    Ok(())
}

/// Handle an LLM streaming event.
///
/// Events whose generation is not current come from a cancelled task and are
/// dropped. A completed response is applied only if the roster it was built
/// from is still the current roster.
async fn handle_llm_event(
    state: &mut AppState,
    event: LlmEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let event_generation = event.generation();
    if event_generation != state.llm_generation {
        debug!(
            "Discarding stale LLM event (event gen: {}, current gen: {})",
            event_generation, state.llm_generation
        );
        return;
    }

    let Some(pending) = state.pending_roster else {
        debug!("Received LLM event with no pending request, discarding");
        return;
    };

    match event {
        LlmEvent::Token { text, .. } => {
            state.llm_text.push_str(&text);
            let _ = ui_tx
                .send(UiUpdate::RecommendationProgress {
                    received: state.llm_text.len(),
                })
                .await;
        }
        LlmEvent::Complete {
            full_text,
            stop_reason,
            input_tokens,
            output_tokens,
            ..
        } => {
            state.pending_roster = None;
            state.current_llm_task = None;

            let current = state.roster.as_ref().map(Roster::id);
            if current != Some(pending) {
                warn!(
                    "Discarding recommendation for roster {} (current: {:?})",
                    pending.value(),
                    current.map(RosterId::value)
                );
                state.recommendation_status = LlmStatus::Idle;
                return;
            }

            debug!(input_tokens, output_tokens, "recommendation complete");
            let result = if stop_reason.as_deref() == Some("max_tokens") {
                Err(GatewayError::failed("response truncated at the token limit"))
            } else {
                parse_recommendation(&full_text)
            };

            match result {
                Ok(recommendation) => {
                    info!(
                        "Recommendation ready: {} with {} upgrades",
                        recommendation.suggested_lineup.formation,
                        recommendation.upgrades.len()
                    );
                    state.recommendation = Some(recommendation.clone());
                    state.recommendation_status = LlmStatus::Complete;
                    let _ = ui_tx.send(UiUpdate::Recommendation(recommendation)).await;
                }
                Err(e) => {
                    warn!("Recommendation rejected: {}", e);
                    state.recommendation_status = LlmStatus::Failed;
                    let _ = ui_tx
                        .send(UiUpdate::RecommendationFailed {
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        }
        LlmEvent::Error { message, .. } => {
            warn!("LLM recommendation error: {}", message);
            state.pending_roster = None;
            state.current_llm_task = None;
            state.recommendation_status = LlmStatus::Failed;
            let _ = ui_tx
                .send(UiUpdate::RecommendationFailed {
                    message: GatewayError::failed(message).to_string(),
                })
                .await;
        }
    }
}

/// Handle a user command from the console.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::ImportFile { path } => {
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to read {}: {}", path, e);
                    let _ = ui_tx
                        .send(UiUpdate::ImportFailed {
                            message: format!("failed to read {path}: {e}"),
                        })
                        .await;
                    return;
                }
            };
            let file_name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            send_import_result(state.import_csv(text, file_name), ui_tx).await;
        }
        UserCommand::ImportText { text, file_name } => {
            send_import_result(state.import_csv(text, file_name), ui_tx).await;
        }
        UserCommand::SetCoins(coins) => {
            state.coins = coins;
            let _ = ui_tx.send(UiUpdate::CoinsChanged(coins)).await;
        }
        UserCommand::SetFilter(update) => {
            state.apply_filter(update);
            let active = state.filters.compile().len();
            let _ = ui_tx.send(UiUpdate::FiltersChanged { active }).await;
        }
        UserCommand::ResetFilters => {
            state.filters = FilterCriteria::default();
            let _ = ui_tx.send(UiUpdate::FiltersChanged { active: 0 }).await;
        }
        UserCommand::SetSort(sort) => {
            state.sort = sort.clone();
            let _ = ui_tx.send(UiUpdate::SortChanged(sort)).await;
        }
        UserCommand::ShowRoster => {
            let Some(roster) = &state.roster else {
                let _ = ui_tx.send(no_roster()).await;
                return;
            };
            let total = roster.len();
            let entries = state.visible_entries().into_iter().cloned().collect();
            let _ = ui_tx.send(UiUpdate::Roster { entries, total }).await;
        }
        UserCommand::ShowStats => match &state.roster {
            Some(roster) => {
                let _ = ui_tx.send(UiUpdate::Stats(ClubStats::compute(roster))).await;
            }
            None => {
                let _ = ui_tx.send(no_roster()).await;
            }
        },
        UserCommand::Compare { left, right } => {
            let Some(roster) = &state.roster else {
                let _ = ui_tx.send(no_roster()).await;
                return;
            };
            let update = match (find_player(roster, &left), find_player(roster, &right)) {
                (Some(a), Some(b)) => UiUpdate::Comparison(view::compare(a, b)),
                (None, _) => UiUpdate::Error(format!("no player matching \"{left}\"")),
                (_, None) => UiUpdate::Error(format!("no player matching \"{right}\"")),
            };
            let _ = ui_tx.send(update).await;
        }
        UserCommand::ShowDiagnostics => {
            let _ = ui_tx
                .send(UiUpdate::Diagnostics(state.diagnostics.clone()))
                .await;
        }
        UserCommand::RequestRecommendation { formation } => {
            match state.request_recommendation(formation.as_deref()) {
                Ok(()) => {
                    let _ = ui_tx
                        .send(UiUpdate::RecommendationStatus(LlmStatus::Streaming))
                        .await;
                }
                Err(e) => {
                    info!("Recommendation not started: {}", e);
                    let _ = ui_tx
                        .send(UiUpdate::RecommendationFailed {
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        }
        UserCommand::SaveSession => {
            let update = match state.save_session() {
                Ok(true) => UiUpdate::SessionSaved,
                Ok(false) => {
                    UiUpdate::Error("Nothing to save yet: import a club CSV first.".into())
                }
                Err(e) => {
                    warn!("Failed to save session: {:#}", e);
                    UiUpdate::Error(format!("failed to save session: {e}"))
                }
            };
            let _ = ui_tx.send(update).await;
        }
        UserCommand::RestoreSession => {
            let Some(saved) = session::load_session(state.store.as_ref()) else {
                let _ = ui_tx.send(UiUpdate::NoSavedSession).await;
                return;
            };
            let SavedSession {
                csv,
                coins,
                file_name,
                ..
            } = saved;
            match state.import_csv(csv, file_name) {
                Ok(imported) => {
                    state.coins = coins;
                    let _ = ui_tx.send(imported).await;
                    let _ = ui_tx
                        .send(UiUpdate::SessionRestored {
                            file_name: state.file_name.clone(),
                            coins,
                        })
                        .await;
                }
                Err(e) => {
                    warn!("Saved session no longer imports, discarding it: {}", e);
                    if let Err(e) = session::clear_session(state.store.as_ref()) {
                        warn!("Failed to clear saved session: {:#}", e);
                    }
                    let _ = ui_tx
                        .send(UiUpdate::ImportFailed {
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

async fn send_import_result(
    result: Result<UiUpdate, ImportError>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let update = match result {
        Ok(update) => update,
        Err(e) => {
            warn!("Import rejected: {}", e);
            UiUpdate::ImportFailed {
                message: e.to_string(),
            }
        }
    };
    let _ = ui_tx.send(update).await;
}

fn no_roster() -> UiUpdate {
    UiUpdate::Error(RequestError::NoRoster.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
