// Message types exchanged between the console front end, the app
// orchestrator, and the LLM streaming task.

use crate::llm::recommendation::Recommendation;
use crate::roster::{Diagnostic, RosterEntry};
use crate::view::{ClubStats, Comparison, SortCriteria, TradeFilter};

// ---------------------------------------------------------------------------
// LLM streaming events
// ---------------------------------------------------------------------------

/// Events emitted by the LLM client while streaming a response. Every event
/// carries the generation of the request that produced it so stale events
/// from a superseded request can be dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    Token {
        text: String,
        generation: u64,
    },
    Complete {
        full_text: String,
        input_tokens: u32,
        output_tokens: u32,
        stop_reason: Option<String>,
        generation: u64,
    },
    Error {
        message: String,
        generation: u64,
    },
}

impl LlmEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LlmEvent::Token { generation, .. }
            | LlmEvent::Complete { generation, .. }
            | LlmEvent::Error { generation, .. } => *generation,
        }
    }
}

/// Lifecycle of the recommendation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
    Failed,
}

// ---------------------------------------------------------------------------
// User commands
// ---------------------------------------------------------------------------

/// One change to the filter criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Name(String),
    Position(String),
    Club(String),
    Rarity(String),
    Nation(String),
    Rating { min: u8, max: u8 },
    Price { min: u64, max: Option<u64> },
    Trade(TradeFilter),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Read and import a CSV file from disk.
    ImportFile { path: String },
    /// Import CSV text directly.
    ImportText { text: String, file_name: String },
    SetCoins(u64),
    SetFilter(FilterUpdate),
    ResetFilters,
    SetSort(SortCriteria),
    ShowRoster,
    ShowStats,
    Compare { left: String, right: String },
    ShowDiagnostics,
    RequestRecommendation { formation: Option<String> },
    SaveSession,
    RestoreSession,
    Quit,
}

// ---------------------------------------------------------------------------
// UI updates
// ---------------------------------------------------------------------------

/// Output from the orchestrator for the front end to render.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Imported {
        file_name: String,
        players: usize,
        skipped: usize,
        enriched: usize,
    },
    ImportFailed {
        message: String,
    },
    Roster {
        entries: Vec<RosterEntry>,
        total: usize,
    },
    Stats(ClubStats),
    Comparison(Comparison),
    Diagnostics(Vec<Diagnostic>),
    CoinsChanged(u64),
    FiltersChanged {
        active: usize,
    },
    SortChanged(SortCriteria),
    RecommendationStatus(LlmStatus),
    /// Characters received so far for the in-flight recommendation.
    RecommendationProgress {
        received: usize,
    },
    Recommendation(Recommendation),
    RecommendationFailed {
        message: String,
    },
    SessionSaved,
    SessionRestored {
        file_name: String,
        coins: u64,
    },
    NoSavedSession,
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_read_from_every_variant() {
        let events = [
            LlmEvent::Token {
                text: "x".into(),
                generation: 3,
            },
            LlmEvent::Complete {
                full_text: String::new(),
                input_tokens: 0,
                output_tokens: 0,
                stop_reason: None,
                generation: 3,
            },
            LlmEvent::Error {
                message: "e".into(),
                generation: 3,
            },
        ];
        assert!(events.iter().all(|e| e.generation() == 3));
    }

    #[test]
    fn status_defaults_to_idle() {
        assert_eq!(LlmStatus::default(), LlmStatus::Idle);
    }
}
