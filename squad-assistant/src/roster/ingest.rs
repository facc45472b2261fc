// One-shot import: tokenize, reconcile, enrich.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::enrich::enrich;
use super::entry::RosterEntry;
use super::reconcile::reconcile;
use super::tokenizer::tokenize;
use super::{Diagnostic, ImportError};
use crate::reference::ReferenceMap;

static NEXT_ROSTER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one successfully imported roster. A fresh id is issued for
/// every import, so a recommendation can be tied to the roster it was
/// computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RosterId(u64);

impl RosterId {
    fn next() -> Self {
        RosterId(NEXT_ROSTER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// The current set of roster entries. Replaced wholesale on each import.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    id: RosterId,
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Roster {
            id: RosterId::next(),
            entries,
        }
    }

    pub fn id(&self) -> RosterId {
        self.id
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, definition_id: &str) -> Option<&RosterEntry> {
        let id = super::entry::normalize_definition_id(definition_id);
        self.entries.iter().find(|e| e.definition_id == id)
    }
}

/// A successful import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub roster: Roster,
    /// Rows that were skipped, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// Entries carrying detailed stats after enrichment.
    pub enriched: usize,
}

/// Run the whole pipeline over raw CSV text.
///
/// Either a complete roster comes back or nothing does; there is no partial
/// intermediate state.
pub fn ingest(text: &str, reference: &ReferenceMap) -> Result<ImportOutcome, ImportError> {
    let mut rows = tokenize(text);
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    let header = rows.remove(0);
    if rows.iter().all(|r| r.len() == 1 && r[0].trim().is_empty()) {
        return Err(ImportError::NoDataRows);
    }

    let reconciled = reconcile(&header, &rows)?;
    if reconciled.entries.is_empty() {
        return Err(ImportError::NoValidRows {
            diagnostics: reconciled.diagnostics,
        });
    }

    let entries = enrich(reconciled.entries, reference);
    let enriched = entries.iter().filter(|e| e.has_detailed_stats()).count();
    let roster = Roster::new(entries);

    info!(
        "imported {} players ({} skipped, {} with detailed stats)",
        roster.len(),
        reconciled.diagnostics.len(),
        enriched
    );

    Ok(ImportOutcome {
        roster,
        diagnostics: reconciled.diagnostics,
        enriched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_alice_and_bob() {
        let text = "Name,DefinitionId,Rating\nAlice,101,85\nBob,102,200\n";
        let outcome = ingest(text, &ReferenceMap::empty()).unwrap();
        assert_eq!(outcome.roster.len(), 1);
        let alice = &outcome.roster.entries()[0];
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.rating, Some(85));
        assert!(!alice.has_detailed_stats());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].row, 3);
        assert!(outcome.diagnostics[0].reason.contains("Bob"));
        assert_eq!(outcome.enriched, 0);
    }

    #[test]
    fn empty_and_whitespace_input_is_empty_error() {
        assert!(matches!(ingest("", &ReferenceMap::empty()), Err(ImportError::Empty)));
        assert!(matches!(
            ingest(" \r\n\t\n", &ReferenceMap::empty()),
            Err(ImportError::Empty)
        ));
    }

    #[test]
    fn header_only_is_no_data_rows() {
        assert!(matches!(
            ingest("Name,DefinitionId,Rating\n", &ReferenceMap::empty()),
            Err(ImportError::NoDataRows)
        ));
    }

    #[test]
    fn missing_columns_propagate() {
        let err = ingest("Rating\n80\n", &ReferenceMap::empty()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumns(_)));
    }

    #[test]
    fn all_rows_rejected_is_no_valid_rows() {
        let err = ingest("Name,ID,Rating\nA,1,x\nB,2,101\n", &ReferenceMap::empty()).unwrap_err();
        match err {
            ImportError::NoValidRows { diagnostics } => assert_eq!(diagnostics.len(), 2),
            other => panic!("expected NoValidRows, got {other:?}"),
        }
    }

    #[test]
    fn each_import_gets_a_fresh_roster_id() {
        let text = "Name,ID\nA,1\n";
        let first = ingest(text, &ReferenceMap::empty()).unwrap();
        let second = ingest(text, &ReferenceMap::empty()).unwrap();
        assert!(second.roster.id() > first.roster.id());
        assert_eq!(first.roster.entries(), second.roster.entries());
    }

    #[test]
    fn find_uses_normalized_id() {
        let outcome = ingest("Name,ID\nA,00012\n", &ReferenceMap::empty()).unwrap();
        assert!(outcome.roster.find("12").is_some());
        assert!(outcome.roster.find("012").is_some());
        assert!(outcome.roster.find("13").is_none());
    }
}
