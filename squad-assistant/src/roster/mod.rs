// Club roster ingestion: tokenize, reconcile, enrich.

pub mod enrich;
pub mod entry;
pub mod fields;
pub mod ingest;
pub mod reconcile;
pub mod tokenizer;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use enrich::enrich;
pub use entry::{
    format_coins, parse_flag, DetailedStats, Price, RosterEntry, StatsSource, PRICE_UNAVAILABLE,
};
pub use fields::{CanonicalField, ColumnMap};
pub use ingest::{ingest, ImportOutcome, Roster, RosterId};
pub use reconcile::{reconcile, Reconciliation, MAX_RATING, REQUIRED_FIELDS};
pub use tokenizer::{tokenize, RawRow};

/// A non-fatal record explaining why one input row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source record number; the header is row 1.
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// Import failures that reject the whole file.
///
/// Row-level problems never surface here on their own; they become
/// diagnostics. `NoValidRows` is the only variant that carries them, for the
/// case where every data row was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV is empty")]
    Empty,

    #[error("CSV has a header but no data rows")]
    NoDataRows,

    #[error("CSV is missing required columns: {}", join_labels(.0))]
    MissingColumns(Vec<CanonicalField>),

    #[error("no valid data: all {} data rows were rejected", .diagnostics.len())]
    NoValidRows { diagnostics: Vec<Diagnostic> },
}

fn join_labels(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic {
            row: 3,
            reason: "invalid rating \"200\"".into(),
        };
        assert_eq!(d.to_string(), "row 3: invalid rating \"200\"");
    }

    #[test]
    fn import_error_messages_are_distinct() {
        assert_eq!(ImportError::Empty.to_string(), "CSV is empty");
        assert_ne!(
            ImportError::Empty.to_string(),
            ImportError::NoDataRows.to_string()
        );
        let missing =
            ImportError::MissingColumns(vec![CanonicalField::Name, CanonicalField::DefinitionId]);
        assert_eq!(
            missing.to_string(),
            "CSV is missing required columns: Name, DefinitionId"
        );
        let none = ImportError::NoValidRows {
            diagnostics: vec![Diagnostic { row: 2, reason: "x".into() }],
        };
        assert!(none.to_string().starts_with("no valid data"));
    }
}
