// Row reconciliation: tokenized rows to validated `RosterEntry` values.
//
// Structural problems (missing required columns) reject the whole import.
// Everything else is decided per row: a bad row is skipped with a
// `Diagnostic` and never affects its neighbours.

use tracing::{debug, warn};

use super::entry::{parse_flag, DetailedStats, Price, RosterEntry, StatsSource, PRICE_UNAVAILABLE};
use super::fields::{CanonicalField, ColumnMap};
use super::tokenizer::RawRow;
use super::{Diagnostic, ImportError};

/// Columns an export must carry for the import to proceed at all.
pub const REQUIRED_FIELDS: [CanonicalField; 2] =
    [CanonicalField::Name, CanonicalField::DefinitionId];

/// Highest valid card rating.
pub const MAX_RATING: u8 = 99;

/// Result of reconciling one export.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub entries: Vec<RosterEntry>,
    pub diagnostics: Vec<Diagnostic>,
    /// Non-blank data rows seen (accepted + skipped).
    pub data_rows: usize,
}

/// Reconcile `rows` against `header`.
///
/// Row numbers in diagnostics are 1-based record numbers counting the header
/// as row 1, so the first data row is row 2.
pub fn reconcile(header: &[String], rows: &[RawRow]) -> Result<Reconciliation, ImportError> {
    let columns = ColumnMap::from_headers(header);

    let missing = columns.missing(&REQUIRED_FIELDS);
    if !missing.is_empty() {
        warn!(
            "import rejected: missing required columns {:?} (headers: {:?})",
            missing, header
        );
        return Err(ImportError::MissingColumns(missing));
    }

    if !columns.unmapped().is_empty() {
        debug!("ignoring unrecognized columns: {:?}", columns.unmapped());
    }
    if !columns.shadowed().is_empty() {
        debug!(
            "ignoring duplicate columns (first occurrence wins): {:?}",
            columns.shadowed()
        );
    }
    if !columns.contains(CanonicalField::Rating) {
        warn!("export has no Rating column; ratings will be unknown");
    }

    let mut result = Reconciliation::default();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;

        if is_blank(row) {
            continue;
        }
        result.data_rows += 1;

        match reconcile_row(&columns, header.len(), row) {
            Ok(entry) => result.entries.push(entry),
            Err(reason) => {
                warn!("skipping row {}: {}", row_number, reason);
                result.diagnostics.push(Diagnostic {
                    row: row_number,
                    reason,
                });
            }
        }
    }

    Ok(result)
}

/// A residual blank line tokenizes to a single empty (or whitespace) field.
fn is_blank(row: &RawRow) -> bool {
    row.len() == 1 && row[0].trim().is_empty()
}

/// Build one entry, or return a human-readable reason for rejecting the row.
fn reconcile_row(
    columns: &ColumnMap,
    expected_fields: usize,
    row: &RawRow,
) -> Result<RosterEntry, String> {
    if row.len() != expected_fields {
        return Err(format!(
            "expected {} fields, found {}",
            expected_fields,
            row.len()
        ));
    }

    let cell = |field: CanonicalField| cell_text(columns, row, field);

    let name = cell(CanonicalField::Name);
    if name.is_empty() {
        return Err("missing Name".to_string());
    }
    let definition_id = cell(CanonicalField::DefinitionId);
    if definition_id.is_empty() {
        return Err(format!("missing DefinitionId for \"{name}\""));
    }

    let rating = if columns.contains(CanonicalField::Rating) {
        Some(parse_rating(cell(CanonicalField::Rating)).map_err(|raw| {
            format!("invalid rating \"{raw}\" for \"{name}\" (expected 0-{MAX_RATING})")
        })?)
    } else {
        None
    };

    let mut entry = RosterEntry::new(definition_id, name);
    entry.rating = rating;
    entry.rarity = cell(CanonicalField::Rarity).to_string();
    entry.preferred_position = cell(CanonicalField::PreferredPosition).to_string();
    entry.alternate_positions = cell(CanonicalField::AlternatePositions).to_string();
    entry.nation = cell(CanonicalField::Nation).to_string();
    entry.league = cell(CanonicalField::League).to_string();
    entry.team = cell(CanonicalField::Team).to_string();
    entry.price_limits = cell(CanonicalField::PriceLimits).to_string();
    entry.last_sale_price = cell(CanonicalField::LastSalePrice).to_string();
    entry.discard_value = cell(CanonicalField::DiscardValue).to_string();
    entry.untradeable = parse_flag(cell(CanonicalField::Untradeable));
    entry.loans = parse_flag(cell(CanonicalField::Loans));
    entry.is_duplicate = parse_flag(cell(CanonicalField::IsDuplicate));
    entry.is_in_active_11 = parse_flag(cell(CanonicalField::IsInActive11));

    let raw_price = cell(CanonicalField::ExternalPrice);
    entry.external_price = Price::parse(raw_price);
    if !raw_price.is_empty()
        && !entry.external_price.is_available()
        && raw_price != PRICE_UNAVAILABLE
    {
        debug!("unreadable price \"{}\" for \"{}\", treating as unavailable", raw_price, name);
    }

    entry.detailed = export_stats(columns, row);

    Ok(entry)
}

/// Trimmed cell text for `field`, or empty when the column is absent.
fn cell_text<'r>(columns: &ColumnMap, row: &'r [String], field: CanonicalField) -> &'r str {
    columns
        .index(field)
        .and_then(|i| row.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// Strict rating parse: an integer in `0..=MAX_RATING`. Returns the raw text
/// on failure so the diagnostic can quote it.
fn parse_rating(raw: &str) -> Result<u8, String> {
    match raw.parse::<i64>() {
        Ok(n) if (0..=i64::from(MAX_RATING)).contains(&n) => Ok(n as u8),
        _ => Err(raw.to_string()),
    }
}

/// Detailed stats carried by the export itself. Only formed when all six face
/// stats are present and valid; a partial set is ignored.
fn export_stats(columns: &ColumnMap, row: &[String]) -> Option<DetailedStats> {
    let cell = |field: CanonicalField| cell_text(columns, row, field);
    let mut face = [0u8; 6];
    for (slot, field) in face.iter_mut().zip(CanonicalField::SUBSTATS) {
        *slot = parse_stat(cell(field))?;
    }
    Some(DetailedStats {
        pace: face[0],
        shooting: face[1],
        passing: face[2],
        dribbling: face[3],
        defending: face[4],
        physicality: face[5],
        play_styles: split_tags(cell(CanonicalField::PlayStyles)),
        play_styles_plus: split_tags(cell(CanonicalField::PlayStylePlus)),
        archetype: Some(cell(CanonicalField::Archetype).to_string()).filter(|s| !s.is_empty()),
        tactical_intelligence: parse_stat(cell(CanonicalField::TacticalIntelligence)),
        source: StatsSource::Export,
    })
}

fn parse_stat(raw: &str) -> Option<u8> {
    raw.parse::<u8>().ok().filter(|v| *v <= MAX_RATING)
}

/// Split a tag list cell. Exports use `|` or `;` between tags, and sometimes
/// commas inside a quoted cell.
pub(crate) fn split_tags(raw: &str) -> Vec<String> {
    raw.split(['|', ';', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
