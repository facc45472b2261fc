// Reference player dataset: detailed stats keyed by definition id.
//
// Loaded once at startup and shared read-only (`Arc<ReferenceMap>`). Two
// on-disk formats are supported: the compact JSON array used by the bundled
// asset, and a plain CSV with one column per attribute.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::roster::entry::{normalize_definition_id, DetailedStats, StatsSource};
use crate::roster::reconcile::split_tags;

/// Highest valid face-stat value.
const MAX_STAT: u64 = 99;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Detailed attributes for one known player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub definition_id: String,
    pub name: String,
    pub pace: u8,
    pub shooting: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defending: u8,
    pub physicality: u8,
    pub play_styles: Vec<String>,
    pub play_styles_plus: Vec<String>,
    pub archetype: Option<String>,
    pub tactical_intelligence: Option<u8>,
}

impl ReferenceEntry {
    /// The entry's attributes in the form merged into a roster entry.
    pub fn detailed_stats(&self) -> DetailedStats {
        DetailedStats {
            pace: self.pace,
            shooting: self.shooting,
            passing: self.passing,
            dribbling: self.dribbling,
            defending: self.defending,
            physicality: self.physicality,
            play_styles: self.play_styles.clone(),
            play_styles_plus: self.play_styles_plus.clone(),
            archetype: self.archetype.clone(),
            tactical_intelligence: self.tactical_intelligence,
            source: StatsSource::Reference,
        }
    }
}

/// Immutable lookup from normalized definition id to reference entry.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceMap {
    pub fn empty() -> Self {
        ReferenceMap::default()
    }

    /// Build a map from entries. Ids are normalized; on duplicates the later
    /// entry wins.
    pub fn from_entries(entries: impl IntoIterator<Item = ReferenceEntry>) -> Self {
        let mut map = HashMap::new();
        for mut entry in entries {
            entry.definition_id = normalize_definition_id(&entry.definition_id);
            if map.contains_key(&entry.definition_id) {
                warn!(
                    "duplicate reference entry for id {}, using latest",
                    entry.definition_id
                );
            }
            map.insert(entry.definition_id.clone(), entry);
        }
        ReferenceMap { entries: map }
    }

    /// Look up an id. The id is normalized before lookup.
    pub fn get(&self, definition_id: &str) -> Option<&ReferenceEntry> {
        self.entries
            .get(definition_id)
            .or_else(|| self.entries.get(&normalize_definition_id(definition_id)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read reference data {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON in reference data {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in reference data {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("unsupported reference data format: {path} (expected .json or .csv)")]
    UnsupportedFormat { path: String },
}

// ---------------------------------------------------------------------------
// Raw serde structs (private)
// ---------------------------------------------------------------------------

/// A stat value that may be written as a number or as numeric text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatValue {
    Number(u64),
    Text(String),
}

impl StatValue {
    fn to_stat(&self) -> Option<u8> {
        let value = match self {
            StatValue::Number(n) => *n,
            StatValue::Text(s) => s.trim().parse::<u64>().ok()?,
        };
        (value <= MAX_STAT).then_some(value as u8)
    }
}

/// A definition id written as a number or as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    fn to_id(&self) -> String {
        match self {
            IdValue::Number(n) => n.to_string(),
            IdValue::Text(s) => normalize_definition_id(s),
        }
    }
}

/// Compact JSON record of the bundled asset. Single-letter keys keep the
/// asset small.
#[derive(Debug, Deserialize)]
struct RawCompactPlayer {
    id: IdValue,
    #[serde(default)]
    n: String,
    p: StatValue,
    s: StatValue,
    a: StatValue,
    d: StatValue,
    e: StatValue,
    h: StatValue,
    #[serde(default)]
    pl: Vec<String>,
    #[serde(default)]
    ps: Vec<String>,
    #[serde(default)]
    at: Option<String>,
    #[serde(default)]
    ti: Option<StatValue>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawReferenceRow {
    #[serde(alias = "ID", alias = "Id")]
    DefinitionId: String,
    #[serde(default)]
    Name: String,
    Pace: String,
    Shooting: String,
    Passing: String,
    Dribbling: String,
    Defending: String,
    Physicality: String,
    #[serde(default)]
    PlayStyle: String,
    #[serde(default)]
    PlayStylePlus: String,
    #[serde(default)]
    Archetype: String,
    #[serde(default)]
    TacticalIntelligence: String,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl RawCompactPlayer {
    fn into_entry(self) -> Result<ReferenceEntry, String> {
        let id = self.id.to_id();
        if id.is_empty() {
            return Err("empty id".to_string());
        }
        let stat = |value: &StatValue, label: &str| {
            value
                .to_stat()
                .ok_or_else(|| format!("invalid {label} for id {id}"))
        };
        Ok(ReferenceEntry {
            pace: stat(&self.p, "pace")?,
            shooting: stat(&self.s, "shooting")?,
            passing: stat(&self.a, "passing")?,
            dribbling: stat(&self.d, "dribbling")?,
            defending: stat(&self.e, "defending")?,
            physicality: stat(&self.h, "physicality")?,
            tactical_intelligence: self.ti.as_ref().and_then(StatValue::to_stat),
            name: self.n.trim().to_string(),
            play_styles: clean_tags(self.pl),
            play_styles_plus: clean_tags(self.ps),
            archetype: non_empty(self.at),
            definition_id: id,
        })
    }
}

impl RawReferenceRow {
    fn into_entry(self) -> Result<ReferenceEntry, String> {
        let id = normalize_definition_id(&self.DefinitionId);
        if id.is_empty() {
            return Err("empty DefinitionId".to_string());
        }
        let stat = |raw: &str, label: &str| {
            StatValue::Text(raw.to_string())
                .to_stat()
                .ok_or_else(|| format!("invalid {label} \"{}\" for id {id}", raw.trim()))
        };
        Ok(ReferenceEntry {
            pace: stat(&self.Pace, "Pace")?,
            shooting: stat(&self.Shooting, "Shooting")?,
            passing: stat(&self.Passing, "Passing")?,
            dribbling: stat(&self.Dribbling, "Dribbling")?,
            defending: stat(&self.Defending, "Defending")?,
            physicality: stat(&self.Physicality, "Physicality")?,
            tactical_intelligence: StatValue::Text(self.TacticalIntelligence).to_stat(),
            name: self.Name.trim().to_string(),
            play_styles: split_tags(&self.PlayStyle),
            play_styles_plus: split_tags(&self.PlayStylePlus),
            archetype: non_empty(Some(self.Archetype)),
            definition_id: id,
        })
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Parse the compact JSON array format. Individual malformed records are
/// skipped; only a document that is not a JSON array fails.
pub fn load_json_from_reader<R: Read>(rdr: R) -> Result<ReferenceMap, serde_json::Error> {
    let records: Vec<serde_json::Value> = serde_json::from_reader(rdr)?;
    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let parsed = serde_json::from_value::<RawCompactPlayer>(record)
            .map_err(|e| e.to_string())
            .and_then(RawCompactPlayer::into_entry);
        match parsed {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!("skipping reference record {}: {}", index, reason),
        }
    }
    Ok(ReferenceMap::from_entries(entries))
}

/// Parse the CSV reference format. List columns are `|`-separated.
pub fn load_csv_from_reader<R: Read>(rdr: R) -> Result<ReferenceMap, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(rdr);
    let mut entries = Vec::new();
    for result in reader.deserialize::<RawReferenceRow>() {
        match result.map_err(|e| e.to_string()).and_then(RawReferenceRow::into_entry) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!("skipping malformed reference row: {}", reason),
        }
    }
    Ok(ReferenceMap::from_entries(entries))
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

/// Load a reference dataset, choosing the format from the file extension.
pub fn load(path: &Path) -> Result<ReferenceMap, ReferenceError> {
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let file = || {
        std::fs::File::open(path).map_err(|source| ReferenceError::Io {
            path: display.clone(),
            source,
        })
    };
    match extension.as_deref() {
        Some("json") => load_json_from_reader(file()?).map_err(|source| ReferenceError::Json {
            path: display.clone(),
            source,
        }),
        Some("csv") => load_csv_from_reader(file()?).map_err(|source| ReferenceError::Csv {
            path: display.clone(),
            source,
        }),
        _ => Err(ReferenceError::UnsupportedFormat { path: display.clone() }),
    }
}

/// Load a reference dataset, degrading to an empty map on any failure.
/// Roster entries then simply carry no reference stats.
pub fn load_or_empty(path: &Path) -> ReferenceMap {
    match load(path) {
        Ok(map) => {
            info!("loaded {} reference players from {}", map.len(), path.display());
            map
        }
        Err(e) => {
            warn!("reference data unavailable, continuing without enrichment: {}", e);
            ReferenceMap::empty()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_compact_format_accepts_text_and_numbers() {
        let json = r#"[
            {"id": "189596", "n": "Thomas Müller", "p": "92", "s": "85", "a": "80",
             "d": "83", "e": "40", "h": "70", "ps": ["Finesse Shot"], "at": "Magician"},
            {"id": 231747, "n": "Kylian Mbappé", "p": 97, "s": 90, "a": 80,
             "d": 92, "e": 36, "h": 78, "ti": 88}
        ]"#;
        let map = load_json_from_reader(json.as_bytes()).unwrap();
        assert_eq!(map.len(), 2);

        let muller = map.get("189596").unwrap();
        assert_eq!(muller.pace, 92);
        assert_eq!(muller.play_styles_plus, vec!["Finesse Shot"]);
        assert_eq!(muller.archetype.as_deref(), Some("Magician"));
        assert_eq!(muller.tactical_intelligence, None);

        let mbappe = map.get("231747").unwrap();
        assert_eq!(mbappe.pace, 97);
        assert_eq!(mbappe.tactical_intelligence, Some(88));
        assert!(mbappe.play_styles_plus.is_empty());
    }

    #[test]
    fn json_malformed_records_are_skipped() {
        let json = r#"[
            {"id": "1", "p": "80", "s": "80", "a": "80", "d": "80", "e": "80", "h": "80"},
            {"id": "2", "p": "fast"},
            {"id": "3", "p": "120", "s": "80", "a": "80", "d": "80", "e": "80", "h": "80"},
            "not an object"
        ]"#;
        let map = load_json_from_reader(json.as_bytes()).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.get("1").is_some());
    }

    #[test]
    fn json_non_array_document_fails() {
        assert!(load_json_from_reader(r#"{"id": "1"}"#.as_bytes()).is_err());
        assert!(load_json_from_reader("not json".as_bytes()).is_err());
    }

    #[test]
    fn ids_are_normalized_for_lookup() {
        let json = r#"[{"id": "00042", "p": 1, "s": 2, "a": 3, "d": 4, "e": 5, "h": 6}]"#;
        let map = load_json_from_reader(json.as_bytes()).unwrap();
        assert!(map.get("42").is_some());
        assert!(map.get(" 0042 ").is_some());
        assert!(map.get("43").is_none());
    }

    #[test]
    fn csv_format_with_list_columns() {
        let csv_data = "\
DefinitionId,Name,Pace,Shooting,Passing,Dribbling,Defending,Physicality,PlayStyle,PlayStylePlus,Archetype,TacticalIntelligence
189596,Thomas Müller,92,85,80,83,40,70,Incisive Pass|Trivela,Finesse Shot,Magician,91
200,Broken,fast,1,1,1,1,1,,,,
300,No Extras,50,50,50,50,50,50,,,,
";
        let map = load_csv_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(map.len(), 2);
        let muller = map.get("189596").unwrap();
        assert_eq!(muller.play_styles, vec!["Incisive Pass", "Trivela"]);
        assert_eq!(muller.play_styles_plus, vec!["Finesse Shot"]);
        assert_eq!(muller.tactical_intelligence, Some(91));
        let plain = map.get("300").unwrap();
        assert!(plain.play_styles.is_empty());
        assert_eq!(plain.archetype, None);
        assert_eq!(plain.tactical_intelligence, None);
    }

    #[test]
    fn duplicate_ids_later_wins() {
        let csv_data = "\
ID,Pace,Shooting,Passing,Dribbling,Defending,Physicality
7,10,10,10,10,10,10
007,20,20,20,20,20,20
";
        let map = load_csv_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("7").unwrap().pace, 20);
    }

    #[test]
    fn detailed_stats_are_marked_as_reference() {
        let entry = ReferenceEntry {
            definition_id: "1".into(),
            name: String::new(),
            pace: 1,
            shooting: 2,
            passing: 3,
            dribbling: 4,
            defending: 5,
            physicality: 6,
            play_styles: vec![],
            play_styles_plus: vec!["Rapid".into()],
            archetype: None,
            tactical_intelligence: Some(70),
        };
        let stats = entry.detailed_stats();
        assert_eq!(stats.source, StatsSource::Reference);
        assert_eq!(stats.physicality, 6);
        assert_eq!(stats.play_styles_plus, vec!["Rapid"]);
    }

    #[test]
    fn load_or_empty_degrades_on_missing_file() {
        let map = load_or_empty(Path::new("/nonexistent/players.json"));
        assert!(map.is_empty());
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let err = load(Path::new("players.xml")).unwrap_err();
        assert!(matches!(err, ReferenceError::UnsupportedFormat { .. }));
    }

    #[test]
    fn load_reads_json_file_from_disk() {
        let dir = std::env::temp_dir().join(format!("squad_ref_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("players.json");
        std::fs::write(
            &path,
            r#"[{"id": "5", "p": 1, "s": 2, "a": 3, "d": 4, "e": 5, "h": 6}]"#,
        )
        .unwrap();
        let map = load(&path).unwrap();
        assert_eq!(map.len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
