// Reference enrichment join.

use tracing::debug;

use super::entry::RosterEntry;
use crate::reference::ReferenceMap;

/// Merge reference stats into each entry whose definition id is known.
///
/// A match replaces any stats the export supplied. Entries without a match
/// keep whatever they already had (usually nothing). The reference map is
/// only read.
pub fn enrich(entries: Vec<RosterEntry>, reference: &ReferenceMap) -> Vec<RosterEntry> {
    if reference.is_empty() {
        return entries;
    }

    let mut matched = 0usize;
    let enriched: Vec<RosterEntry> = entries
        .into_iter()
        .map(|mut entry| {
            if let Some(found) = reference.get(&entry.definition_id) {
                entry.detailed = Some(found.detailed_stats());
                matched += 1;
            }
            entry
        })
        .collect();

    debug!(
        "enrichment matched {} of {} entries",
        matched,
        enriched.len()
    );
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceEntry;
    use crate::roster::entry::{DetailedStats, StatsSource};

    fn reference_with(id: &str, pace: u8) -> ReferenceMap {
        ReferenceMap::from_entries([ReferenceEntry {
            definition_id: id.into(),
            name: "Ref".into(),
            pace,
            shooting: 85,
            passing: 80,
            dribbling: 83,
            defending: 40,
            physicality: 70,
            play_styles: vec![],
            play_styles_plus: vec!["Finesse Shot".into()],
            archetype: Some("Magician".into()),
            tactical_intelligence: None,
        }])
    }

    #[test]
    fn matching_id_acquires_stats() {
        let reference = reference_with("189596", 92);
        let entries = vec![RosterEntry::new("189596", "Müller"), RosterEntry::new("1", "Nobody")];
        let out = enrich(entries, &reference);

        assert!(out[0].has_detailed_stats());
        let stats = out[0].detailed.as_ref().unwrap();
        assert_eq!(stats.pace, 92);
        assert_eq!(stats.archetype.as_deref(), Some("Magician"));
        assert_eq!(stats.source, StatsSource::Reference);

        assert!(!out[1].has_detailed_stats());
        assert!(out[1].detailed.is_none());
    }

    #[test]
    fn reference_overrides_export_stats() {
        let reference = reference_with("5", 60);
        let mut entry = RosterEntry::new("5", "Export");
        entry.detailed = Some(DetailedStats {
            pace: 10,
            shooting: 10,
            passing: 10,
            dribbling: 10,
            defending: 10,
            physicality: 10,
            play_styles: vec![],
            play_styles_plus: vec![],
            archetype: None,
            tactical_intelligence: None,
            source: StatsSource::Export,
        });
        let out = enrich(vec![entry], &reference);
        let stats = out[0].detailed.as_ref().unwrap();
        assert_eq!(stats.pace, 60);
        assert_eq!(stats.source, StatsSource::Reference);
    }

    #[test]
    fn empty_reference_is_identity() {
        let entries = vec![RosterEntry::new("1", "A"), RosterEntry::new("2", "B")];
        let out = enrich(entries.clone(), &ReferenceMap::empty());
        assert_eq!(out, entries);
    }

    #[test]
    fn order_is_preserved() {
        let reference = reference_with("2", 70);
        let entries = vec![
            RosterEntry::new("3", "C"),
            RosterEntry::new("2", "B"),
            RosterEntry::new("1", "A"),
        ];
        let names: Vec<String> = enrich(entries, &reference).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }
}
