// Prompt templates for squad improvement recommendations.
//
// The roster is sent as a compact JSON array so a full club fits in one
// request. Only the fields the model needs to reason about lineups and
// chemistry are included.

use serde::Serialize;

use crate::roster::RosterEntry;

// ---------------------------------------------------------------------------
// Compact roster projection
// ---------------------------------------------------------------------------

/// The subset of a roster entry sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactPlayer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub positions: Vec<String>,
    pub team: String,
    pub league: String,
    pub nation: String,
    pub untradeable: bool,
    /// Coin price, or `None` when unavailable.
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CompactStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactStats {
    pub pac: u8,
    pub sho: u8,
    pub pas: u8,
    pub dri: u8,
    pub def: u8,
    pub phy: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,
    #[serde(rename = "playStyles", skip_serializing_if = "Vec::is_empty")]
    pub play_styles: Vec<String>,
    #[serde(rename = "playStylesPlus", skip_serializing_if = "Vec::is_empty")]
    pub play_styles_plus: Vec<String>,
}

impl CompactPlayer {
    pub fn from_entry(entry: &RosterEntry) -> Self {
        CompactPlayer {
            name: entry.name.clone(),
            rating: entry.rating,
            positions: entry.positions(),
            team: entry.team.clone(),
            league: entry.league.clone(),
            nation: entry.nation.clone(),
            untradeable: entry.untradeable,
            price: entry.external_price.coins(),
            stats: entry.detailed.as_ref().map(|d| CompactStats {
                pac: d.pace,
                sho: d.shooting,
                pas: d.passing,
                dri: d.dribbling,
                def: d.defending,
                phy: d.physicality,
                archetype: d.archetype.clone(),
                play_styles: d.play_styles.clone(),
                play_styles_plus: d.play_styles_plus.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Return the static system prompt for recommendation requests.
pub fn system_prompt() -> String {
    "You are an expert EA FC Ultimate Team squad builder.\n\
     \n\
     You receive the user's club as a JSON array of players, their coin budget, and \
     optionally a preferred formation. Each player lists rating, positions, club, league, \
     nation, whether the card is untradeable, its market price (null when unknown), and \
     face stats when known.\n\
     \n\
     Your job:\n\
     1. Build the strongest starting XI from the club, maximizing team chemistry \
     (shared club, league and nation links) as well as rating. Use exactly 11 players, \
     each in a position they can play.\n\
     2. Suggest upgrades the user can afford with their budget. Each upgrade names the \
     club player to replace, the replacement's name, league, nation and club, an \
     approximate price in coins, and a one-sentence reason. The combined price of all \
     upgrades must not exceed the budget.\n\
     3. Write a short strategy summary (2-3 sentences).\n\
     \n\
     Respond with ONLY a JSON object, no markdown and no commentary, matching:\n\
     {\"suggestedLineup\":{\"formation\":string,\"players\":[{\"name\":string,\
     \"position\":string,\"rating\":string,\"team\":string,\"league\":string,\
     \"nation\":string}]},\"upgrades\":[{\"replace\":string,\"with\":{\"name\":string,\
     \"league\":string,\"nation\":string,\"club\":string},\"approximatePrice\":number,\
     \"reason\":string}],\"summary\":string}"
        .to_string()
}

// ---------------------------------------------------------------------------
// Recommendation prompt
// ---------------------------------------------------------------------------

/// Build the user message for a recommendation request.
pub fn build_recommendation_prompt(
    players: &[CompactPlayer],
    budget: u64,
    formation: Option<&str>,
) -> String {
    // Serializing plain structs of strings and numbers cannot fail.
    let roster_json = serde_json::to_string(players).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::with_capacity(roster_json.len() + 512);

    prompt.push_str("## BUDGET\n");
    prompt.push_str(&format!("{budget} coins\n\n"));

    prompt.push_str("## FORMATION\n");
    match formation.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => prompt.push_str(&format!("Use the {f} formation.\n\n")),
        None => prompt.push_str("Choose the formation that best suits this club.\n\n"),
    }

    prompt.push_str(&format!("## MY CLUB ({} players)\n", players.len()));
    prompt.push_str(&roster_json);
    prompt.push_str("\n\n");

    prompt.push_str(
        "Untradeable players cannot be sold; prefer keeping them in the lineup. \
         Return only the JSON object.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{DetailedStats, Price, StatsSource};

    fn entry() -> RosterEntry {
        let mut e = RosterEntry::new("189596", "Thomas Müller");
        e.rating = Some(87);
        e.preferred_position = "CAM".into();
        e.alternate_positions = "ST, CF".into();
        e.team = "FC Bayern".into();
        e.league = "Bundesliga".into();
        e.nation = "Germany".into();
        e.untradeable = true;
        e.external_price = Price::Coins(42_000);
        e
    }

    #[test]
    fn compact_player_without_stats_omits_them() {
        let compact = CompactPlayer::from_entry(&entry());
        assert_eq!(compact.positions, vec!["CAM", "ST", "CF"]);
        assert!(compact.untradeable);
        assert_eq!(compact.price, Some(42_000));

        let json = serde_json::to_value(&compact).unwrap();
        assert!(json.get("stats").is_none());
        assert_eq!(json["rating"], 87);
        assert_eq!(json["untradeable"], true);
    }

    #[test]
    fn compact_player_includes_known_stats() {
        let mut e = entry();
        e.external_price = Price::Unavailable;
        e.detailed = Some(DetailedStats {
            pace: 70,
            shooting: 84,
            passing: 85,
            dribbling: 83,
            defending: 50,
            physicality: 72,
            play_styles: vec![],
            play_styles_plus: vec!["Incisive Pass".into()],
            archetype: Some("Magician".into()),
            tactical_intelligence: None,
            source: StatsSource::Reference,
        });
        let json = serde_json::to_value(CompactPlayer::from_entry(&e)).unwrap();
        assert_eq!(json["price"], serde_json::Value::Null);
        assert_eq!(json["stats"]["pac"], 70);
        assert_eq!(json["stats"]["archetype"], "Magician");
        assert_eq!(json["stats"]["playStylesPlus"][0], "Incisive Pass");
        assert!(json["stats"].get("playStyles").is_none());
    }

    #[test]
    fn prompt_contains_budget_formation_and_roster() {
        let players = vec![CompactPlayer::from_entry(&entry())];
        let prompt = build_recommendation_prompt(&players, 50_000, Some("4-2-3-1"));
        assert!(prompt.contains("50000 coins"));
        assert!(prompt.contains("Use the 4-2-3-1 formation."));
        assert!(prompt.contains("## MY CLUB (1 players)"));
        assert!(prompt.contains("Thomas Müller"));
    }

    #[test]
    fn prompt_without_formation_lets_model_choose() {
        let prompt = build_recommendation_prompt(&[], 0, Some("  "));
        assert!(prompt.contains("Choose the formation"));
        assert!(prompt.contains("[]"));
    }

    #[test]
    fn system_prompt_describes_schema() {
        let sys = system_prompt();
        assert!(sys.contains("suggestedLineup"));
        assert!(sys.contains("approximatePrice"));
        assert!(sys.contains("exactly 11"));
    }
}
