// Line-oriented text front end.
//
// Parses one line of user input into a `UserCommand` and renders each
// `UiUpdate` from the orchestrator as plain text. The terminal is owned by
// this module; logging goes to a file.

use std::fmt::Write as _;

use crate::llm::recommendation::Recommendation;
use crate::protocol::{FilterUpdate, LlmStatus, UiUpdate, UserCommand};
use crate::roster::{Price, RosterEntry, PRICE_UNAVAILABLE};
use crate::view::{
    ClubStats, Comparison, Direction, SortCriteria, SortField, SortKey, TradeFilter, Verdict,
};

pub use crate::roster::format_coins;

pub const HELP: &str = "\
Commands:
  import <path>                 load a club CSV export
  coins <amount>                set the coin budget
  filter name|position|club|rarity|nation [text]
  filter rating <min> <max>
  filter price <min> [max]
  filter tradeable yes|no|all
  reset                         clear all filters
  sort <field> [asc|desc], ...  fields: name rating price position team league nation
  sort none                     keep import order
  list                          show the filtered roster
  stats                         club-wide statistics
  compare <a> <b>               compare two players by id (or `name vs name`)
  diagnostics                   rows skipped by the last import
  recommend [formation]         ask for a lineup and upgrades
  save | restore                persist or reload the session
  help | quit";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(UserCommand),
    Help,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command \"{0}\" (type `help` for a list)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("not a number: \"{0}\"")]
    Number(String),

    #[error("{0}")]
    Invalid(String),
}

/// Parse one line of console input.
pub fn parse_command(line: &str) -> Result<Input, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let cmd = match verb.to_lowercase().as_str() {
        "import" | "load" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("import <path>"));
            }
            UserCommand::ImportFile {
                path: rest.to_string(),
            }
        }
        "coins" | "budget" => UserCommand::SetCoins(parse_amount(rest, "coins <amount>")?),
        "filter" => UserCommand::SetFilter(parse_filter(rest)?),
        "reset" => UserCommand::ResetFilters,
        "sort" => UserCommand::SetSort(parse_sort(rest)?),
        "list" | "ls" => UserCommand::ShowRoster,
        "stats" => UserCommand::ShowStats,
        "compare" => {
            let (left, right) = parse_pair(rest)?;
            UserCommand::Compare { left, right }
        }
        "diagnostics" | "diag" => UserCommand::ShowDiagnostics,
        "recommend" => UserCommand::RequestRecommendation {
            formation: (!rest.is_empty()).then(|| rest.to_string()),
        },
        "save" => UserCommand::SaveSession,
        "restore" => UserCommand::RestoreSession,
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => UserCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Input::Command(cmd))
}

/// Non-negative integer, tolerating `,` and `_` separators.
fn parse_amount(text: &str, usage: &'static str) -> Result<u64, ParseError> {
    if text.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | '_')).collect();
    cleaned
        .parse::<u64>()
        .map_err(|_| ParseError::Number(text.to_string()))
}

fn parse_rating(text: &str) -> Result<u8, ParseError> {
    match text.parse::<u8>() {
        Ok(r) if r <= crate::roster::MAX_RATING => Ok(r),
        _ => Err(ParseError::Invalid(format!(
            "rating must be 0-{}: \"{text}\"",
            crate::roster::MAX_RATING
        ))),
    }
}

fn parse_filter(rest: &str) -> Result<FilterUpdate, ParseError> {
    const USAGE: &str = "filter <name|position|club|rarity|nation|rating|price|tradeable> ...";

    let (field, value) = match rest.split_once(char::is_whitespace) {
        Some((field, value)) => (field, value.trim()),
        None => (rest, ""),
    };
    let update = match field.to_lowercase().as_str() {
        "name" => FilterUpdate::Name(value.to_string()),
        "position" | "pos" => FilterUpdate::Position(value.to_string()),
        "club" | "team" | "league" => FilterUpdate::Club(value.to_string()),
        "rarity" => FilterUpdate::Rarity(value.to_string()),
        "nation" => FilterUpdate::Nation(value.to_string()),
        "rating" => {
            let parts: Vec<&str> = value.split_whitespace().collect();
            let [min, max] = parts[..] else {
                return Err(ParseError::Usage("filter rating <min> <max>"));
            };
            FilterUpdate::Rating {
                min: parse_rating(min)?,
                max: parse_rating(max)?,
            }
        }
        "price" => {
            let parts: Vec<&str> = value.split_whitespace().collect();
            let (min, max) = match parts[..] {
                [min] => (min, None),
                [min, max] => (min, Some(max)),
                _ => return Err(ParseError::Usage("filter price <min> [max]")),
            };
            let max = match max {
                None | Some("max") | Some("any") => None,
                Some(m) => Some(parse_amount(m, "filter price <min> [max]")?),
            };
            FilterUpdate::Price {
                min: parse_amount(min, "filter price <min> [max]")?,
                max,
            }
        }
        "tradeable" | "tradable" | "trade" => {
            let trade = match value.to_lowercase().as_str() {
                "yes" | "y" | "true" => TradeFilter::Tradeable,
                "no" | "n" | "false" => TradeFilter::Untradeable,
                "all" | "" => TradeFilter::All,
                _ => return Err(ParseError::Usage("filter tradeable yes|no|all")),
            };
            FilterUpdate::Trade(trade)
        }
        _ => return Err(ParseError::Usage(USAGE)),
    };
    Ok(update)
}

/// `rating desc, name` -> two keys. `none` or nothing clears the sort.
fn parse_sort(rest: &str) -> Result<SortCriteria, ParseError> {
    if rest.is_empty() || rest.eq_ignore_ascii_case("none") {
        return Ok(SortCriteria::default());
    }
    let mut keys = Vec::new();
    for part in rest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut words = part.split_whitespace();
        let field: SortField = words
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(ParseError::Invalid)?;
        let direction = match words.next().map(str::to_lowercase).as_deref() {
            None | Some("asc") => Direction::Ascending,
            Some("desc") => Direction::Descending,
            Some(other) => {
                return Err(ParseError::Invalid(format!(
                    "unknown sort direction: {other}"
                )))
            }
        };
        keys.push(SortKey::new(field, direction));
    }
    Ok(SortCriteria::new(keys))
}

/// Two player keys: `a b` for ids, or `left vs right` for names with spaces.
fn parse_pair(rest: &str) -> Result<(String, String), ParseError> {
    const USAGE: &str = "compare <a> <b> | compare <name> vs <name>";

    if let Some((left, right)) = rest.split_once(" vs ") {
        let (left, right) = (left.trim(), right.trim());
        if !left.is_empty() && !right.is_empty() {
            return Ok((left.to_string(), right.to_string()));
        }
        return Err(ParseError::Usage(USAGE));
    }
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts[..] {
        [left, right] => Ok((left.to_string(), right.to_string())),
        _ => Err(ParseError::Usage(USAGE)),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn format_price(price: Price) -> String {
    match price {
        Price::Coins(c) => format_coins(c),
        Price::Unavailable => PRICE_UNAVAILABLE.to_string(),
    }
}

/// Cut to `width` characters, marking the cut with `~`.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

/// Render one update as text. Multi-line output has no trailing newline.
pub fn render(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Imported {
            file_name,
            players,
            skipped,
            enriched,
        } => {
            let mut out = format!("Imported {players} players from {file_name}");
            if *enriched > 0 {
                let _ = write!(out, ", {enriched} with detailed stats");
            }
            if *skipped > 0 {
                let _ = write!(out, " ({skipped} rows skipped, see `diagnostics`)");
            }
            out
        }
        UiUpdate::ImportFailed { message } => format!("Import failed: {message}"),
        UiUpdate::Roster { entries, total } => render_roster(entries, *total),
        UiUpdate::Stats(stats) => render_stats(stats),
        UiUpdate::Comparison(comparison) => render_comparison(comparison),
        UiUpdate::Diagnostics(diagnostics) => {
            if diagnostics.is_empty() {
                return "No rows were skipped.".to_string();
            }
            let mut out = format!("{} rows skipped:", diagnostics.len());
            for d in diagnostics {
                let _ = write!(out, "\n  {d}");
            }
            out
        }
        UiUpdate::CoinsChanged(coins) => format!("Budget set to {} coins", format_coins(*coins)),
        UiUpdate::FiltersChanged { active } => match active {
            0 => "Filters cleared".to_string(),
            1 => "1 filter active".to_string(),
            n => format!("{n} filters active"),
        },
        UiUpdate::SortChanged(sort) => {
            if sort.is_empty() {
                "Sorting by import order".to_string()
            } else {
                let keys: Vec<String> = sort.keys().iter().map(ToString::to_string).collect();
                format!("Sorting by {}", keys.join(", "))
            }
        }
        UiUpdate::RecommendationStatus(status) => match status {
            LlmStatus::Streaming => "Requesting squad recommendations...".to_string(),
            LlmStatus::Idle => "No recommendation requested".to_string(),
            LlmStatus::Complete => "Recommendation ready".to_string(),
            LlmStatus::Failed => "Recommendation failed".to_string(),
        },
        UiUpdate::RecommendationProgress { received } => {
            format!("  ...{received} characters received")
        }
        UiUpdate::Recommendation(rec) => render_recommendation(rec),
        UiUpdate::RecommendationFailed { message } => message.clone(),
        UiUpdate::SessionSaved => "Session saved".to_string(),
        UiUpdate::SessionRestored { file_name, coins } => format!(
            "Restored session: {file_name}, {} coins",
            format_coins(*coins)
        ),
        UiUpdate::NoSavedSession => "No saved session".to_string(),
        UiUpdate::Error(message) => format!("Error: {message}"),
    }
}

fn render_roster(entries: &[RosterEntry], total: usize) -> String {
    let mut out = format!(
        "{:<10} {:<24} {:>3} {:<9} {:<18} {:<16} {:<12} {:>12} {:<5}",
        "ID", "Name", "OVR", "Pos", "Team", "League", "Nation", "Price", "Trade"
    );
    for e in entries {
        let rating = e.rating.map_or_else(|| "-".to_string(), |r| r.to_string());
        let positions = e.positions().join("/");
        let _ = write!(
            out,
            "\n{:<10} {:<24} {:>3} {:<9} {:<18} {:<16} {:<12} {:>12} {:<5}{}",
            truncate(&e.definition_id, 10),
            truncate(&e.name, 24),
            rating,
            truncate(&positions, 9),
            truncate(&e.team, 18),
            truncate(&e.league, 16),
            truncate(&e.nation, 12),
            format_price(e.external_price),
            e.is_tradeable(),
            if e.has_detailed_stats() { " *" } else { "" },
        );
    }
    let _ = write!(out, "\nShowing {} of {total} players", entries.len());
    out
}

fn render_stats(stats: &ClubStats) -> String {
    let mut out = format!("Players:          {}", stats.player_count);
    let _ = write!(out, "\nAverage rating:   {:.1}", stats.average_rating);
    let _ = write!(out, "\nRated / priced:   {} / {}", stats.rated_count, stats.priced_count);
    let _ = write!(out, "\nTradeable:        {}", stats.tradeable_count);
    let _ = write!(out, "\nDetailed stats:   {}", stats.detailed_count);
    let _ = write!(
        out,
        "\nPrice range:      {} - {}",
        format_coins(stats.min_price),
        format_coins(stats.max_price)
    );
    let _ = write!(out, "\nClub value:       {}", format_coins(stats.total_value));
    out
}

fn marker(verdict: Verdict, left: bool) -> &'static str {
    match (verdict, left) {
        (Verdict::Left, true) | (Verdict::Right, false) => "+",
        (Verdict::Tie, _) => "=",
        _ => " ",
    }
}

fn render_comparison(c: &Comparison) -> String {
    let mut out = format!(
        "{:<16} {:>22}   {:<22}",
        "",
        truncate(&c.left_name, 22),
        truncate(&c.right_name, 22)
    );
    let rows = c.basic.iter().chain(c.detailed.iter());
    for row in rows {
        let _ = write!(
            out,
            "\n{:<16} {:>21}{} {}{:<22}",
            row.label,
            truncate(&row.left, 21),
            marker(row.verdict, true),
            marker(row.verdict, false),
            truncate(&row.right, 21),
        );
    }
    if c.detailed.is_empty() {
        out.push_str("\n(detailed stats need reference data for both players)");
    }
    out
}

fn render_recommendation(rec: &Recommendation) -> String {
    let lineup = &rec.suggested_lineup;
    let mut out = format!("Suggested lineup ({})", lineup.formation);
    for p in &lineup.players {
        let _ = write!(
            out,
            "\n  {:<5} {:<24} {:>3}  {}",
            p.position,
            truncate(&p.name, 24),
            p.rating,
            [p.team.as_str(), p.league.as_str(), p.nation.as_str()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" | ")
        );
    }
    if !rec.upgrades.is_empty() {
        out.push_str("\nUpgrades");
        for u in &rec.upgrades {
            let _ = write!(
                out,
                "\n  {} -> {} (~{} coins)",
                u.replace,
                u.with.name,
                format_coins(u.approximate_price.round() as u64)
            );
            if !u.reason.is_empty() {
                let _ = write!(out, "\n      {}", u.reason);
            }
        }
    }
    if !rec.summary.is_empty() {
        let _ = write!(out, "\nSummary: {}", rec.summary);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Diagnostic;
    use crate::view::compare;

    fn cmd(line: &str) -> UserCommand {
        match parse_command(line) {
            Ok(Input::Command(c)) => c,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("  "), Ok(Input::Empty));
        assert_eq!(parse_command("help"), Ok(Input::Help));
        assert_eq!(cmd("LIST"), UserCommand::ShowRoster);
        assert_eq!(cmd("stats"), UserCommand::ShowStats);
        assert_eq!(cmd("diag"), UserCommand::ShowDiagnostics);
        assert_eq!(cmd("reset"), UserCommand::ResetFilters);
        assert_eq!(cmd("save"), UserCommand::SaveSession);
        assert_eq!(cmd("restore"), UserCommand::RestoreSession);
        assert_eq!(cmd("quit"), UserCommand::Quit);
        assert!(matches!(
            parse_command("dance"),
            Err(ParseError::Unknown(v)) if v == "dance"
        ));
    }

    #[test]
    fn import_keeps_paths_with_spaces() {
        assert_eq!(
            cmd("import My Club/export 1.csv"),
            UserCommand::ImportFile {
                path: "My Club/export 1.csv".into()
            }
        );
        assert_eq!(parse_command("import"), Err(ParseError::Usage("import <path>")));
    }

    #[test]
    fn coins_accept_separators() {
        assert_eq!(cmd("coins 1,250,000"), UserCommand::SetCoins(1_250_000));
        assert_eq!(
            parse_command("coins lots"),
            Err(ParseError::Number("lots".into()))
        );
    }

    #[test]
    fn parses_filters() {
        assert_eq!(
            cmd("filter name müller"),
            UserCommand::SetFilter(FilterUpdate::Name("müller".into()))
        );
        assert_eq!(
            cmd("filter club"),
            UserCommand::SetFilter(FilterUpdate::Club(String::new()))
        );
        assert_eq!(
            cmd("filter rating 80 90"),
            UserCommand::SetFilter(FilterUpdate::Rating { min: 80, max: 90 })
        );
        assert!(parse_command("filter rating 80 100").is_err());
        assert_eq!(
            cmd("filter price 1000 max"),
            UserCommand::SetFilter(FilterUpdate::Price { min: 1000, max: None })
        );
        assert_eq!(
            cmd("filter price 0 50,000"),
            UserCommand::SetFilter(FilterUpdate::Price {
                min: 0,
                max: Some(50_000)
            })
        );
        assert_eq!(
            cmd("filter tradeable no"),
            UserCommand::SetFilter(FilterUpdate::Trade(TradeFilter::Untradeable))
        );
        assert!(parse_command("filter height 190").is_err());
    }

    #[test]
    fn parses_sort_lists() {
        assert_eq!(
            cmd("sort rating desc, name"),
            UserCommand::SetSort(SortCriteria::new(vec![
                SortKey::new(SortField::Rating, Direction::Descending),
                SortKey::new(SortField::Name, Direction::Ascending),
            ]))
        );
        assert_eq!(cmd("sort none"), UserCommand::SetSort(SortCriteria::default()));
        assert!(parse_command("sort rating sideways").is_err());
        assert!(parse_command("sort height").is_err());
    }

    #[test]
    fn parses_compare_and_recommend() {
        assert_eq!(
            cmd("compare 189596 212622"),
            UserCommand::Compare {
                left: "189596".into(),
                right: "212622".into()
            }
        );
        assert_eq!(
            cmd("compare Thomas Müller vs Joshua Kimmich"),
            UserCommand::Compare {
                left: "Thomas Müller".into(),
                right: "Joshua Kimmich".into()
            }
        );
        assert!(parse_command("compare 1").is_err());
        assert_eq!(
            cmd("recommend"),
            UserCommand::RequestRecommendation { formation: None }
        );
        assert_eq!(
            cmd("recommend 4-2-3-1"),
            UserCommand::RequestRecommendation {
                formation: Some("4-2-3-1".into())
            }
        );
    }

    #[test]
    fn renders_roster_table() {
        let mut a = RosterEntry::new("189596", "Thomas Müller");
        a.rating = Some(87);
        a.preferred_position = "CAM".into();
        a.external_price = Price::Coins(42_000);
        let b = RosterEntry::new("1", "No Price");

        let text = render(&UiUpdate::Roster {
            entries: vec![a, b],
            total: 5,
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("42,000"));
        assert!(lines[2].contains(PRICE_UNAVAILABLE));
        assert_eq!(lines[3], "Showing 2 of 5 players");
    }

    #[test]
    fn renders_comparison_markers() {
        let mut a = RosterEntry::new("1", "Left");
        a.rating = Some(90);
        let mut b = RosterEntry::new("2", "Right");
        b.rating = Some(80);

        let text = render(&UiUpdate::Comparison(compare(&a, &b)));
        let rating_line = text.lines().find(|l| l.starts_with("Rating")).unwrap();
        assert!(rating_line.contains("90+"));
        assert!(text.contains("detailed stats need reference data"));
    }

    #[test]
    fn renders_status_lines() {
        assert_eq!(
            render(&UiUpdate::CoinsChanged(50_000)),
            "Budget set to 50,000 coins"
        );
        assert_eq!(
            render(&UiUpdate::Diagnostics(vec![Diagnostic {
                row: 3,
                reason: "bad".into()
            }])),
            "1 rows skipped:\n  row 3: bad"
        );
        assert_eq!(render(&UiUpdate::FiltersChanged { active: 0 }), "Filters cleared");
        assert!(render(&UiUpdate::Imported {
            file_name: "club.csv".into(),
            players: 10,
            skipped: 2,
            enriched: 0
        })
        .contains("2 rows skipped"));
        assert_eq!(
            render(&UiUpdate::Stats(ClubStats::default())).lines().count(),
            7
        );
    }
}
