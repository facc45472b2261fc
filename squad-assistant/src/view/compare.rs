// Side-by-side comparison of two players.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::roster::{format_coins, Price, RosterEntry};

/// Which side of a comparison row is better, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Left,
    Right,
    Tie,
    /// Informational row, or neither value comparable.
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub label: String,
    pub left: String,
    pub right: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub left_name: String,
    pub right_name: String,
    pub basic: Vec<ComparisonRow>,
    /// Empty unless both players have detailed stats.
    pub detailed: Vec<ComparisonRow>,
}

fn higher_wins(a: Option<u8>, b: Option<u8>) -> Verdict {
    match (a, b) {
        (Some(x), Some(y)) => match x.cmp(&y) {
            Ordering::Greater => Verdict::Left,
            Ordering::Less => Verdict::Right,
            Ordering::Equal => Verdict::Tie,
        },
        _ => Verdict::Neutral,
    }
}

/// Lower price wins; an unavailable price never wins.
fn cheaper_wins(a: Price, b: Price) -> Verdict {
    match (a.coins(), b.coins()) {
        (Some(x), Some(y)) => match x.cmp(&y) {
            Ordering::Less => Verdict::Left,
            Ordering::Greater => Verdict::Right,
            Ordering::Equal => Verdict::Tie,
        },
        (Some(_), None) => Verdict::Left,
        (None, Some(_)) => Verdict::Right,
        (None, None) => Verdict::Neutral,
    }
}

fn row(label: &str, left: String, right: String, verdict: Verdict) -> ComparisonRow {
    ComparisonRow {
        label: label.to_string(),
        left,
        right,
        verdict,
    }
}

fn show_rating(r: Option<u8>) -> String {
    r.map_or_else(|| "N/A".to_string(), |r| r.to_string())
}

fn show_price(p: Price) -> String {
    p.coins().map_or_else(|| "N/A".to_string(), format_coins)
}

/// Compare two entries.
pub fn compare(a: &RosterEntry, b: &RosterEntry) -> Comparison {
    let basic = vec![
        row(
            "Rating",
            show_rating(a.rating),
            show_rating(b.rating),
            higher_wins(a.rating, b.rating),
        ),
        row(
            "Price",
            show_price(a.external_price),
            show_price(b.external_price),
            cheaper_wins(a.external_price, b.external_price),
        ),
        row(
            "Position",
            a.preferred_position.clone(),
            b.preferred_position.clone(),
            Verdict::Neutral,
        ),
        row("League", a.league.clone(), b.league.clone(), Verdict::Neutral),
        row("Nation", a.nation.clone(), b.nation.clone(), Verdict::Neutral),
    ];

    let mut detailed = Vec::new();
    if let (Some(da), Some(db)) = (&a.detailed, &b.detailed) {
        for ((label, x), (_, y)) in da.face_stats().into_iter().zip(db.face_stats()) {
            detailed.push(row(label, x.to_string(), y.to_string(), higher_wins(Some(x), Some(y))));
        }
        if let (Some(x), Some(y)) = (da.tactical_intelligence, db.tactical_intelligence) {
            detailed.push(row(
                "Tactical Int.",
                x.to_string(),
                y.to_string(),
                higher_wins(Some(x), Some(y)),
            ));
        }
    }

    Comparison {
        left_name: a.name.clone(),
        right_name: b.name.clone(),
        basic,
        detailed,
    }
}
