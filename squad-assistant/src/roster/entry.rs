// Roster entry model: one validated player card from a club export.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal used by club exports when no market price is known.
pub const PRICE_UNAVAILABLE: &str = "-- NA --";

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// A card's external market price.
///
/// `Unavailable` is distinct from `Coins(0)`: it means the market has no
/// price for the card (typically untradeable or very rare cards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Price {
    #[default]
    Unavailable,
    Coins(u64),
}

impl Price {
    /// Parse price text from an export.
    ///
    /// Accepts plain or separator-grouped non-negative numbers
    /// (`1500000`, `1,500,000`, `1 500 000`). Fractional coin values are
    /// rounded. The sentinel, empty text, negative numbers, and anything
    /// unparseable all map to `Unavailable`.
    pub fn parse(text: &str) -> Price {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == PRICE_UNAVAILABLE {
            return Price::Unavailable;
        }
        let cleaned: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ',' | '_' | ' '))
            .collect();
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Price::Coins(v.round() as u64),
            _ => Price::Unavailable,
        }
    }

    pub fn coins(self) -> Option<u64> {
        match self {
            Price::Coins(c) => Some(c),
            Price::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Price::Coins(_))
    }

    /// Value used for range filtering: the sentinel counts as zero.
    pub fn filter_value(self) -> u64 {
        self.coins().unwrap_or(0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Unavailable => f.write_str(PRICE_UNAVAILABLE),
            Price::Coins(c) => write!(f, "{c}"),
        }
    }
}

/// Group digits in thousands: `1234567` -> `"1,234,567"`.
pub fn format_coins(coins: u64) -> String {
    let digits = coins.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl From<Price> for String {
    fn from(price: Price) -> String {
        price.to_string()
    }
}

impl From<String> for Price {
    fn from(text: String) -> Price {
        Price::parse(&text)
    }
}

// ---------------------------------------------------------------------------
// Flags and identifiers
// ---------------------------------------------------------------------------

/// Compatibility shim for boolean-like export columns.
///
/// Flags are `bool` internally and rendered as `"true"`/`"false"`. Exports in
/// the wild use `true/false`, `Y/N`, `yes/no` or `1/0`; those spellings are
/// accepted case-insensitively. Everything else, including an empty cell, is
/// `false`.
pub fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "true" | "y" | "yes" | "1"
    )
}

/// Canonical form of a player definition id.
///
/// Ids that parse fully as an integer are re-rendered in canonical decimal
/// form (dropping leading zeros, a leading `+`, and surrounding whitespace);
/// anything else is kept trimmed but otherwise untouched.
pub fn normalize_definition_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Detailed stats
// ---------------------------------------------------------------------------

/// Where a card's detailed stats came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsSource {
    /// Merged from the bundled reference dataset.
    Reference,
    /// Supplied by the export itself (all six face-stat columns present).
    Export,
}

/// Face stats and tags for a card. Present only when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedStats {
    pub pace: u8,
    pub shooting: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defending: u8,
    pub physicality: u8,
    #[serde(default)]
    pub play_styles: Vec<String>,
    #[serde(default)]
    pub play_styles_plus: Vec<String>,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub tactical_intelligence: Option<u8>,
    pub source: StatsSource,
}

impl DetailedStats {
    /// The six face stats with their display labels, in card order.
    pub fn face_stats(&self) -> [(&'static str, u8); 6] {
        [
            ("Pace", self.pace),
            ("Shooting", self.shooting),
            ("Passing", self.passing),
            ("Dribbling", self.dribbling),
            ("Defending", self.defending),
            ("Physicality", self.physicality),
        ]
    }
}

// ---------------------------------------------------------------------------
// RosterEntry
// ---------------------------------------------------------------------------

/// One validated card from the user's club.
///
/// Every field is populated: text fields default to empty, flags to `false`,
/// and the price to `Price::Unavailable`. `rating` is `None` only when the
/// export carried no rating column at all; a present but invalid rating
/// rejects the row instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub definition_id: String,
    pub name: String,
    pub rating: Option<u8>,
    pub rarity: String,
    pub preferred_position: String,
    pub alternate_positions: String,
    pub nation: String,
    pub league: String,
    pub team: String,
    pub price_limits: String,
    pub last_sale_price: String,
    pub discard_value: String,
    pub untradeable: bool,
    pub loans: bool,
    pub is_duplicate: bool,
    pub is_in_active_11: bool,
    pub external_price: Price,
    pub detailed: Option<DetailedStats>,
}

impl RosterEntry {
    /// A card with the given identity and every other field at its default.
    pub fn new(definition_id: &str, name: &str) -> Self {
        RosterEntry {
            definition_id: normalize_definition_id(definition_id),
            name: name.trim().to_string(),
            rating: None,
            rarity: String::new(),
            preferred_position: String::new(),
            alternate_positions: String::new(),
            nation: String::new(),
            league: String::new(),
            team: String::new(),
            price_limits: String::new(),
            last_sale_price: String::new(),
            discard_value: String::new(),
            untradeable: false,
            loans: false,
            is_duplicate: false,
            is_in_active_11: false,
            external_price: Price::Unavailable,
            detailed: None,
        }
    }

    /// Whether substats are known for this card. Lets callers tell
    /// "stat is zero" apart from "stat is unknown".
    pub fn has_detailed_stats(&self) -> bool {
        self.detailed.is_some()
    }

    pub fn is_tradeable(&self) -> bool {
        !self.untradeable
    }

    /// Preferred position followed by each alternate position.
    pub fn positions(&self) -> Vec<String> {
        let mut positions = Vec::new();
        if !self.preferred_position.trim().is_empty() {
            positions.push(self.preferred_position.trim().to_string());
        }
        for alt in self
            .alternate_positions
            .split([',', '/', ';', '|'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            if !positions.iter().any(|p| p.eq_ignore_ascii_case(alt)) {
                positions.push(alt.to_string());
            }
        }
        positions
    }
}
