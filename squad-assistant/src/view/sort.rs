// Multi-key stable sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::roster::RosterEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Name,
    Rating,
    Price,
    Position,
    Team,
    League,
    Nation,
}

impl SortField {
    pub fn label(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Rating => "rating",
            SortField::Price => "price",
            SortField::Position => "position",
            SortField::Team => "team",
            SortField::League => "league",
            SortField::Nation => "nation",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "rating" | "ovr" => Ok(SortField::Rating),
            "price" => Ok(SortField::Price),
            "position" | "pos" => Ok(SortField::Position),
            "team" | "club" => Ok(SortField::Team),
            "league" => Ok(SortField::League),
            "nation" => Ok(SortField::Nation),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

impl SortKey {
    pub fn new(field: SortField, direction: Direction) -> Self {
        SortKey { field, direction }
    }

    /// Compare two entries on this key alone.
    pub fn compare(&self, a: &RosterEntry, b: &RosterEntry) -> Ordering {
        match self.field {
            SortField::Name => self.direction.apply(compare_text(&a.name, &b.name)),
            SortField::Position => self
                .direction
                .apply(compare_text(&a.preferred_position, &b.preferred_position)),
            SortField::Team => self.direction.apply(compare_text(&a.team, &b.team)),
            SortField::League => self.direction.apply(compare_text(&a.league, &b.league)),
            SortField::Nation => self.direction.apply(compare_text(&a.nation, &b.nation)),
            SortField::Rating => self.direction.apply(a.rating.cmp(&b.rating)),
            // Priced entries compare in the requested direction. Entries
            // without a price always come after every priced entry.
            SortField::Price => match (a.external_price.coins(), b.external_price.coins()) {
                (Some(x), Some(y)) => self.direction.apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        write!(f, "{} {}", self.field.label(), dir)
    }
}

/// Ordered tie-break list. An empty list keeps import order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortCriteria(pub Vec<SortKey>);

impl SortCriteria {
    pub fn new(keys: Vec<SortKey>) -> Self {
        SortCriteria(keys)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First non-equal key decides.
    pub fn compare(&self, a: &RosterEntry, b: &RosterEntry) -> Ordering {
        self.0
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Stable in-place sort.
    pub fn sort(&self, entries: &mut [&RosterEntry]) {
        if self.is_empty() {
            return;
        }
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

/// Case-insensitive order, falling back to a byte-wise comparison so that
/// distinct strings never compare equal.
///
/// Collation is not locale-aware: lowercased text is compared by code point,
/// so a name starting with an accented letter (`Ödegaard`) sorts after `z`.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
