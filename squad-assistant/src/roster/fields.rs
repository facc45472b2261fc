// Canonical roster fields and the header synonym table.
//
// Club exports from different tools name the same column differently
// ("Player Name" vs "Name", "Club" vs "Team", "ID" vs "DefinitionId").
// Every raw header resolves to at most one `CanonicalField` through a
// case-insensitive exact match against the synonyms below.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CanonicalField
// ---------------------------------------------------------------------------

/// One of the fixed, semantically named roster attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalField {
    Name,
    Rating,
    Rarity,
    PreferredPosition,
    AlternatePositions,
    Nation,
    League,
    Team,
    PriceLimits,
    LastSalePrice,
    DiscardValue,
    Untradeable,
    Loans,
    DefinitionId,
    IsDuplicate,
    IsInActive11,
    ExternalPrice,
    Pace,
    Shooting,
    Passing,
    Dribbling,
    Defending,
    Physicality,
    TacticalIntelligence,
    PlayStyles,
    PlayStylePlus,
    Archetype,
}

impl CanonicalField {
    /// Every canonical field, in declaration order.
    pub const ALL: [CanonicalField; 27] = [
        CanonicalField::Name,
        CanonicalField::Rating,
        CanonicalField::Rarity,
        CanonicalField::PreferredPosition,
        CanonicalField::AlternatePositions,
        CanonicalField::Nation,
        CanonicalField::League,
        CanonicalField::Team,
        CanonicalField::PriceLimits,
        CanonicalField::LastSalePrice,
        CanonicalField::DiscardValue,
        CanonicalField::Untradeable,
        CanonicalField::Loans,
        CanonicalField::DefinitionId,
        CanonicalField::IsDuplicate,
        CanonicalField::IsInActive11,
        CanonicalField::ExternalPrice,
        CanonicalField::Pace,
        CanonicalField::Shooting,
        CanonicalField::Passing,
        CanonicalField::Dribbling,
        CanonicalField::Defending,
        CanonicalField::Physicality,
        CanonicalField::TacticalIntelligence,
        CanonicalField::PlayStyles,
        CanonicalField::PlayStylePlus,
        CanonicalField::Archetype,
    ];

    /// The six face stats, in card order.
    pub const SUBSTATS: [CanonicalField; 6] = [
        CanonicalField::Pace,
        CanonicalField::Shooting,
        CanonicalField::Passing,
        CanonicalField::Dribbling,
        CanonicalField::Defending,
        CanonicalField::Physicality,
    ];

    /// Resolve a raw header to its canonical field.
    ///
    /// Matching is case-insensitive and exact after trimming surrounding
    /// whitespace. Unknown headers return `None`.
    pub fn normalize(raw_header: &str) -> Option<CanonicalField> {
        let key = raw_header.trim().to_lowercase();
        let field = match key.as_str() {
            "name" | "player name" | "player" | "playername" | "player_name" | "full name" => {
                CanonicalField::Name
            }
            "rating" | "ovr" | "overall" | "overall rating" => CanonicalField::Rating,
            "rarity" | "card type" | "version" => CanonicalField::Rarity,
            "preferred position" | "preferredposition" | "preferred_position" | "pos"
            | "position" | "main position" => CanonicalField::PreferredPosition,
            "alternate positions" | "alternatepositions" | "alternate_positions"
            | "alt positions" | "alt pos" | "other positions" => {
                CanonicalField::AlternatePositions
            }
            "nation" | "nationality" | "country" => CanonicalField::Nation,
            "league" => CanonicalField::League,
            "team" | "club" => CanonicalField::Team,
            "price limits" | "pricelimits" | "price_limits" | "price range" => {
                CanonicalField::PriceLimits
            }
            "last sale price" | "lastsaleprice" | "last_sale_price" | "last sale" => {
                CanonicalField::LastSalePrice
            }
            "discard value" | "discardvalue" | "discard_value" | "quick sell" => {
                CanonicalField::DiscardValue
            }
            "untradeable" | "untradable" | "is untradeable" | "isuntradeable" => {
                CanonicalField::Untradeable
            }
            "loans" | "loan" | "is loan" => CanonicalField::Loans,
            "id" | "player id" | "playerid" | "player_id" | "definitionid" | "definition id"
            | "definition_id" => CanonicalField::DefinitionId,
            "isduplicate" | "is duplicate" | "is_duplicate" | "duplicate" => {
                CanonicalField::IsDuplicate
            }
            "isinactive11" | "is in active 11" | "is_in_active_11" | "in active 11"
            | "active 11" => CanonicalField::IsInActive11,
            "price" | "externalprice" | "external price" | "external_price" | "market price" => {
                CanonicalField::ExternalPrice
            }
            "pace" | "pac" => CanonicalField::Pace,
            "shooting" | "sho" => CanonicalField::Shooting,
            "passing" | "pas" => CanonicalField::Passing,
            "dribbling" | "dri" => CanonicalField::Dribbling,
            "defending" | "def" => CanonicalField::Defending,
            "physicality" | "physical" | "phy" => CanonicalField::Physicality,
            "tactical intelligence" | "tacticalintelligence" | "tactical_intelligence" => {
                CanonicalField::TacticalIntelligence
            }
            "playstyle" | "playstyles" | "play styles" => CanonicalField::PlayStyles,
            "playstyleplus" | "playstyle+" | "playstyles+" | "playstyle plus"
            | "playstyles plus" => CanonicalField::PlayStylePlus,
            "archetype" | "role" => CanonicalField::Archetype,
            _ => return None,
        };
        Some(field)
    }

    /// Human-facing canonical column name, as written in a canonical export.
    pub fn label(self) -> &'static str {
        match self {
            CanonicalField::Name => "Name",
            CanonicalField::Rating => "Rating",
            CanonicalField::Rarity => "Rarity",
            CanonicalField::PreferredPosition => "Preferred Position",
            CanonicalField::AlternatePositions => "Alternate Positions",
            CanonicalField::Nation => "Nation",
            CanonicalField::League => "League",
            CanonicalField::Team => "Team",
            CanonicalField::PriceLimits => "PriceLimits",
            CanonicalField::LastSalePrice => "LastSalePrice",
            CanonicalField::DiscardValue => "DiscardValue",
            CanonicalField::Untradeable => "Untradeable",
            CanonicalField::Loans => "Loans",
            CanonicalField::DefinitionId => "DefinitionId",
            CanonicalField::IsDuplicate => "IsDuplicate",
            CanonicalField::IsInActive11 => "IsInActive11",
            CanonicalField::ExternalPrice => "ExternalPrice",
            CanonicalField::Pace => "Pace",
            CanonicalField::Shooting => "Shooting",
            CanonicalField::Passing => "Passing",
            CanonicalField::Dribbling => "Dribbling",
            CanonicalField::Defending => "Defending",
            CanonicalField::Physicality => "Physicality",
            CanonicalField::TacticalIntelligence => "Tactical Intelligence",
            CanonicalField::PlayStyles => "PlayStyle",
            CanonicalField::PlayStylePlus => "PlayStylePlus",
            CanonicalField::Archetype => "Archetype",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ColumnMap
// ---------------------------------------------------------------------------

/// Binding from canonical field to the column index that supplies it.
///
/// Built once per import from the header row. When two headers normalize to
/// the same field, the leftmost one keeps the binding.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<CanonicalField, usize>,
    /// Raw headers that matched no canonical field. Their columns are never read.
    unmapped: Vec<String>,
    /// Raw headers that repeated an already bound field.
    shadowed: Vec<String>,
}

impl ColumnMap {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut map = ColumnMap::default();
        for (index, header) in headers.iter().enumerate() {
            let header = header.as_ref();
            match CanonicalField::normalize(header) {
                Some(field) => {
                    if map.indices.contains_key(&field) {
                        map.shadowed.push(header.trim().to_string());
                    } else {
                        map.indices.insert(field, index);
                    }
                }
                None => map.unmapped.push(header.trim().to_string()),
            }
        }
        map
    }

    /// Column index bound to `field`, if any.
    pub fn index(&self, field: CanonicalField) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.indices.contains_key(&field)
    }

    /// The fields from `required` that have no bound column, in the order given.
    pub fn missing(&self, required: &[CanonicalField]) -> Vec<CanonicalField> {
        required
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }

    /// Number of canonical fields bound to a column.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
