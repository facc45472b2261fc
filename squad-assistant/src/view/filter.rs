// Roster filtering.
//
// `FilterCriteria` is the user-editable form. Before a pass over the roster it
// compiles to the list of predicates that are actually active, so criteria
// left at their defaults cost nothing per row.

use serde::{Deserialize, Serialize};

use crate::roster::{RosterEntry, MAX_RATING};

/// Tri-state filter on the tradeable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradeFilter {
    #[default]
    All,
    Tradeable,
    Untradeable,
}

/// User-editable filter settings. All text matches are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Substring of the player name.
    pub name: String,
    /// Substring of the preferred or any alternate position.
    pub position: String,
    /// Substring of the team or the league.
    pub club: String,
    /// Exact rarity.
    pub rarity: String,
    /// Exact nation.
    pub nation: String,
    pub min_rating: u8,
    pub max_rating: u8,
    /// Unavailable prices count as 0 here.
    pub min_price: u64,
    /// `None` means no upper bound.
    pub max_price: Option<u64>,
    pub trade: TradeFilter,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            name: String::new(),
            position: String::new(),
            club: String::new(),
            rarity: String::new(),
            nation: String::new(),
            min_rating: 0,
            max_rating: MAX_RATING,
            min_price: 0,
            max_price: None,
            trade: TradeFilter::All,
        }
    }
}

impl FilterCriteria {
    /// Compile to the active predicates only.
    pub fn compile(&self) -> Vec<Predicate> {
        let mut active = Vec::new();

        let text = |s: &str| {
            let t = s.trim().to_lowercase();
            (!t.is_empty()).then_some(t)
        };
        if let Some(t) = text(&self.name) {
            active.push(Predicate::NameContains(t));
        }
        if let Some(t) = text(&self.position) {
            active.push(Predicate::PositionContains(t));
        }
        if let Some(t) = text(&self.club) {
            active.push(Predicate::ClubContains(t));
        }
        if let Some(t) = text(&self.rarity) {
            active.push(Predicate::RarityIs(t));
        }
        if let Some(t) = text(&self.nation) {
            active.push(Predicate::NationIs(t));
        }
        if self.min_rating > 0 || self.max_rating < MAX_RATING {
            active.push(Predicate::RatingBetween(self.min_rating, self.max_rating));
        }
        if self.min_price > 0 || self.max_price.is_some() {
            active.push(Predicate::PriceBetween(
                self.min_price,
                self.max_price.unwrap_or(u64::MAX),
            ));
        }
        match self.trade {
            TradeFilter::All => {}
            TradeFilter::Tradeable => active.push(Predicate::Tradeable(true)),
            TradeFilter::Untradeable => active.push(Predicate::Tradeable(false)),
        }

        active
    }
}

/// One active filter condition. Text payloads are already lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    NameContains(String),
    PositionContains(String),
    ClubContains(String),
    RarityIs(String),
    NationIs(String),
    RatingBetween(u8, u8),
    PriceBetween(u64, u64),
    Tradeable(bool),
}

impl Predicate {
    pub fn matches(&self, entry: &RosterEntry) -> bool {
        let contains = |haystack: &str, needle: &str| haystack.to_lowercase().contains(needle);
        match self {
            Predicate::NameContains(t) => contains(&entry.name, t),
            Predicate::PositionContains(t) => {
                contains(&entry.preferred_position, t) || contains(&entry.alternate_positions, t)
            }
            Predicate::ClubContains(t) => contains(&entry.team, t) || contains(&entry.league, t),
            Predicate::RarityIs(t) => entry.rarity.trim().to_lowercase() == *t,
            Predicate::NationIs(t) => entry.nation.trim().to_lowercase() == *t,
            // An unknown rating never satisfies an explicit range.
            Predicate::RatingBetween(lo, hi) => {
                entry.rating.is_some_and(|r| (*lo..=*hi).contains(&r))
            }
            Predicate::PriceBetween(lo, hi) => {
                (*lo..=*hi).contains(&entry.external_price.filter_value())
            }
            Predicate::Tradeable(want) => entry.is_tradeable() == *want,
        }
    }
}

/// Whether `entry` satisfies every predicate.
pub fn matches_all(predicates: &[Predicate], entry: &RosterEntry) -> bool {
    predicates.iter().all(|p| p.matches(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Price;

    fn entry(name: &str, rating: u8, price: Price) -> RosterEntry {
        let mut e = RosterEntry::new("1", name);
        e.rating = Some(rating);
        e.external_price = price;
        e
    }

    #[test]
    fn default_criteria_compile_to_nothing() {
        assert!(FilterCriteria::default().compile().is_empty());
    }

    #[test]
    fn whitespace_text_is_inactive() {
        let criteria = FilterCriteria {
            name: "   ".into(),
            ..Default::default()
        };
        assert!(criteria.compile().is_empty());
    }

    #[test]
    fn only_changed_criteria_are_compiled() {
        let criteria = FilterCriteria {
            name: "Mb".into(),
            min_rating: 80,
            ..Default::default()
        };
        assert_eq!(
            criteria.compile(),
            vec![
                Predicate::NameContains("mb".into()),
                Predicate::RatingBetween(80, 99)
            ]
        );
    }

    #[test]
    fn name_is_case_insensitive_substring() {
        let p = Predicate::NameContains("mbap".into());
        assert!(p.matches(&entry("Kylian Mbappé", 91, Price::Unavailable)));
        assert!(!p.matches(&entry("Haaland", 91, Price::Unavailable)));
    }

    #[test]
    fn position_checks_alternates() {
        let mut e = entry("A", 80, Price::Unavailable);
        e.preferred_position = "ST".into();
        e.alternate_positions = "LW, CF".into();
        assert!(Predicate::PositionContains("cf".into()).matches(&e));
        assert!(Predicate::PositionContains("st".into()).matches(&e));
        assert!(!Predicate::PositionContains("cb".into()).matches(&e));
    }

    #[test]
    fn club_checks_team_or_league() {
        let mut e = entry("A", 80, Price::Unavailable);
        e.team = "Real Madrid".into();
        e.league = "LALIGA EA SPORTS".into();
        assert!(Predicate::ClubContains("madrid".into()).matches(&e));
        assert!(Predicate::ClubContains("laliga".into()).matches(&e));
        assert!(!Predicate::ClubContains("premier".into()).matches(&e));
    }

    #[test]
    fn rarity_and_nation_are_exact() {
        let mut e = entry("A", 80, Price::Unavailable);
        e.rarity = "Rare".into();
        e.nation = "France".into();
        assert!(Predicate::RarityIs("rare".into()).matches(&e));
        assert!(!Predicate::RarityIs("ra".into()).matches(&e));
        assert!(Predicate::NationIs("france".into()).matches(&e));
        assert!(!Predicate::NationIs("fra".into()).matches(&e));
    }

    #[test]
    fn rating_range_is_inclusive() {
        let p = Predicate::RatingBetween(80, 85);
        assert!(p.matches(&entry("A", 80, Price::Unavailable)));
        assert!(p.matches(&entry("A", 85, Price::Unavailable)));
        assert!(!p.matches(&entry("A", 86, Price::Unavailable)));
        let mut unknown = entry("A", 0, Price::Unavailable);
        unknown.rating = None;
        assert!(!p.matches(&unknown));
    }

    #[test]
    fn unavailable_price_filters_as_zero() {
        let low = Predicate::PriceBetween(0, 1000);
        assert!(low.matches(&entry("A", 80, Price::Unavailable)));
        let above = Predicate::PriceBetween(1, u64::MAX);
        assert!(!above.matches(&entry("A", 80, Price::Unavailable)));
        assert!(above.matches(&entry("A", 80, Price::Coins(500))));
    }

    #[test]
    fn trade_filter_tri_state() {
        let mut locked = entry("A", 80, Price::Unavailable);
        locked.untradeable = true;
        let free = entry("B", 80, Price::Coins(100));

        let tradeable = FilterCriteria {
            trade: TradeFilter::Tradeable,
            ..Default::default()
        }
        .compile();
        assert!(!matches_all(&tradeable, &locked));
        assert!(matches_all(&tradeable, &free));

        let untradeable = FilterCriteria {
            trade: TradeFilter::Untradeable,
            ..Default::default()
        }
        .compile();
        assert!(matches_all(&untradeable, &locked));
        assert!(!matches_all(&untradeable, &free));
    }
}
