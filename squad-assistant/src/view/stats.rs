// Club-wide aggregates over the unfiltered roster.

use serde::{Deserialize, Serialize};

use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClubStats {
    pub player_count: usize,
    /// Entries with a known rating.
    pub rated_count: usize,
    /// Entries with an available price.
    pub priced_count: usize,
    pub tradeable_count: usize,
    pub detailed_count: usize,
    /// 0.0 when nothing is rated.
    pub average_rating: f64,
    /// 0 when nothing is priced.
    pub min_price: u64,
    pub max_price: u64,
    /// Sum of available prices.
    pub total_value: u64,
}

impl ClubStats {
    /// Aggregate over every entry. Unknown ratings and unavailable prices are
    /// skipped; an empty roster yields all zeros.
    pub fn compute(roster: &Roster) -> Self {
        let mut stats = ClubStats {
            player_count: roster.len(),
            ..Default::default()
        };

        let mut rating_sum = 0u64;
        let mut min_price: Option<u64> = None;
        for entry in roster.entries() {
            if let Some(r) = entry.rating {
                rating_sum += u64::from(r);
                stats.rated_count += 1;
            }
            if let Some(price) = entry.external_price.coins() {
                stats.priced_count += 1;
                stats.max_price = stats.max_price.max(price);
                min_price = Some(min_price.map_or(price, |m| m.min(price)));
                stats.total_value = stats.total_value.saturating_add(price);
            }
            if entry.is_tradeable() {
                stats.tradeable_count += 1;
            }
            if entry.has_detailed_stats() {
                stats.detailed_count += 1;
            }
        }

        stats.min_price = min_price.unwrap_or(0);
        if stats.rated_count > 0 {
            stats.average_rating = rating_sum as f64 / stats.rated_count as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Price, RosterEntry};

    fn entry(rating: Option<u8>, price: Price) -> RosterEntry {
        let mut e = RosterEntry::new("1", "P");
        e.rating = rating;
        e.external_price = price;
        e
    }

    #[test]
    fn empty_roster_is_zeroed() {
        let stats = ClubStats::compute(&Roster::new(vec![]));
        assert_eq!(stats, ClubStats::default());
    }

    #[test]
    fn skips_unavailable_prices_and_unknown_ratings() {
        let roster = Roster::new(vec![
            entry(Some(80), Price::Coins(1_000)),
            entry(Some(90), Price::Unavailable),
            entry(None, Price::Coins(250)),
        ]);
        let stats = ClubStats::compute(&roster);
        assert_eq!(stats.player_count, 3);
        assert_eq!(stats.rated_count, 2);
        assert!((stats.average_rating - 85.0).abs() < 1e-9);
        assert_eq!(stats.priced_count, 2);
        assert_eq!(stats.min_price, 250);
        assert_eq!(stats.max_price, 1_000);
        assert_eq!(stats.total_value, 1_250);
    }

    #[test]
    fn zero_price_counts_as_a_price() {
        let roster = Roster::new(vec![
            entry(Some(50), Price::Coins(0)),
            entry(Some(50), Price::Coins(10)),
        ]);
        let stats = ClubStats::compute(&roster);
        assert_eq!(stats.min_price, 0);
        assert_eq!(stats.priced_count, 2);
    }

    #[test]
    fn counts_tradeable_and_detailed() {
        let mut locked = entry(Some(70), Price::Unavailable);
        locked.untradeable = true;
        let roster = Roster::new(vec![locked, entry(Some(70), Price::Unavailable)]);
        let stats = ClubStats::compute(&roster);
        assert_eq!(stats.tradeable_count, 1);
        assert_eq!(stats.detailed_count, 0);
    }
}
