// Derived views over the current roster.
//
// Everything here is a pure function of (roster, filters, sort). Nothing is
// cached; callers recompute on demand.

pub mod compare;
pub mod filter;
pub mod sort;
pub mod stats;

pub use compare::{compare, Comparison, ComparisonRow, Verdict};
pub use filter::{FilterCriteria, Predicate, TradeFilter};
pub use sort::{Direction, SortCriteria, SortField, SortKey};
pub use stats::ClubStats;

use crate::roster::{Roster, RosterEntry};

/// Filter then sort the roster. The roster itself is untouched.
pub fn project<'a>(
    roster: &'a Roster,
    filters: &FilterCriteria,
    sort: &SortCriteria,
) -> Vec<&'a RosterEntry> {
    let predicates = filters.compile();
    let mut view: Vec<&RosterEntry> = if predicates.is_empty() {
        roster.entries().iter().collect()
    } else {
        roster
            .entries()
            .iter()
            .filter(|e| filter::matches_all(&predicates, e))
            .collect()
    };
    sort.sort(&mut view);
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{ingest, Price};
    use crate::reference::ReferenceMap;

    fn sample() -> Roster {
        let text = "\
Name,ID,Rating,Team,Price
Alice,1,85,Alpha FC,5000
Bob,2,90,Beta FC,-- NA --
Carol,3,78,Alpha FC,1200
Dan,4,90,Gamma FC,800
";
        ingest(text, &ReferenceMap::empty()).unwrap().roster
    }

    fn names(view: &[&RosterEntry]) -> Vec<String> {
        view.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn default_projection_is_import_order() {
        let roster = sample();
        let view = project(&roster, &FilterCriteria::default(), &SortCriteria::default());
        assert_eq!(names(&view), vec!["Alice", "Bob", "Carol", "Dan"]);
    }

    #[test]
    fn filter_and_sort_compose() {
        let roster = sample();
        let filters = FilterCriteria {
            club: "alpha".into(),
            ..Default::default()
        };
        let sort = SortCriteria::new(vec![SortKey::new(SortField::Rating, Direction::Ascending)]);
        assert_eq!(names(&project(&roster, &filters, &sort)), vec!["Carol", "Alice"]);
    }

    #[test]
    fn price_sort_puts_unavailable_last() {
        let roster = sample();
        let sort = SortCriteria::new(vec![SortKey::new(SortField::Price, Direction::Descending)]);
        let view = project(&roster, &FilterCriteria::default(), &sort);
        assert_eq!(names(&view), vec!["Alice", "Carol", "Dan", "Bob"]);
        assert_eq!(view[3].external_price, Price::Unavailable);
    }

    #[test]
    fn projection_is_repeatable() {
        let roster = sample();
        let sort = SortCriteria::new(vec![
            SortKey::new(SortField::Rating, Direction::Descending),
            SortKey::new(SortField::Name, Direction::Ascending),
        ]);
        let first = names(&project(&roster, &FilterCriteria::default(), &sort));
        let second = names(&project(&roster, &FilterCriteria::default(), &sort));
        assert_eq!(first, second);
        assert_eq!(first, vec!["Bob", "Dan", "Alice", "Carol"]);
    }

    #[test]
    fn empty_roster_projects_to_empty() {
        let roster = Roster::new(vec![]);
        let filters = FilterCriteria {
            name: "x".into(),
            ..Default::default()
        };
        assert!(project(&roster, &filters, &SortCriteria::default()).is_empty());
    }
}
