//! Eligibility filter: which listed items need syncing in this run.

use super::seen::SeenSet;
use crate::catalog::MediaSummary;

/// An item is eligible iff it is not already stored and the remote service
/// has finished processing it. Items that are not ready yet are simply
/// skipped; they come back as candidates in a later run.
pub fn is_eligible(item: &MediaSummary, seen: &SeenSet) -> bool {
    item.is_ready() && !seen.contains(&item.id)
}

/// Keep the eligible items of a page, in listing order.
pub fn eligible<'a>(
    page: Vec<MediaSummary>,
    seen: &'a SeenSet,
) -> impl Iterator<Item = MediaSummary> + 'a {
    page.into_iter().filter(move |item| is_eligible(item, seen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Readiness;
    use crate::test_support::{ready, summary};

    #[test]
    fn test_unseen_ready_is_eligible() {
        let seen: SeenSet = ["A"].into_iter().collect();
        assert!(is_eligible(&ready("B"), &seen));
    }

    #[test]
    fn test_seen_is_not_eligible() {
        let seen: SeenSet = ["A"].into_iter().collect();
        assert!(!is_eligible(&ready("A"), &seen));
    }

    #[test]
    fn test_unready_is_not_eligible_even_if_unseen() {
        let seen = SeenSet::default();
        for status in [Readiness::Processing, Readiness::Failed, Readiness::Unknown] {
            assert!(!is_eligible(&summary("X", status), &seen));
        }
    }

    #[test]
    fn test_eligible_keeps_listing_order() {
        let seen: SeenSet = ["A", "B"].into_iter().collect();
        let page = vec![
            ready("A"),
            ready("D"),
            summary("P", Readiness::Processing),
            ready("B"),
            ready("C"),
        ];
        let ids: Vec<String> = eligible(page, &seen).map(|m| m.id).collect();
        assert_eq!(ids, ["D", "C"]);
    }
}
