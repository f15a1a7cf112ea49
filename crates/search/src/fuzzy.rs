//! Ranked fuzzy matching over arbitrary records.

use crate::damerau_levenshtein;
use serde::Serialize;

/// A record that fell within the distance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FuzzyMatch<'a, T> {
    /// The matched record
    pub item: &'a T,
    /// Edit distance between the query and the record's projected text
    pub distance: usize,
}

/// Search `records` for entries whose projected text is within `max_distance`
/// edits of `query`.
///
/// Matches are ordered best first. Records with the same distance keep the
/// order they had in `records`. A negative `max_distance` matches nothing.
///
/// # Arguments
/// * `query` - Text to look for
/// * `records` - Records to search
/// * `max_distance` - Largest accepted edit distance (inclusive)
/// * `project` - Extracts the text to compare from a record
///
/// # Example
/// ```
/// use catalog_search::fuzzy_search;
///
/// let names = ["Chair", "Chairman", "Lamp"];
/// let found = fuzzy_search("Chair", &names, 2, |name| *name);
/// assert_eq!(found, vec![&"Chair"]);
/// ```
pub fn fuzzy_search<'a, T, F, S>(
    query: &str,
    records: &'a [T],
    max_distance: i64,
    project: F,
) -> Vec<&'a T>
where
    F: Fn(&'a T) -> S,
    S: AsRef<str>,
{
    fuzzy_search_scored(query, records, max_distance, project)
        .into_iter()
        .map(|m| m.item)
        .collect()
}

/// Same as [`fuzzy_search`] but keeps the distance of every match.
pub fn fuzzy_search_scored<'a, T, F, S>(
    query: &str,
    records: &'a [T],
    max_distance: i64,
    project: F,
) -> Vec<FuzzyMatch<'a, T>>
where
    F: Fn(&'a T) -> S,
    S: AsRef<str>,
{
    let Some(max) = threshold(max_distance) else {
        return Vec::new();
    };

    let matches = records
        .iter()
        .map(|item| FuzzyMatch {
            item,
            distance: damerau_levenshtein(query, project(item).as_ref()),
        })
        .filter(|m| m.distance <= max)
        .collect();

    rank(matches)
}

/// Parallel variant of [`fuzzy_search_scored`].
///
/// Distances are computed on the rayon pool; results are identical to the
/// sequential version, tie order included.
#[cfg(feature = "parallel")]
pub fn par_fuzzy_search_scored<'a, T, F, S>(
    query: &str,
    records: &'a [T],
    max_distance: i64,
    project: F,
) -> Vec<FuzzyMatch<'a, T>>
where
    T: Sync,
    F: Fn(&'a T) -> S + Sync,
    S: AsRef<str>,
{
    use rayon::prelude::*;

    let Some(max) = threshold(max_distance) else {
        return Vec::new();
    };

    // `collect` on an indexed parallel iterator keeps input order.
    let scored: Vec<FuzzyMatch<'a, T>> = records
        .par_iter()
        .map(|item| FuzzyMatch {
            item,
            distance: damerau_levenshtein(query, project(item).as_ref()),
        })
        .collect();

    rank(scored.into_iter().filter(|m| m.distance <= max).collect())
}

fn threshold(max_distance: i64) -> Option<usize> {
    usize::try_from(max_distance).ok()
}

fn rank<T>(mut matches: Vec<FuzzyMatch<'_, T>>) -> Vec<FuzzyMatch<'_, T>> {
    // Stable: equal distances stay in input order.
    matches.sort_by_key(|m| m.distance);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: &'static str,
    }

    fn items(names: &[&'static str]) -> Vec<Item> {
        names.iter().map(|name| Item { name }).collect()
    }

    fn names<'a>(found: &[&'a Item]) -> Vec<&'a str> {
        found.iter().map(|item| item.name).collect()
    }

    #[test]
    fn test_exact_match_only_within_threshold() {
        let records = items(&["Chair", "Chairman", "Lamp"]);
        let found = fuzzy_search("Chair", &records, 2, |r| r.name);
        assert_eq!(names(&found), vec!["Chair"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let records = items(&["Chair", "Chairman", "Lamp"]);
        let found = fuzzy_search("Chair", &records, 3, |r| r.name);
        assert_eq!(names(&found), vec!["Chair", "Chairman"]);
    }

    #[test]
    fn test_case_sensitive_comparison() {
        let records = items(&["Chair"]);
        assert!(fuzzy_search("chair", &records, 0, |r| r.name).is_empty());
        assert_eq!(fuzzy_search("chair", &records, 1, |r| r.name).len(), 1);
    }

    #[test]
    fn test_sorted_by_distance() {
        let records = items(&["Lamp", "Laptop", "Lap"]);
        let found = fuzzy_search_scored("Lap", &records, 3, |r| r.name);
        let distances: Vec<usize> = found.iter().map(|m| m.distance).collect();
        assert_eq!(distances, vec![0, 1, 3]);
        assert_eq!(found[0].item.name, "Lap");
        assert_eq!(found[1].item.name, "Lamp");
        assert_eq!(found[2].item.name, "Laptop");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = ["bat", "cat2", "hat"];
        let found = fuzzy_search("cat", &records, 1, |s| *s);
        assert_eq!(found, vec![&"bat", &"cat2", &"hat"]);

        let records = ["hat", "cats", "bat", "cat"];
        let found = fuzzy_search("cat", &records, 1, |s| *s);
        assert_eq!(found, vec![&"cat", &"hat", &"cats", &"bat"]);
    }

    #[test]
    fn test_empty_records() {
        let records: Vec<Item> = Vec::new();
        assert!(fuzzy_search("anything", &records, 10, |r| r.name).is_empty());
    }

    #[test]
    fn test_negative_threshold_matches_nothing() {
        let records = items(&["same"]);
        assert!(fuzzy_search("same", &records, -1, |r| r.name).is_empty());
        assert!(fuzzy_search_scored("same", &records, i64::MIN, |r| r.name).is_empty());
    }

    #[test]
    fn test_projection_can_return_owned_strings() {
        let records = vec![(1, "Shoes"), (2, "Shoe")];
        let found = fuzzy_search("shoes", &records, 1, |(_, name)| name.to_lowercase());
        assert_eq!(found, vec![&(1, "Shoes"), &(2, "Shoe")]);
    }

    #[test]
    #[should_panic(expected = "projection failed")]
    fn test_projection_panic_propagates() {
        let records = items(&["Chair"]);
        let _ = fuzzy_search("Chair", &records, 1, |_: &Item| -> &'static str {
            panic!("projection failed")
        });
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let records = items(&["Phone", "Phones", "Hone", "Pone", "Tablet", "Phnoe", "Lamp"]);
        let seq = fuzzy_search_scored("Phone", &records, 2, |r| r.name);
        let par = par_fuzzy_search_scored("Phone", &records, 2, |r| r.name);
        assert_eq!(seq, par);
    }

    proptest! {
        #[test]
        fn prop_raising_threshold_extends_prefix(
            query in "[a-c]{0,5}",
            words in proptest::collection::vec("[a-c]{0,6}", 0..20),
            d1 in -1i64..4,
            extra in 0i64..4,
        ) {
            let d2 = d1 + extra;
            let low = fuzzy_search(&query, &words, d1, |w| w.as_str());
            let high = fuzzy_search(&query, &words, d2, |w| w.as_str());
            prop_assert!(low.len() <= high.len());
            for (a, b) in low.iter().zip(high.iter()) {
                prop_assert!(std::ptr::eq(*a, *b));
            }
        }

        #[test]
        fn prop_results_within_threshold_and_sorted(
            query in "[a-c]{0,5}",
            words in proptest::collection::vec("[a-c]{0,6}", 0..20),
            max in 0i64..5,
        ) {
            let found = fuzzy_search_scored(&query, &words, max, |w| w.as_str());
            for pair in found.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
            for m in &found {
                prop_assert!(m.distance as i64 <= max);
            }
        }
    }
}
