//! Edit distance algorithms.

/// Calculate the restricted Damerau-Levenshtein (optimal string alignment)
/// distance between two strings.
///
/// Counts single-character insertions, deletions, substitutions and swaps of
/// two adjacent characters. A swapped pair is never edited again, so this is
/// the restricted variant: `damerau_levenshtein("ca", "abc")` is 3, not 2.
///
/// Characters are compared as Unicode scalar values. Comparison is
/// case-sensitive; callers that want case folding normalize beforehand.
///
/// # Arguments
/// * `source` - String to transform
/// * `target` - String to transform into
///
/// # Returns
/// Minimum number of edits needed to turn `source` into `target`
///
/// # Example
/// ```
/// use catalog_search::damerau_levenshtein;
///
/// assert_eq!(damerau_levenshtein("kitten", "sitting"), 3);
/// assert_eq!(damerau_levenshtein("ab", "ba"), 1);
/// ```
pub fn damerau_levenshtein(source: &str, target: &str) -> usize {
    let s: Vec<char> = source.chars().collect();
    let t: Vec<char> = target.chars().collect();

    let m = s.len();
    let n = t.len();

    if m == 0 { return n; }
    if n == 0 { return m; }

    // Row-major (m + 1) x (n + 1) table in one allocation.
    let width = n + 1;
    let mut dist = vec![0usize; (m + 1) * width];
    let at = |i: usize, j: usize| i * width + j;

    for i in 0..=m {
        dist[at(i, 0)] = i;
    }
    for j in 0..=n {
        dist[at(0, j)] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(s[i - 1] != t[j - 1]);

            let mut best = (dist[at(i - 1, j)] + 1)
                .min(dist[at(i, j - 1)] + 1)
                .min(dist[at(i - 1, j - 1)] + cost);

            if i > 1 && j > 1 && s[i - 1] == t[j - 2] && s[i - 2] == t[j - 1] {
                best = best.min(dist[at(i - 2, j - 2)] + 1);
            }

            dist[at(i, j)] = best;
        }
    }

    dist[at(m, n)]
}
