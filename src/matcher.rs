//! Edit-distance matching for free-text item queries.

/// Levenshtein distance between `a` and `b`: the minimum number of
/// single-character insertions, deletions, or substitutions turning one
/// into the other.
///
/// Operates on chars, not bytes — catalog display names carry umlauts.
/// Callers are expected to lowercase both inputs first; this function does
/// no case folding itself. O(len(a)·len(b)) time with a single rolling row,
/// so O(min(len(a), len(b))) space.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Roll over the shorter string.
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return long.len();
    }

    let mut previous_row: Vec<usize> = (0..=short.len()).collect();
    for (i, &c1) in long.iter().enumerate() {
        let mut current = i + 1;
        for (j, &c2) in short.iter().enumerate() {
            let insertion = previous_row[j + 1] + 1;
            let deletion = current + 1;
            let substitution = previous_row[j] + usize::from(c1 != c2);
            let next = insertion.min(deletion).min(substitution);
            previous_row[j] = current;
            current = next;
        }
        previous_row[short.len()] = current;
    }

    previous_row[short.len()]
}
