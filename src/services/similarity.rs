use std::collections::HashSet;

/// Shorter keys than this skip the shared-prefix rule
const MIN_PREFIX_LEN: usize = 5;

/// Fraction of the shorter key that must be a shared prefix
const PREFIX_RATIO_THRESHOLD: f64 = 0.8;

/// Decides whether a normalized candidate key likely names a work already seen
///
/// Matches on exact equality, containment in either direction, or a shared
/// prefix covering at least 80% of the shorter key (only when that key has at
/// least five characters). Biased toward rejection: sequels and remakes are
/// caught, and so are some legitimately distinct titles. Translated titles with
/// different prefixes slip through.
pub fn is_too_similar(candidate: &str, existing_keys: &HashSet<String>) -> bool {
    if candidate.is_empty() {
        return false;
    }

    existing_keys
        .iter()
        .filter(|existing| !existing.is_empty())
        .any(|existing| keys_match(candidate, existing))
}

fn keys_match(candidate: &str, existing: &str) -> bool {
    if candidate == existing {
        return true;
    }

    if candidate.contains(existing) || existing.contains(candidate) {
        return true;
    }

    let min_len = candidate.len().min(existing.len());
    if min_len < MIN_PREFIX_LEN {
        return false;
    }

    let common = common_prefix_len(candidate, existing);
    common as f64 / min_len as f64 >= PREFIX_RATIO_THRESHOLD
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_exact_match() {
        assert!(is_too_similar("inception", &keys(&["inception"])));
    }

    #[test]
    fn test_containment_both_directions() {
        let existing = keys(&["spiderman"]);
        assert!(is_too_similar("spidermanfarfromhome", &existing));

        let existing = keys(&["spidermanfarfromhome"]);
        assert!(is_too_similar("spiderman", &existing));
    }

    #[test]
    fn test_prefix_ratio() {
        assert!(is_too_similar("breakingbadthemovie", &keys(&["breakingbad"])));
        // 8 of 9 shared: "ghostbust" vs "ghostbuss"
        assert!(is_too_similar("ghostbust", &keys(&["ghostbuss"])));
        // 4 of 9 shared
        assert!(!is_too_similar("starwars", &keys(&["startrekk"])));
    }

    #[test]
    fn test_prefix_rule_skipped_for_short_keys() {
        // 3 of 4 shared, too short for the prefix rule
        assert!(!is_too_similar("jaws", &keys(&["java"])));
        assert!(!is_too_similar("heat", &keys(&["heal"])));
    }

    #[test]
    fn test_unrelated_keys() {
        let existing = keys(&["inception", "amelie", "matrix"]);
        assert!(!is_too_similar("interstellar", &existing));
    }

    #[test]
    fn test_empty_keys_never_match() {
        assert!(!is_too_similar("", &keys(&["inception"])));
        assert!(!is_too_similar("inception", &keys(&[""])));
        assert!(!is_too_similar("inception", &HashSet::new()));
    }
}
