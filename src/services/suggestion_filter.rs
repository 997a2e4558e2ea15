use std::collections::HashSet;

use serde_json::Value;

use crate::{
    models::{RawCandidate, Suggestion},
    services::{normalizer::normalize, similarity::is_too_similar},
};

/// Result of filtering one round of candidates
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Accepted suggestions in candidate order
    pub accepted: Vec<Suggestion>,
    /// Literal titles rejected as duplicates, reported back to the generator
    pub rejected_titles: Vec<String>,
}

/// Builds the lower-cased, trimmed category allowlist (empty means unrestricted)
pub fn category_allowlist(categories: &[String]) -> HashSet<String> {
    categories
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Splits candidates into accepted suggestions and rejected duplicate titles
///
/// Checks run in this order for every candidate:
/// 1. missing title or category, or a title normalizing to an empty key: dropped
/// 2. key equal to a catalog key or an accepted key: rejected
/// 3. key too similar to a catalog key: rejected
/// 4. category outside a non-empty allowlist: dropped
///
/// Duplicate checks precede the category check so the rejected list stays
/// accurate for retry prompts. Keys accepted earlier in the same round count
/// as accepted keys.
pub fn filter_candidates(
    candidates: Vec<RawCandidate>,
    existing_keys: &HashSet<String>,
    accepted_keys: &HashSet<String>,
    allowed_categories: &HashSet<String>,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    let mut round_keys: HashSet<String> = HashSet::new();

    for candidate in candidates {
        let (title, category) = match (candidate.title, candidate.category) {
            (Some(title), Some(category)) if !title.is_empty() && !category.is_empty() => {
                (title, category)
            }
            _ => continue,
        };

        let key = normalize(&title);
        if key.is_empty() {
            tracing::debug!(title = %title, "Dropping candidate with empty normalized title");
            continue;
        }

        if existing_keys.contains(&key) || accepted_keys.contains(&key) || round_keys.contains(&key)
        {
            tracing::debug!(title = %title, key = %key, "Rejecting exact duplicate");
            outcome.rejected_titles.push(title);
            continue;
        }

        if is_too_similar(&key, existing_keys) {
            tracing::debug!(title = %title, key = %key, "Rejecting title too similar to catalog");
            outcome.rejected_titles.push(title);
            continue;
        }

        if !allowed_categories.is_empty()
            && !allowed_categories.contains(&category.trim().to_lowercase())
        {
            tracing::debug!(title = %title, category = %category, "Dropping disallowed category");
            continue;
        }

        round_keys.insert(key);
        outcome.accepted.push(Suggestion {
            title,
            category,
            reason: candidate.reason.unwrap_or_default(),
            score: sanitize_score(&candidate.score),
            year: sanitize_year(&candidate.year),
            global_rating: None,
        });
    }

    outcome
}

/// Coerces a raw score to a float, 0.0 when it cannot be read as a finite number
pub fn sanitize_score(raw: &Value) -> f64 {
    let score = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    score.filter(|s| s.is_finite()).unwrap_or(0.0)
}

/// Coerces a raw year to an integer; absent, zero, empty or unreadable values give `None`
pub fn sanitize_year(raw: &Value) -> Option<i32> {
    let year = match raw {
        Value::Number(n) => match n.as_i64() {
            Some(whole) => i32::try_from(whole).ok(),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < i32::MAX as f64)
                .map(|f| f.trunc() as i32),
        },
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };

    year.filter(|y| *y != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(title: &str, category: &str) -> RawCandidate {
        RawCandidate {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    fn keys(titles: &[&str]) -> HashSet<String> {
        titles.iter().map(|t| normalize(t)).collect()
    }

    fn titles(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.accepted.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_catalog_duplicates_rejected() {
        let outcome = filter_candidates(
            vec![candidate("Inception (2010)", "Film"), candidate("Interstellar", "Film")],
            &keys(&["Inception"]),
            &HashSet::new(),
            &category_allowlist(&["Film".to_string()]),
        );

        assert_eq!(titles(&outcome), vec!["Interstellar"]);
        assert_eq!(outcome.rejected_titles, vec!["Inception (2010)"]);
    }

    #[test]
    fn test_similar_titles_rejected() {
        let outcome = filter_candidates(
            vec![
                candidate("Spider-Man: Far From Home", "Film"),
                candidate("Breaking Bad: The Movie", "Série"),
            ],
            &keys(&["Spider-Man", "Breaking Bad"]),
            &HashSet::new(),
            &HashSet::new(),
        );

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected_titles.len(), 2);
    }

    #[test]
    fn test_previously_accepted_rejected() {
        let outcome = filter_candidates(
            vec![candidate("INTERSTELLAR", "Film")],
            &HashSet::new(),
            &keys(&["Interstellar"]),
            &HashSet::new(),
        );

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected_titles, vec!["INTERSTELLAR"]);
    }

    #[test]
    fn test_same_round_duplicates_rejected() {
        let outcome = filter_candidates(
            vec![
                candidate("Amélie", "Film"),
                candidate("amelie", "Film"),
                candidate("Arrival", "Film"),
            ],
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        );

        assert_eq!(titles(&outcome), vec!["Amélie", "Arrival"]);
        assert_eq!(outcome.rejected_titles, vec!["amelie"]);
    }

    #[test]
    fn test_invalid_candidates_dropped_silently() {
        let outcome = filter_candidates(
            vec![
                RawCandidate::default(),
                candidate("", "Film"),
                candidate("Dune", ""),
                candidate("(1984)", "Film"),
                candidate("Season", "Série"),
            ],
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        );

        assert_eq!(outcome, FilterOutcome::default());
    }

    #[test]
    fn test_whitespace_category_only_fails_a_restricted_list() {
        let unrestricted = filter_candidates(
            vec![candidate("Dune", "   ")],
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        );
        assert_eq!(titles(&unrestricted), vec!["Dune"]);

        let restricted = filter_candidates(
            vec![candidate("Dune", "   ")],
            &HashSet::new(),
            &HashSet::new(),
            &category_allowlist(&["Film".to_string()]),
        );
        assert!(restricted.accepted.is_empty());
        assert!(restricted.rejected_titles.is_empty());
    }

    #[test]
    fn test_category_allowlist() {
        let allowed = category_allowlist(&[" Film ".to_string(), "Série".to_string()]);
        let outcome = filter_candidates(
            vec![
                candidate("Arrival", "film"),
                candidate("Dark", " SÉRIE "),
                candidate("Hades", "Jeu"),
            ],
            &HashSet::new(),
            &HashSet::new(),
            &allowed,
        );

        assert_eq!(titles(&outcome), vec!["Arrival", "Dark"]);
        assert!(outcome.rejected_titles.is_empty());
    }

    #[test]
    fn test_unrestricted_categories_accept_anything() {
        let outcome = filter_candidates(
            vec![candidate("Hades", "Jeu")],
            &HashSet::new(),
            &HashSet::new(),
            &category_allowlist(&[]),
        );

        assert_eq!(titles(&outcome), vec!["Hades"]);
    }

    #[test]
    fn test_duplicate_counted_before_category_check() {
        let outcome = filter_candidates(
            vec![candidate("Inception", "Livre")],
            &keys(&["Inception"]),
            &HashSet::new(),
            &category_allowlist(&["Film".to_string()]),
        );

        assert_eq!(outcome.rejected_titles, vec!["Inception"]);
    }

    #[test]
    fn test_fields_sanitized() {
        let raw = RawCandidate {
            title: Some("Arrival".to_string()),
            category: Some("Film".to_string()),
            reason: Some("Quiet first contact".to_string()),
            score: json!("87"),
            year: json!("2016"),
        };

        let outcome =
            filter_candidates(vec![raw], &HashSet::new(), &HashSet::new(), &HashSet::new());
        let accepted = &outcome.accepted[0];

        assert_eq!(accepted.score, 87.0);
        assert_eq!(accepted.year, Some(2016));
        assert_eq!(accepted.reason, "Quiet first contact");
        assert_eq!(accepted.global_rating, None);
    }

    #[test]
    fn test_sanitize_score() {
        assert_eq!(sanitize_score(&json!("87")), 87.0);
        assert_eq!(sanitize_score(&json!(" 42.5 ")), 42.5);
        assert_eq!(sanitize_score(&json!(64)), 64.0);
        assert_eq!(sanitize_score(&json!("n/a")), 0.0);
        assert_eq!(sanitize_score(&json!("NaN")), 0.0);
        assert_eq!(sanitize_score(&json!(null)), 0.0);
        assert_eq!(sanitize_score(&json!([90])), 0.0);
    }

    #[test]
    fn test_sanitize_year() {
        assert_eq!(sanitize_year(&json!("2021")), Some(2021));
        assert_eq!(sanitize_year(&json!(1999)), Some(1999));
        assert_eq!(sanitize_year(&json!(2021.7)), Some(2021));
        assert_eq!(sanitize_year(&json!("")), None);
        assert_eq!(sanitize_year(&json!(0)), None);
        assert_eq!(sanitize_year(&json!("circa 2000")), None);
        assert_eq!(sanitize_year(&json!(null)), None);
        assert_eq!(sanitize_year(&json!(9_999_999_999i64)), None);
    }
}
