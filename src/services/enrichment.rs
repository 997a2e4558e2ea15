use crate::{models::Suggestion, services::providers::RatingProvider};

/// Attaches the public aggregate rating to each accepted suggestion
///
/// Lookups run one after another and never fail the caller; unknown titles
/// keep `global_rating: None`.
pub async fn attach_global_ratings(provider: &dyn RatingProvider, suggestions: &mut [Suggestion]) {
    let mut found = 0usize;

    for suggestion in suggestions.iter_mut() {
        suggestion.global_rating = provider.global_rating(&suggestion.title).await;
        if suggestion.global_rating.is_some() {
            found += 1;
        }
    }

    tracing::info!(
        suggestions = suggestions.len(),
        rated = found,
        provider = provider.name(),
        "Global ratings attached"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRatings;

    #[async_trait::async_trait]
    impl RatingProvider for FixedRatings {
        async fn global_rating(&self, title: &str) -> Option<f64> {
            match title {
                "Arrival" => Some(7.6),
                _ => None,
            }
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn suggestion(title: &str) -> Suggestion {
        Suggestion {
            title: title.to_string(),
            category: "Film".to_string(),
            reason: String::new(),
            score: 50.0,
            year: None,
            global_rating: None,
        }
    }

    #[tokio::test]
    async fn test_ratings_attached_where_known() {
        let mut suggestions = vec![suggestion("Arrival"), suggestion("Unknown Work")];

        attach_global_ratings(&FixedRatings, &mut suggestions).await;

        assert_eq!(suggestions[0].global_rating, Some(7.6));
        assert_eq!(suggestions[1].global_rating, None);
        assert_eq!(suggestions[1].title, "Unknown Work");
    }
}
