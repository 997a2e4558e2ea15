//! Prompt rendering for the generation provider.
//!
//! Both builders are pure: every piece of run state they embed is passed in as
//! an explicit snapshot.

use crate::models::{CatalogEntry, Suggestion};

/// Catalog entries rendered as human-readable lines
pub const CATALOG_EXCERPT_LIMIT: usize = 500;

/// Catalog titles rendered in the JSON exclusion list
pub const SEEN_TITLES_LIMIT: usize = 1000;

const RESPONSE_FORMAT: &str = r#"RESPONSE FORMAT (STRICT JSON, NO TEXT AROUND IT):
{
  "suggestions": [
    {
      "title": "Title of the work",
      "category": "One of the allowed categories",
      "year": 2024,
      "reason": "Why this recommendation fits my taste",
      "score": 0-100
    }
  ]
}"#;

const SCORE_GUIDANCE: &str = "ABOUT SCORES:
- Really use the whole 0-100 scale.
- Some suggestions must be very strong (>= 90).
- Others average (~60-80).
- At least one below 50 (a gamble or a discovery).

Answer STRICTLY with valid JSON, without ``` fences or explanations around it.";

const ERA_CONSTRAINTS: &str = "- IMPORTANT - ERA CONSTRAINTS:
  * At most 10% of the works released before 1980
  * At most 20% of the works released before 2000
  * Favor recent works (2000+) for at least 80% of the suggestions";

/// First-round prompt
pub fn build_initial_prompt(
    catalog: &[CatalogEntry],
    target_count: usize,
    allowed_categories: &[String],
) -> String {
    let allowed = allowed_text(allowed_categories);

    format!(
        "{intro}

And here is the same list of titles as JSON (NEVER RECOMMEND THEM):
{seen}

I want EXACTLY {target_count} suggestions from the FOLLOWING categories ONLY:
{allowed}

STRICT CONSTRAINTS:
- Always return the official French title of the work (as listed on SensCritique)
{category_rule}
- NEVER recommend a work whose title appears in the JSON list above.
- If you are unsure of a category, pick the closest allowed one and stay consistent.
- If you cannot find enough works that respect these constraints, propose fewer, but do not break the JSON.
{ERA_CONSTRAINTS}

{RESPONSE_FORMAT}

{SCORE_GUIDANCE}
",
        intro = intro(catalog),
        seen = seen_titles_json(catalog),
        category_rule = category_rule(allowed_categories),
    )
}

/// Follow-up prompt listing everything already proposed
pub fn build_retry_prompt(
    catalog: &[CatalogEntry],
    remaining_count: usize,
    allowed_categories: &[String],
    rejected_titles: &[String],
    accepted: &[Suggestion],
) -> String {
    let allowed = allowed_text(allowed_categories);
    let duplicates = rejected_titles.join(", ");
    let already_accepted = accepted
        .iter()
        .map(|s| s.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{intro}

Full list of titles already seen (NEVER RECOMMEND THEM):
{seen}

WARNING: you already suggested these works, which were DUPLICATES (already seen):
{duplicates}

You also already suggested these VALID works (do not suggest them again):
{already_accepted}

I now want EXACTLY {remaining_count} NEW suggestions (different from the ones above) from the FOLLOWING categories ONLY:
{allowed}

STRICT CONSTRAINTS:
- Always return the official French title of the work (as listed on SensCritique)
{category_rule}
- NEVER recommend a work whose title appears in the JSON list above
- Do NOT recommend the duplicates you already suggested
- Do NOT recommend the valid suggestions already made
- Propose COMPLETELY DIFFERENT works
{ERA_CONSTRAINTS}

{RESPONSE_FORMAT}

{SCORE_GUIDANCE}
",
        intro = intro(catalog),
        seen = seen_titles_json(catalog),
        category_rule = category_rule(allowed_categories),
    )
}

fn intro(catalog: &[CatalogEntry]) -> String {
    let excerpt = catalog
        .iter()
        .take(CATALOG_EXCERPT_LIMIT)
        .map(|entry| {
            // Debug formatting keeps the decimal point on whole ratings ("8.0")
            format!(
                "- {} (cat={}, rating={:?})",
                entry.title, entry.category, entry.rating_given
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a recommendation engine based on the tastes of a SensCritique user.

Here is a list of works I have ALREADY watched, listened to or read:

{excerpt}"
    )
}

fn seen_titles_json(catalog: &[CatalogEntry]) -> String {
    let titles: Vec<&str> = catalog
        .iter()
        .take(SEEN_TITLES_LIMIT)
        .map(|entry| entry.title.as_str())
        .collect();

    serde_json::to_string_pretty(&titles).unwrap_or_else(|_| "[]".to_string())
}

fn allowed_text(allowed_categories: &[String]) -> String {
    if allowed_categories.is_empty() {
        "any category".to_string()
    } else {
        allowed_categories.join(", ")
    }
}

fn category_rule(allowed_categories: &[String]) -> String {
    if allowed_categories.is_empty() {
        "- The \"category\" field must name the kind of work (film, series, book, game...)"
            .to_string()
    } else {
        format!(
            "- The \"category\" field MUST be exactly one of the following values: {}",
            allowed_categories.join(", ")
        )
    }
}
