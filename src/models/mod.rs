use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A work the user has already consumed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub category: String,
    pub rating_given: f64,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>, category: impl Into<String>, rating_given: f64) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            rating_given,
        }
    }
}

/// A suggestion accepted by the filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub reason: String,
    pub score: f64,
    pub year: Option<i32>,
    /// Aggregate public rating, only set after enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_rating: Option<f64>,
}

/// Candidate exactly as the generator produced it
///
/// Text fields that are not JSON strings are treated as missing. Score and year
/// keep their raw JSON value until the filter sanitizes them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawCandidate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,
    #[serde(default)]
    pub score: Value,
    #[serde(default)]
    pub year: Value,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// Whether a run reached its requested count
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Complete,
    /// Attempt budget ran out first
    Partial,
}

// ============================================================================
// API Types
// ============================================================================

/// Request body for POST /api/v1/recommendations
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    /// SensCritique user whose collection is fetched
    #[serde(default)]
    pub username: Option<String>,
    /// Inline catalog, used instead of fetching one
    #[serde(default)]
    pub catalog: Option<Vec<CatalogEntry>>,
    pub count: usize,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub with_ratings: bool,
}

/// Response for POST /api/v1/recommendations
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub suggestions: Vec<Suggestion>,
    pub requested: usize,
    pub attempts: u32,
    pub status: RunStatus,
    pub filtered_duplicates: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// SensCritique API Types
// ============================================================================

/// GraphQL envelope
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct UserCollectionData {
    #[serde(default)]
    pub user: Option<ScUser>,
}

#[derive(Debug, Deserialize)]
pub struct ScUser {
    #[serde(default)]
    pub collection: Option<ScCollection>,
}

#[derive(Debug, Deserialize)]
pub struct ScCollection {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub products: Vec<ScProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub other_user_infos: Option<ScUserInfos>,
}

#[derive(Debug, Deserialize)]
pub struct ScUserInfos {
    #[serde(default)]
    pub rating: Option<f64>,
}

impl ScProduct {
    /// Converts into a catalog entry when title, category and personal rating are all present
    pub fn into_catalog_entry(self) -> Option<CatalogEntry> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let category = self.category.filter(|c| !c.is_empty())?;
        let rating = self.other_user_infos.and_then(|infos| infos.rating)?;
        Some(CatalogEntry::new(title, category, rating))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductData {
    #[serde(default)]
    pub search_product_explorer: Option<ScSearchResults>,
}

#[derive(Debug, Deserialize)]
pub struct ScSearchResults {
    #[serde(default)]
    pub items: Vec<ScSearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct ScSearchItem {
    #[serde(default)]
    pub rating: Option<f64>,
}

// ============================================================================
// OpenAI API Types
// ============================================================================

/// Request body for the Responses endpoint
#[derive(Debug, Serialize)]
pub struct ResponsesRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub store: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<ResponseOutputItem>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseOutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ResponsesResponse {
    /// Concatenates every `output_text` block of every message item
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|content| content.content_type == "output_text")
            .filter_map(|content| content.text.as_deref())
            .collect()
    }
}
