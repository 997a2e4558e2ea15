/// SensCritique GraphQL provider
///
/// Serves both collaborators backed by SensCritique:
/// 1. Catalog: `UserCollection`, paginated by 100. The first page gives the total,
///    remaining pages are fetched concurrently and reassembled in offset order.
/// 2. Rating lookup: `SearchProductExplorer`, first result's public rating.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CatalogEntry, GraphQlResponse, SearchProductData, UserCollectionData},
    services::{
        progress::{notify, ProgressObserver},
        providers::{CatalogProvider, RatingProvider},
    },
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

const PAGE_SIZE: usize = 100;
const SEARCH_LIMIT: usize = 16;
const CATALOG_CACHE_TTL: u64 = 3600; // 1 hour
const RATING_CACHE_TTL: u64 = 604800; // 1 week

const USER_COLLECTION_QUERY: &str = "query UserCollection($limit: Int, $offset: Int, \
$order: CollectionSort, $username: String!, $isCollection: Boolean) {
  user(username: $username) {
    collection(limit: $limit, offset: $offset, order: $order, isCollection: $isCollection) {
      total
      products {
        title
        category
        otherUserInfos(username: $username) {
          rating
        }
      }
    }
  }
}";

const SEARCH_PRODUCT_QUERY: &str = "query SearchProductExplorer($query: String, $offset: Int, \
$limit: Int, $filters: [SearchFilter], $sortBy: SearchProductExplorerSort) {
  searchProductExplorer(query: $query, filters: $filters, sortBy: $sortBy, offset: $offset, limit: $limit) {
    items {
      title
      rating
    }
  }
}";

#[derive(Clone)]
pub struct SensCritiqueProvider {
    http_client: HttpClient,
    api_url: String,
    auth_token: Option<String>,
    cache: Cache,
}

impl SensCritiqueProvider {
    pub fn new(cache: Cache, api_url: String, auth_token: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            auth_token,
            cache,
        }
    }

    /// Posts a GraphQL operation and decodes its `data` payload
    async fn post_graphql<T: DeserializeOwned>(&self, body: Value) -> AppResult<Option<T>> {
        let mut request = self
            .http_client
            .post(&self.api_url)
            .header("accept", "*/*")
            .header("origin", "https://www.senscritique.com")
            .header("user-agent", "Mozilla/5.0")
            .json(&body);

        if let Some(token) = &self.auth_token {
            request = request.header("authorization", token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "SensCritique API returned status {}: {}",
                status, body
            )));
        }

        let envelope: GraphQlResponse<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Fetches one collection page, returning its entries and the collection total
    async fn fetch_page(&self, username: &str, offset: usize) -> AppResult<(Vec<CatalogEntry>, usize)> {
        let data: Option<UserCollectionData> = self
            .post_graphql(collection_request(username, offset))
            .await?;
        collection_entries(data)
            .ok_or_else(|| AppError::NotFound(format!("SensCritique user '{}'", username)))
    }

    async fn fetch_all_pages(
        &self,
        username: &str,
        observer: Option<&dyn ProgressObserver>,
    ) -> AppResult<Vec<CatalogEntry>> {
        let (mut catalog, total) = self.fetch_page(username, 0).await?;
        notify(observer, catalog.len(), total);

        if total <= PAGE_SIZE {
            return Ok(catalog);
        }

        let mut tasks = Vec::new();
        for offset in page_offsets(total) {
            let provider = self.clone();
            let username = username.to_string();
            let task = tokio::spawn(async move {
                provider
                    .fetch_page(&username, offset)
                    .await
                    .map(|(entries, _)| (offset, entries))
            });
            tasks.push(task);
        }

        // Any failed page fails the fetch: a partial catalog would let seen works through
        for task in tasks {
            let (offset, entries) = task
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            notify(observer, offset + entries.len(), total);
            catalog.extend(entries);
        }

        tracing::info!(
            username = %username,
            total,
            entries = catalog.len(),
            provider = "senscritique",
            "Catalog fetched"
        );

        Ok(catalog)
    }

    async fn search_rating(&self, title: &str) -> AppResult<Option<f64>> {
        let data: Option<SearchProductData> = self.post_graphql(search_request(title)).await?;
        Ok(first_rating(data))
    }

    /// Missing matches are cached too; request failures are not
    async fn cached_rating(&self, title: &str) -> AppResult<Option<f64>> {
        cached!(
            self.cache,
            CacheKey::GlobalRating(title.to_string()),
            RATING_CACHE_TTL,
            async move { self.search_rating(title).await }
        )
    }
}

#[async_trait::async_trait]
impl CatalogProvider for SensCritiqueProvider {
    async fn fetch_catalog(
        &self,
        username: &str,
        observer: Option<&dyn ProgressObserver>,
    ) -> AppResult<Vec<CatalogEntry>> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("Username cannot be empty".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::Catalog(username.to_string()),
            CATALOG_CACHE_TTL,
            async move { self.fetch_all_pages(username, observer).await }
        )
    }

    fn name(&self) -> &'static str {
        "senscritique"
    }
}

#[async_trait::async_trait]
impl RatingProvider for SensCritiqueProvider {
    async fn global_rating(&self, title: &str) -> Option<f64> {
        match self.cached_rating(title).await {
            Ok(rating) => rating,
            Err(e) => {
                tracing::debug!(title = %title, error = %e, "Global rating lookup failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "senscritique"
    }
}

fn collection_request(username: &str, offset: usize) -> Value {
    json!({
        "operationName": "UserCollection",
        "variables": {
            "username": username,
            "limit": PAGE_SIZE,
            "offset": offset,
            "order": "LAST_ACTION_DESC",
            "isCollection": true
        },
        "query": USER_COLLECTION_QUERY
    })
}

fn search_request(title: &str) -> Value {
    json!({
        "operationName": "SearchProductExplorer",
        "variables": {
            "offset": 0,
            "limit": SEARCH_LIMIT,
            "query": title,
            "filters": [],
            "sortBy": "RELEVANCE"
        },
        "query": SEARCH_PRODUCT_QUERY
    })
}

/// Offsets of every page after the first
fn page_offsets(total: usize) -> impl Iterator<Item = usize> {
    (PAGE_SIZE..total).step_by(PAGE_SIZE)
}

/// Entries and total of a collection page, `None` when the user does not exist
fn collection_entries(data: Option<UserCollectionData>) -> Option<(Vec<CatalogEntry>, usize)> {
    let user = data?.user?;
    let Some(collection) = user.collection else {
        return Some((Vec::new(), 0));
    };

    let entries = collection
        .products
        .into_iter()
        .filter_map(|product| product.into_catalog_entry())
        .collect();

    Some((entries, collection.total))
}

fn first_rating(data: Option<SearchProductData>) -> Option<f64> {
    data?
        .search_product_explorer?
        .items
        .into_iter()
        .next()?
        .rating
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<T: DeserializeOwned>(json: &str) -> Option<T> {
        serde_json::from_str::<GraphQlResponse<T>>(json).unwrap().data
    }

    #[test]
    fn test_page_offsets() {
        assert_eq!(page_offsets(100).collect::<Vec<_>>(), Vec::<usize>::new());
        assert_eq!(page_offsets(101).collect::<Vec<_>>(), vec![100]);
        assert_eq!(page_offsets(350).collect::<Vec<_>>(), vec![100, 200, 300]);
    }

    #[test]
    fn test_collection_entries_skips_incomplete_products() {
        let json = r#"{
            "data": {
                "user": {
                    "collection": {
                        "total": 240,
                        "products": [
                            {"title": "Inception", "category": "Film", "otherUserInfos": {"rating": 9}},
                            {"title": "Dune", "category": "Livre", "otherUserInfos": {"rating": null}},
                            {"title": null, "category": "Film", "otherUserInfos": {"rating": 5}},
                            {"title": "Hades", "category": "Jeu", "otherUserInfos": null},
                            {"title": "Dark", "category": "Série", "otherUserInfos": {"rating": 7.5}}
                        ]
                    }
                }
            }
        }"#;

        let (entries, total) = collection_entries(decode(json)).unwrap();

        assert_eq!(total, 240);
        assert_eq!(
            entries,
            vec![
                CatalogEntry::new("Inception", "Film", 9.0),
                CatalogEntry::new("Dark", "Série", 7.5),
            ]
        );
    }

    #[test]
    fn test_collection_entries_unknown_user() {
        assert_eq!(collection_entries(decode(r#"{"data": {"user": null}}"#)), None);
        assert_eq!(collection_entries(None), None);
    }

    #[test]
    fn test_collection_entries_empty_collection() {
        let data = decode(r#"{"data": {"user": {"collection": null}}}"#);
        assert_eq!(collection_entries(data), Some((Vec::new(), 0)));
    }

    // Nothing listens on port 1, so both Redis and the API refuse connections
    async fn provider_without_services() -> SensCritiqueProvider {
        let client = crate::db::create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client).await;
        SensCritiqueProvider::new(cache, "http://127.0.0.1:1/graphql".to_string(), None)
    }

    #[tokio::test]
    async fn test_cache_outage_still_reaches_api() {
        let provider = provider_without_services().await;

        let result = provider.fetch_catalog("cinephile", None).await;

        // The cache failure is skipped; the error comes from the API request
        assert!(matches!(result, Err(AppError::HttpClient(_))));
    }

    #[tokio::test]
    async fn test_blank_username_rejected() {
        let provider = provider_without_services().await;

        let result = provider.fetch_catalog("   ", None).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_first_rating() {
        let json = r#"{"data": {"searchProductExplorer": {"items": [
            {"title": "Arrival", "rating": 7.6},
            {"title": "Arrival (short)", "rating": 5.1}
        ]}}}"#;
        assert_eq!(first_rating(decode(json)), Some(7.6));

        let json = r#"{"data": {"searchProductExplorer": {"items": []}}}"#;
        assert_eq!(first_rating(decode(json)), None);

        let json = r#"{"data": {"searchProductExplorer": {"items": [{"title": "X", "rating": null}]}}}"#;
        assert_eq!(first_rating(decode(json)), None);
    }

    #[test]
    fn test_collection_request_variables() {
        let body = collection_request("cinephile", 200);
        assert_eq!(body["operationName"], "UserCollection");
        assert_eq!(body["variables"]["username"], "cinephile");
        assert_eq!(body["variables"]["offset"], 200);
        assert_eq!(body["variables"]["limit"], 100);
        assert_eq!(body["variables"]["order"], "LAST_ACTION_DESC");
        assert_eq!(body["variables"]["isCollection"], true);
    }

    #[test]
    fn test_search_request_variables() {
        let body = search_request("Arrival");
        assert_eq!(body["variables"]["query"], "Arrival");
        assert_eq!(body["variables"]["limit"], 16);
        assert_eq!(body["variables"]["sortBy"], "RELEVANCE");
    }
}
