/// External collaborators of the recommendation engine
///
/// Generation, catalog retrieval and rating lookup each sit behind a trait so the
/// engine and the HTTP layer can run against in-process fakes.
use crate::{
    error::AppResult,
    models::CatalogEntry,
    services::progress::ProgressObserver,
};

pub mod openai;
pub mod senscritique;

/// Text generation service
///
/// Errors returned here are transport or service failures and abort the run.
/// Malformed but delivered text is returned as `Ok` and handled by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Sends a prompt and returns the raw generated text
    async fn generate(&self, prompt: &str, model: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Source of a user's already-consumed works
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches the full catalog for a user, notifying the observer after every page
    async fn fetch_catalog(
        &self,
        username: &str,
        observer: Option<&dyn ProgressObserver>,
    ) -> AppResult<Vec<CatalogEntry>>;

    fn name(&self) -> &'static str;
}

/// Aggregate public rating lookup
#[async_trait::async_trait]
pub trait RatingProvider: Send + Sync {
    /// Rating of the best match for a title; every failure is `None`
    async fn global_rating(&self, title: &str) -> Option<f64>;

    fn name(&self) -> &'static str;
}
