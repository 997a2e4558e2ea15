use std::sync::Arc;

use crate::services::{
    providers::{CatalogProvider, GenerationProvider, RatingProvider},
    RecommendationEngine,
};

/// Shared application state
pub struct AppState {
    pub engine: RecommendationEngine,
    pub catalog_provider: Arc<dyn CatalogProvider>,
    pub rating_provider: Arc<dyn RatingProvider>,
    /// Model used when a request does not name one
    pub default_model: String,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        catalog_provider: Arc<dyn CatalogProvider>,
        rating_provider: Arc<dyn RatingProvider>,
        default_model: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            engine: RecommendationEngine::new(generator).with_max_attempts(max_attempts),
            catalog_provider,
            rating_provider,
            default_model: default_model.into(),
        }
    }
}
