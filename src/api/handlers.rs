use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CatalogEntry, RecommendationRequest, RecommendationResponse},
    services::{enrichment::attach_global_ratings, RunInput},
};

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Fetch a user's catalog from the configured catalog provider
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let observer = progress_logger(request_id.clone(), "catalog");
    let catalog = state
        .catalog_provider
        .fetch_catalog(&username, Some(&observer))
        .await?;

    tracing::info!(
        request_id = %request_id,
        username = %username,
        entries = catalog.len(),
        "Catalog served"
    );

    Ok(Json(catalog))
}

/// Run the recommendation engine against a fetched or inline catalog
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload?;
    if request.count == 0 {
        return Err(AppError::InvalidInput(
            "count must be at least 1".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        count = request.count,
        categories = ?request.categories,
        "Processing recommendation request"
    );

    let catalog = match (request.username.as_deref(), request.catalog) {
        (Some(username), None) => {
            let observer = progress_logger(request_id.clone(), "catalog");
            state
                .catalog_provider
                .fetch_catalog(username, Some(&observer))
                .await?
        }
        (None, Some(catalog)) => {
            if catalog.iter().any(|entry| entry.title.trim().is_empty()) {
                return Err(AppError::InvalidInput(
                    "catalog entries must have a non-empty title".to_string(),
                ));
            }
            catalog
        }
        _ => {
            return Err(AppError::InvalidInput(
                "provide exactly one of username or catalog".to_string(),
            ))
        }
    };

    let model = request
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.default_model.clone());

    let observer = progress_logger(request_id.clone(), "generation");
    let outcome = state
        .engine
        .recommend(
            RunInput {
                catalog: &catalog,
                count: request.count,
                categories: &request.categories,
                model: &model,
            },
            Some(&observer),
        )
        .await?;

    let mut suggestions = outcome.suggestions;
    if request.with_ratings {
        attach_global_ratings(state.rating_provider.as_ref(), &mut suggestions).await;
    }

    tracing::info!(
        request_id = %request_id,
        accepted = suggestions.len(),
        attempts = outcome.attempts,
        status = ?outcome.status,
        "Recommendation request completed"
    );

    Ok(Json(RecommendationResponse {
        suggestions,
        requested: request.count,
        attempts: outcome.attempts,
        status: outcome.status,
        filtered_duplicates: outcome.filtered_duplicates,
        generated_at: Utc::now(),
    }))
}

/// Progress observer that emits debug events tagged with the request id
fn progress_logger(request_id: RequestId, stage: &'static str) -> impl Fn(usize, usize) + Send + Sync {
    move |current, total| {
        tracing::debug!(
            request_id = %request_id,
            stage,
            current,
            total,
            "Progress"
        );
    }
}
