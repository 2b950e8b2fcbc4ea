use super::server::AppState;
use crate::core::{RateSnapshot, RateSources};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

const NO_STORE: [(header::HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store")];

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub success: bool,
    pub data: RateSnapshot,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub data: RateSnapshot,
    pub sources: RateSources,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn failure(error: &str, details: Option<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        NO_STORE,
        Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

/// `GET /api/rates`
pub async fn get_rates(State(state): State<AppState>) -> Response {
    match state.reader.read().await {
        Ok(outcome) => (
            NO_STORE,
            Json(RatesResponse {
                success: true,
                data: outcome.snapshot,
                cached: outcome.cached,
            }),
        )
            .into_response(),
        Err(_) => failure("Failed to read rates", None),
    }
}

/// `GET /api/update-rates`
pub async fn update_rates(State(state): State<AppState>) -> Response {
    match state.refresher.run().await {
        Ok(outcome) => (
            NO_STORE,
            Json(UpdateResponse {
                success: true,
                data: outcome.snapshot,
                sources: outcome.sources,
            }),
        )
            .into_response(),
        Err(e) => failure("Failed to update rates", Some(format!("{e:#}"))),
    }
}
