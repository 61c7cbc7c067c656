use axum::{extract::State, Json};

use crate::api::{state::AppState, types::*};

/// GET /health -- liveness check with model summary
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let columns = state.predictor.bundle().columns();
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_seconds(),
        input_dim: columns.len(),
        cities: columns.cities().into_iter().map(str::to_string).collect(),
    })
}
