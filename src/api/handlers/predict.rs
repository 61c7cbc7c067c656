use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, error, warn};

use crate::api::{state::AppState, types::*};

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> std::result::Result<Json<PredictionResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected malformed prediction request");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(rejection.body_text())),
        )
    })?;

    debug!(
        city = %request.city,
        last_paid_units = request.last_paid_units,
        last_paid_date = %request.last_paid_date,
        billing_cycle = request.billing_cycle,
        "Incoming prediction request"
    );

    match state.predictor.predict(&request) {
        Ok(response) => Ok(Json(response)),
        Err(e) if e.is_client_error() => {
            warn!(city = %request.city, date = %request.last_paid_date, error = %e, "Prediction rejected");
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))))
        }
        Err(e) => {
            error!(error = %e, "Prediction failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
