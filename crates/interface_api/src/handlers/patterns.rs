//! Recurring pattern handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use app_booking::{FlexFillRequest, PatternDeactivation, PatternFill};
use core_kernel::PatternId;

use crate::dto::{CreatePatternBody, DeactivatePatternBody, ExtendPatternBody};
use crate::{error::ApiError, AppState};

/// Creates a pattern and fills it with bookings
pub async fn create_pattern(
    State(state): State<AppState>,
    Json(body): Json<CreatePatternBody>,
) -> Result<(StatusCode, Json<PatternFill>), ApiError> {
    body.validate()?;
    let fill = state.engine.create_recurring_pattern(body.into_request()?).await?;
    Ok((StatusCode::CREATED, Json(fill)))
}

/// Fills a lease's flex pattern over its contract or one month
pub async fn fill_flex_pattern(
    State(state): State<AppState>,
    Json(request): Json<FlexFillRequest>,
) -> Result<(StatusCode, Json<PatternFill>), ApiError> {
    let fill = state.engine.fill_flex_pattern(request).await?;
    Ok((StatusCode::CREATED, Json(fill)))
}

pub async fn extend_pattern(
    State(state): State<AppState>,
    Path(id): Path<PatternId>,
    Json(body): Json<ExtendPatternBody>,
) -> Result<Json<PatternFill>, ApiError> {
    Ok(Json(state.engine.extend_pattern(id, body.until).await?))
}

pub async fn deactivate_pattern(
    State(state): State<AppState>,
    Path(id): Path<PatternId>,
    Json(body): Json<DeactivatePatternBody>,
) -> Result<Json<PatternDeactivation>, ApiError> {
    Ok(Json(
        state
            .engine
            .deactivate_pattern(id, body.end_date, body.cancel_future)
            .await?,
    ))
}
