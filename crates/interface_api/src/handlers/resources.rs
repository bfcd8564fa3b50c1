//! Availability and credit queries

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use core_kernel::{LeaseId, ResourceId};
use domain_booking::Booking;

use crate::dto::{CreditUsageResponse, DayQuery, FreeSlotsQuery, MonthQuery, TimeSlot};
use crate::{error::ApiError, AppState};

/// Active bookings of a resource on a day, by start time
pub async fn day_agenda(
    State(state): State<AppState>,
    Path(resource_id): Path<ResourceId>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.engine.day_agenda(resource_id, query.date).await?))
}

pub async fn free_slots(
    State(state): State<AppState>,
    Path(resource_id): Path<ResourceId>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    query.validate()?;
    let (open_from, open_until) = query.opening_hours();
    let gaps = state
        .engine
        .free_slots(resource_id, query.date, open_from, open_until)
        .await?;
    Ok(Json(gaps.iter().map(TimeSlot::from).collect()))
}

/// Credits used and remaining for a lease in a month
pub async fn credit_usage(
    State(state): State<AppState>,
    Path(lease_id): Path<LeaseId>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<CreditUsageResponse>, ApiError> {
    let ledger = state.engine.credit_usage(lease_id, query.month()?).await?;
    Ok(Json(ledger.into()))
}
