//! Booking handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use app_booking::{BookingMove, Deletion, FlexBookingRequest, InvoiceRemoval, StatusChange};
use core_kernel::BookingId;
use domain_billing::DraftInvoice;
use domain_booking::Booking;

use crate::dto::{CreateBookingBody, MoveBookingBody, StatusBody};
use crate::{error::ApiError, AppState};

/// Creates an ad-hoc booking
pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    body.validate()?;
    let booking = state.engine.create_booking(body.into_request()?).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Creates a flex-desk booking against a lease's credits
pub async fn create_flex_booking(
    State(state): State<AppState>,
    Json(request): Json<FlexBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = state.engine.create_flex_booking(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.engine.change_status(id, body.status).await?))
}

/// Moves a booking to another date or time
pub async fn move_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(body): Json<MoveBookingBody>,
) -> Result<Json<BookingMove>, ApiError> {
    body.validate()?;
    Ok(Json(state.engine.move_booking(id, body.into_slot()?).await?))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<Deletion>, ApiError> {
    Ok(Json(state.engine.delete_booking(id).await?))
}

/// Adds the booking to its holder's draft invoice for the month
pub async fn invoice_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<DraftInvoice>, ApiError> {
    Ok(Json(state.engine.generate_or_update_invoice_for_booking(id).await?))
}

pub async fn uninvoice_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<InvoiceRemoval>, ApiError> {
    Ok(Json(state.engine.remove_booking_from_invoice(id).await?))
}
