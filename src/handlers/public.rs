use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::time::format_time;
use crate::models::{Booking, Employee, Service, ServiceSelection};
use crate::services::booking::{self, BookingRequest};
use crate::services::calendar::{self, WeekView};
use crate::services::notifications::{self, ConfirmationReport};
use crate::state::AppState;

pub async fn list_employees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let db = state.lock_db()?;
    Ok(Json(queries::list_employees(&db)?))
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let db = state.lock_db()?;
    Ok(Json(queries::list_services(&db)?))
}

// GET /api/availability?employee_id=..&date=YYYY-MM-DD&services=cut:1,beard:1
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub employee_id: String,
    pub date: NaiveDate,
    pub services: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    employee_id: String,
    date: NaiveDate,
    duration_minutes: i64,
    slots: Vec<String>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let selections =
        ServiceSelection::parse_list(&query.services).map_err(AppError::InvalidRequest)?;

    let db = state.lock_db()?;
    if queries::get_employee(&db, &query.employee_id)?.is_none() {
        return Err(AppError::NotFound("employee not found".to_string()));
    }
    let (duration, slots) = booking::available_times(
        &db,
        &state.clock,
        &query.employee_id,
        query.date,
        &selections,
        state.config.max_booking_minutes,
    )?;

    Ok(Json(AvailabilityResponse {
        employee_id: query.employee_id,
        date: query.date,
        duration_minutes: duration,
        slots: slots.into_iter().map(format_time).collect(),
    }))
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    booking: Booking,
    /// `None` when the confirmation texts could not be sent.
    notifications: Option<ConfirmationReport>,
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let booking = {
        let mut db = state.lock_db()?;
        booking::create_booking(&mut db, &state.clock, state.config.max_booking_minutes, &body)?
    };

    let notifications = match notifications::send_booking_confirmation(&state, &booking.id).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(error = %e, booking_id = %booking.id, "booking confirmation failed");
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking,
            notifications,
        }),
    ))
}

#[derive(Deserialize)]
pub struct WeekQuery {
    pub start: Option<NaiveDate>,
}

// GET /api/employees/:id/week
pub async fn employee_week(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekView>, AppError> {
    let start = query.start.unwrap_or_else(|| state.clock.today());
    let db = state.lock_db()?;
    let employee = queries::get_employee(&db, &id)?
        .ok_or_else(|| AppError::NotFound("employee not found".to_string()))?;
    Ok(Json(calendar::week_view(&db, &employee, start)?))
}
