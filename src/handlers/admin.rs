use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, BookingFilter};
use crate::errors::{storage_error, AppError};
use crate::models::time::hhmm;
use crate::models::{
    Booking, BookingLine, BookingStatus, Customer, Employee, Service, TimeOff, WeeklyScheduleEntry,
};
use crate::services::calendar::{self, WeekView};
use crate::state::AppState;

pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub employee_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    booking: Booking,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    employee_name: Option<String>,
    services: Vec<BookingLine>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()
        .map_err(AppError::InvalidRequest)?;
    let filter = BookingFilter {
        status,
        employee_id: query.employee_id,
        date: query.date,
        limit: query.limit,
    };

    let db = state.lock_db()?;
    let mut response = vec![];
    for booking in queries::list_bookings(&db, &filter)? {
        let customer = queries::get_customer(&db, &booking.customer_id)?;
        let employee = queries::get_employee(&db, &booking.employee_id)?;
        let services = queries::get_booking_lines(&db, &booking.id)?;
        response.push(BookingResponse {
            customer_name: customer.as_ref().map(|c| c.name.clone()),
            customer_phone: customer.map(|c| c.phone),
            employee_name: employee.map(|e| e.name),
            services,
            booking,
        });
    }

    Ok(Json(response))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.lock_db()?;
    let Some(booking) = queries::get_booking(&db, &id)? else {
        return Err(AppError::NotFound("booking not found".to_string()));
    };
    if !queries::transition_booking_status(
        &db,
        &id,
        &BookingStatus::CANCELLABLE,
        BookingStatus::Cancelled,
    )? {
        return Err(AppError::Conflict(format!(
            "booking is {} and cannot be cancelled",
            booking.status.as_str()
        )));
    }

    tracing::info!(booking_id = %id, "booking cancelled by admin");
    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Employees ──

#[derive(Deserialize)]
pub struct EmployeeRequest {
    pub name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EmployeeRequest {
    fn into_employee(self, id: String) -> Result<Employee, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidRequest("name is required".to_string()));
        }
        Ok(Employee {
            id,
            name,
            phone: blank_to_none(self.phone),
            bio: blank_to_none(self.bio),
        })
    }
}

pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Employee>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let db = state.lock_db()?;
    Ok(Json(queries::list_employees(&db)?))
}

pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<EmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let employee = body.into_employee(uuid::Uuid::new_v4().to_string())?;
    {
        let db = state.lock_db()?;
        queries::create_employee(&db, &employee)?;
    }

    tracing::info!(employee_id = %employee.id, "employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<EmployeeRequest>,
) -> Result<Json<Employee>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let employee = body.into_employee(id)?;
    let db = state.lock_db()?;
    if !queries::update_employee(&db, &employee)? {
        return Err(AppError::NotFound("employee not found".to_string()));
    }
    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.lock_db()?;
    let removed = queries::delete_employee(&db, &id)
        .map_err(|e| storage_error(e, "employee still has bookings"))?;
    if !removed {
        return Err(AppError::NotFound("employee not found".to_string()));
    }
    tracing::info!(employee_id = %id, "employee deleted");
    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Services ──

#[derive(Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
}

impl ServiceRequest {
    fn into_service(self, id: String) -> Result<Service, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidRequest("name is required".to_string()));
        }
        if self.duration_minutes <= 0 {
            return Err(AppError::InvalidRequest(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::InvalidRequest("price must not be negative".to_string()));
        }
        Ok(Service {
            id,
            name,
            duration_minutes: self.duration_minutes,
            price: self.price,
        })
    }
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let db = state.lock_db()?;
    Ok(Json(queries::list_services(&db)?))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let service = body.into_service(uuid::Uuid::new_v4().to_string())?;
    {
        let db = state.lock_db()?;
        queries::create_service(&db, &service)?;
    }
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let service = body.into_service(id)?;
    let db = state.lock_db()?;
    if !queries::update_service(&db, &service)? {
        return Err(AppError::NotFound("service not found".to_string()));
    }
    Ok(Json(service))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.lock_db()?;
    let removed = queries::delete_service(&db, &id)
        .map_err(|e| storage_error(e, "service is used by existing bookings"))?;
    if !removed {
        return Err(AppError::NotFound("service not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/customers
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Customer>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let db = state.lock_db()?;
    Ok(Json(queries::list_customers(&db)?))
}

// ── Schedule ──

#[derive(Deserialize)]
pub struct ScheduleDay {
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

fn validate_schedule(
    employee_id: &str,
    days: Vec<ScheduleDay>,
) -> Result<Vec<WeeklyScheduleEntry>, AppError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(days.len());
    for day in days {
        if !(1..=7).contains(&day.day_of_week) {
            return Err(AppError::InvalidRequest(format!(
                "day_of_week must be 1-7, got {}",
                day.day_of_week
            )));
        }
        if day.end_time <= day.start_time {
            return Err(AppError::InvalidRequest(format!(
                "day {} ends before it starts",
                day.day_of_week
            )));
        }
        if !seen.insert(day.day_of_week) {
            return Err(AppError::InvalidRequest(format!(
                "day {} listed more than once",
                day.day_of_week
            )));
        }
        entries.push(WeeklyScheduleEntry {
            employee_id: employee_id.to_string(),
            day_of_week: day.day_of_week,
            start_time: day.start_time,
            end_time: day.end_time,
        });
    }
    entries.sort_by_key(|e| e.day_of_week);
    Ok(entries)
}

fn require_employee(db: &rusqlite::Connection, id: &str) -> Result<Employee, AppError> {
    queries::get_employee(db, id)?
        .ok_or_else(|| AppError::NotFound("employee not found".to_string()))
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<WeeklyScheduleEntry>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let db = state.lock_db()?;
    require_employee(&db, &id)?;
    Ok(Json(queries::get_schedule(&db, &id)?))
}

// PUT /api/admin/employees/:id/schedule replaces the whole week.
pub async fn replace_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Vec<ScheduleDay>>,
) -> Result<Json<Vec<WeeklyScheduleEntry>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let entries = validate_schedule(&id, body)?;
    let db = state.lock_db()?;
    require_employee(&db, &id)?;
    queries::replace_schedule(&db, &id, &entries)?;

    tracing::info!(employee_id = %id, days = entries.len(), "schedule replaced");
    Ok(Json(entries))
}

// ── Time off ──

#[derive(Deserialize)]
pub struct TimeOffRequest {
    pub date: NaiveDate,
    pub reason: Option<String>,
}

pub async fn list_time_off(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<TimeOff>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let db = state.lock_db()?;
    require_employee(&db, &id)?;
    Ok(Json(queries::list_time_off(&db, &id)?))
}

pub async fn add_time_off(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TimeOffRequest>,
) -> Result<(StatusCode, Json<TimeOff>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let time_off = TimeOff {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: id,
        date: body.date,
        reason: blank_to_none(body.reason),
    };
    let db = state.lock_db()?;
    require_employee(&db, &time_off.employee_id)?;
    queries::add_time_off(&db, &time_off)
        .map_err(|e| storage_error(e, "employee already has that date off"))?;

    tracing::info!(employee_id = %time_off.employee_id, date = %time_off.date, "time off added");
    Ok((StatusCode::CREATED, Json(time_off)))
}

pub async fn delete_time_off(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let db = state.lock_db()?;
    if !queries::delete_time_off(&db, &id)? {
        return Err(AppError::NotFound("time off not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/week
#[derive(Deserialize)]
pub struct WeekQuery {
    pub start: Option<NaiveDate>,
}

pub async fn week_overview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<WeekQuery>,
) -> Result<Json<Vec<WeekView>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let start = query.start.unwrap_or_else(|| state.clock.today());
    let db = state.lock_db()?;
    let mut weeks = vec![];
    for employee in queries::list_employees(&db)? {
        weeks.push(calendar::week_view(&db, &employee, start)?);
    }
    Ok(Json(weeks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn day(dow: u8, start: &str, end: &str) -> ScheduleDay {
        ScheduleDay {
            day_of_week: dow,
            start_time: t(start),
            end_time: t(end),
        }
    }

    #[test]
    fn test_check_auth() {
        let mut headers = HeaderMap::new();
        assert!(check_auth(&headers, "secret").is_err());
        headers.insert("authorization", "Bearer wrong".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_err());
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_ok());
    }

    #[test]
    fn test_validate_schedule_sorts_days() {
        let days = vec![day(5, "09:00", "17:00"), day(1, "10:00", "18:00")];
        let entries = validate_schedule("b", days).unwrap();
        assert_eq!(entries[0].day_of_week, 1);
        assert_eq!(entries[1].day_of_week, 5);
    }

    #[test]
    fn test_validate_schedule_rejects_bad_input() {
        assert!(validate_schedule("b", vec![day(0, "09:00", "17:00")]).is_err());
        assert!(validate_schedule("b", vec![day(8, "09:00", "17:00")]).is_err());
        assert!(validate_schedule("b", vec![day(2, "17:00", "09:00")]).is_err());
        assert!(validate_schedule("b", vec![day(2, "09:00", "09:00")]).is_err());
        let split_day = vec![day(2, "09:00", "12:00"), day(2, "13:00", "17:00")];
        assert!(validate_schedule("b", split_day).is_err());
    }

    #[test]
    fn test_empty_schedule_is_allowed() {
        assert!(validate_schedule("b", vec![]).unwrap().is_empty());
    }
}
