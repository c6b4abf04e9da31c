use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use super::admin::check_auth;
use crate::errors::AppError;
use crate::services::reminders::{self, ReminderReport};
use crate::state::AppState;

// GET /api/cron/booking-reminders
pub async fn run_booking_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ReminderReport>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let report = reminders::run_due_notices(&state).await?;
    tracing::info!(
        reminders = report.reminders_sent,
        followups = report.followups_sent,
        failures = report.failures,
        "reminder run finished"
    );
    Ok(Json(report))
}
