use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

use super::admin::check_auth;
use crate::errors::AppError;
use crate::services::commands;
use crate::services::messaging::twilio::validate_signature;
use crate::services::notifications::{self, ConfirmationReport, NotifyError};
use crate::state::AppState;

fn form_value<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

// Twilio signs every posted parameter, so the form is kept as raw pairs.
pub async fn sms_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    let from = form_value(&params, "From").trim().to_string();
    let body = form_value(&params, "Body").trim().to_string();

    tracing::info!(from = %from, body = %body, "incoming SMS");

    // Signature check is skipped when no auth token is configured (dev mode)
    if !state.config.twilio_auth_token.is_empty() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Twilio-Signature header");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        // Behind a proxy the public URL comes from X-Forwarded-Proto/Host
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        let host = headers
            .get("x-forwarded-host")
            .or_else(|| headers.get("host"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let url = format!("{proto}://{host}/webhook/sms");

        let signed: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        if !validate_signature(&state.config.twilio_auth_token, signature, &url, &signed) {
            tracing::warn!("invalid Twilio signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let reply = match commands::reply_to(&state, &from, &body) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, from = %from, "sms command failed");
            "Sorry, something went wrong. Please try again in a moment.".to_string()
        }
    };

    twiml_response(&reply)
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn twiml_response(message: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        format!(
            "<Response><Message>{}</Message></Response>",
            xml_escape(message)
        ),
    )
        .into_response()
}

// POST /webhook/booking-created
#[derive(Deserialize)]
pub struct BookingCreatedPayload {
    pub record: Option<BookingRecord>,
}

#[derive(Deserialize)]
pub struct BookingRecord {
    pub id: Option<String>,
}

pub async fn booking_created(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<BookingCreatedPayload>,
) -> Result<Json<ConfirmationReport>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let Some(booking_id) = payload
        .record
        .and_then(|r| r.id)
        .filter(|id| !id.trim().is_empty())
    else {
        return Err(AppError::InvalidRequest("missing booking id".to_string()));
    };

    match notifications::send_booking_confirmation(&state, &booking_id).await {
        Ok(report) => Ok(Json(report)),
        Err(NotifyError::NotFound(what)) => {
            Err(AppError::InvalidRequest(format!("{what} not found")))
        }
        Err(NotifyError::MissingPhone(who)) => {
            Err(AppError::InvalidRequest(format!("{who} phone missing")))
        }
        Err(NotifyError::Send(e)) => Err(AppError::Messaging(e.to_string())),
        Err(NotifyError::Storage(e)) => Err(AppError::Internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_value_defaults_to_empty() {
        let params = vec![("From".to_string(), "+15551110000".to_string())];
        assert_eq!(form_value(&params, "From"), "+15551110000");
        assert_eq!(form_value(&params, "Body"), "");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("Rozer's <Barber> & Co"), "Rozer&apos;s &lt;Barber&gt; &amp; Co");
    }
}
