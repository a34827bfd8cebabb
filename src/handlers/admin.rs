use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::db::queries::{self, BookingFilter, DashboardStats};
use crate::errors::AppError;
use crate::handlers::require_admin;
use crate::models::{
    ActivityKind, BookingEvent, BookingStatus, BookingWithService, ContactMessage, PaymentMethod,
    PaymentSettings, PaymentStatus,
};
use crate::services::{activity, booking, contact, validation};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

fn list_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

// POST /api/admin/auth
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    success: bool,
    token: String,
    expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if body.password.trim().is_empty() {
        return Err(AppError::BadRequest("password is required".to_string()));
    }
    let expected = state
        .config
        .admin_password
        .as_deref()
        .ok_or_else(|| AppError::Config("ADMIN_PASSWORD is not set".to_string()))?;

    let matches: bool = body.password.as_bytes().ct_eq(expected.as_bytes()).into();
    if !matches {
        tracing::warn!("admin login rejected");
        return Err(AppError::Unauthorized);
    }

    {
        let db = state.db()?;
        match queries::prune_revoked_sessions(&db) {
            Ok(0) => {}
            Ok(pruned) => tracing::debug!(pruned, "pruned expired session revocations"),
            Err(e) => tracing::warn!(error = %e, "failed to prune session revocations"),
        }
    }

    let session = state.sessions.issue()?;
    tracing::info!(expires_at = %session.expires_at, "admin session issued");

    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at,
    }))
}

// GET /api/admin/auth
pub async fn verify_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match require_admin(&state, &headers) {
        Ok(claims) => Json(serde_json::json!({
            "authenticated": true,
            "expires_at": claims.expires_at,
        }))
        .into_response(),
        Err(AppError::Unauthorized) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"authenticated": false})),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

// POST /api/admin/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let claims = require_admin(&state, &headers)?;

    {
        let db = state.db()?;
        queries::revoke_session(&db, &claims.nonce, &claims.expires_at.naive_utc())?;
    }
    tracing::info!("admin session revoked");

    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, AppError> {
    require_admin(&state, &headers)?;

    let stats = {
        let db = state.db()?;
        queries::get_dashboard_stats(&db)?
    };
    Ok(Json(stats))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub booking_status: Option<String>,
    pub payment_status: Option<String>,
    pub limit: Option<i64>,
}

impl BookingsQuery {
    fn filter(&self) -> Result<BookingFilter, AppError> {
        let booking_status = match validation::optional(self.booking_status.clone()) {
            None => None,
            Some(raw) => Some(BookingStatus::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("unknown booking_status: {raw}"))
            })?),
        };
        let payment_status = match validation::optional(self.payment_status.clone()) {
            None => None,
            Some(raw) => Some(PaymentStatus::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("unknown payment_status: {raw}"))
            })?),
        };
        Ok(BookingFilter {
            booking_status,
            payment_status,
        })
    }
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingWithService>>, AppError> {
    require_admin(&state, &headers)?;

    let filter = query.filter()?;
    let bookings = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter, list_limit(query.limit))?
    };
    Ok(Json(bookings))
}

// POST /api/admin/bookings/:id/{confirm,complete,cancel}
fn transition_booking(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    event: BookingEvent,
) -> Result<Json<BookingWithService>, AppError> {
    require_admin(state, headers)?;
    let booking = booking::apply_booking_event(state, id, event)?;
    Ok(Json(booking))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingWithService>, AppError> {
    transition_booking(&state, &headers, &id, BookingEvent::Confirm)
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingWithService>, AppError> {
    transition_booking(&state, &headers, &id, BookingEvent::Complete)
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingWithService>, AppError> {
    transition_booking(&state, &headers, &id, BookingEvent::Cancel)
}

// POST /api/admin/bookings/:id/payment-status
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentStatusRequest {
    pub payment_status: String,
}

pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PaymentStatusRequest>,
) -> Result<Json<BookingWithService>, AppError> {
    require_admin(&state, &headers)?;

    let raw = validation::required("payment_status", &body.payment_status)?;
    let status = PaymentStatus::parse(&raw)
        .ok_or_else(|| AppError::BadRequest(format!("unknown payment_status: {raw}")))?;

    let booking = booking::set_payment_status(&state, &id, status)?;
    Ok(Json(booking))
}

// GET /api/admin/messages
#[derive(Deserialize)]
pub struct MessagesQuery {
    pub unread: Option<bool>,
    pub limit: Option<i64>,
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    require_admin(&state, &headers)?;

    let is_read = query.unread.map(|unread| !unread);
    let messages = {
        let db = state.db()?;
        queries::list_contact_messages(&db, is_read, list_limit(query.limit))?
    };
    Ok(Json(messages))
}

// POST /api/admin/messages/:id/read
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default = "default_is_read")]
    pub is_read: bool,
}

fn default_is_read() -> bool {
    true
}

impl MarkReadRequest {
    /// An empty body marks the message read; anything else must be valid JSON.
    fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self { is_read: true });
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("invalid read request: {e}")))
    }
}

pub async fn mark_message_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ContactMessage>, AppError> {
    require_admin(&state, &headers)?;

    let request = MarkReadRequest::from_body(&body)?;
    let message = contact::mark_read(&state, &id, request.is_read)?;
    Ok(Json(message))
}

// POST /api/admin/messages/:id/reply
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplyRequest {
    pub reply: String,
}

pub async fn reply_to_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<ContactMessage>, AppError> {
    require_admin(&state, &headers)?;

    let reply = validation::required("reply", &body.reply)?;
    let message = contact::reply(&state, &id, &reply)?;
    Ok(Json(message))
}

// GET /api/admin/payment-methods
pub async fn get_payment_methods(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    require_admin(&state, &headers)?;

    let methods = {
        let db = state.db()?;
        queries::list_payment_methods(&db, false)?
    };
    Ok(Json(methods))
}

// POST /api/admin/payment-methods/:id/toggle
pub async fn toggle_payment_method(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<PaymentMethod>, AppError> {
    require_admin(&state, &headers)?;

    let method = {
        let db = state.db()?;
        queries::toggle_payment_method(&db, id)?.ok_or(AppError::NotFound)?;
        queries::get_payment_method(&db, id)?.ok_or(AppError::NotFound)?
    };

    tracing::info!(id, is_active = method.is_active, "payment method toggled");
    activity::record(
        &state,
        ActivityKind::PaymentMethodUpdated,
        &id.to_string(),
        None,
        Some(if method.is_active { "activated" } else { "deactivated" }),
    );

    Ok(Json(method))
}

// PUT /api/admin/payment-methods/:id
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePaymentMethodRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<serde_json::Value>,
}

fn validate_settings(settings: &PaymentSettings) -> Result<(), AppError> {
    if let PaymentSettings::Paypal(paypal) = settings {
        let email = paypal.paypal_email.trim();
        if !email.is_empty() && !validation::is_valid_email(email) {
            return Err(AppError::BadRequest(
                "paypal_email must be a valid email address".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn update_payment_method(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePaymentMethodRequest>,
) -> Result<Json<PaymentMethod>, AppError> {
    require_admin(&state, &headers)?;

    let method = {
        let db = state.db()?;
        let mut method = queries::get_payment_method(&db, id)?.ok_or(AppError::NotFound)?;

        if let Some(name) = &body.name {
            method.name = validation::required("name", name)?;
        }
        if body.description.is_some() {
            method.description = validation::optional(body.description);
        }
        if let Some(raw) = body.settings {
            let method_type = method.settings.method_type();
            let settings = PaymentSettings::from_parts(method_type, raw).map_err(|e| {
                AppError::BadRequest(format!(
                    "settings do not match payment method type {}: {e}",
                    method_type.as_str()
                ))
            })?;
            validate_settings(&settings)?;
            method.settings = settings;
        }
        method.updated_at = queries::now_timestamp();

        if !queries::update_payment_method(&db, &method)? {
            return Err(AppError::NotFound);
        }
        method
    };

    tracing::info!(id, method_type = method.settings.method_type().as_str(), "payment method updated");
    activity::record(
        &state,
        ActivityKind::PaymentMethodUpdated,
        &id.to_string(),
        None,
        Some("settings updated"),
    );

    Ok(Json(method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_body() {
        assert!(MarkReadRequest::from_body(b"").unwrap().is_read);
        assert!(MarkReadRequest::from_body(b"{}").unwrap().is_read);
        assert!(!MarkReadRequest::from_body(br#"{"is_read": false}"#).unwrap().is_read);
        assert!(MarkReadRequest::from_body(br#"{"is_read": "false"}"#).is_err());
        assert!(MarkReadRequest::from_body(b"is_read=false").is_err());
    }

    #[test]
    fn test_list_limit_is_clamped() {
        assert_eq!(list_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(list_limit(Some(0)), 1);
        assert_eq!(list_limit(Some(10_000)), MAX_LIST_LIMIT);
    }
}
