use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::require_admin;
use crate::models::BookingWithService;
use crate::services::mailer::{Delivery, OutgoingEmail};
use crate::services::notifications::{self, BusinessProfile, NotificationKind};
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub email: String,
    #[serde(alias = "bookingId")]
    pub booking_id: Option<String>,
    pub reference: Option<String>,
}

/// A booking that cannot be loaded only costs the template its details.
fn load_booking(state: &AppState, id: &str) -> Option<BookingWithService> {
    let result = state
        .db()
        .and_then(|db| queries::get_booking_by_id(&db, id).map_err(AppError::from));
    match result {
        Ok(Some(booking)) => Some(booking),
        Ok(None) => {
            tracing::warn!(booking_id = %id, "notification booking not found");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id = %id, "failed to load notification booking");
            None
        }
    }
}

// POST /api/notifications
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NotificationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;

    if body.kind.trim().is_empty() || body.email.trim().is_empty() {
        return Err(AppError::BadRequest("type and email are required".to_string()));
    }
    let kind = NotificationKind::parse(body.kind.trim())
        .ok_or_else(|| AppError::BadRequest("invalid notification type".to_string()))?;
    let email = validation::email("email", &body.email)?;

    let booking = validation::optional(body.booking_id).and_then(|id| load_booking(&state, &id));
    let reference = validation::optional(body.reference);

    let business = BusinessProfile::from_config(&state.config);
    let composed = notifications::compose(kind, booking.as_ref(), reference.as_deref(), &business);

    let outgoing = OutgoingEmail {
        to: email.clone(),
        subject: composed.subject,
        html: composed.html,
        text: composed.text,
    };
    let delivery = state
        .mailer
        .send(&outgoing)
        .await
        .map_err(|e| AppError::Delivery(e.to_string()))?;

    let message = match delivery {
        Delivery::Sent => "Notification sent",
        Delivery::NotConfigured => "Notification prepared (email service integration pending)",
    };
    tracing::info!(kind = kind.as_str(), to = %email, "notification processed");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message,
        "data": {
            "type": kind.as_str(),
            "email": email,
            "subject": outgoing.subject,
            "preview": outgoing.text,
        }
    })))
}
