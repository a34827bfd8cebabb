use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingWithService, ContactMessage};
use crate::services::{reference, validation};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackRequest {
    pub reference: String,
    pub email: String,
}

impl TrackRequest {
    /// Normalized `(reference, email)`, or `None` when either cannot match any row.
    fn normalized(&self, prefix: &str) -> Option<(String, String)> {
        let reference = reference::normalize(&self.reference);
        let email = validation::normalize_email(&self.email);
        if email.is_empty() || !reference::is_well_formed(prefix, &reference) {
            return None;
        }
        Some((reference, email))
    }
}

// POST /api/track/booking
pub async fn track_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackRequest>,
) -> Result<Json<BookingWithService>, AppError> {
    let (reference, email) = body
        .normalized(reference::BOOKING_PREFIX)
        .ok_or(AppError::NotFound)?;

    let booking = {
        let db = state.db()?;
        queries::find_booking_for_tracking(&db, &reference, &email)?
    };
    booking.map(Json).ok_or(AppError::NotFound)
}

// POST /api/track/message
pub async fn track_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackRequest>,
) -> Result<Json<ContactMessage>, AppError> {
    let (reference, email) = body
        .normalized(reference::MESSAGE_PREFIX)
        .ok_or(AppError::NotFound)?;

    let message = {
        let db = state.db()?;
        queries::find_message_for_tracking(&db, &reference, &email)?
    };
    message.map(Json).ok_or(AppError::NotFound)
}
