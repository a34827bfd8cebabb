use chrono::NaiveDate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    ActivityKind, Booking, BookingEvent, BookingStatus, BookingWithService, Frequency,
    PaymentMethodType, PaymentStatus,
};
use crate::services::{activity, reference};
use crate::state::AppState;

/// A booking submission that has passed field validation.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub service_id: i64,
    pub service_date: NaiveDate,
    pub service_time: String,
    pub frequency: Frequency,
    pub special_instructions: Option<String>,
    pub payment_method: PaymentMethodType,
}

/// Persists a new booking priced from its service, with both statuses pending.
pub fn submit_booking(state: &AppState, input: NewBooking) -> Result<Booking, AppError> {
    let booking = {
        let db = state.db()?;

        let service = queries::get_service(&db, input.service_id)?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::BadRequest("selected service is not available".to_string()))?;

        if !queries::has_available_payment_method(&db, input.payment_method)? {
            return Err(AppError::BadRequest(
                "selected payment method is not available".to_string(),
            ));
        }

        let now = queries::now_timestamp();
        let mut booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            reference: String::new(),
            customer_name: input.customer_name,
            customer_email: input.customer_email,
            customer_phone: input.customer_phone,
            address: input.address,
            city: input.city,
            postcode: input.postcode,
            service_id: service.id,
            service_date: input.service_date,
            service_time: input.service_time,
            frequency: input.frequency,
            special_instructions: input.special_instructions,
            payment_method: input.payment_method,
            amount_pence: service.price_pence,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let stored = reference::insert_with_unique(reference::BOOKING_PREFIX, |candidate| {
            booking.reference = candidate.to_string();
            queries::create_booking(&db, &booking)
        })?;
        booking.reference = stored;
        booking
    };

    tracing::info!(
        reference = %booking.reference,
        service_id = booking.service_id,
        "booking created"
    );
    activity::record(
        state,
        ActivityKind::BookingCreated,
        &booking.id,
        Some(&booking.reference),
        None,
    );

    Ok(booking)
}

/// Moves a booking through its lifecycle. The current status is read and
/// written under the same connection lock.
pub fn apply_booking_event(
    state: &AppState,
    id: &str,
    event: BookingEvent,
) -> Result<BookingWithService, AppError> {
    let (updated, from) = {
        let db = state.db()?;
        let current = queries::get_booking_by_id(&db, id)?.ok_or(AppError::NotFound)?;
        let from = current.booking.booking_status;
        let next = from
            .apply(event)
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        queries::update_booking_status(&db, id, next)?;
        let updated = queries::get_booking_by_id(&db, id)?.ok_or(AppError::NotFound)?;
        (updated, from)
    };

    let to = updated.booking.booking_status;
    tracing::info!(
        reference = %updated.booking.reference,
        from = from.as_str(),
        to = to.as_str(),
        "booking status changed"
    );
    activity::record(
        state,
        ActivityKind::BookingStatusChanged,
        &updated.booking.id,
        Some(&updated.booking.reference),
        Some(&format!("{} -> {}", from.as_str(), to.as_str())),
    );

    Ok(updated)
}

/// Payment status has no transition graph and never moves the booking status.
pub fn set_payment_status(
    state: &AppState,
    id: &str,
    status: PaymentStatus,
) -> Result<BookingWithService, AppError> {
    let (updated, from) = {
        let db = state.db()?;
        let current = queries::get_booking_by_id(&db, id)?.ok_or(AppError::NotFound)?;
        queries::update_payment_status(&db, id, status)?;
        let updated = queries::get_booking_by_id(&db, id)?.ok_or(AppError::NotFound)?;
        (updated, current.booking.payment_status)
    };

    tracing::info!(
        reference = %updated.booking.reference,
        from = from.as_str(),
        to = status.as_str(),
        "payment status changed"
    );
    activity::record(
        state,
        ActivityKind::PaymentStatusChanged,
        &updated.booking.id,
        Some(&updated.booking.reference),
        Some(&format!("{} -> {}", from.as_str(), status.as_str())),
    );

    Ok(updated)
}
