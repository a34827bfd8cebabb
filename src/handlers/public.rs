use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, ContactMessage, Frequency, InquiryType, PaymentMethod, PaymentMethodType, Service};
use crate::services::booking::{self, NewBooking};
use crate::services::contact::{self, NewContactMessage};
use crate::services::validation;
use crate::state::AppState;

// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = {
        let db = state.db()?;
        queries::list_active_services(&db)?
    };
    Ok(Json(services))
}

// GET /api/payment-methods
pub async fn list_payment_methods(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    let methods = {
        let db = state.db()?;
        queries::list_available_payment_methods(&db)?
    };
    Ok(Json(methods))
}

// POST /api/bookings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub service_id: Option<i64>,
    pub service_date: String,
    pub service_time: String,
    pub frequency: Option<String>,
    pub special_instructions: Option<String>,
    pub payment_method: String,
}

impl CreateBookingRequest {
    fn validate(self) -> Result<NewBooking, AppError> {
        let customer_name = validation::required("customer_name", &self.customer_name)?;
        let customer_email = validation::email("customer_email", &self.customer_email)?;
        let customer_phone = validation::required("customer_phone", &self.customer_phone)?;
        let address = validation::required("address", &self.address)?;
        let city = validation::required("city", &self.city)?;
        let postcode = validation::required("postcode", &self.postcode)?.to_uppercase();

        let service_id = self
            .service_id
            .ok_or_else(|| AppError::BadRequest("service_id is required".to_string()))?;

        let raw_date = validation::required("service_date", &self.service_date)?;
        let service_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|_| {
            AppError::BadRequest("service_date must be a date (YYYY-MM-DD)".to_string())
        })?;

        let raw_time = validation::required("service_time", &self.service_time)?;
        let service_time = NaiveTime::parse_from_str(&raw_time, "%H:%M")
            .map_err(|_| AppError::BadRequest("service_time must be a time (HH:MM)".to_string()))?
            .format("%H:%M")
            .to_string();

        let frequency = match validation::optional(self.frequency) {
            None => Frequency::default(),
            Some(raw) => Frequency::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(
                    "frequency must be one of one-time, weekly, bi-weekly, monthly".to_string(),
                )
            })?,
        };

        let raw_method = validation::required("payment_method", &self.payment_method)?;
        let payment_method = PaymentMethodType::parse(&raw_method).ok_or_else(|| {
            AppError::BadRequest("payment_method must be one of paypal, bank_transfer".to_string())
        })?;

        Ok(NewBooking {
            customer_name,
            customer_email,
            customer_phone,
            address,
            city,
            postcode,
            service_id,
            service_date,
            service_time,
            frequency,
            special_instructions: validation::optional(self.special_instructions),
            payment_method,
        })
    }
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let input = body.validate()?;
    let booking = booking::submit_booking(&state, input)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/contact
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateMessageRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub subject: Option<String>,
    pub inquiry_type: Option<String>,
}

impl CreateMessageRequest {
    fn validate(self) -> Result<NewContactMessage, AppError> {
        let name = validation::required("name", &self.name)?;
        let email = validation::email("email", &self.email)?;
        let message = validation::required("message", &self.message)?;

        let inquiry_type = match validation::optional(self.inquiry_type) {
            None => None,
            Some(raw) => Some(
                serde_json::from_value::<InquiryType>(serde_json::Value::String(raw.to_lowercase()))
                    .map_err(|_| {
                        AppError::BadRequest(
                            "inquiry_type must be one of quote, booking, complaint, general"
                                .to_string(),
                        )
                    })?,
            ),
        };

        Ok(NewContactMessage {
            name,
            email,
            phone: validation::optional(self.phone),
            message,
            subject: validation::optional(self.subject),
            inquiry_type,
        })
    }
}

pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<ContactMessage>), AppError> {
    let input = body.validate()?;
    let message = contact::submit_message(&state, input)?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_request() -> CreateBookingRequest {
        CreateBookingRequest {
            customer_name: " Alice Smith ".to_string(),
            customer_email: "Alice@Example.com".to_string(),
            customer_phone: "07123 456789".to_string(),
            address: "1 High Street".to_string(),
            city: "London".to_string(),
            postcode: "sw1a 1aa".to_string(),
            service_id: Some(1),
            service_date: "2030-05-01".to_string(),
            service_time: "14:05".to_string(),
            frequency: None,
            special_instructions: Some("  ".to_string()),
            payment_method: "paypal".to_string(),
        }
    }

    #[test]
    fn test_booking_request_normalizes_fields() {
        let booking = booking_request().validate().unwrap();
        assert_eq!(booking.customer_name, "Alice Smith");
        assert_eq!(booking.customer_email, "alice@example.com");
        assert_eq!(booking.postcode, "SW1A 1AA");
        assert_eq!(booking.service_time, "14:05");
        assert_eq!(booking.frequency, Frequency::OneTime);
        assert_eq!(booking.special_instructions, None);
        assert_eq!(booking.payment_method, PaymentMethodType::Paypal);
    }

    #[test]
    fn test_booking_request_names_first_bad_field() {
        let err = CreateBookingRequest {
            customer_phone: "".to_string(),
            service_time: "late".to_string(),
            ..booking_request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "customer_phone is required");

        let err = CreateBookingRequest {
            service_time: "25:00".to_string(),
            ..booking_request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "service_time must be a time (HH:MM)");

        let err = CreateBookingRequest {
            payment_method: "cash".to_string(),
            ..booking_request()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_message_request_inquiry_type() {
        let message = CreateMessageRequest {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            message: "Hello".to_string(),
            inquiry_type: Some("Complaint".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(message.inquiry_type, Some(InquiryType::Complaint));

        let err = CreateMessageRequest {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            message: "Hello".to_string(),
            inquiry_type: Some("spam".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
