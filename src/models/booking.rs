use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::PaymentMethodType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub reference: String,
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
    pub amount_pence: i64,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A booking joined with the catalogue entry it was made for.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithService {
    #[serde(flatten)]
    pub booking: Booking,
    pub service_name: Option<String>,
    pub service_description: Option<String>,
    pub service_price_pence: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Admin actions that move a booking through its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingEvent {
    Confirm,
    Complete,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a {} booking", .event.as_str(), .from.as_str())]
pub struct TransitionError {
    pub from: BookingStatus,
    pub event: BookingEvent,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Legal transitions: pending -> confirmed -> completed, and cancel from
    /// anything that is not already cancelled.
    pub fn apply(self, event: BookingEvent) -> Result<BookingStatus, TransitionError> {
        use BookingEvent::*;
        use BookingStatus::*;

        match (self, event) {
            (Pending, Confirm) => Ok(Confirmed),
            (Confirmed, Complete) => Ok(Completed),
            (Pending | Confirmed | Completed, Cancel) => Ok(Cancelled),
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}

impl BookingEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEvent::Confirm => "confirm",
            BookingEvent::Complete => "complete",
            BookingEvent::Cancel => "cancel",
        }
    }
}

/// Tracked independently of [`BookingStatus`]; any value may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    #[serde(rename = "one-time")]
    OneTime,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "bi-weekly")]
    BiWeekly,
    #[serde(rename = "monthly")]
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneTime => "one-time",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi-weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one-time" => Some(Frequency::OneTime),
            "weekly" => Some(Frequency::Weekly),
            "bi-weekly" => Some(Frequency::BiWeekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::OneTime => "One-time Service",
            Frequency::Weekly => "Weekly",
            Frequency::BiWeekly => "Bi-weekly (Every 2 weeks)",
            Frequency::Monthly => "Monthly",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let confirmed = BookingStatus::Pending.apply(BookingEvent::Confirm).unwrap();
        assert_eq!(confirmed, BookingStatus::Confirmed);
        let completed = confirmed.apply(BookingEvent::Complete).unwrap();
        assert_eq!(completed, BookingStatus::Completed);
    }

    #[test]
    fn test_cancel_reachable_from_every_other_status() {
        for status in BookingStatus::ALL {
            if status == BookingStatus::Cancelled {
                continue;
            }
            assert_eq!(
                status.apply(BookingEvent::Cancel),
                Ok(BookingStatus::Cancelled),
                "cancel from {}",
                status.as_str()
            );
        }
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let illegal = [
            (BookingStatus::Pending, BookingEvent::Complete),
            (BookingStatus::Confirmed, BookingEvent::Confirm),
            (BookingStatus::Completed, BookingEvent::Confirm),
            (BookingStatus::Completed, BookingEvent::Complete),
            (BookingStatus::Cancelled, BookingEvent::Confirm),
            (BookingStatus::Cancelled, BookingEvent::Complete),
            (BookingStatus::Cancelled, BookingEvent::Cancel),
        ];
        for (from, event) in illegal {
            assert_eq!(from.apply(event), Err(TransitionError { from, event }));
        }
    }

    #[test]
    fn test_transition_error_message() {
        let err = BookingStatus::Pending
            .apply(BookingEvent::Complete)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot complete a pending booking");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(BookingStatus::parse("completed"), Some(BookingStatus::Completed));
        assert_eq!(BookingStatus::parse("Completed"), None);
        assert_eq!(PaymentStatus::parse("refunded"), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::parse("unpaid"), None);
    }

    #[test]
    fn test_frequency_wire_names() {
        assert_eq!(
            serde_json::to_string(&Frequency::BiWeekly).unwrap(),
            "\"bi-weekly\""
        );
        let parsed: Frequency = serde_json::from_str("\"one-time\"").unwrap();
        assert_eq!(parsed, Frequency::OneTime);
        assert_eq!(Frequency::default(), Frequency::OneTime);
    }
}
