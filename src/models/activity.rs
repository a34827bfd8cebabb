use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub kind: String,
    pub subject_id: String,
    pub reference: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    BookingCreated,
    BookingStatusChanged,
    PaymentStatusChanged,
    MessageReceived,
    MessageRead,
    MessageReplied,
    PaymentMethodUpdated,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::BookingCreated => "booking_created",
            ActivityKind::BookingStatusChanged => "booking_status_changed",
            ActivityKind::PaymentStatusChanged => "payment_status_changed",
            ActivityKind::MessageReceived => "message_received",
            ActivityKind::MessageRead => "message_read",
            ActivityKind::MessageReplied => "message_replied",
            ActivityKind::PaymentMethodUpdated => "payment_method_updated",
        }
    }
}
