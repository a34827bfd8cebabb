use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub reference: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub admin_reply: Option<String>,
    pub replied_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InquiryType {
    Quote,
    Booking,
    Complaint,
    General,
}

impl InquiryType {
    pub fn label(&self) -> &'static str {
        match self {
            InquiryType::Quote => "Request a Quote",
            InquiryType::Booking => "Booking Inquiry",
            InquiryType::Complaint => "Complaint or Issue",
            InquiryType::General => "General Question",
        }
    }
}
