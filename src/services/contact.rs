use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ActivityKind, ContactMessage, InquiryType};
use crate::services::{activity, reference};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub subject: Option<String>,
    pub inquiry_type: Option<InquiryType>,
}

impl NewContactMessage {
    /// The stored body carries the inquiry type and subject as a header when given.
    pub fn composed_body(&self) -> String {
        let mut header = vec![];
        if let Some(kind) = self.inquiry_type {
            header.push(format!("Inquiry Type: {}", kind.label()));
        }
        if let Some(subject) = &self.subject {
            header.push(format!("Subject: {subject}"));
        }

        if header.is_empty() {
            self.message.clone()
        } else {
            format!("{}\n\n{}", header.join("\n"), self.message)
        }
    }
}

pub fn submit_message(
    state: &AppState,
    input: NewContactMessage,
) -> Result<ContactMessage, AppError> {
    let message = {
        let db = state.db()?;
        let mut message = ContactMessage {
            id: uuid::Uuid::new_v4().to_string(),
            reference: String::new(),
            message: input.composed_body(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            is_read: false,
            admin_reply: None,
            replied_at: None,
            created_at: queries::now_timestamp(),
        };

        let stored = reference::insert_with_unique(reference::MESSAGE_PREFIX, |candidate| {
            message.reference = candidate.to_string();
            queries::create_contact_message(&db, &message)
        })?;
        message.reference = stored;
        message
    };

    tracing::info!(reference = %message.reference, "contact message received");
    activity::record(
        state,
        ActivityKind::MessageReceived,
        &message.id,
        Some(&message.reference),
        None,
    );

    Ok(message)
}

pub fn mark_read(state: &AppState, id: &str, is_read: bool) -> Result<ContactMessage, AppError> {
    let message = {
        let db = state.db()?;
        if !queries::set_message_read(&db, id, is_read)? {
            return Err(AppError::NotFound);
        }
        queries::get_contact_message(&db, id)?.ok_or(AppError::NotFound)?
    };

    activity::record(
        state,
        ActivityKind::MessageRead,
        &message.id,
        Some(&message.reference),
        Some(if is_read { "read" } else { "unread" }),
    );

    Ok(message)
}

/// Attaches the admin reply; the message is forced to read and `replied_at` stamped.
pub fn reply(state: &AppState, id: &str, reply: &str) -> Result<ContactMessage, AppError> {
    let message = {
        let db = state.db()?;
        let now = queries::now_timestamp();
        if !queries::save_reply(&db, id, reply, &now)? {
            return Err(AppError::NotFound);
        }
        queries::get_contact_message(&db, id)?.ok_or(AppError::NotFound)?
    };

    tracing::info!(reference = %message.reference, "contact message replied");
    activity::record(
        state,
        ActivityKind::MessageReplied,
        &message.id,
        Some(&message.reference),
        None,
    );

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewContactMessage {
        NewContactMessage {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            phone: None,
            message: "Do you clean ovens?".to_string(),
            subject: None,
            inquiry_type: None,
        }
    }

    #[test]
    fn test_plain_body() {
        assert_eq!(input().composed_body(), "Do you clean ovens?");
    }

    #[test]
    fn test_body_with_inquiry_header() {
        let message = NewContactMessage {
            subject: Some("Oven cleaning".to_string()),
            inquiry_type: Some(InquiryType::Quote),
            ..input()
        };
        assert_eq!(
            message.composed_body(),
            "Inquiry Type: Request a Quote\nSubject: Oven cleaning\n\nDo you clean ovens?"
        );
    }
}
