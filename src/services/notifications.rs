use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::BookingWithService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmation,
    PaymentConfirmed,
    BookingReminder,
    BookingCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingConfirmation => "booking_confirmation",
            NotificationKind::PaymentConfirmed => "payment_confirmed",
            NotificationKind::BookingReminder => "booking_reminder",
            NotificationKind::BookingCancelled => "booking_cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booking_confirmation" => Some(NotificationKind::BookingConfirmation),
            "payment_confirmed" => Some(NotificationKind::PaymentConfirmed),
            "booking_reminder" => Some(NotificationKind::BookingReminder),
            "booking_cancelled" => Some(NotificationKind::BookingCancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BusinessProfile {
    pub name: String,
    pub whatsapp: String,
    pub company_number: String,
}

impl BusinessProfile {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            name: config.business_name.clone(),
            whatsapp: config.business_whatsapp.clone(),
            company_number: config.company_number.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn compose(
    kind: NotificationKind,
    booking: Option<&BookingWithService>,
    reference: Option<&str>,
    business: &BusinessProfile,
) -> ComposedEmail {
    let reference = reference
        .map(str::to_string)
        .or_else(|| booking.map(|b| b.booking.reference.clone()));
    let subject_suffix = reference.clone().unwrap_or_else(|| business.name.clone());
    let reference = reference.unwrap_or_default();

    match kind {
        NotificationKind::BookingConfirmation => ComposedEmail {
            subject: format!("Booking Confirmed - {subject_suffix}"),
            html: booking_confirmation_html(booking, &reference, business),
            text: format!("Your booking has been confirmed! Reference: {reference}"),
        },
        NotificationKind::PaymentConfirmed => ComposedEmail {
            subject: format!("Payment Received - {subject_suffix}"),
            html: payment_confirmed_html(&reference, business),
            text: format!(
                "Your payment has been received and confirmed. Reference: {reference}"
            ),
        },
        NotificationKind::BookingReminder => ComposedEmail {
            subject: format!(
                "Reminder: Your cleaning service is tomorrow - {subject_suffix}"
            ),
            html: booking_reminder_html(booking, &reference, business),
            text: "Reminder: Your cleaning service is scheduled for tomorrow.".to_string(),
        },
        NotificationKind::BookingCancelled => ComposedEmail {
            subject: format!("Booking Cancelled - {subject_suffix}"),
            html: cancellation_html(&reference, business),
            text: format!("Your booking has been cancelled. Reference: {reference}"),
        },
    }
}

fn booking_confirmation_html(
    booking: Option<&BookingWithService>,
    reference: &str,
    business: &BusinessProfile,
) -> String {
    let greeting_name = booking
        .map(|b| escape_html(&b.booking.customer_name))
        .unwrap_or_else(|| "Valued Customer".to_string());

    let details = match booking {
        Some(b) => format!(
            "<h3>Booking Details</h3>\n\
             {}{}{}{}{}",
            detail_row("Service", b.service_name.as_deref().unwrap_or("N/A")),
            detail_row("Date", &b.booking.service_date.format("%d/%m/%Y").to_string()),
            detail_row("Time", &b.booking.service_time),
            detail_row(
                "Address",
                &format!("{}, {} {}", b.booking.address, b.booking.city, b.booking.postcode)
            ),
            detail_row("Amount", &format_pence(b.booking.amount_pence)),
        ),
        None => String::new(),
    };

    let whatsapp = whatsapp_link(
        &business.whatsapp,
        &format!("Hi, my booking reference is {reference}"),
    )
    .map(|url| {
        format!(
            "<p style=\"text-align:center\"><a href=\"{}\">Contact us on WhatsApp</a></p>",
            escape_html(&url)
        )
    })
    .unwrap_or_default();

    let body = format!(
        "<p>Dear {greeting_name},</p>\n\
         <p>Your booking has been successfully confirmed! We're looking forward to providing you with excellent cleaning service.</p>\n\
         {ref_box}\n\
         <div>{details}</div>\n\
         {whatsapp}\n\
         <p><strong>What's next?</strong></p>\n\
         <ol>\n\
         <li>Our team will contact you on WhatsApp within 24 hours</li>\n\
         <li>We'll confirm your payment and finalize all details</li>\n\
         <li>Our professional cleaners will arrive at your scheduled time</li>\n\
         </ol>",
        ref_box = reference_box("Booking Reference", reference),
    );

    layout("#14b8a6", "Booking Confirmed!", &body, business)
}

fn payment_confirmed_html(reference: &str, business: &BusinessProfile) -> String {
    let body = format!(
        "<p>Great news! We've received your payment.</p>\n\
         {}\n\
         <p>Your booking is now confirmed and we'll be ready to provide our service at the scheduled time.</p>\n\
         <p>If you have any questions, please contact us on WhatsApp: <strong>{}</strong></p>",
        reference_box("Reference", reference),
        escape_html(&business.whatsapp),
    );
    layout("#10b981", "Payment Confirmed!", &body, business)
}

fn booking_reminder_html(
    booking: Option<&BookingWithService>,
    reference: &str,
    business: &BusinessProfile,
) -> String {
    let details = booking
        .map(|b| {
            format!(
                "<p><strong>Service Time:</strong> {}</p>\n<p><strong>Address:</strong> {}</p>",
                escape_html(&b.booking.service_time),
                escape_html(&format!(
                    "{}, {} {}",
                    b.booking.address, b.booking.city, b.booking.postcode
                )),
            )
        })
        .unwrap_or_default();

    let body = format!(
        "<p>This is a friendly reminder that your cleaning service is scheduled for tomorrow.</p>\n\
         {details}\n\
         <p>Our team will arrive promptly at the scheduled time. Please ensure someone is available to provide access to the property.</p>\n\
         <p>Reference: <strong>{}</strong></p>",
        escape_html(reference),
    );
    layout("#f59e0b", "Reminder: Service Tomorrow!", &body, business)
}

fn cancellation_html(reference: &str, business: &BusinessProfile) -> String {
    let body = format!(
        "<p>Your booking has been cancelled as requested.</p>\n\
         <p><strong>Cancelled Reference:</strong> {}</p>\n\
         <p>If this was a mistake or if you'd like to rebook, please contact us on WhatsApp: <strong>{}</strong></p>\n\
         <p>We hope to serve you again in the future!</p>",
        escape_html(reference),
        escape_html(&business.whatsapp),
    );
    layout("#ef4444", "Booking Cancelled", &body, business)
}

fn layout(accent: &str, heading: &str, body: &str, business: &BusinessProfile) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">\n\
         <div style=\"max-width: 600px; margin: 0 auto; padding: 20px;\">\n\
         <div style=\"background: {accent}; color: white; padding: 30px; text-align: center;\">\n\
         <h1>{heading}</h1>\n\
         <p>Thank you for choosing {name}</p>\n\
         </div>\n\
         <div style=\"background: #f9fafb; padding: 30px;\">\n\
         {body}\n\
         </div>\n\
         <div style=\"background: #1f2937; color: white; padding: 20px; text-align: center;\">\n\
         <p><strong>{name} Ltd</strong> &bull; Company No. {company}</p>\n\
         <p>WhatsApp: {whatsapp}</p>\n\
         </div>\n\
         </div>\n\
         </body>\n\
         </html>\n",
        name = escape_html(&business.name),
        company = escape_html(&business.company_number),
        whatsapp = escape_html(&business.whatsapp),
    )
}

fn reference_box(label: &str, reference: &str) -> String {
    format!(
        "<div style=\"background: white; border: 2px dashed #14b8a6; padding: 20px; margin: 20px 0; text-align: center;\">\n\
         <p style=\"margin: 0; color: #6b7280;\">{label}</p>\n\
         <h2>{}</h2>\n\
         <p style=\"margin: 0; color: #6b7280; font-size: 12px;\">Save this reference to track your booking</p>\n\
         </div>",
        escape_html(reference),
    )
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        "<p>{label}: <strong>{}</strong></p>\n",
        escape_html(value)
    )
}

fn whatsapp_link(number: &str, message: &str) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    reqwest::Url::parse_with_params(&format!("https://wa.me/{digits}"), &[("text", message)])
        .ok()
        .map(String::from)
}

pub fn format_pence(pence: i64) -> String {
    let sign = if pence < 0 { "-" } else { "" };
    let abs = pence.unsigned_abs();
    format!("{sign}£{}.{:02}", abs / 100, abs % 100)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::models::{Booking, BookingStatus, Frequency, PaymentMethodType, PaymentStatus};

    fn business() -> BusinessProfile {
        BusinessProfile {
            name: "L&C Cleaning Services".to_string(),
            whatsapp: "+44 7413 069737".to_string(),
            company_number: "16561686".to_string(),
        }
    }

    fn booking() -> BookingWithService {
        BookingWithService {
            booking: Booking {
                id: "b-1".to_string(),
                reference: "LCB-123456-ABC".to_string(),
                customer_name: "Alice <Admin>".to_string(),
                customer_email: "alice@example.com".to_string(),
                customer_phone: "07700900000".to_string(),
                address: "1 High Street".to_string(),
                city: "London".to_string(),
                postcode: "E1 6AN".to_string(),
                service_id: 1,
                service_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                service_time: "10:00".to_string(),
                frequency: Frequency::OneTime,
                special_instructions: None,
                payment_method: PaymentMethodType::Paypal,
                amount_pence: 6000,
                booking_status: BookingStatus::Confirmed,
                payment_status: PaymentStatus::Pending,
                created_at: NaiveDateTime::default(),
                updated_at: NaiveDateTime::default(),
            },
            service_name: Some("Regular Home Cleaning".to_string()),
            service_description: None,
            service_price_pence: Some(6000),
        }
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            NotificationKind::parse("payment_confirmed"),
            Some(NotificationKind::PaymentConfirmed)
        );
        assert_eq!(NotificationKind::parse("newsletter"), None);
    }

    #[test]
    fn test_confirmation_with_booking_details() {
        let booking = booking();
        let email = compose(
            NotificationKind::BookingConfirmation,
            Some(&booking),
            None,
            &business(),
        );
        assert_eq!(email.subject, "Booking Confirmed - LCB-123456-ABC");
        assert!(email.html.contains("Regular Home Cleaning"));
        assert!(email.html.contains("15/06/2025"));
        assert!(email.html.contains("£60.00"));
        assert!(email.html.contains("Alice &lt;Admin&gt;"));
        assert!(!email.html.contains("<Admin>"));
        assert!(email.html.contains("https://wa.me/447413069737?text="));
        assert_eq!(
            email.text,
            "Your booking has been confirmed! Reference: LCB-123456-ABC"
        );
    }

    #[test]
    fn test_subject_falls_back_to_business_name() {
        let email = compose(NotificationKind::BookingCancelled, None, None, &business());
        assert_eq!(email.subject, "Booking Cancelled - L&C Cleaning Services");
        assert!(email.html.contains("L&amp;C Cleaning Services Ltd"));
    }

    #[test]
    fn test_reminder_without_booking_omits_details() {
        let email = compose(
            NotificationKind::BookingReminder,
            None,
            Some("LCB-000001-XYZ"),
            &business(),
        );
        assert!(!email.html.contains("Service Time"));
        assert!(email.html.contains("LCB-000001-XYZ"));
    }

    #[test]
    fn test_format_pence() {
        assert_eq!(format_pence(6000), "£60.00");
        assert_eq!(format_pence(12345), "£123.45");
        assert_eq!(format_pence(5), "£0.05");
    }
}
