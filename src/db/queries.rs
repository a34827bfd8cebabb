use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::models::{
    ActivityEvent, ActivityKind, Booking, BookingStatus, BookingWithService, ContactMessage,
    Frequency, PaymentMethod, PaymentMethodType, PaymentSettings, PaymentStatus, Service,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Second precision, matching what is stored.
pub fn now_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

// ── Services ──

pub fn list_active_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, short_description, price_pence, is_active
         FROM services WHERE is_active = 1 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: i64) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name, description, short_description, price_pence, is_active
         FROM services WHERE id = ?1",
        params![id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        short_description: row.get(3)?,
        price_pence: row.get(4)?,
        is_active: row.get::<_, i32>(5)? != 0,
    })
}

// ── Payment Methods ──

const PAYMENT_METHOD_COLUMNS: &str =
    "id, name, method_type, description, is_active, settings, created_at, updated_at";

pub fn list_payment_methods(
    conn: &Connection,
    active_only: bool,
) -> anyhow::Result<Vec<PaymentMethod>> {
    let sql = if active_only {
        format!("SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE is_active = 1 ORDER BY name ASC")
    } else {
        format!("SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods ORDER BY name ASC")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_payment_method_row(row)))?;

    let mut methods = vec![];
    for row in rows {
        methods.push(row??);
    }
    Ok(methods)
}

pub fn get_payment_method(conn: &Connection, id: i64) -> anyhow::Result<Option<PaymentMethod>> {
    let result = conn.query_row(
        &format!("SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE id = ?1"),
        params![id],
        |row| Ok(parse_payment_method_row(row)),
    );

    match result {
        Ok(method) => Ok(Some(method?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Active methods whose settings are complete enough to pay with.
pub fn list_available_payment_methods(conn: &Connection) -> anyhow::Result<Vec<PaymentMethod>> {
    let mut methods = list_payment_methods(conn, true)?;
    methods.retain(|m| m.settings.is_configured());
    Ok(methods)
}

pub fn has_available_payment_method(
    conn: &Connection,
    method_type: PaymentMethodType,
) -> anyhow::Result<bool> {
    Ok(list_available_payment_methods(conn)?
        .iter()
        .any(|m| m.settings.method_type() == method_type))
}

/// Flips `is_active`, returning the new value, or `None` for an unknown id.
pub fn toggle_payment_method(conn: &Connection, id: i64) -> anyhow::Result<Option<bool>> {
    let count = conn.execute(
        "UPDATE payment_methods SET is_active = 1 - is_active, updated_at = ?1 WHERE id = ?2",
        params![format_timestamp(&now_timestamp()), id],
    )?;
    if count == 0 {
        return Ok(None);
    }
    let active: i32 = conn.query_row(
        "SELECT is_active FROM payment_methods WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(Some(active != 0))
}

pub fn update_payment_method(conn: &Connection, method: &PaymentMethod) -> anyhow::Result<bool> {
    let settings = serde_json::to_string(&method.settings.to_value())?;
    let count = conn.execute(
        "UPDATE payment_methods SET name = ?1, description = ?2, settings = ?3, updated_at = ?4
         WHERE id = ?5 AND method_type = ?6",
        params![
            method.name,
            method.description,
            settings,
            format_timestamp(&method.updated_at),
            method.id,
            method.settings.method_type().as_str(),
        ],
    )?;
    Ok(count > 0)
}

fn parse_payment_method_row(row: &rusqlite::Row) -> anyhow::Result<PaymentMethod> {
    let method_type_str: String = row.get(2)?;
    let settings_json: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let method_type = PaymentMethodType::parse(&method_type_str)
        .with_context(|| format!("unknown payment method type: {method_type_str}"))?;
    let settings_value: serde_json::Value =
        serde_json::from_str(&settings_json).context("invalid payment method settings json")?;
    let settings = PaymentSettings::from_parts(method_type, settings_value)
        .context("payment method settings do not match its type")?;

    Ok(PaymentMethod {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(3)?,
        is_active: row.get::<_, i32>(4)? != 0,
        settings,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Bookings ──

const BOOKING_SELECT: &str =
    "SELECT b.id, b.reference, b.customer_name, b.customer_email, b.customer_phone, b.address,
            b.city, b.postcode, b.service_id, b.service_date, b.service_time, b.frequency,
            b.special_instructions, b.payment_method, b.amount_pence, b.booking_status,
            b.payment_status, b.created_at, b.updated_at,
            s.name, s.description, s.price_pence
     FROM bookings b LEFT JOIN services s ON s.id = b.service_id";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, reference, customer_name, customer_email, customer_phone, address, city,
                               postcode, service_id, service_date, service_time, frequency, special_instructions,
                               payment_method, amount_pence, booking_status, payment_status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            booking.id,
            booking.reference,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.address,
            booking.city,
            booking.postcode,
            booking.service_id,
            booking.service_date.format(DATE_FORMAT).to_string(),
            booking.service_time,
            booking.frequency.as_str(),
            booking.special_instructions,
            booking.payment_method.as_str(),
            booking.amount_pence,
            booking.booking_status.as_str(),
            booking.payment_status.as_str(),
            format_timestamp(&booking.created_at),
            format_timestamp(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingWithService>> {
    let result = conn.query_row(
        &format!("{BOOKING_SELECT} WHERE b.id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Both arguments must already be normalized (reference uppercased, email lowercased).
pub fn find_booking_for_tracking(
    conn: &Connection,
    reference: &str,
    email: &str,
) -> anyhow::Result<Option<BookingWithService>> {
    let result = conn.query_row(
        &format!("{BOOKING_SELECT} WHERE b.reference = ?1 AND lower(b.customer_email) = ?2"),
        params![reference, email],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub booking_status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
}

pub fn list_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    limit: i64,
) -> anyhow::Result<Vec<BookingWithService>> {
    let mut clauses: Vec<&str> = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(status) = filter.booking_status {
        params_vec.push(Box::new(status.as_str()));
        clauses.push("b.booking_status = ?");
    }
    if let Some(status) = filter.payment_status {
        params_vec.push(Box::new(status.as_str()));
        clauses.push("b.payment_status = ?");
    }
    params_vec.push(Box::new(limit));

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!("{BOOKING_SELECT}{where_sql} ORDER BY b.created_at DESC, b.rowid DESC LIMIT ?");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET booking_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_timestamp(&now_timestamp()), id],
    )?;
    Ok(count > 0)
}

pub fn update_payment_status(
    conn: &Connection,
    id: &str,
    status: PaymentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_timestamp(&now_timestamp()), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<BookingWithService> {
    let service_date_str: String = row.get(9)?;
    let frequency_str: String = row.get(11)?;
    let payment_method_str: String = row.get(13)?;
    let booking_status_str: String = row.get(15)?;
    let payment_status_str: String = row.get(16)?;
    let created_at_str: String = row.get(17)?;
    let updated_at_str: String = row.get(18)?;

    let booking = Booking {
        id: row.get(0)?,
        reference: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        address: row.get(5)?,
        city: row.get(6)?,
        postcode: row.get(7)?,
        service_id: row.get(8)?,
        service_date: NaiveDate::parse_from_str(&service_date_str, DATE_FORMAT)
            .with_context(|| format!("invalid stored service date: {service_date_str}"))?,
        service_time: row.get(10)?,
        frequency: Frequency::parse(&frequency_str)
            .with_context(|| format!("unknown frequency: {frequency_str}"))?,
        special_instructions: row.get(12)?,
        payment_method: PaymentMethodType::parse(&payment_method_str)
            .with_context(|| format!("unknown payment method: {payment_method_str}"))?,
        amount_pence: row.get(14)?,
        booking_status: BookingStatus::parse(&booking_status_str)
            .with_context(|| format!("unknown booking status: {booking_status_str}"))?,
        payment_status: PaymentStatus::parse(&payment_status_str)
            .with_context(|| format!("unknown payment status: {payment_status_str}"))?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    };

    Ok(BookingWithService {
        booking,
        service_name: row.get(19)?,
        service_description: row.get(20)?,
        service_price_pence: row.get(21)?,
    })
}

// ── Contact Messages ──

const MESSAGE_COLUMNS: &str =
    "id, reference, name, email, phone, message, is_read, admin_reply, replied_at, created_at";

pub fn create_contact_message(conn: &Connection, message: &ContactMessage) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO contact_messages (id, reference, name, email, phone, message, is_read, admin_reply, replied_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            message.id,
            message.reference,
            message.name,
            message.email,
            message.phone,
            message.message,
            message.is_read as i32,
            message.admin_reply,
            message.replied_at.as_ref().map(format_timestamp),
            format_timestamp(&message.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_contact_message(conn: &Connection, id: &str) -> anyhow::Result<Option<ContactMessage>> {
    let result = conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE id = ?1"),
        params![id],
        |row| Ok(parse_message_row(row)),
    );

    match result {
        Ok(message) => Ok(Some(message?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Both arguments must already be normalized (reference uppercased, email lowercased).
pub fn find_message_for_tracking(
    conn: &Connection,
    reference: &str,
    email: &str,
) -> anyhow::Result<Option<ContactMessage>> {
    let result = conn.query_row(
        &format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE reference = ?1 AND lower(email) = ?2"
        ),
        params![reference, email],
        |row| Ok(parse_message_row(row)),
    );

    match result {
        Ok(message) => Ok(Some(message?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_contact_messages(
    conn: &Connection,
    is_read: Option<bool>,
    limit: i64,
) -> anyhow::Result<Vec<ContactMessage>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match is_read {
        Some(read) => (
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE is_read = ?1 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            ),
            vec![
                Box::new(read as i32) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM contact_messages \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_message_row(row)))?;

    let mut messages = vec![];
    for row in rows {
        messages.push(row??);
    }
    Ok(messages)
}

pub fn set_message_read(conn: &Connection, id: &str, is_read: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE contact_messages SET is_read = ?1 WHERE id = ?2",
        params![is_read as i32, id],
    )?;
    Ok(count > 0)
}

/// Stores the reply, marks the message read and stamps `replied_at`.
pub fn save_reply(
    conn: &Connection,
    id: &str,
    reply: &str,
    replied_at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE contact_messages SET admin_reply = ?1, replied_at = ?2, is_read = 1 WHERE id = ?3",
        params![reply, format_timestamp(replied_at), id],
    )?;
    Ok(count > 0)
}

fn parse_message_row(row: &rusqlite::Row) -> anyhow::Result<ContactMessage> {
    let replied_at_str: Option<String> = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    Ok(ContactMessage {
        id: row.get(0)?,
        reference: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        message: row.get(5)?,
        is_read: row.get::<_, i32>(6)? != 0,
        admin_reply: row.get(7)?,
        replied_at: replied_at_str.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Dashboard ──

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub pending_bookings: i64,
    pub completed_bookings: i64,
    pub total_messages: i64,
    pub new_messages: i64,
    pub completed_revenue_pence: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let (total_bookings, pending_bookings, completed_bookings, completed_revenue_pence): (
        i64,
        i64,
        i64,
        i64,
    ) = conn
        .query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(booking_status = 'pending'), 0),
                    COALESCE(SUM(booking_status = 'completed'), 0),
                    COALESCE(SUM(CASE WHEN booking_status = 'completed' THEN amount_pence ELSE 0 END), 0)
             FROM bookings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .context("failed to compute booking stats")?;

    let (total_messages, new_messages): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_read = 0), 0) FROM contact_messages",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .context("failed to compute message stats")?;

    Ok(DashboardStats {
        total_bookings,
        pending_bookings,
        completed_bookings,
        total_messages,
        new_messages,
        completed_revenue_pence,
    })
}

// ── Admin Sessions ──

pub fn revoke_session(
    conn: &Connection,
    nonce: &str,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO revoked_sessions (nonce, expires_at) VALUES (?1, ?2)
         ON CONFLICT(nonce) DO NOTHING",
        params![nonce, format_timestamp(expires_at)],
    )?;
    Ok(())
}

pub fn is_session_revoked(conn: &Connection, nonce: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM revoked_sessions WHERE nonce = ?1",
        params![nonce],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Revocations only matter until the token would have expired anyway.
pub fn prune_revoked_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = format_timestamp(&now_timestamp());
    let count = conn.execute(
        "DELETE FROM revoked_sessions WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}

// ── Activity Events ──

pub fn insert_activity_event(
    conn: &Connection,
    kind: ActivityKind,
    subject_id: &str,
    reference: Option<&str>,
    detail: Option<&str>,
) -> anyhow::Result<ActivityEvent> {
    let created_at = format_timestamp(&now_timestamp());
    conn.execute(
        "INSERT INTO activity_events (kind, subject_id, reference, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![kind.as_str(), subject_id, reference, detail, created_at],
    )?;

    Ok(ActivityEvent {
        id: conn.last_insert_rowid(),
        kind: kind.as_str().to_string(),
        subject_id: subject_id.to_string(),
        reference: reference.map(str::to_string),
        detail: detail.map(str::to_string),
        created_at,
    })
}

/// The newest `limit` events after `since_id`, oldest first.
pub fn get_activity_events_since(
    conn: &Connection,
    since_id: i64,
    limit: i64,
) -> anyhow::Result<Vec<ActivityEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, subject_id, reference, detail, created_at FROM (
             SELECT id, kind, subject_id, reference, detail, created_at
             FROM activity_events WHERE id > ?1
             ORDER BY id DESC LIMIT ?2
         ) ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![since_id, limit], |row| {
        Ok(ActivityEvent {
            id: row.get(0)?,
            kind: row.get(1)?,
            subject_id: row.get(2)?,
            reference: row.get(3)?,
            detail: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_activity_catchup_keeps_newest_events() {
        let conn = conn();
        for i in 0..10 {
            insert_activity_event(&conn, ActivityKind::MessageReceived, &format!("m{i}"), None, None)
                .unwrap();
        }

        let events = get_activity_events_since(&conn, 0, 4).unwrap();
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![7, 8, 9, 10]);

        let events = get_activity_events_since(&conn, 8, 4).unwrap();
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 10]);
    }

    #[test]
    fn test_blank_payment_methods_are_unavailable() {
        let conn = conn();
        assert!(list_available_payment_methods(&conn).unwrap().is_empty());
        assert!(!has_available_payment_method(&conn, PaymentMethodType::Paypal).unwrap());

        conn.execute(
            "UPDATE payment_methods SET settings = '{\"paypal_email\":\"pay@example.com\"}'
             WHERE method_type = 'paypal'",
            [],
        )
        .unwrap();
        assert!(has_available_payment_method(&conn, PaymentMethodType::Paypal).unwrap());
        assert!(!has_available_payment_method(&conn, PaymentMethodType::BankTransfer).unwrap());
    }
}
