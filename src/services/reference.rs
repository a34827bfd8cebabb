use chrono::Utc;
use rand::Rng;

pub const BOOKING_PREFIX: &str = "LCB";
pub const MESSAGE_PREFIX: &str = "LCM";

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 3;
const STAMP_DIGITS: usize = 6;

/// Human-shareable reference: `<prefix>-<last 6 digits of unix millis>-<3 random [0-9A-Z]>`.
/// Not unique by construction; callers rely on the UNIQUE column and retry.
pub fn generate(prefix: &str) -> String {
    generate_at(prefix, Utc::now().timestamp_millis())
}

fn generate_at(prefix: &str, unix_millis: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{:06}-{suffix}", unix_millis.rem_euclid(1_000_000))
}

const MAX_INSERT_ATTEMPTS: usize = 5;

/// Runs `insert` with freshly generated references until one does not collide
/// with an existing row. Returns the reference that was stored.
pub fn insert_with_unique<F>(prefix: &str, mut insert: F) -> anyhow::Result<String>
where
    F: FnMut(&str) -> anyhow::Result<()>,
{
    let mut attempt = 1;
    loop {
        let reference = generate(prefix);
        match insert(&reference) {
            Ok(()) => return Ok(reference),
            Err(e) if attempt < MAX_INSERT_ATTEMPTS && is_unique_violation(&e) => {
                tracing::warn!(reference = %reference, attempt, "reference collision, regenerating");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub fn normalize(reference: &str) -> String {
    reference.trim().to_uppercase()
}

pub fn is_well_formed(prefix: &str, reference: &str) -> bool {
    let Some(rest) = reference
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };
    let Some((stamp, suffix)) = rest.split_once('-') else {
        return false;
    };

    stamp.len() == STAMP_DIGITS
        && stamp.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_references_are_well_formed() {
        for _ in 0..200 {
            let booking = generate(BOOKING_PREFIX);
            assert!(is_well_formed(BOOKING_PREFIX, &booking), "{booking}");
            let message = generate(MESSAGE_PREFIX);
            assert!(is_well_formed(MESSAGE_PREFIX, &message), "{message}");
        }
    }

    #[test]
    fn test_stamp_uses_last_six_digits() {
        let reference = generate_at(BOOKING_PREFIX, 1_718_000_123_456);
        assert!(reference.starts_with("LCB-123456-"));

        let padded = generate_at(MESSAGE_PREFIX, 1_000_000_000_042);
        assert!(padded.starts_with("LCM-000042-"));
    }

    #[test]
    fn test_insert_retries_on_collision() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE refs (reference TEXT NOT NULL UNIQUE);
             INSERT INTO refs (reference) VALUES ('fixed');",
        )
        .unwrap();

        let mut calls = 0;
        let result = insert_with_unique(BOOKING_PREFIX, |reference| {
            calls += 1;
            let value = if calls == 1 { "fixed" } else { reference };
            conn.execute("INSERT INTO refs (reference) VALUES (?1)", [value])?;
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_insert_gives_up_after_repeated_collisions() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE refs (reference TEXT NOT NULL UNIQUE);
             INSERT INTO refs (reference) VALUES ('fixed');",
        )
        .unwrap();

        let mut calls = 0;
        let result = insert_with_unique(BOOKING_PREFIX, |_| {
            calls += 1;
            conn.execute("INSERT INTO refs (reference) VALUES ('fixed')", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(calls, MAX_INSERT_ATTEMPTS);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  lcb-123456-ab1 "), "LCB-123456-AB1");
    }

    #[test]
    fn test_malformed_references() {
        assert!(!is_well_formed(BOOKING_PREFIX, "LCM-123456-ABC"));
        assert!(!is_well_formed(BOOKING_PREFIX, "LCB-12345-ABC"));
        assert!(!is_well_formed(BOOKING_PREFIX, "LCB-123456-AB"));
        assert!(!is_well_formed(BOOKING_PREFIX, "LCB-123456-abc"));
        assert!(!is_well_formed(BOOKING_PREFIX, "LCB123456ABC"));
        assert!(is_well_formed(BOOKING_PREFIX, "LCB-123456-A1Z"));
    }
}
