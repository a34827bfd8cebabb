use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Shared admin password. Login is refused with a configuration error when unset.
    pub admin_password: Option<String>,
    /// HMAC key for admin session tokens. A random per-process key is used when unset,
    /// which invalidates every session on restart.
    pub session_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub business_name: String,
    pub business_whatsapp: String,
    pub company_number: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "cleanline.db".to_string()),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            session_secret: non_empty_var("SESSION_SECRET"),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h| *h > 0)
                .unwrap_or(24),
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| {
                "L&C Cleaning Services <noreply@lccleaningservices.co.uk>".to_string()
            }),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| "L&C Cleaning Services".to_string()),
            business_whatsapp: env::var("BUSINESS_WHATSAPP")
                .unwrap_or_else(|_| "+44 7413 069737".to_string()),
            company_number: env::var("COMPANY_NUMBER").unwrap_or_else(|_| "16561686".to_string()),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
