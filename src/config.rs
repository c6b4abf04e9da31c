use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    pub business_name: String,
    /// Number customers are told to call when a booking is too close to cancel.
    pub business_phone: String,
    /// IANA name, e.g. `America/Toronto`.
    pub business_timezone: String,
    pub review_link: String,
    pub max_booking_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "barberbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER").unwrap_or_default(),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| "Rozer's Barber Station".to_string()),
            business_phone: env::var("BUSINESS_PHONE").unwrap_or_default(),
            business_timezone: env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| "America/Toronto".to_string()),
            review_link: env::var("REVIEW_LINK").unwrap_or_default(),
            max_booking_minutes: env::var("MAX_BOOKING_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}
