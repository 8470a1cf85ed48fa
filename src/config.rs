use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub smtp: SmtpConfig,
}

/// SMTP settings for the order-confirmation mail. Leaving `SMTP_HOST` unset
/// disables outbound mail entirely.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let smtp = SmtpConfig {
            host: env::var("SMTP_HOST").ok(),
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "CarShop <no-reply@carshop.example>".to_string()),
        };
        Ok(Self {
            port,
            database_url,
            host,
            smtp,
        })
    }
}
