//! Service configuration

use booking_engine::EngineConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub database_max_connections: u32,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    /// HMAC key for reservation management links
    pub reservation_secret_key: String,
    pub stripe_secret_key: String,
    /// Bearer token expected by the reminder cron endpoint
    pub cron_secret: String,
    /// Prefix of management links sent to guests
    pub public_base_url: String,
    /// Sender address for guest emails
    pub mail_from: String,
    pub capacity_threshold: i32,
    /// Daily-rolling log files go here when set
    pub log_dir: Option<String>,
}

impl Config {
    /// Must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            database_max_connections: Self::parsed("DATABASE_MAX_CONNECTIONS", 5),
            http_port: Self::parsed("HTTP_PORT", 8080),
            reservation_secret_key: Self::require_secret("RESERVATION_SECRET_KEY", &environment)?,
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            cron_secret: Self::require_secret("CRON_SECRET", &environment)?,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            mail_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "reservations@localhost".into()),
            capacity_threshold: Self::parsed("CAPACITY_THRESHOLD", booking_engine::capacity::DEFAULT_THRESHOLD),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Engine knobs derived from the environment
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            capacity_threshold: self.capacity_threshold.max(0),
            public_base_url: self.public_base_url.clone(),
            ..EngineConfig::default()
        }
    }
}
