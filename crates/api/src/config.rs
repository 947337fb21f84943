//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; in-memory store if unset
/// - `ADMIN_EMAIL` — recipient of new-order alerts
/// - `CASHIERS` — comma-separated user ids allowed to update order status
/// - `STOREKEEPERS` — comma-separated user ids allowed to adjust stock
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub admin_email: String,
    pub cashiers: Vec<String>,
    pub storekeepers: Vec<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@supermart.example".to_string()),
            cashiers: std::env::var("CASHIERS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            storekeepers: std::env::var("STOREKEEPERS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            admin_email: "admin@supermart.example".to_string(),
            cashiers: Vec::new(),
            storekeepers: Vec::new(),
        }
    }
}
