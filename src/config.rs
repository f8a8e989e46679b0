//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   server runs on the in-memory store and loses all data on exit.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DEFAULT_PAGE_SIZE` / `MAX_PAGE_SIZE` (optional): list pagination, 10 / 100
/// - `BOOTSTRAP_API_KEY` (optional): registers a user for this key at startup
/// - `BOOTSTRAP_USER_NAME` (optional): display name of that user, defaults to "owner"
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    pub bootstrap_api_key: Option<String>,

    #[serde(default = "default_bootstrap_user_name")]
    pub bootstrap_user_name: String,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

fn default_bootstrap_user_name() -> String {
    "owner".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into
    /// expected types.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Pagination limits handed to the list handlers.
    pub fn pagination(&self) -> PaginationConfig {
        PaginationConfig {
            default_page_size: self.default_page_size.clamp(1, self.max_page_size.max(1)),
            max_page_size: self.max_page_size.max(1),
        }
    }
}

/// Page size limits applied to every paginated listing.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_variables_are_missing() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.bootstrap_user_name, "owner");
    }

    #[test]
    fn variables_override_defaults() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/finance".to_string()),
            ("SERVER_PORT".to_string(), "8080".to_string()),
            ("MAX_PAGE_SIZE".to_string(), "50".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/finance"));
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.pagination().max_page_size, 50);
    }

    #[test]
    fn default_page_size_never_exceeds_maximum() {
        let vars = vec![
            ("DEFAULT_PAGE_SIZE".to_string(), "500".to_string()),
            ("MAX_PAGE_SIZE".to_string(), "20".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.pagination().default_page_size, 20);
    }
}
