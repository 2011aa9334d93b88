use std::env;

use crate::pipeline::yield_columns;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Survey column averaged per site visit
    pub yield_value_column: String,
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            yield_value_column: yield_columns::DEFAULT_YIELD_VALUE.to_string(),
            max_upload_mb: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            yield_value_column: env::var("YIELD_VALUE_COLUMN")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.yield_value_column),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_mb),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
