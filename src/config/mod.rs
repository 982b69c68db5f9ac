use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

use crate::optimizer::Template;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub template_path: Option<String>,

    /// Extraction template, loaded from `template_path` or defaulted
    #[serde(skip)]
    pub template: Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Database URL for storage-backed commands
    pub fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL environment variable is required but not set"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// IANA zone the newsletter desk works in
    pub timezone: String,
}

impl SessionConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid SESSION_TIMEZONE '{}': {}", self.timezone, e))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenv::dotenv().ok();

        let template_path = env::var("NEWSLETTER_TEMPLATE_PATH").ok();
        let template = match &template_path {
            Some(path) => Template::load(path)
                .with_context(|| format!("Failed to load extraction template from {}", path))?,
            None => Template::default(),
        };

        let config = Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("Invalid DB_MAX_CONNECTIONS value")?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .context("Invalid DB_MIN_CONNECTIONS value")?,
            },
            session: SessionConfig {
                timezone: env::var("SESSION_TIMEZONE")
                    .unwrap_or_else(|_| "America/New_York".to_string()),
            },
            template_path,
            template,
        };

        // fail early on a bad zone rather than at the first run
        config.session.tz()?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                min_connections: 1,
            },
            session: SessionConfig {
                timezone: "America/New_York".to_string(),
            },
            template_path: None,
            template: Template::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timezone_parses() {
        let config = Config::default();
        assert_eq!(config.session.tz().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let session = SessionConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
        };
        assert!(session.tz().is_err());
    }

    #[test]
    fn test_require_url_mentions_variable() {
        let err = Config::default().database.require_url().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
