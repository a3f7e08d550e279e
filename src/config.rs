use std::env;
use std::fmt;

use anyhow::{Context, Result};

/// Default bind address for `homepage serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default port for `homepage serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Central configuration loaded from environment variables.
///
/// Built once at startup and shared read-only through `AppState`. The .env
/// file is loaded automatically at startup via dotenvy.
#[derive(Clone)]
pub struct Config {
    /// Shared dashboard password (HOMEPAGE_PASSWORD). Empty disables auth.
    pub password: String,
    /// True when HOMEPAGE_ENV=production; marks the session cookie Secure.
    pub production: bool,
    pub bind: String,
    pub port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("password", &"[REDACTED]")
            .field("production", &self.production)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Build a config directly, with the default bind address and port.
    pub fn new(password: impl Into<String>, production: bool) -> Self {
        Self {
            password: password.into(),
            production,
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Everything has a default; only a malformed HOMEPAGE_PORT is an error.
    pub fn load() -> Result<Self> {
        let port = match env::var("HOMEPAGE_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("HOMEPAGE_PORT is not a valid port: {raw:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            password: env::var("HOMEPAGE_PASSWORD").unwrap_or_default(),
            production: is_production(env::var("HOMEPAGE_ENV").ok().as_deref()),
            bind: env::var("HOMEPAGE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            port,
        })
    }

    /// Whether a password is configured at all.
    pub fn auth_enabled(&self) -> bool {
        !self.password.is_empty()
    }
}

fn is_production(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v.trim().eq_ignore_ascii_case("production"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::new("hunter2", false);
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_auth_enabled_tracks_password() {
        assert!(Config::new("secret", false).auth_enabled());
        assert!(!Config::new("", false).auth_enabled());
    }

    #[test]
    fn test_production_flag_parsing() {
        assert!(is_production(Some("production")));
        assert!(is_production(Some("Production ")));
        assert!(!is_production(Some("development")));
        assert!(!is_production(None));
    }
}
