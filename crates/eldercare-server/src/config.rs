//! Environment configuration.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use eldercare_core::workflow::{WorkflowSettings, MAX_SESSION_HOURS};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}={value}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub db_path: PathBuf,
    pub session_ttl_hours: i64,
    pub elder_fee: f64,
    pub checkout_base_url: String,
    /// Seeded on startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Read `ELDERCARE_*` variables from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            bind: load(&lookup, "ELDERCARE_BIND", "0.0.0.0:8080")?,
            db_path: load(&lookup, "ELDERCARE_DB_PATH", "eldercare.sqlite")?,
            session_ttl_hours: load(&lookup, "ELDERCARE_SESSION_TTL_HOURS", "24")?,
            elder_fee: load(&lookup, "ELDERCARE_ELDER_FEE", "1500.0")?,
            checkout_base_url: load(
                &lookup,
                "ELDERCARE_CHECKOUT_BASE_URL",
                "http://localhost:8080/mock-checkout",
            )?,
            admin_email: lookup("ELDERCARE_ADMIN_EMAIL"),
            admin_password: lookup("ELDERCARE_ADMIN_PASSWORD"),
        };

        if !(1..=MAX_SESSION_HOURS).contains(&config.session_ttl_hours) {
            return Err(ConfigError::Invalid {
                key: "ELDERCARE_SESSION_TTL_HOURS",
                value: config.session_ttl_hours.to_string(),
                reason: format!("must be between 1 and {MAX_SESSION_HOURS}"),
            });
        }
        if !(config.elder_fee.is_finite() && config.elder_fee > 0.0) {
            return Err(ConfigError::Invalid {
                key: "ELDERCARE_ELDER_FEE",
                value: config.elder_fee.to_string(),
                reason: "must be a positive amount".into(),
            });
        }
        Ok(config)
    }

    /// Log filter for the subscriber, read before the config itself is loaded.
    pub fn log_filter() -> String {
        env::var("ELDERCARE_LOG").unwrap_or_else(|_| "info".to_string())
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            elder_fee: self.elder_fee,
            checkout_base_url: self.checkout_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let loaded = config(&[]).unwrap();
        assert_eq!(loaded.bind, "0.0.0.0:8080");
        assert_eq!(loaded.db_path, PathBuf::from("eldercare.sqlite"));
        assert_eq!(loaded.session_ttl_hours, 24);
        assert_eq!(loaded.elder_fee, 1500.0);
        assert!(loaded.admin_email.is_none());
        assert_eq!(loaded.workflow_settings(), WorkflowSettings::default());
    }

    #[test]
    fn test_overrides_and_errors() {
        let loaded = config(&[
            ("ELDERCARE_SESSION_TTL_HOURS", "2"),
            ("ELDERCARE_CHECKOUT_BASE_URL", "https://pay.example/checkout/"),
            ("ELDERCARE_ADMIN_EMAIL", "root@care.org"),
        ])
        .unwrap();
        assert_eq!(loaded.session_ttl_hours, 2);
        assert_eq!(loaded.workflow_settings().checkout_base_url, "https://pay.example/checkout");
        assert_eq!(loaded.admin_email.as_deref(), Some("root@care.org"));

        assert!(config(&[("ELDERCARE_SESSION_TTL_HOURS", "soon")]).is_err());
        assert!(config(&[("ELDERCARE_SESSION_TTL_HOURS", "0")]).is_err());
        assert!(config(&[("ELDERCARE_ELDER_FEE", "-5")]).is_err());
    }

    #[test]
    fn test_session_ttl_upper_bound() {
        let max = MAX_SESSION_HOURS.to_string();
        assert_eq!(
            config(&[("ELDERCARE_SESSION_TTL_HOURS", &max)]).unwrap().session_ttl_hours,
            MAX_SESSION_HOURS
        );

        let over = (MAX_SESSION_HOURS + 1).to_string();
        for value in [over.as_str(), "3000000000"] {
            let err = config(&[("ELDERCARE_SESSION_TTL_HOURS", value)]).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    key: "ELDERCARE_SESSION_TTL_HOURS",
                    ..
                }
            ));
        }
    }
}
