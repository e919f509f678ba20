//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration, built from `SUPPORT_INTAKE_*` environment variables.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// libSQL database file holding the snapshots.
    pub db_path: PathBuf,
    /// Snapshot namespace inside the database.
    pub namespace: String,
    /// HTTP listen port.
    pub port: u16,
    /// Registration endpoint. Submissions are simulated when unset.
    pub submit_url: Option<String>,
    /// Delay used by the simulated registration service.
    pub simulated_submit_delay: Duration,
    /// Timeout for outbound registration requests.
    pub submit_timeout: Duration,
    /// Directory for daily-rolling log files. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/support-intake.db"),
            namespace: "default".to_string(),
            port: 8080,
            submit_url: None,
            simulated_submit_delay: Duration::from_secs(1),
            submit_timeout: Duration::from_secs(30),
            log_dir: None,
        }
    }
}

/// Parse `key` if set. Unset or empty means `None`; unparseable is an error.
fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

fn string_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl IntakeConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = string_var("SUPPORT_INTAKE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let namespace = string_var("SUPPORT_INTAKE_NAMESPACE").unwrap_or(defaults.namespace);
        let port = parse_var("SUPPORT_INTAKE_PORT")?.unwrap_or(defaults.port);
        let submit_url = string_var("SUPPORT_INTAKE_SUBMIT_URL");
        let simulated_submit_delay = parse_var("SUPPORT_INTAKE_SUBMIT_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.simulated_submit_delay);
        let submit_timeout = parse_var("SUPPORT_INTAKE_SUBMIT_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.submit_timeout);
        let log_dir = string_var("SUPPORT_INTAKE_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            db_path,
            namespace,
            port,
            submit_url,
            simulated_submit_delay,
            submit_timeout,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IntakeConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.namespace, "default");
        assert!(config.submit_url.is_none());
        assert_eq!(config.simulated_submit_delay, Duration::from_secs(1));
    }

    #[test]
    fn parse_var_unset_is_none() {
        let value: Option<u16> = parse_var("SUPPORT_INTAKE_TEST_NEVER_SET").unwrap();
        assert!(value.is_none());
    }
}
