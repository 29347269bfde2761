use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while reading the process configuration or the object catalog.
/// All of them are fatal at startup: the exporter cannot run without a catalog.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("object `{0}` is declared more than once")]
    DuplicateObject(String),
    #[error("object #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

pub const DEFAULT_ENDPOINT: &str = "http://localhost:7125";
pub const DEFAULT_CATALOG_PATH: &str = "objects.yaml";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9101";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Process-wide settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Moonraker base URL, without trailing slash.
    pub endpoint: String,
    /// Value of the `printer` label on every per-object metric.
    pub printer: String,
    pub catalog_path: PathBuf,
    pub listen_addr: SocketAddr,
    /// Timeout applied to each upstream request.
    pub timeout: Duration,
    /// Reload the catalog on every collection cycle instead of caching it.
    pub catalog_reload: bool,
    pub log_level: String,
}

impl ExporterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let endpoint = get("MOONRAKER_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        let listen_raw = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Env {
            var: "LISTEN_ADDR",
            reason: format!("{listen_raw}: {e}"),
        })?;

        let timeout_secs = match get("MOONRAKER_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Env {
                        var: "MOONRAKER_TIMEOUT_SECS",
                        reason: "timeout must be greater than zero".into(),
                    })
                }
                Ok(secs) => secs,
                Err(e) => {
                    return Err(ConfigError::Env {
                        var: "MOONRAKER_TIMEOUT_SECS",
                        reason: format!("{raw}: {e}"),
                    })
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let catalog_reload = match get("CATALOG_RELOAD") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Env {
                var: "CATALOG_RELOAD",
                reason: format!("expected true/false, got `{raw}`"),
            })?,
            None => false,
        };

        Ok(Self {
            endpoint,
            // the original exporter labels with an empty printer when unset
            printer: lookup("PRINTER_NAME").unwrap_or_default(),
            catalog_path: get("MOONRAKER_OBJECTS_CONFIG")
                .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string())
                .into(),
            listen_addr,
            timeout: Duration::from_secs(timeout_secs),
            catalog_reload,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ExporterConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.printer, "");
        assert_eq!(cfg.catalog_path, PathBuf::from("objects.yaml"));
        assert_eq!(cfg.listen_addr.port(), 9101);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert!(!cfg.catalog_reload);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let cfg = ExporterConfig::from_lookup(lookup(&[
            ("MOONRAKER_ENDPOINT", "http://voron.local:7125/"),
            ("PRINTER_NAME", "voron"),
            ("MOONRAKER_OBJECTS_CONFIG", "/etc/moonraker/objects.yaml"),
            ("LISTEN_ADDR", "127.0.0.1:9200"),
            ("MOONRAKER_TIMEOUT_SECS", "2"),
            ("CATALOG_RELOAD", "yes"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(cfg.endpoint, "http://voron.local:7125");
        assert_eq!(cfg.printer, "voron");
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:9200");
        assert_eq!(cfg.timeout, Duration::from_secs(2));
        assert!(cfg.catalog_reload);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_invalid_values() {
        let err = ExporterConfig::from_lookup(lookup(&[("LISTEN_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "LISTEN_ADDR", .. }));

        let err = ExporterConfig::from_lookup(lookup(&[("MOONRAKER_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "MOONRAKER_TIMEOUT_SECS", .. }));

        let err = ExporterConfig::from_lookup(lookup(&[("CATALOG_RELOAD", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "CATALOG_RELOAD", .. }));
    }
}
