use crate::query_structures::{MAX_LINES, MIN_LINES};
use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration, read once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Label stamped on every local entry (default: "api")
    pub server_name: String,
    /// Address the HTTP server binds to (default: "0.0.0.0")
    pub bind_address: String,
    /// HTTP port (default: 8080)
    pub port: u16,
    /// Peer instances queried on every request, `host:port` or full base URL
    pub peers: Vec<String>,
    /// Concurrent peer requests per query (default: 3)
    pub worker_count: usize,
    /// Directory requested files are resolved in (default: "/var/log/")
    pub log_dir: PathBuf,
    /// Line count used when `n` is missing (default: 10)
    pub default_lines: usize,
    /// Deadline of a single peer request (default: 10s)
    pub peer_request_timeout: Duration,
    /// Deadline of the whole peer fan-out (default: 15s)
    pub fan_out_timeout: Duration,
    /// Grace period for in-flight requests on shutdown (default: 15s)
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Arguments
    /// * `config_path` - Path to a .env file to load (falls back to the default .env)
    ///
    /// # Environment Variables
    /// * `SERVER_NAME`, `BIND_ADDRESS`, `PORT`
    /// * `PEERS` - Comma separated peer list
    /// * `WORKER_COUNT` - Must be at least 1
    /// * `LOG_DIR`, `DEFAULT_LINES`
    /// * `PEER_REQUEST_TIMEOUT_SECS`, `FAN_OUT_TIMEOUT_SECS`, `SHUTDOWN_TIMEOUT_SECS`
    pub fn load(config_path: &str) -> Result<Self> {
        if std::path::Path::new(config_path).exists() {
            dotenvy::from_filename(config_path)
                .with_context(|| format!("Failed to read config file {config_path}"))?;
        } else if env::var("DEPLOYMENT").unwrap_or_default() != "PROD" {
            // Fallback to default .env if config file doesn't exist
            dotenv().ok();
        }

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            server_name: lookup("SERVER_NAME").unwrap_or_else(|| "api".to_string()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 8080)?,
            peers: parse_peers(&lookup("PEERS").unwrap_or_default()),
            worker_count: parse_var(&lookup, "WORKER_COUNT", 3)?,
            log_dir: PathBuf::from(lookup("LOG_DIR").unwrap_or_else(|| "/var/log/".to_string())),
            default_lines: parse_var(&lookup, "DEFAULT_LINES", 10)?,
            peer_request_timeout: Duration::from_secs(parse_var(&lookup, "PEER_REQUEST_TIMEOUT_SECS", 10)?),
            fan_out_timeout: Duration::from_secs(parse_var(&lookup, "FAN_OUT_TIMEOUT_SECS", 15)?),
            shutdown_timeout: Duration::from_secs(parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", 15)?),
        };

        if config.worker_count == 0 {
            bail!("WORKER_COUNT must be at least 1");
        }
        if !(MIN_LINES..=MAX_LINES).contains(&config.default_lines) {
            bail!("DEFAULT_LINES must be between {MIN_LINES} and {MAX_LINES}");
        }
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        _ => Ok(default),
    }
}

fn parse_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|peer| !peer.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_name, "api");
        assert_eq!(config.port, 8080);
        assert!(config.peers.is_empty());
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/"));
        assert_eq!(config.default_lines, 10);
        assert_eq!(config.peer_request_timeout, Duration::from_secs(10));
        assert_eq!(config.fan_out_timeout, Duration::from_secs(15));
    }

    #[test]
    fn peers_are_split_and_trimmed() {
        let config = config_from(&[("PEERS", " host-a:8080, host-b:8080,,")]).unwrap();
        assert_eq!(config.peers, vec!["host-a:8080", "host-b:8080"]);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("SERVER_NAME", "node-1"),
            ("PORT", "9090"),
            ("WORKER_COUNT", "8"),
            ("DEFAULT_LINES", "100"),
            ("FAN_OUT_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.server_name, "node-1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.default_lines, 100);
        assert_eq!(config.fan_out_timeout, Duration::from_secs(2));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn rejects_empty_worker_pool_and_bad_default_lines() {
        tokio_test::assert_err!(config_from(&[("WORKER_COUNT", "0")]));
        tokio_test::assert_err!(config_from(&[("DEFAULT_LINES", "1001")]));
        tokio_test::assert_ok!(config_from(&[("DEFAULT_LINES", "100")]));
    }
}
