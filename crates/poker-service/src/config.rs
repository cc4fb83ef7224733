//! Poker service configuration.
//!
//! Configuration is loaded from environment variables. Nothing here is
//! sensitive, so `Debug` prints every field.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP + WebSocket bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default WebSocket route.
pub const DEFAULT_SOCKET_PATH: &str = "/api/socket";

/// Default registry capacity.
pub const DEFAULT_MAX_ROOMS: usize = 10_000;

/// Default outbound mailbox size per connection.
pub const DEFAULT_CONNECTION_BUFFER: usize = 256;

/// Default time to wait for actors to stop on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 10;

/// Routes served next to the socket; the socket path may not shadow them.
const RESERVED_PATHS: &[&str] = &["/health", "/ready", "/metrics", "/api/rooms"];

/// Default instance ID prefix.
pub const DEFAULT_INSTANCE_ID_PREFIX: &str = "poker";

/// Poker service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP + WebSocket bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Route the WebSocket upgrade is served on (default: "/api/socket").
    pub socket_path: String,

    /// Unique identifier for this instance, used in logs.
    pub instance_id: String,

    /// Maximum number of live rooms. Joins that would create a room beyond
    /// this are dropped.
    pub max_rooms: usize,

    /// Outbound mailbox size per connection. Events to a full mailbox are
    /// dropped.
    pub connection_buffer: usize,

    /// How long shutdown waits for the actor tree.
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is present but
    /// unparsable or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is present but
    /// unparsable or out of range.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("POKER_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let socket_path = vars
            .get("POKER_SOCKET_PATH")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string());
        if !socket_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "POKER_SOCKET_PATH must start with '/', got '{socket_path}'"
            )));
        }
        if socket_path.contains([':', '*'])
            || socket_path.starts_with("/api/rooms/")
            || RESERVED_PATHS.contains(&socket_path.as_str())
        {
            return Err(ConfigError::InvalidValue(format!(
                "POKER_SOCKET_PATH '{socket_path}' conflicts with a built-in route"
            )));
        }

        let max_rooms = parse_positive(vars, "POKER_MAX_ROOMS", DEFAULT_MAX_ROOMS)?;
        let connection_buffer =
            parse_positive(vars, "POKER_CONNECTION_BUFFER", DEFAULT_CONNECTION_BUFFER)?;
        let shutdown_grace_seconds = parse_or_default(
            vars,
            "POKER_SHUTDOWN_GRACE_SECONDS",
            DEFAULT_SHUTDOWN_GRACE_SECONDS,
        )?;

        let instance_id = vars.get("POKER_INSTANCE_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_INSTANCE_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            bind_address,
            socket_path,
            instance_id,
            max_rooms,
            connection_buffer,
            shutdown_grace_seconds,
        })
    }

    /// Shutdown grace period as a `Duration`.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

fn parse_or_default<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{key} is not a valid number: '{raw}'"))),
    }
}

fn parse_positive(
    vars: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let value = parse_or_default(vars, key, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{key} must be greater than zero"
        )));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = HashMap::new();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.socket_path, DEFAULT_SOCKET_PATH);
        assert_eq!(config.max_rooms, DEFAULT_MAX_ROOMS);
        assert_eq!(config.connection_buffer, DEFAULT_CONNECTION_BUFFER);
        assert_eq!(config.shutdown_grace_seconds, DEFAULT_SHUTDOWN_GRACE_SECONDS);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));
        // Instance ID should be auto-generated
        assert!(config.instance_id.starts_with("poker-"));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            (
                "POKER_BIND_ADDRESS".to_string(),
                "127.0.0.1:4000".to_string(),
            ),
            ("POKER_SOCKET_PATH".to_string(), "/ws".to_string()),
            ("POKER_INSTANCE_ID".to_string(), "poker-test-001".to_string()),
            ("POKER_MAX_ROOMS".to_string(), "50".to_string()),
            ("POKER_CONNECTION_BUFFER".to_string(), "8".to_string()),
            ("POKER_SHUTDOWN_GRACE_SECONDS".to_string(), "0".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:4000");
        assert_eq!(config.socket_path, "/ws");
        assert_eq!(config.instance_id, "poker-test-001");
        assert_eq!(config.max_rooms, 50);
        assert_eq!(config.connection_buffer, 8);
        assert_eq!(config.shutdown_grace_seconds, 0);
    }

    #[test]
    fn test_from_vars_rejects_unparsable_number() {
        let vars = HashMap::from([("POKER_MAX_ROOMS".to_string(), "lots".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("POKER_MAX_ROOMS")));
    }

    #[test]
    fn test_from_vars_rejects_zero_capacity() {
        let vars = HashMap::from([("POKER_CONNECTION_BUFFER".to_string(), "0".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("POKER_CONNECTION_BUFFER"))
        );
    }

    #[test]
    fn test_from_vars_rejects_relative_socket_path() {
        let vars = HashMap::from([("POKER_SOCKET_PATH".to_string(), "api/socket".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_from_vars_rejects_socket_path_shadowing_routes() {
        for path in ["/health", "/api/rooms", "/api/rooms/abc", "/ws/:id"] {
            let vars = HashMap::from([("POKER_SOCKET_PATH".to_string(), path.to_string())]);
            let result = Config::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(_))),
                "{path} should be rejected"
            );
        }
    }
}
