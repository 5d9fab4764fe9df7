//! Configuration for the chat TCP server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `CHAT_BIND_ADDR`      (default: "0.0.0.0")
//! - `CHAT_PORT`           (default: "5000")
//! - `CHAT_MAX_CLIENTS`    (default: "1024")
//! - `CHAT_MAX_LINE_BYTES` (default: "65536")
//! - `CHAT_JWT_SECRET`     (unset: trust claimed identities)

use std::env;
use std::str::FromStr;

use anyhow::Context;
use chat_core::IdentityPolicy;
use chat_protocol::DEFAULT_MAX_LINE_BYTES;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Longest accepted line, newline excluded.
    pub max_line_bytes: usize,

    /// HS256 secret shared with the auth service. When set, clients must
    /// authenticate before they can join or send.
    pub jwt_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            max_clients: 1024,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            jwt_secret: None,
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults above.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let bind_addr = env::var("CHAT_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = read_env_or_default("CHAT_PORT", defaults.port)?;
        let max_clients = read_env_or_default("CHAT_MAX_CLIENTS", defaults.max_clients)?;
        let max_line_bytes = read_env_or_default("CHAT_MAX_LINE_BYTES", defaults.max_line_bytes)?;
        let jwt_secret = env::var("CHAT_JWT_SECRET").ok().filter(|s| !s.is_empty());

        Ok(Config {
            bind_addr,
            port,
            max_clients,
            max_line_bytes,
            jwt_secret,
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn identity_policy(&self) -> IdentityPolicy {
        if self.jwt_secret.is_some() {
            IdentityPolicy::RequireVerified
        } else {
            IdentityPolicy::TrustClaimed
        }
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, val)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.socket_addr_string(), "0.0.0.0:5000");
        assert_eq!(config.identity_policy(), IdentityPolicy::TrustClaimed);
    }

    #[test]
    fn secret_enables_verification() {
        let config = Config {
            jwt_secret: Some("s3cret".to_string()),
            ..Config::default()
        };
        assert_eq!(config.identity_policy(), IdentityPolicy::RequireVerified);
    }

    #[test]
    fn unparsable_value_is_an_error() {
        // Unique key so parallel tests never race on it.
        env::set_var("CHAT_TEST_BAD_PORT", "fivethousand");
        let res = read_env_or_default::<u16>("CHAT_TEST_BAD_PORT", 1);
        env::remove_var("CHAT_TEST_BAD_PORT");

        let err = res.unwrap_err();
        assert!(err.to_string().contains("CHAT_TEST_BAD_PORT"));
    }

    #[test]
    fn missing_value_uses_default() {
        let port = read_env_or_default::<u16>("CHAT_TEST_UNSET_PORT", 4242).unwrap();
        assert_eq!(port, 4242);
    }
}
