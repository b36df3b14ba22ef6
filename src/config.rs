//! Connection configuration.
//!
//! Every recognized option is an explicit field with a default, replacing
//! any open-ended option-bag style. A [`Config`] is validated once, before
//! any connection attempt, and is immutable afterwards; nickname collision
//! handling mutates only the session's working copy of the nickname.

use crate::error::ConfigError;

/// Configuration for a single IRC server connection.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Server hostname or address.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Desired nickname.
    pub nickname: String,
    /// Alternate nickname used after the first collision.
    pub alternate: String,
    /// Username (ident).
    pub username: String,
    /// Real name / GECOS.
    pub realname: String,
    /// Server password, if required.
    pub password: Option<String>,
    /// Character encoding label for the wire (default `utf-8`).
    pub encoding: String,
    /// Whether outbound lines are rate limited.
    pub flood_protection: bool,
    /// Minimum virtual-clock seconds between rate-limited sends.
    pub flood_protection_send_rate: f64,
    /// Connect with TLS.
    pub ssl: bool,
    /// Verify the server hostname during the TLS handshake.
    pub verify_hostname: bool,
    /// Verify the server certificate chain during the TLS handshake.
    pub verify_certificate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 6667,
            nickname: "ircsession".to_string(),
            alternate: "irc_session".to_string(),
            username: "ircsession".to_string(),
            realname: "ircsession".to_string(),
            password: None,
            encoding: "utf-8".to_string(),
            flood_protection: true,
            flood_protection_send_rate: 1.5,
            ssl: false,
            verify_hostname: false,
            verify_certificate: false,
        }
    }
}

impl Config {
    /// Create a configuration for the given server and port with all
    /// other options at their defaults.
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            ..Self::default()
        }
    }

    /// Check the configuration for invalid or unsupported combinations.
    ///
    /// Called by [`Client::connect`](crate::client::Client::connect) before
    /// opening the socket; a TLS request on a build without TLS support
    /// fails here, never mid-connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::EmptyServer);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.nickname.is_empty() {
            return Err(ConfigError::EmptyNickname);
        }
        if encoding::Encoding::for_label(self.encoding.as_bytes()).is_none() {
            return Err(ConfigError::UnknownEncoding(self.encoding.clone()));
        }
        if !self.flood_protection_send_rate.is_finite() || self.flood_protection_send_rate <= 0.0 {
            return Err(ConfigError::InvalidSendRate(self.flood_protection_send_rate));
        }
        if self.ssl && !cfg!(feature = "tls") {
            return Err(ConfigError::TlsUnavailable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::new("irc.example.net", 6667);
        assert!(config.validate().is_ok());
        assert_eq!(config.encoding, "utf-8");
        assert!(config.flood_protection);
        assert!((config.flood_protection_send_rate - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_empty_server() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyServer)));
    }

    #[test]
    fn test_rejects_zero_port() {
        let config = Config {
            port: 0,
            ..Config::new("irc.example.net", 6667)
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_rejects_unknown_encoding() {
        let config = Config {
            encoding: "no-such-charset".to_string(),
            ..Config::new("irc.example.net", 6667)
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_rejects_bad_send_rate() {
        let config = Config {
            flood_protection_send_rate: 0.0,
            ..Config::new("irc.example.net", 6667)
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSendRate(_))
        ));
    }

    #[cfg(not(feature = "tls"))]
    #[test]
    fn test_ssl_fails_fast_without_tls() {
        let config = Config {
            ssl: true,
            ..Config::new("irc.example.net", 6697)
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TlsUnavailable)
        ));
    }

    #[cfg(feature = "tls")]
    #[test]
    fn test_ssl_accepted_with_tls() {
        let config = Config {
            ssl: true,
            ..Config::new("irc.example.net", 6697)
        };
        assert!(config.validate().is_ok());
    }
}
