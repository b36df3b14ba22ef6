//! Error types for the IRC session engine.
//!
//! This module defines error types for configuration validation,
//! protocol-level transport failures, and connection setup.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised by [`Config::validate`](crate::config::Config::validate)
/// before any connection attempt is made.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// TLS was requested but the crate was built without the `tls` feature.
    #[error("ssl requested but this build has no TLS support (enable the `tls` feature)")]
    TlsUnavailable,

    /// The encoding label is not recognized by the encoding backend.
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// Server host is empty.
    #[error("server host must not be empty")]
    EmptyServer,

    /// Port is zero.
    #[error("port must be nonzero")]
    InvalidPort,

    /// Nickname is empty.
    #[error("nickname must not be empty")]
    EmptyNickname,

    /// Flood send rate is not a positive, finite number of seconds.
    #[error("flood_protection_send_rate must be positive and finite: {0}")]
    InvalidSendRate(f64),
}

/// Transport-level protocol errors.
///
/// Any of these is terminal for the connection: the engine closes the
/// socket, stops both timers, and emits a single disconnection event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent more bytes than the maximum line length without
    /// a line terminator.
    #[error("line too long: {0} bytes")]
    LineTooLong(usize),
}

/// Errors surfaced by [`Client::connect`](crate::client::Client::connect).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Invalid or unsupported configuration, rejected before connecting.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The connection failed at the transport level.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// TLS client setup failed (certificate store or handshake).
    #[error("tls setup failed: {0}")]
    Tls(String),

    /// The session has already been stopped.
    #[error("session is no longer running")]
    Stopped,
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::Protocol(ProtocolError::Io(err))
    }
}
