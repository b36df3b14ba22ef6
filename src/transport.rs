//! Framed connection transport: plain TCP or client-side TLS.
//!
//! The transport owns the socket, wraps it in a [`LineCodec`]-framed
//! stream, and exposes a single blocking read and write surface to the
//! driver. TLS is behind the `tls` cargo feature; requesting it on a
//! build without the feature is rejected at configuration time, before
//! any connection attempt.

use anyhow::Result;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use futures_util::{SinkExt, StreamExt};

use crate::config::Config;
use crate::error::{ProtocolError, SessionError};
use crate::line::LineCodec;

#[cfg(feature = "tls")]
use tokio_rustls::client::TlsStream;

/// A connected, framed IRC transport.
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    /// Plain TCP.
    Tcp {
        framed: Framed<TcpStream, LineCodec>,
    },
    /// TLS over TCP.
    #[cfg(feature = "tls")]
    Tls {
        framed: Framed<TlsStream<TcpStream>, LineCodec>,
    },
}

impl Transport {
    /// Open the socket described by `config`, enable keepalive, and
    /// wrap it in the line codec (TLS-wrapped when `config.ssl` is set).
    pub async fn connect(config: &Config) -> Result<Self, SessionError> {
        let stream = TcpStream::connect((config.server.as_str(), config.port)).await?;
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        let codec = LineCodec::new(&config.encoding)
            .ok_or_else(|| crate::error::ConfigError::UnknownEncoding(config.encoding.clone()))
            .map_err(SessionError::Config)?;

        if config.ssl {
            #[cfg(feature = "tls")]
            {
                let stream = tls::wrap(stream, config).await?;
                debug!(server = %config.server, port = config.port, "tls transport established");
                return Ok(Self::Tls {
                    framed: Framed::new(stream, codec),
                });
            }
            #[cfg(not(feature = "tls"))]
            {
                return Err(SessionError::Config(
                    crate::error::ConfigError::TlsUnavailable,
                ));
            }
        }

        debug!(server = %config.server, port = config.port, "tcp transport established");
        Ok(Self::Tcp {
            framed: Framed::new(stream, codec),
        })
    }

    /// Whether the connection is TLS-wrapped.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        #[cfg(feature = "tls")]
        {
            matches!(self, Self::Tls { .. })
        }
        #[cfg(not(feature = "tls"))]
        {
            false
        }
    }

    /// Read the next complete line. `None` means the peer closed the
    /// connection cleanly.
    pub async fn read_line(&mut self) -> Option<Result<String, ProtocolError>> {
        match self {
            Transport::Tcp { framed } => framed.next().await,
            #[cfg(feature = "tls")]
            Transport::Tls { framed } => framed.next().await,
        }
    }

    /// Write one line (terminator appended by the codec).
    pub async fn write_line(&mut self, line: String) -> Result<()> {
        match self {
            Transport::Tcp { framed } => framed.send(line).await.map_err(|e| anyhow::anyhow!(e)),
            #[cfg(feature = "tls")]
            Transport::Tls { framed } => framed.send(line).await.map_err(|e| anyhow::anyhow!(e)),
        }
    }
}

fn enable_keepalive(stream: &TcpStream) -> Result<()> {
    use socket2::{SockRef, TcpKeepalive};
    use std::time::Duration;

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)?;
    Ok(())
}

#[cfg(feature = "tls")]
mod tls {
    //! rustls client setup.
    //!
    //! The configuration's verification flags map onto verifier
    //! selection: full webpki verification against the platform trust
    //! store only when both `verify_certificate` and `verify_hostname`
    //! are set; otherwise an accept-all verifier, since rustls performs
    //! hostname checking inside certificate verification and the two
    //! cannot be disabled independently.

    use std::sync::Arc;

    use tokio::net::TcpStream;
    use tokio_rustls::client::TlsStream;
    use tokio_rustls::rustls::client::danger::{
        HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
    };
    use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use tokio_rustls::rustls::{self, ClientConfig, DigitallySignedStruct, RootCertStore};
    use tokio_rustls::TlsConnector;
    use tracing::warn;

    use crate::config::Config;
    use crate::error::SessionError;

    pub async fn wrap(stream: TcpStream, config: &Config) -> Result<TlsStream<TcpStream>, SessionError> {
        let client_config = if config.verify_certificate && config.verify_hostname {
            let mut roots = RootCertStore::empty();
            let loaded = rustls_native_certs::load_native_certs();
            for error in &loaded.errors {
                warn!("skipping unreadable platform certificate: {}", error);
            }
            for cert in loaded.certs {
                if let Err(e) = roots.add(cert) {
                    warn!("skipping invalid platform certificate: {}", e);
                }
            }
            ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth()
        } else {
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
                .with_no_client_auth()
        };

        let connector = TlsConnector::from(Arc::new(client_config));
        let server_name = ServerName::try_from(config.server.clone())
            .map_err(|e| SessionError::Tls(format!("invalid server name: {}", e)))?;

        connector
            .connect(server_name, stream)
            .await
            .map_err(|e| SessionError::Tls(e.to_string()))
    }

    /// Verifier used when certificate or hostname verification is
    /// switched off in the configuration.
    #[derive(Debug)]
    struct AcceptAnyCertificate;

    impl ServerCertVerifier for AcceptAnyCertificate {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
            use rustls::SignatureScheme::*;
            vec![
                RSA_PKCS1_SHA256,
                RSA_PKCS1_SHA384,
                RSA_PKCS1_SHA512,
                ECDSA_NISTP256_SHA256,
                ECDSA_NISTP384_SHA384,
                ECDSA_NISTP521_SHA512,
                RSA_PSS_SHA256,
                RSA_PSS_SHA384,
                RSA_PSS_SHA512,
                ED25519,
            ]
        }
    }
}
