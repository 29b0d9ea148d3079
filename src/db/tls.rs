#[cfg(feature = "tls")]
use std::fs::File;
#[cfg(feature = "tls")]
use std::io::BufReader;
#[cfg(feature = "tls")]
use std::path::Path;
#[cfg(feature = "tls")]
use std::sync::Arc;

#[cfg(feature = "tls")]
use rustls::{ClientConfig, RootCertStore};
#[cfg(feature = "tls")]
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::error::{MigenError, Result};
use tokio_postgres::{Client, NoTls};
use tracing::error;
#[cfg(feature = "tls")]
use tracing::debug;

/// TLS mode for PostgreSQL connections, mirroring libpq's `sslmode`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TlsMode {
    #[default]
    Disable,
    /// Try TLS first, fall back to an unencrypted connection
    #[cfg(feature = "tls")]
    Prefer,
    /// Encrypt without verifying the server certificate
    #[cfg(feature = "tls")]
    Require,
    #[cfg(feature = "tls")]
    VerifyCa,
    /// Verify the CA and that the hostname matches the certificate
    #[cfg(feature = "tls")]
    VerifyFull,
}

impl TlsMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "disable" => Ok(TlsMode::Disable),
            #[cfg(feature = "tls")]
            "prefer" => Ok(TlsMode::Prefer),
            #[cfg(feature = "tls")]
            "require" => Ok(TlsMode::Require),
            #[cfg(feature = "tls")]
            "verify-ca" => Ok(TlsMode::VerifyCa),
            #[cfg(feature = "tls")]
            "verify-full" => Ok(TlsMode::VerifyFull),
            #[cfg(not(feature = "tls"))]
            mode @ ("prefer" | "require" | "verify-ca" | "verify-full") => {
                Err(MigenError::Configuration(format!(
                    "sslmode '{}' requires migen to be built with the 'tls' feature",
                    mode
                )))
            }
            _ => Err(MigenError::Configuration(format!("Invalid sslmode: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub mode: TlsMode,
    pub root_cert: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
}

#[cfg(feature = "tls")]
fn tls_error(message: impl std::fmt::Display) -> MigenError {
    MigenError::Configuration(format!("TLS setup failed: {}", message))
}

#[cfg(feature = "tls")]
fn load_certs(path: &Path) -> Result<Vec<rustls::pki_types::CertificateDer<'static>>> {
    let file = File::open(path).map_err(|_| MigenError::FileNotFound(path.to_path_buf()))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(tls_error)
}

#[cfg(feature = "tls")]
fn load_private_key(path: &Path) -> Result<rustls::pki_types::PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|_| MigenError::FileNotFound(path.to_path_buf()))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(tls_error)?
        .ok_or_else(|| tls_error(format!("no private key found in {}", path.display())))
}

#[cfg(feature = "tls")]
fn build_rustls_config(tls_config: &TlsConfig) -> Result<ClientConfig> {
    let config = match tls_config.mode {
        TlsMode::Prefer | TlsMode::Require => ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new()))
            .with_no_client_auth(),
        TlsMode::VerifyCa | TlsMode::VerifyFull => {
            let mut root_store = RootCertStore::empty();
            match &tls_config.root_cert {
                Some(root_cert_path) => {
                    for cert in load_certs(Path::new(root_cert_path))? {
                        root_store.add(cert).map_err(tls_error)?;
                    }
                }
                None => root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
            }

            let builder = ClientConfig::builder().with_root_certificates(root_store);
            match (&tls_config.client_cert, &tls_config.client_key) {
                (Some(cert_path), Some(key_path)) => builder
                    .with_client_auth_cert(
                        load_certs(Path::new(cert_path))?,
                        load_private_key(Path::new(key_path))?,
                    )
                    .map_err(tls_error)?,
                _ => builder.with_no_client_auth(),
            }
        }
        TlsMode::Disable => return Err(tls_error("TLS is disabled")),
    };

    Ok(config)
}

fn spawn_connection<F>(connection: F)
where
    F: std::future::Future<Output = std::result::Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "Database connection error");
        }
    });
}

/// Connect with the configured TLS mode and drive the connection on a background task
pub async fn connect_with_tls(connection_string: &str, tls_config: &TlsConfig) -> Result<Client> {
    match tls_config.mode {
        TlsMode::Disable => {
            let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;
            spawn_connection(connection);
            Ok(client)
        }
        #[cfg(feature = "tls")]
        _ => {
            let connector = MakeRustlsConnect::new(build_rustls_config(tls_config)?);
            match tokio_postgres::connect(connection_string, connector).await {
                Ok((client, connection)) => {
                    spawn_connection(connection);
                    Ok(client)
                }
                Err(e) if tls_config.mode == TlsMode::Prefer => {
                    debug!(error = %e, "TLS connection failed, falling back to plaintext");
                    let (client, connection) =
                        tokio_postgres::connect(connection_string, NoTls).await?;
                    spawn_connection(connection);
                    Ok(client)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

#[cfg(feature = "tls")]
#[derive(Debug)]
struct AcceptAnyServerCert {
    crypto_provider: Arc<rustls::crypto::CryptoProvider>,
}

#[cfg(feature = "tls")]
impl AcceptAnyServerCert {
    fn new() -> Self {
        Self {
            crypto_provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }
}

#[cfg(feature = "tls")]
impl rustls::client::danger::ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.crypto_provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_mode_parse() {
        assert_eq!(TlsMode::parse("disable").unwrap(), TlsMode::Disable);
        assert_eq!(TlsMode::parse("DISABLE").unwrap(), TlsMode::Disable);

        #[cfg(feature = "tls")]
        {
            assert_eq!(TlsMode::parse("prefer").unwrap(), TlsMode::Prefer);
            assert_eq!(TlsMode::parse("Verify-Full").unwrap(), TlsMode::VerifyFull);
        }

        #[cfg(not(feature = "tls"))]
        {
            let err = TlsMode::parse("require").unwrap_err();
            assert!(err.to_string().contains("'tls' feature"));
        }

        assert!(TlsMode::parse("sometimes").is_err());
    }
}
