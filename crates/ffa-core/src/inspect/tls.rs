use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::Url;
use x509_parser::prelude::{FromDer, X509Certificate};

use super::{CertInspector, InspectError};

/// Certificate inspector backed by a real TLS handshake.
///
/// Opens a connection to host:443 (or the URL's explicit port), completes
/// the handshake, reads the leaf certificate's not-after field and closes.
/// No application data is ever sent.
pub struct TlsInspector {
    connector: TlsConnector,
    timeout: Duration,
}

impl TlsInspector {
    pub fn new(timeout: Duration) -> Self {
        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        roots.add_parsable_certificates(native.certs);

        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        }
    }

    pub fn from_config(config: &crate::config::WorkerConfig) -> Self {
        Self::new(config.ssl_timeout)
    }

    async fn handshake(&self, host: String, port: u16) -> Result<DateTime<Utc>, InspectError> {
        let server_name =
            ServerName::try_from(host.clone()).map_err(|e| InspectError::InvalidUrl {
                url: host.clone(),
                reason: e.to_string(),
            })?;

        let tcp = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| InspectError::Connect {
                host: host.clone(),
                reason: e.to_string(),
            })?;

        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| InspectError::Handshake {
                host: host.clone(),
                reason: e.to_string(),
            })?;

        let (_, session) = tls.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| InspectError::NoCertificate { host: host.clone() })?;

        let (_, cert) =
            X509Certificate::from_der(leaf.as_ref()).map_err(|e| InspectError::Parse {
                host: host.clone(),
                reason: e.to_string(),
            })?;

        let not_after = cert.validity().not_after.timestamp();
        DateTime::from_timestamp(not_after, 0).ok_or_else(|| InspectError::Parse {
            host,
            reason: format!("not-after timestamp {not_after} out of range"),
        })
    }
}

impl Default for TlsInspector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl CertInspector for TlsInspector {
    async fn expiry(&self, raw_url: &str) -> Result<Option<DateTime<Utc>>, InspectError> {
        let url = Url::parse(raw_url).map_err(|e| InspectError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "https" {
            debug!(url = raw_url, "Not an HTTPS monitor, skipping certificate check");
            return Ok(None);
        }

        let host = url
            .host_str()
            .ok_or_else(|| InspectError::InvalidUrl {
                url: raw_url.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_string();
        let port = url.port().unwrap_or(443);

        match tokio::time::timeout(self.timeout, self.handshake(host.clone(), port)).await {
            Ok(result) => result.map(Some),
            Err(_) => Err(InspectError::Timeout { host }),
        }
    }
}
