pub mod imap;
pub mod managesieve;

use std::sync::Arc;

use rustls::ClientConfig;
use tokio_rustls::TlsConnector;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Not connected")]
    NotConnected,
}

fn tls_connector() -> TlsConnector {
    let mut store = rustls::RootCertStore::empty();
    store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut tls_config = ClientConfig::builder()
        .with_root_certificates(store)
        .with_no_client_auth();
    tls_config.alpn_protocols = vec![];

    TlsConnector::from(Arc::new(tls_config))
}

fn server_name(host: &str) -> Result<rustls::pki_types::ServerName<'static>, Error> {
    rustls::pki_types::ServerName::try_from(host.to_string())
        .map_err(|e| Error::Protocol(format!("Invalid server name: {e}")))
}
