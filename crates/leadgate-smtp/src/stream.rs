//! Line-oriented SMTP transport over TCP or TLS.

use crate::error::{Error, Result};
use crate::reply::{Reply, is_final_line};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::trace;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Connects over plain TCP.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self::Tcp(BufReader::new(stream)))
    }

    /// Connects with implicit TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or TLS handshake fails.
    pub async fn connect_tls(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        let tls = handshake(host, stream).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls))))
    }

    /// Upgrades a TCP stream to TLS after a successful STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted or the handshake fails.
    pub async fn upgrade(self, host: &str) -> Result<Self> {
        let Self::Tcp(reader) = self else {
            return Err(Error::Protocol("Already using TLS".into()));
        };
        let tls = handshake(host, reader.into_inner()).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls))))
    }

    /// Reads one line, without its line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the server closed the connection.
    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if read == 0 {
            return Err(Error::Protocol("Connection closed by server".into()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Reads a complete (possibly multi-line) reply.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the reply is malformed.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            trace!("S: {line}");
            let last = is_final_line(&line);
            lines.push(line);
            if last {
                return Reply::parse(&lines);
            }
        }
    }

    /// Writes raw bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }
}

async fn handshake(
    host: &str,
    stream: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {host}")))?;
    Ok(tls_connector()?.connect(server_name, stream).await?)
}

/// Creates a TLS connector trusting the webpki root certificates.
///
/// Uses the aws-lc-rs provider explicitly; no process-wide default is required.
fn tls_connector() -> Result<TlsConnector> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
