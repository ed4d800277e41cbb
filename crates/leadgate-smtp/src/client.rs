//! One-shot SMTP submission client.

use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyCode};
use crate::stream::SmtpStream;
use base64::Engine;
use tracing::{debug, trace};

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Default submission port for the security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Tls => 465,
        }
    }
}

/// Envelope sender and recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path (`MAIL FROM`).
    pub from: String,
    /// Forward paths (`RCPT TO`).
    pub to: Vec<String>,
}

impl Envelope {
    /// Creates an envelope with no recipients.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Vec::new(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }
}

/// SMTP client configuration. Each [`Client::send`] opens a fresh connection.
#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    port: u16,
    security: Security,
    credentials: Option<(String, String)>,
    helo_name: String,
}

impl Client {
    /// Creates a client for the given server.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Self {
        Self {
            host: host.into(),
            port,
            security,
            credentials: None,
            helo_name: "localhost".to_string(),
        }
    }

    /// Authenticates with AUTH PLAIN after EHLO.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn with_helo_name(mut self, name: impl Into<String>) -> Self {
        self.helo_name = name.into();
        self
    }

    /// Connects, delivers one RFC 5322 message, and quits.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting, negotiating, authenticating or any
    /// envelope/data command fails.
    pub async fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        if envelope.to.is_empty() {
            return Err(Error::NoRecipients);
        }

        let stream = match self.security {
            Security::Tls => SmtpStream::connect_tls(&self.host, self.port).await?,
            Security::StartTls | Security::None => {
                SmtpStream::connect(&self.host, self.port).await?
            }
        };
        debug!(host = %self.host, port = self.port, "SMTP connected");

        let mut session = Session::open(stream).await?;
        session.ehlo(&self.helo_name).await?;

        if self.security == Security::StartTls {
            if !session.supports("STARTTLS") {
                return Err(Error::NotSupported("STARTTLS"));
            }
            session
                .expect("STARTTLS", "STARTTLS", ReplyCode::SERVICE_READY)
                .await?;
            session.stream = session.stream.upgrade(&self.host).await?;
            session.ehlo(&self.helo_name).await?;
        }

        if let Some((username, password)) = &self.credentials {
            session.auth_plain(username, password).await?;
        }

        session.transfer(envelope, message).await?;
        session.quit().await;
        Ok(())
    }
}

/// An open SMTP conversation.
struct Session {
    stream: SmtpStream,
    extensions: Vec<String>,
}

impl Session {
    async fn open(mut stream: SmtpStream) -> Result<Self> {
        let greeting = stream.read_reply().await?;
        check("greeting", &greeting, ReplyCode::SERVICE_READY)?;
        Ok(Self {
            stream,
            extensions: Vec::new(),
        })
    }

    async fn command(&mut self, line: &str) -> Result<Reply> {
        trace!("C: {}", line.split_whitespace().take(2).collect::<Vec<_>>().join(" "));
        self.stream.write_all(format!("{line}\r\n").as_bytes()).await?;
        self.stream.read_reply().await
    }

    async fn expect(
        &mut self,
        name: &'static str,
        line: &str,
        code: ReplyCode,
    ) -> Result<Reply> {
        let reply = self.command(line).await?;
        check(name, &reply, code)?;
        Ok(reply)
    }

    async fn ehlo(&mut self, helo_name: &str) -> Result<()> {
        let reply = self
            .expect("EHLO", &format!("EHLO {helo_name}"), ReplyCode::OK)
            .await?;
        // First line is the server's greeting, the rest are extension keywords.
        self.extensions = reply
            .lines
            .iter()
            .skip(1)
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_ascii_uppercase)
            .collect();
        Ok(())
    }

    fn supports(&self, keyword: &str) -> bool {
        self.extensions.iter().any(|ext| ext == keyword)
    }

    async fn auth_plain(&mut self, username: &str, password: &str) -> Result<()> {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("\0{username}\0{password}").as_bytes());
        self.expect(
            "AUTH PLAIN",
            &format!("AUTH PLAIN {token}"),
            ReplyCode::AUTH_SUCCEEDED,
        )
        .await?;
        Ok(())
    }

    async fn transfer(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        self.expect(
            "MAIL FROM",
            &format!("MAIL FROM:<{}>", envelope.from),
            ReplyCode::OK,
        )
        .await?;

        for recipient in &envelope.to {
            let reply = self.command(&format!("RCPT TO:<{recipient}>")).await?;
            if !reply.is_success() {
                return Err(rejected("RCPT TO", &reply));
            }
        }

        self.expect("DATA", "DATA", ReplyCode::START_DATA).await?;
        self.stream.write_all(&encode_data(message)).await?;
        let reply = self.stream.read_reply().await?;
        check("message data", &reply, ReplyCode::OK)
    }

    /// The message is already accepted at this point, so a failed QUIT is
    /// only logged.
    async fn quit(&mut self) {
        match self.command("QUIT").await {
            Ok(reply) if reply.code == ReplyCode::CLOSING => {}
            Ok(reply) => debug!("Unexpected QUIT reply: {}", reply.code),
            Err(e) => debug!("QUIT failed: {e}"),
        }
    }
}

fn check(command: &'static str, reply: &Reply, expected: ReplyCode) -> Result<()> {
    if reply.code == expected {
        Ok(())
    } else {
        Err(rejected(command, reply))
    }
}

fn rejected(command: &'static str, reply: &Reply) -> Error {
    Error::Rejected {
        command,
        code: reply.code.as_u16(),
        message: reply.text(),
    }
}

/// Normalises line endings to CRLF, dot-stuffs, and appends the terminator.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accepts one connection and answers like a permissive submission
    /// server, except for recipients listed in `reject`. Returns every line
    /// the client sent.
    async fn scripted_server(reject: &'static [&'static str]) -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut reader = BufReader::new(read);
            let mut transcript = Vec::new();
            write.write_all(b"220 mx.test ESMTP\r\n").await.unwrap();

            let mut in_data = false;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                transcript.push(line.clone());

                let response: &[u8] = if in_data {
                    if line != "." {
                        continue;
                    }
                    in_data = false;
                    b"250 queued\r\n"
                } else if line.starts_with("EHLO") {
                    b"250-mx.test\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n"
                } else if line.starts_with("AUTH PLAIN") {
                    b"235 ok\r\n"
                } else if line.starts_with("RCPT TO")
                    && reject.iter().any(|r| line.contains(r))
                {
                    b"550 no such user\r\n"
                } else if line == "DATA" {
                    in_data = true;
                    b"354 go ahead\r\n"
                } else if line == "QUIT" {
                    write.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                } else {
                    b"250 ok\r\n"
                };
                write.write_all(response).await.unwrap();
            }
            transcript
        });

        (port, handle)
    }

    #[tokio::test]
    async fn delivers_message_with_auth() {
        let (port, server) = scripted_server(&[]).await;
        let client = Client::new("127.0.0.1", port, Security::None)
            .with_credentials("user", "pass")
            .with_helo_name("leadgate.test");
        let envelope = Envelope::new("noreply@example.com").to("sales@example.com");

        client
            .send(&envelope, b"Subject: Hi\r\n\r\nline one\n.hidden\n")
            .await
            .unwrap();

        let transcript = server.await.unwrap();
        assert_eq!(transcript[0], "EHLO leadgate.test");
        assert!(transcript[1].starts_with("AUTH PLAIN "));
        assert_eq!(transcript[2], "MAIL FROM:<noreply@example.com>");
        assert_eq!(transcript[3], "RCPT TO:<sales@example.com>");
        assert_eq!(transcript[4], "DATA");
        assert_eq!(
            &transcript[5..10],
            &["Subject: Hi", "", "line one", "..hidden", "."]
        );
        assert_eq!(transcript.last().unwrap(), "QUIT");
    }

    #[tokio::test]
    async fn rejected_recipient_is_permanent_error() {
        let (port, server) = scripted_server(&["nobody@example.com"]).await;
        let client = Client::new("127.0.0.1", port, Security::None);
        let envelope = Envelope::new("noreply@example.com").to("nobody@example.com");

        let err = client.send(&envelope, b"body").await.unwrap_err();
        assert!(err.is_permanent());
        assert!(matches!(err, Error::Rejected { command: "RCPT TO", code: 550, .. }));
        drop(server);
    }

    #[tokio::test]
    async fn starttls_requires_server_support() {
        let (port, server) = scripted_server(&[]).await;
        let client = Client::new("127.0.0.1", port, Security::StartTls);
        let envelope = Envelope::new("a@example.com").to("b@example.com");

        let err = client.send(&envelope, b"body").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported("STARTTLS")));
        drop(server);
    }

    #[tokio::test]
    async fn empty_envelope_is_refused_before_connecting() {
        let client = Client::new("127.0.0.1", 1, Security::None);
        let err = client
            .send(&Envelope::new("a@example.com"), b"body")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoRecipients));
    }

    #[test]
    fn encode_data_normalises_and_terminates() {
        assert_eq!(encode_data(b"a\nb\r\n"), b"a\r\nb\r\n.\r\n");
        assert_eq!(encode_data(b".x"), b"..x\r\n.\r\n");
    }

    #[test]
    fn default_ports() {
        assert_eq!(Security::Tls.default_port(), 465);
        assert_eq!(Security::StartTls.default_port(), 587);
        assert_eq!(Security::None.default_port(), 25);
    }
}
