//! Email delivery of lead notifications over SMTP.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use leadgate_smtp::{Client, Envelope, Security};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LeadNotification, Notifier, NotifyError};
use crate::validation::is_valid_email;

/// Connection security for the SMTP relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS.
    #[default]
    Tls,
    /// STARTTLS upgrade after a plaintext greeting.
    StartTls,
    /// No encryption.
    None,
}

impl From<SmtpSecurity> for Security {
    fn from(security: SmtpSecurity) -> Self {
        match security {
            SmtpSecurity::Tls => Self::Tls,
            SmtpSecurity::StartTls => Self::StartTls,
            SmtpSecurity::None => Self::None,
        }
    }
}

/// SMTP relay and addressing for lead notifications.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Relay hostname.
    pub host: String,
    /// Relay port; defaults by security mode.
    pub port: Option<u16>,
    /// Connection security.
    pub security: SmtpSecurity,
    /// AUTH username, if the relay requires login.
    pub username: Option<String>,
    /// AUTH password.
    pub password: Option<String>,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Recipient of lead notifications; defaults to `from_email`.
    pub notification_email: Option<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            security: SmtpSecurity::default(),
            username: None,
            password: None,
            from_email: "noreply@altandynamics.com".to_string(),
            from_name: "Altan Dynamics".to_string(),
            notification_email: None,
        }
    }
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("notification_email", &self.notification_email)
            .finish_non_exhaustive()
    }
}

impl EmailSettings {
    /// Port to connect to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
            .unwrap_or_else(|| Security::from(self.security).default_port())
    }

    /// Address that receives notifications.
    #[must_use]
    pub fn recipient(&self) -> &str {
        self.notification_email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(&self.from_email)
    }

    /// Checks the settings are complete.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] naming the first problem found.
    pub fn validate(&self) -> Result<(), NotifyError> {
        if self.host.trim().is_empty() {
            return Err(NotifyError::Config("SMTP host is required".into()));
        }
        if self.port == Some(0) {
            return Err(NotifyError::Config("SMTP port must be 1-65535".into()));
        }
        if !is_valid_email(&self.from_email) {
            return Err(NotifyError::Config(format!(
                "Invalid sender address: {}",
                self.from_email
            )));
        }
        if !is_valid_email(self.recipient()) {
            return Err(NotifyError::Config(format!(
                "Invalid notification address: {}",
                self.recipient()
            )));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(NotifyError::Config(
                "SMTP username and password must be set together".into(),
            ));
        }
        Ok(())
    }
}

/// A plain-text message ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender display name.
    pub from_name: String,
    /// Sender address.
    pub from_email: String,
    /// Recipient address.
    pub to: String,
    /// Reply-To display name and address.
    pub reply_to: Option<(String, String)>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// `Date` header value.
    pub date: DateTime<Utc>,
}

impl OutgoingMessage {
    /// Renders the message as RFC 5322 text with CRLF line endings.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::new();

        let _ = write!(
            message,
            "From: {}\r\n",
            mailbox(&self.from_name, &self.from_email)
        );
        let _ = write!(message, "To: <{}>\r\n", header_value(&self.to));
        if let Some((name, email)) = &self.reply_to {
            let _ = write!(message, "Reply-To: {}\r\n", mailbox(name, email));
        }
        let _ = write!(message, "Subject: {}\r\n", encode_word(&self.subject));
        let _ = write!(message, "Date: {}\r\n", self.date.to_rfc2822());
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("\r\n");

        for line in self.body.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }

        message
    }
}

/// Strips line breaks and other control characters from a header value.
fn header_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// RFC 2047 encoded-word for non-ASCII header text.
fn encode_word(value: &str) -> String {
    let value = header_value(value);
    if value.is_ascii() {
        value
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

fn mailbox(name: &str, email: &str) -> String {
    let email = header_value(email);
    let name = header_value(name);
    if name.is_empty() {
        return format!("<{email}>");
    }
    let name = if name.is_ascii() {
        format!("\"{}\"", name.replace(['"', '\\'], ""))
    } else {
        encode_word(&name)
    };
    format!("{name} <{email}>")
}

/// Sends lead notifications by email.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    settings: EmailSettings,
    client: Client,
}

impl EmailNotifier {
    /// Creates a notifier from validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are incomplete.
    pub fn new(settings: EmailSettings) -> Result<Self, NotifyError> {
        settings.validate()?;
        let mut client = Client::new(&settings.host, settings.port(), settings.security.into());
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            client = client.with_credentials(username, password);
        }
        Ok(Self { settings, client })
    }

    /// Builds the notification email for a lead.
    #[must_use]
    pub fn compose(&self, notification: &LeadNotification) -> OutgoingMessage {
        let priority = notification.priority.display_name();
        let inquiry_type = notification.inquiry_type.display_name();
        let received = notification.received_at.format("%Y-%m-%d %H:%M:%S");

        let mut body = String::new();
        let _ = writeln!(body, "NEW LEAD SUBMISSION");
        let _ = writeln!(body, "Priority: {}", priority.to_uppercase());
        let _ = writeln!(body);
        let _ = writeln!(body, "Name: {}", notification.full_name);
        let _ = writeln!(body, "Email: {}", notification.email);
        let _ = writeln!(body, "Organization: {}", notification.organization);
        let _ = writeln!(body, "Inquiry Type: {inquiry_type}");
        if let Some(phone) = &notification.phone {
            let _ = writeln!(body, "Phone: {phone}");
        }
        let _ = writeln!(body);
        let _ = writeln!(body, "Message:");
        let _ = writeln!(body, "{}", notification.message);
        let _ = writeln!(body);
        let _ = writeln!(body, "Received: {received} UTC");
        let _ = writeln!(body);
        let _ = writeln!(body, "---");
        let _ = writeln!(body, "{}", self.settings.from_name);

        OutgoingMessage {
            from_name: self.settings.from_name.clone(),
            from_email: self.settings.from_email.clone(),
            to: self.settings.recipient().to_string(),
            reply_to: Some((notification.full_name.clone(), notification.email.clone())),
            subject: format!(
                "New {priority} Lead: {inquiry_type} - {}",
                notification.organization
            ),
            body,
            date: Utc::now(),
        }
    }
}

impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &LeadNotification) -> Result<(), NotifyError> {
        let message = self.compose(notification);
        let envelope = Envelope::new(&message.from_email).to(&message.to);
        debug!(lead = %notification.lead_id, to = %message.to, "Sending lead notification email");
        self.client
            .send(&envelope, message.to_rfc5322().as_bytes())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lead::{InquiryType, LeadId, LeadPriority};
    use chrono::TimeZone;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn settings() -> EmailSettings {
        EmailSettings {
            host: "smtp.example.com".into(),
            notification_email: Some("sales@example.com".into()),
            ..EmailSettings::default()
        }
    }

    fn notification() -> LeadNotification {
        LeadNotification {
            lead_id: LeadId::generate(),
            full_name: "Jane Doe".into(),
            email: "jane@agency.gov".into(),
            organization: "Agency".into(),
            inquiry_type: InquiryType::FederalDefense,
            message: "Line one\nLine two".into(),
            priority: LeadPriority::Critical,
            phone: Some("555-0100".into()),
            received_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn defaults_and_recipient_fallback() {
        let settings = EmailSettings::default();
        assert_eq!(settings.from_email, "noreply@altandynamics.com");
        assert_eq!(settings.from_name, "Altan Dynamics");
        assert_eq!(settings.recipient(), "noreply@altandynamics.com");
        assert_eq!(settings.port(), 465);
        assert_eq!(
            EmailSettings {
                security: SmtpSecurity::StartTls,
                ..EmailSettings::default()
            }
            .port(),
            587
        );
    }

    #[test]
    fn validation() {
        assert!(settings().validate().is_ok());
        assert!(EmailSettings::default().validate().is_err());
        assert!(
            EmailSettings {
                username: Some("user".into()),
                ..settings()
            }
            .validate()
            .is_err()
        );
        assert!(
            EmailSettings {
                notification_email: Some("nope".into()),
                ..settings()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn settings_parse_security() {
        let settings: EmailSettings =
            serde_json::from_str(r#"{"host":"mx","security":"starttls","port":2525}"#).unwrap();
        assert_eq!(settings.security, SmtpSecurity::StartTls);
        assert_eq!(settings.port(), 2525);
        assert_eq!(settings.from_name, "Altan Dynamics");
    }

    #[test]
    fn composes_notification() {
        let notifier = EmailNotifier::new(settings()).unwrap();
        let message = notifier.compose(&notification());

        assert_eq!(message.subject, "New Critical Lead: DoD/Federal - Agency");
        assert_eq!(message.to, "sales@example.com");
        assert_eq!(
            message.reply_to,
            Some(("Jane Doe".to_string(), "jane@agency.gov".to_string()))
        );
        assert!(message.body.contains("Priority: CRITICAL"));
        assert!(message.body.contains("Name: Jane Doe"));
        assert!(message.body.contains("Email: jane@agency.gov"));
        assert!(message.body.contains("Organization: Agency"));
        assert!(message.body.contains("Inquiry Type: DoD/Federal"));
        assert!(message.body.contains("Phone: 555-0100"));
        assert!(message.body.contains("Line one\nLine two"));
        assert!(message.body.contains("Received: 2026-01-02 03:04:05 UTC"));
    }

    #[test]
    fn phone_line_is_optional() {
        let notifier = EmailNotifier::new(settings()).unwrap();
        let message = notifier.compose(&LeadNotification {
            phone: None,
            ..notification()
        });
        assert!(!message.body.contains("Phone:"));
    }

    #[test]
    fn rfc5322_headers() {
        let message = OutgoingMessage {
            from_name: "Altan Dynamics".into(),
            from_email: "noreply@example.com".into(),
            to: "sales@example.com".into(),
            reply_to: Some(("Jane\r\nBcc: evil@example.com".into(), "jane@example.com".into())),
            subject: "New High Lead: Investor - Zürich AG".into(),
            body: "Hello\nWorld".into(),
            date: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        let text = message.to_rfc5322();

        assert!(text.starts_with("From: \"Altan Dynamics\" <noreply@example.com>\r\n"));
        assert!(text.contains("To: <sales@example.com>\r\n"));
        assert!(text.contains("Reply-To: \"Jane  Bcc: evil@example.com\" <jane@example.com>\r\n"));
        assert!(!text.contains("\r\nBcc:"));
        assert!(text.contains("Subject: =?UTF-8?B?"));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(text.ends_with("\r\n\r\nHello\r\nWorld\r\n"));
    }

    #[tokio::test]
    async fn delivers_through_smtp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
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
                let line = line.trim_end().to_string();
                transcript.push(line.clone());
                let reply: &[u8] = if in_data {
                    if line != "." {
                        continue;
                    }
                    in_data = false;
                    b"250 queued\r\n"
                } else if line == "DATA" {
                    in_data = true;
                    b"354 go\r\n"
                } else if line == "QUIT" {
                    write.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                } else {
                    b"250 ok\r\n"
                };
                write.write_all(reply).await.unwrap();
            }
            transcript
        });

        let notifier = EmailNotifier::new(EmailSettings {
            host: "127.0.0.1".into(),
            port: Some(port),
            security: SmtpSecurity::None,
            ..settings()
        })
        .unwrap();
        notifier.notify(&notification()).await.unwrap();

        let transcript = server.await.unwrap();
        assert!(transcript.contains(&"MAIL FROM:<noreply@altandynamics.com>".to_string()));
        assert!(transcript.contains(&"RCPT TO:<sales@example.com>".to_string()));
        assert!(
            transcript
                .iter()
                .any(|l| l == "Subject: New Critical Lead: DoD/Federal - Agency")
        );
    }
}
