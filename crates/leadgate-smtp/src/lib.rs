//! # leadgate-smtp
//!
//! A small SMTP submission client (RFC 5321) for delivering one message per
//! connection.
//!
//! ## Features
//!
//! - **Connection security**: implicit TLS (port 465), STARTTLS (port 587) or
//!   plain TCP
//! - **Authentication**: AUTH PLAIN with SASL initial response
//! - **Delivery**: MAIL FROM / RCPT TO / DATA with CRLF normalisation and
//!   dot-stuffing
//!
//! ## Quick Start
//!
//! ```ignore
//! use leadgate_smtp::{Client, Envelope, Security};
//!
//! #[tokio::main]
//! async fn main() -> leadgate_smtp::Result<()> {
//!     let client = Client::new("smtp.example.com", 587, Security::StartTls)
//!         .with_credentials("user@example.com", "password");
//!
//!     let envelope = Envelope::new("noreply@example.com").to("sales@example.com");
//!     client
//!         .send(&envelope, b"Subject: Test\r\n\r\nHello, World!\r\n")
//!         .await
//! }
//! ```
//!
//! ## Session Flow
//!
//! ```text
//! greeting(220) → EHLO → [STARTTLS → EHLO] → [AUTH PLAIN] →
//!     MAIL FROM → RCPT TO (×n) → DATA → message → QUIT
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
mod error;
pub mod reply;
mod stream;

pub use client::{Client, Envelope, Security};
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};
pub use stream::SmtpStream;
