//! SMTP replies and their parser.

use crate::error::{Error, Result};

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCEEDED: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code.
    pub code: ReplyCode,
    /// Text of each reply line, without code and separator.
    pub lines: Vec<String>,
}

impl Reply {
    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full reply text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Parses a complete reply from its raw lines.
    ///
    /// Multi-line replies use `-` after the code on every line but the last:
    /// `250-first`, `250-second`, `250 last`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines are empty, a code is not numeric, or the
    /// lines disagree on the code.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let first = raw
            .first()
            .ok_or_else(|| Error::Protocol("Empty reply".into()))?;
        let code = parse_code(first)?;

        let mut lines = Vec::with_capacity(raw.len());
        for line in raw {
            if parse_code(line)? != code {
                return Err(Error::Protocol(format!("Inconsistent reply code: {line}")));
            }
            lines.push(line.get(4..).unwrap_or_default().to_string());
        }

        Ok(Self { code, lines })
    }
}

/// Checks if a line is the last line of a (possibly multi-line) reply.
#[must_use]
pub fn is_final_line(line: &str) -> bool {
    line.len() == 3 || line.as_bytes().get(3) == Some(&b' ')
}

fn parse_code(line: &str) -> Result<ReplyCode> {
    line.get(..3)
        .and_then(|code| code.parse::<u16>().ok())
        .map(ReplyCode::new)
        .ok_or_else(|| Error::Protocol(format!("Malformed reply line: {line}")))
}
