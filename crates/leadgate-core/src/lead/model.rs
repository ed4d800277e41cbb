//! Lead data models.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::priority::classify;
use crate::page::{default_page, default_page_size};

/// Unique identifier for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub Uuid);

impl LeadId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The category of interest a lead declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    /// Defense or federal agency.
    FederalDefense,
    /// State or local government.
    StateLocal,
    /// Prospective investor.
    Investor,
    /// Press.
    Media,
    /// Anything else.
    Other,
}

impl InquiryType {
    /// All inquiry types.
    pub const ALL: [Self; 5] = [
        Self::FederalDefense,
        Self::StateLocal,
        Self::Investor,
        Self::Media,
        Self::Other,
    ];

    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "federal_defense" => Some(Self::FederalDefense),
            "state_local" => Some(Self::StateLocal),
            "investor" => Some(Self::Investor),
            "media" => Some(Self::Media),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FederalDefense => "federal_defense",
            Self::StateLocal => "state_local",
            Self::Investor => "investor",
            Self::Media => "media",
            Self::Other => "other",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::FederalDefense => "DoD/Federal",
            Self::StateLocal => "State/Local",
            Self::Investor => "Investor",
            Self::Media => "Media",
            Self::Other => "Other",
        }
    }
}

/// Follow-up urgency. Variants are declared in ascending order, so the
/// derived `Ord` ranks `Critical` highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LeadPriority {
    /// No special handling.
    #[default]
    Standard,
    /// State and local government.
    Medium,
    /// Federal and investor inquiries.
    High,
    /// Government email domains.
    Critical,
}

impl LeadPriority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 4] = [Self::Standard, Self::Medium, Self::High, Self::Critical];

    /// Numeric rank stored in the database; higher is more urgent.
    #[must_use]
    pub const fn rank(self) -> i64 {
        match self {
            Self::Standard => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }

    /// Inverse of [`rank`](Self::rank).
    #[must_use]
    pub const fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            0 => Some(Self::Standard),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            3 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Convert to wire string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

/// Where a lead is in the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Not yet looked at.
    #[default]
    New,
    /// First contact made.
    Contacted,
    /// Judged worth pursuing.
    Qualified,
    /// Became a customer or investor.
    Converted,
    /// No further action.
    Closed,
}

impl LeadStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "qualified" => Some(Self::Qualified),
            "converted" => Some(Self::Converted),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Closed => "closed",
        }
    }
}

/// A persisted inquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Unique identifier.
    pub id: LeadId,
    /// Submitter's name.
    pub full_name: String,
    /// Submitter's email address.
    pub email: String,
    /// Submitter's organization.
    pub organization: String,
    /// Declared category of interest.
    pub inquiry_type: InquiryType,
    /// Free-text message.
    pub message: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Classified at intake; never changes afterwards.
    pub priority: LeadPriority,
    /// Pipeline status.
    pub status: LeadStatus,
    /// Internal notes.
    pub notes: Option<String>,
    /// When the lead was received.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Builds a new lead from a validated submission, classifying it.
    #[must_use]
    pub fn from_submission(submission: NewLead, now: DateTime<Utc>) -> Self {
        let inquiry_type = submission.inquiry_type.unwrap_or(InquiryType::Other);
        let priority = classify(&submission.email, inquiry_type);
        Self {
            id: LeadId::generate(),
            full_name: submission.full_name.trim().to_string(),
            email: submission.email.trim().to_string(),
            organization: submission.organization.trim().to_string(),
            inquiry_type,
            message: submission.message,
            phone: submission
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            priority,
            status: LeadStatus::New,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an update. Absent fields are left alone and `updated_at`
    /// always moves strictly forward.
    pub fn apply(&mut self, update: LeadUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        self.updated_at = now.max(self.updated_at + Duration::microseconds(1));
    }
}

/// A public inquiry as submitted.
///
/// Every field deserializes when absent so that missing input is reported
/// by validation, field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    /// Submitter's name.
    #[serde(default)]
    pub full_name: String,
    /// Submitter's email address.
    #[serde(default)]
    pub email: String,
    /// Submitter's organization.
    #[serde(default)]
    pub organization: String,
    /// Declared category of interest; required.
    #[serde(default)]
    pub inquiry_type: Option<InquiryType>,
    /// Free-text message.
    #[serde(default)]
    pub message: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

/// An admin's change to a lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    /// New status, if changing.
    #[serde(default)]
    pub status: Option<LeadStatus>,
    /// Replacement notes, if changing.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Listing filter and paging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    /// Only leads with this priority.
    #[serde(default)]
    pub priority: Option<LeadPriority>,
    /// Only leads with this status.
    #[serde(default)]
    pub status: Option<LeadStatus>,
    /// Case-insensitive substring of name, email or organization.
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for LeadFilter {
    fn default() -> Self {
        Self {
            priority: None,
            status: None,
            search: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}
