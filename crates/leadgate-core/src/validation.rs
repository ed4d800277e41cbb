//! Request validation.
//!
//! Every check reports all failures at once so a client can fix a form in a
//! single round trip. Field names are the wire (camelCase) names.

use crate::account::{ProfileUpdate, Registration};
use crate::lead::NewLead;

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    Required(&'static str),
    /// A field exceeds its maximum length in characters.
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
    /// A field is shorter than its minimum length in characters.
    TooShort {
        /// Field name.
        field: &'static str,
        /// Minimum allowed length.
        min: usize,
    },
    /// Email address format is invalid.
    InvalidEmail,
    /// Password confirmation does not match.
    PasswordMismatch,
    /// The accredited investor attestation was not given.
    AttestationRequired,
    /// Page number is zero.
    InvalidPage,
    /// Page size is zero.
    InvalidPageSize,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Required(field) => format!("{} is required", label(field)),
            Self::TooLong { field, max } => {
                format!("{} must be at most {max} characters", label(field))
            }
            Self::TooShort { field, min } => {
                format!("{} must be at least {min} characters", label(field))
            }
            Self::InvalidEmail => "Invalid email address format".to_string(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            Self::AttestationRequired => {
                "You must attest that you are an accredited investor".to_string()
            }
            Self::InvalidPage => "Page must be at least 1".to_string(),
            Self::InvalidPageSize => "Page size must be at least 1".to_string(),
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Required(field) | Self::TooLong { field, .. } | Self::TooShort { field, .. } => {
                *field
            }
            Self::InvalidEmail => "email",
            Self::PasswordMismatch => "confirmPassword",
            Self::AttestationRequired => "accreditedInvestorAttestation",
            Self::InvalidPage => "page",
            Self::InvalidPageSize => "pageSize",
        }
    }
}

fn label(field: &str) -> &str {
    match field {
        "fullName" => "Full name",
        "email" => "Email",
        "organization" => "Organization",
        "inquiryType" => "Inquiry type",
        "confirmPassword" => "Password confirmation",
        "message" => "Message",
        "phone" => "Phone",
        "password" => "Password",
        other => other,
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// All validation failures for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Iterates over the individual failures.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ValidationError::message).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

/// Result of validating a request.
pub type ValidationResult = Result<(), ValidationErrors>;

#[derive(Default)]
struct Checks(Vec<ValidationError>);

impl Checks {
    fn required(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(ValidationError::Required(field));
        } else {
            self.max_len(field, value, max);
        }
        self
    }

    fn present(&mut self, field: &'static str, present: bool) -> &mut Self {
        if !present {
            self.0.push(ValidationError::Required(field));
        }
        self
    }

    fn optional(&mut self, field: &'static str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            self.max_len(field, value, max);
        }
        self
    }

    fn max_len(&mut self, field: &'static str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.0.push(ValidationError::TooLong { field, max });
        }
    }

    fn email(&mut self, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(ValidationError::Required("email"));
        } else if value.chars().count() > max {
            self.0.push(ValidationError::TooLong { field: "email", max });
        } else if !is_valid_email(value) {
            self.0.push(ValidationError::InvalidEmail);
        }
        self
    }

    fn push(&mut self, error: ValidationError) -> &mut Self {
        self.0.push(error);
        self
    }

    fn finish(&mut self) -> ValidationResult {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.0)))
        }
    }
}

/// Validate a public lead submission.
///
/// # Errors
///
/// Returns every field that is missing, too long or malformed.
pub fn validate_new_lead(lead: &NewLead) -> ValidationResult {
    Checks::default()
        .required("fullName", &lead.full_name, 100)
        .email(&lead.email, 256)
        .required("organization", &lead.organization, 200)
        .present("inquiryType", lead.inquiry_type.is_some())
        .required("message", &lead.message, 2000)
        .optional("phone", lead.phone.as_deref(), 20)
        .finish()
}

/// Validate an investor self-registration.
///
/// # Errors
///
/// Returns every field that is missing, too long or malformed, a password
/// shorter than [`MIN_PASSWORD_LEN`], a confirmation mismatch and a missing
/// attestation.
pub fn validate_registration(registration: &Registration) -> ValidationResult {
    let mut checks = Checks::default();
    checks
        .email(&registration.email, 256)
        .required("fullName", &registration.full_name, 100)
        .optional("organization", registration.organization.as_deref(), 200);

    if registration.password.is_empty() {
        checks.push(ValidationError::Required("password"));
    } else if registration.password.chars().count() < MIN_PASSWORD_LEN {
        checks.push(ValidationError::TooShort {
            field: "password",
            min: MIN_PASSWORD_LEN,
        });
    }
    if registration.password != registration.confirm_password {
        checks.push(ValidationError::PasswordMismatch);
    }
    if !registration.accredited_investor_attestation {
        checks.push(ValidationError::AttestationRequired);
    }
    checks.finish()
}

/// Validate a profile update.
///
/// # Errors
///
/// Returns an error for each supplied field that is too long.
pub fn validate_profile_update(update: &ProfileUpdate) -> ValidationResult {
    Checks::default()
        .optional("fullName", update.full_name.as_deref(), 100)
        .optional("organization", update.organization.as_deref(), 200)
        .finish()
}

/// Basic email validation.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain.contains('.') && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lead::InquiryType;

    fn lead() -> NewLead {
        NewLead {
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            organization: "Acme".into(),
            inquiry_type: Some(InquiryType::Other),
            message: "Tell me more".into(),
            phone: None,
        }
    }

    fn registration() -> Registration {
        Registration {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
            confirm_password: "correct horse".into(),
            full_name: "Ada Investor".into(),
            organization: None,
            accredited_investor_attestation: true,
        }
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@sub.example.mil"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn valid_lead_passes() {
        assert!(validate_new_lead(&lead()).is_ok());
    }

    #[test]
    fn blank_lead_reports_every_required_field() {
        let errors = validate_new_lead(&NewLead {
            full_name: " ".into(),
            email: String::new(),
            organization: String::new(),
            inquiry_type: None,
            message: String::new(),
            ..lead()
        })
        .unwrap_err();

        for field in ["fullName", "email", "organization", "inquiryType", "message"] {
            assert!(errors.iter().any(|e| e.field() == field), "missing {field}");
        }
        assert_eq!(errors.0.len(), 5);
        assert!(errors.0.contains(&ValidationError::Required("inquiryType")));
        assert_eq!(
            ValidationError::Required("inquiryType").message(),
            "Inquiry type is required"
        );
    }

    #[test]
    fn lead_length_limits() {
        let errors = validate_new_lead(&NewLead {
            full_name: "x".repeat(101),
            message: "m".repeat(2001),
            phone: Some("1".repeat(21)),
            ..lead()
        })
        .unwrap_err();
        assert!(errors.0.contains(&ValidationError::TooLong { field: "fullName", max: 100 }));
        assert!(errors.0.contains(&ValidationError::TooLong { field: "message", max: 2000 }));
        assert!(errors.0.contains(&ValidationError::TooLong { field: "phone", max: 20 }));

        let ok = NewLead {
            full_name: "x".repeat(100),
            message: "m".repeat(2000),
            phone: Some("1".repeat(20)),
            ..lead()
        };
        assert!(validate_new_lead(&ok).is_ok());
    }

    #[test]
    fn malformed_lead_email() {
        let errors = validate_new_lead(&NewLead {
            email: "not-an-email".into(),
            ..lead()
        })
        .unwrap_err();
        assert_eq!(errors.0, vec![ValidationError::InvalidEmail]);
        assert_eq!(errors.0[0].field(), "email");
    }

    #[test]
    fn valid_registration_passes() {
        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn registration_rules() {
        let errors = validate_registration(&Registration {
            password: "short".into(),
            confirm_password: "different".into(),
            accredited_investor_attestation: false,
            ..registration()
        })
        .unwrap_err();
        assert!(errors.0.contains(&ValidationError::TooShort { field: "password", min: 8 }));
        assert!(errors.0.contains(&ValidationError::PasswordMismatch));
        assert!(errors.0.contains(&ValidationError::AttestationRequired));
    }

    #[test]
    fn profile_update_limits() {
        assert!(validate_profile_update(&ProfileUpdate::default()).is_ok());
        let errors = validate_profile_update(&ProfileUpdate {
            full_name: Some("n".repeat(101)),
            organization: Some("o".repeat(201)),
        })
        .unwrap_err();
        assert_eq!(errors.0.len(), 2);
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            ValidationError::Required("fullName").message(),
            "Full name is required"
        );
        assert_eq!(
            ValidationError::TooLong { field: "phone", max: 20 }.message(),
            "Phone must be at most 20 characters"
        );
        let errors = ValidationErrors(vec![
            ValidationError::Required("email"),
            ValidationError::PasswordMismatch,
        ]);
        assert_eq!(errors.to_string(), "Email is required; Passwords do not match");
    }
}
