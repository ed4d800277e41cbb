//! Server settings.
//!
//! Settings are read from a JSON file (`LEADGATE_CONFIG`, or
//! `<config dir>/leadgate/config.json`), then selected values are taken
//! from the environment. A missing file means defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use leadgate_auth::TokenSettings;
use leadgate_core::EmailSettings;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Names the settings file.
pub const CONFIG_ENV: &str = "LEADGATE_CONFIG";

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A setting has an unusable value.
    #[error("Invalid setting {key}: {message}")]
    Invalid {
        /// Setting name.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Account provisioned as an administrator at startup.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Display name.
    #[serde(default = "default_admin_name")]
    pub full_name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl std::fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSettings")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listen address.
    pub bind: SocketAddr,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Access token issuance.
    pub jwt: TokenSettings,
    /// SMTP notification channel; leads are only logged when absent.
    pub email: Option<EmailSettings>,
    /// Bootstrap administrator.
    pub admin: Option<AdminSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: default_data_dir().join("leadgate.db"),
            jwt: TokenSettings::default(),
            email: None,
            admin: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leadgate")
}

/// Default settings file location.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leadgate")
        .join("config.json")
}

impl Settings {
    /// Loads settings from the configured file and the process environment,
    /// then validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting settings are invalid.
    pub async fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).map_or_else(default_config_path, PathBuf::from);
        let mut settings = Self::from_file(&path).await?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads a settings file, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "No settings file; using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let settings = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Applies `LEADGATE_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `LEADGATE_BIND` is not a socket address.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("LEADGATE_BIND") {
            self.bind = bind.parse().map_err(|_| {
                ConfigError::invalid("LEADGATE_BIND", format!("{bind:?} is not a socket address"))
            })?;
        }
        if let Some(path) = lookup("LEADGATE_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(secret) = lookup("LEADGATE_JWT_SECRET") {
            self.jwt.secret = secret;
        }

        let admin_email = lookup("LEADGATE_ADMIN_EMAIL");
        let admin_password = lookup("LEADGATE_ADMIN_PASSWORD");
        if admin_email.is_some() || admin_password.is_some() {
            let admin = self.admin.get_or_insert_with(|| AdminSettings {
                email: String::new(),
                password: String::new(),
                full_name: default_admin_name(),
            });
            if let Some(email) = admin_email {
                admin.email = email;
            }
            if let Some(password) = admin_password {
                admin.password = password;
            }
        }
        Ok(())
    }

    /// Checks the settings are complete enough to start the server.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt
            .validate()
            .map_err(|e| ConfigError::invalid("jwt", e.to_string()))?;

        if let Some(email) = &self.email {
            email
                .validate()
                .map_err(|e| ConfigError::invalid("email", e.to_string()))?;
        }

        if let Some(admin) = &self.admin {
            if admin.email.trim().is_empty() {
                return Err(ConfigError::invalid("admin.email", "must not be empty"));
            }
            if admin.password.is_empty() {
                return Err(ConfigError::invalid("admin.password", "must not be empty"));
            }
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("database_path", "must not be empty"));
        }
        Ok(())
    }
}
