use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::UserId;
use crate::model::settings::UserSettings;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("display name cannot be empty")]
    EmptyDisplayName,

    #[error("invalid photo URL")]
    InvalidPhotoUrl,

    #[error("unknown auth provider: {0}")]
    UnknownProvider(String),

    #[error("credential accounts require a password hash")]
    MissingPasswordHash,
}

/// Lowercased, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// # Errors
    ///
    /// Returns `UserError::InvalidEmail` unless the value has text on both sides of one `@`.
    pub fn parse(raw: &str) -> Result<Self, UserError> {
        let value = raw.trim().to_lowercase();
        let Some((local, domain)) = value.split_once('@') else {
            return Err(UserError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') || value.contains(char::is_whitespace) {
            return Err(UserError::InvalidEmail);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Credentials,
    Google,
    Github,
}

impl AuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthProvider::Credentials => "credentials",
            AuthProvider::Google => "google",
            AuthProvider::Github => "github",
        }
    }
}

impl FromStr for AuthProvider {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credentials" => Ok(Self::Credentials),
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(UserError::UnknownProvider(other.to_owned())),
        }
    }
}

/// A validated account awaiting its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: Email,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub provider: AuthProvider,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// # Errors
    ///
    /// Returns `UserError` if the email, name or photo URL is invalid, or if a
    /// credentials account has no password hash.
    pub fn new(
        email: &str,
        display_name: &str,
        photo_url: Option<String>,
        provider: AuthProvider,
        password_hash: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if provider == AuthProvider::Credentials && password_hash.is_none() {
            return Err(UserError::MissingPasswordHash);
        }
        Ok(Self {
            email: Email::parse(email)?,
            display_name: validate_display_name(display_name)?,
            photo_url: validate_photo_url(photo_url)?,
            provider,
            password_hash,
            created_at,
        })
    }

    #[must_use]
    pub fn assign_id(self, id: UserId) -> User {
        User {
            id,
            email: self.email,
            display_name: self.display_name,
            photo_url: self.photo_url,
            provider: self.provider,
            password_hash: self.password_hash,
            settings: UserSettings::default(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    display_name: String,
    photo_url: Option<String>,
    provider: AuthProvider,
    password_hash: Option<String>,
    settings: UserSettings,
    created_at: DateTime<Utc>,
}

impl User {
    /// # Errors
    ///
    /// Returns `UserError` if persisted values no longer validate.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: UserId,
        email: &str,
        display_name: &str,
        photo_url: Option<String>,
        provider: AuthProvider,
        password_hash: Option<String>,
        settings: UserSettings,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let mut user =
            NewUser::new(email, display_name, photo_url, provider, password_hash, created_at)?
                .assign_id(id);
        user.settings = settings;
        Ok(user)
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    #[must_use]
    pub fn provider(&self) -> AuthProvider {
        self.provider
    }

    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    #[must_use]
    pub fn settings(&self) -> UserSettings {
        self.settings
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// # Errors
    ///
    /// Returns `UserError::EmptyDisplayName` if the name is blank.
    pub fn set_display_name(&mut self, name: &str) -> Result<(), UserError> {
        self.display_name = validate_display_name(name)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `UserError::InvalidPhotoUrl` if the URL does not parse.
    pub fn set_photo_url(&mut self, photo_url: Option<String>) -> Result<(), UserError> {
        self.photo_url = validate_photo_url(photo_url)?;
        Ok(())
    }

    pub fn set_settings(&mut self, settings: UserSettings) {
        self.settings = settings;
    }
}

fn validate_display_name(name: &str) -> Result<String, UserError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UserError::EmptyDisplayName);
    }
    Ok(trimmed.to_owned())
}

fn validate_photo_url(photo_url: Option<String>) -> Result<Option<String>, UserError> {
    let Some(raw) = photo_url.map(|p| p.trim().to_owned()).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    if Url::parse(&raw).is_err() {
        return Err(UserError::InvalidPhotoUrl);
    }
    Ok(Some(raw))
}
