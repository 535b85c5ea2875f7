use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::work_session::EnvironmentSnapshot;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(SettingsError::UnknownTheme(s.to_owned())),
        }
    }
}

/// Which parts of the working environment get recorded with a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCapture {
    pub enabled: bool,
    pub capture_open_apps: bool,
    pub capture_browser_tabs: bool,
}

impl SessionCapture {
    /// Keeps only the parts of `snapshot` the user opted into.
    #[must_use]
    pub fn filter(&self, snapshot: Option<EnvironmentSnapshot>) -> Option<EnvironmentSnapshot> {
        if !self.enabled {
            return None;
        }
        let snapshot = snapshot?;
        let filtered = EnvironmentSnapshot {
            open_apps: if self.capture_open_apps {
                snapshot.open_apps
            } else {
                Vec::new()
            },
            browser_tabs: if self.capture_browser_tabs {
                snapshot.browser_tabs
            } else {
                Vec::new()
            },
        };
        (!filtered.is_empty()).then_some(filtered)
    }
}

/// Per-user preferences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserSettings {
    theme: Theme,
    notifications: bool,
    session_capture: SessionCapture,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            notifications: true,
            session_capture: SessionCapture::default(),
        }
    }
}

impl UserSettings {
    #[must_use]
    pub fn from_persisted(theme: Theme, notifications: bool, session_capture: SessionCapture) -> Self {
        Self {
            theme,
            notifications,
            session_capture,
        }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn notifications(&self) -> bool {
        self.notifications
    }

    #[must_use]
    pub fn session_capture(&self) -> SessionCapture {
        self.session_capture
    }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct UserSettingsDraft {
    pub theme: Option<String>,
    pub notifications: Option<bool>,
    pub capture_enabled: Option<bool>,
    pub capture_open_apps: Option<bool>,
    pub capture_browser_tabs: Option<bool>,
}

impl UserSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft and apply it over `current`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::UnknownTheme` if the theme is not recognised.
    pub fn apply_to(self, current: UserSettings) -> Result<UserSettings, SettingsError> {
        let theme = match self.theme {
            Some(raw) => raw.parse()?,
            None => current.theme,
        };
        let capture = current.session_capture;

        Ok(UserSettings {
            theme,
            notifications: self.notifications.unwrap_or(current.notifications),
            session_capture: SessionCapture {
                enabled: self.capture_enabled.unwrap_or(capture.enabled),
                capture_open_apps: self.capture_open_apps.unwrap_or(capture.capture_open_apps),
                capture_browser_tabs: self
                    .capture_browser_tabs
                    .unwrap_or(capture.capture_browser_tabs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::work_session::BrowserTab;

    fn snapshot() -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            open_apps: vec!["editor".into()],
            browser_tabs: vec![BrowserTab {
                title: "docs".into(),
                url: "https://docs.rs".into(),
            }],
        }
    }

    #[test]
    fn defaults() {
        let s = UserSettings::default();
        assert_eq!(s.theme(), Theme::System);
        assert!(s.notifications());
        assert!(!s.session_capture().enabled);
    }

    #[test]
    fn draft_applies_only_given_fields() {
        let draft = UserSettingsDraft {
            theme: Some(" Dark ".into()),
            capture_enabled: Some(true),
            ..UserSettingsDraft::new()
        };
        let s = draft.apply_to(UserSettings::default()).unwrap();
        assert_eq!(s.theme(), Theme::Dark);
        assert!(s.notifications());
        assert!(s.session_capture().enabled);
        assert!(!s.session_capture().capture_open_apps);
    }

    #[test]
    fn draft_rejects_unknown_theme() {
        let draft = UserSettingsDraft {
            theme: Some("sepia".into()),
            ..UserSettingsDraft::new()
        };
        let err = draft.apply_to(UserSettings::default()).unwrap_err();
        assert_eq!(err, SettingsError::UnknownTheme("sepia".into()));
    }

    #[test]
    fn capture_disabled_stores_nothing() {
        let capture = SessionCapture {
            enabled: false,
            capture_open_apps: true,
            capture_browser_tabs: true,
        };
        assert_eq!(capture.filter(Some(snapshot())), None);
    }

    #[test]
    fn capture_keeps_enabled_parts() {
        let capture = SessionCapture {
            enabled: true,
            capture_open_apps: false,
            capture_browser_tabs: true,
        };
        let kept = capture.filter(Some(snapshot())).unwrap();
        assert!(kept.open_apps.is_empty());
        assert_eq!(kept.browser_tabs.len(), 1);
    }

    #[test]
    fn capture_with_nothing_selected_is_none() {
        let capture = SessionCapture {
            enabled: true,
            capture_open_apps: false,
            capture_browser_tabs: false,
        };
        assert_eq!(capture.filter(Some(snapshot())), None);
    }
}
