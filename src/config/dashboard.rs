//! Dashboard preferences and profile (dashboard.yml)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// File holding dashboard state, next to `_config.yml`
pub const DASHBOARD_FILE: &str = "dashboard.yml";

/// Color scheme of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::System => "System",
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::invalid_field("theme", format!("unknown theme '{}'", s)))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interface language of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Id,
    Es,
    Fr,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Id, Language::Es, Language::Fr];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
            Language::Es => "es",
            Language::Fr => "fr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Id => "Bahasa Indonesia",
            Language::Es => "Español",
            Language::Fr => "Français",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Language::ALL
            .into_iter()
            .find(|l| l.code() == s)
            .ok_or_else(|| Error::invalid_field("language", format!("unknown language '{}'", s)))
    }
}

/// Dashboard settings form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub language: Language,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub newsletter: bool,
    pub two_factor_auth: bool,
    /// IANA time zone name
    pub timezone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            language: Language::En,
            email_notifications: true,
            push_notifications: false,
            newsletter: true,
            two_factor_auth: false,
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

impl Settings {
    /// Check the time zone against the IANA database
    pub fn validate(&self) -> Result<()> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map(|_| ())
            .map_err(|_| {
                Error::invalid_field("timezone", format!("unknown time zone '{}'", self.timezone))
            })
    }

    /// Current wall-clock time in the configured zone, if the zone is valid
    pub fn local_now(&self) -> Option<String> {
        let tz: chrono_tz::Tz = self.timezone.parse().ok()?;
        Some(
            chrono::Utc::now()
                .with_timezone(&tz)
                .format("%Y-%m-%d %H:%M %Z")
                .to_string(),
        )
    }
}

/// Admin profile shown in the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub avatar: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Admin User".to_string(),
            email: "admin@example.com".to_string(),
            bio: "Blog administrator and content creator.".to_string(),
            avatar: "https://ui-avatars.com/api/?name=Admin+User&background=6366f1&color=fff"
                .to_string(),
        }
    }
}

impl Profile {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_field("name", "name is required"));
        }
        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .map(|(user, domain)| !user.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(Error::invalid_field("email", "a valid email is required"));
        }
        Ok(())
    }
}

/// Everything stored in dashboard.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub settings: Settings,
    pub profile: Profile,
}

impl DashboardConfig {
    /// Load dashboard state, falling back to defaults when the file is absent
    /// or unreadable
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Self {
        let path = base_dir.as_ref().join(DASHBOARD_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring malformed {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write dashboard state back to disk
    pub fn save<P: AsRef<Path>>(&self, base_dir: P) -> Result<()> {
        let path = base_dir.as_ref().join(DASHBOARD_FILE);
        let yaml = serde_yaml::to_string(self)?;
        fs::write(&path, yaml)?;
        tracing::debug!("Saved dashboard state to {:?}", path);
        Ok(())
    }
}
