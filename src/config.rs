//! Configuration management for the Targetprocess MCP server.
//!
//! Settings come from environment variables first and fall back to a JSON
//! file (`~/.config/targetprocess/config.json`, or the path in
//! `TARGETPROCESS_CONFIG`). The two sources are merged field by field and
//! then validated into a [`Config`] carrying exactly one credential form.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::TpError;

/// Environment variable holding the instance URL.
pub const URL_VAR: &str = "TARGETPROCESS_URL";
/// Environment variable holding the access token.
pub const TOKEN_VAR: &str = "TARGETPROCESS_TOKEN";
/// Environment variable holding the basic-auth username.
pub const USERNAME_VAR: &str = "TARGETPROCESS_USERNAME";
/// Environment variable holding the basic-auth password.
pub const PASSWORD_VAR: &str = "TARGETPROCESS_PASSWORD";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_VAR: &str = "TARGETPROCESS_CONFIG";

/// How requests authenticate against Targetprocess.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Access token, sent as the basic-auth password with an empty username.
    Token(String),
    /// Plain username and password.
    Basic {
        /// Login name.
        username: String,
        /// Password. Never logged.
        password: String,
    },
}

impl Credentials {
    /// Returns the secret values that must be redacted from messages.
    pub fn secrets(&self) -> Vec<&str> {
        match self {
            Credentials::Token(token) => vec![token.as_str()],
            Credentials::Basic { password, .. } => vec![password.as_str()],
        }
    }

    /// Short label for logging.
    pub fn mode(&self) -> &'static str {
        match self {
            Credentials::Token(_) => "token",
            Credentials::Basic { .. } => "basic",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token([REDACTED])"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Fully resolved configuration for connecting to Targetprocess.
#[derive(Clone, Debug)]
pub struct Config {
    /// Instance URL without trailing slash (e.g., `https://acme.tpondemand.com`).
    pub base_url: String,

    /// The single credential form in use.
    pub credentials: Credentials,
}

/// Unvalidated settings from one source.
///
/// Blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Instance URL.
    #[serde(rename = "TARGETPROCESS_URL", default)]
    pub url: Option<String>,
    /// Access token.
    #[serde(rename = "TARGETPROCESS_TOKEN", default)]
    pub token: Option<String>,
    /// Basic-auth username.
    #[serde(rename = "TARGETPROCESS_USERNAME", default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(rename = "TARGETPROCESS_PASSWORD", default)]
    pub password: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`non_blank`] but keeps surrounding whitespace, which may be part of a secret.
fn non_blank_verbatim(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Reads settings through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup(URL_VAR),
            token: lookup(TOKEN_VAR),
            username: lookup(USERNAME_VAR),
            password: lookup(PASSWORD_VAR),
        }
        .normalized()
    }

    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings from a JSON config file.
    ///
    /// A missing file yields empty settings. An unreadable or malformed file
    /// is logged and also yields empty settings.
    pub fn from_file(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<Settings>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load config file");
                Self::default()
            }
        }
    }

    fn normalized(self) -> Self {
        Self {
            url: non_blank(self.url),
            token: non_blank_verbatim(self.token),
            username: non_blank_verbatim(self.username),
            password: non_blank_verbatim(self.password),
        }
    }

    /// Fills fields missing here from `fallback`.
    #[must_use]
    pub fn merge(self, fallback: Settings) -> Settings {
        Settings {
            url: self.url.or(fallback.url),
            token: self.token.or(fallback.token),
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
        }
    }

    /// Returns true when a URL and at least one full credential are present.
    pub fn is_complete(&self) -> bool {
        self.url.is_some()
            && (self.token.is_some() || (self.username.is_some() && self.password.is_some()))
    }

    /// Validates the settings into a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns `TpError::Config` if the URL is missing or malformed, if no
    /// credential is present, or if both a token and a username/password pair
    /// are present.
    pub fn resolve(self) -> Result<Config, TpError> {
        let url = self.url.ok_or_else(|| TpError::missing_setting(URL_VAR))?;
        let base_url = validate_base_url(&url)?;

        let basic = match (self.username, self.password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        };

        let credentials = match (self.token, basic) {
            (Some(_), Some(_)) => {
                return Err(TpError::invalid_config(format!(
                    "both {} and {}/{} are set; configure exactly one authentication mode",
                    TOKEN_VAR, USERNAME_VAR, PASSWORD_VAR
                )))
            }
            (Some(token), None) => Credentials::Token(token),
            (None, Some((username, password))) => Credentials::Basic { username, password },
            (None, None) => {
                return Err(TpError::invalid_config(format!(
                    "either {} or {}/{} is required (check environment variables or {})",
                    TOKEN_VAR,
                    USERNAME_VAR,
                    PASSWORD_VAR,
                    default_config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "the config file".to_string())
                )))
            }
        };

        for secret in credentials.secrets() {
            validate_secret(secret)?;
        }

        Ok(Config {
            base_url,
            credentials,
        })
    }
}

/// Returns `~/.config/targetprocess/config.json`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("targetprocess").join("config.json"))
}

impl Config {
    /// Loads configuration from the environment, falling back to the config file.
    ///
    /// The file is only read when the environment does not already provide a
    /// URL and a complete credential.
    ///
    /// # Errors
    ///
    /// Returns `TpError::Config` if the merged settings do not validate.
    pub fn load() -> Result<Self, TpError> {
        let file = env::var(CONFIG_PATH_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_config_path);
        Self::from_sources(Settings::from_env(), file.as_deref())
    }

    /// Resolves configuration from explicit sources.
    pub fn from_sources(env: Settings, file: Option<&Path>) -> Result<Self, TpError> {
        let settings = if env.is_complete() {
            env
        } else {
            match file {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Environment incomplete, reading config file");
                    env.merge(Settings::from_file(path))
                }
                None => env,
            }
        };
        settings.resolve()
    }
}

/// Validates and normalizes the base URL.
fn validate_base_url(raw: &str) -> Result<String, TpError> {
    let trimmed = raw.trim().trim_end_matches('/');

    let parsed = Url::parse(trimmed).map_err(|e| {
        TpError::invalid_config(format!("{} is not a valid URL: {}", URL_VAR, e))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(TpError::invalid_config(format!(
            "{} must start with http:// or https://",
            URL_VAR
        )));
    }

    Ok(trimmed.to_string())
}

/// Rejects secrets that are obviously copied from an example file.
fn validate_secret(secret: &str) -> Result<(), TpError> {
    let lower = secret.to_lowercase();
    let placeholders = ["your_token", "your_password", "placeholder", "changeme"];

    if placeholders.iter().any(|p| lower.contains(p)) {
        return Err(TpError::invalid_config(
            "credential appears to be a placeholder value",
        ));
    }

    Ok(())
}
