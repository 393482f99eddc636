use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS_FILE: &str = "spaceterminal.yaml";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("could not read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse settings file {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Client-side request budget
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RateLimitSettings {
    pub per_second: f64,
    pub burst: u32,
}

impl RateLimitSettings {
    pub fn is_valid(&self) -> bool {
        self.per_second.is_finite() && self.per_second > 0.0
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            per_second: 2.0,
            burst: 10,
        }
    }
}

/// How long to keep waiting out 429/502 responses before giving up
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub rate_limit: RateLimitSettings,
    pub retry: RetrySettings,
    pub token_file: PathBuf,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://api.spacetraders.io/v2".to_string(),
            timeout_secs: 10,
            rate_limit: RateLimitSettings::default(),
            retry: RetrySettings::default(),
            token_file: PathBuf::from("token.json"),
            log_file: PathBuf::from("spaceterminal.log"),
        }
    }
}

/// Settings along with what loading them noticed. Loading runs before the log
/// subscriber exists, so the caller logs these once it is installed.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub file_found: bool,
    pub warnings: Vec<String>,
}

impl Settings {
    /// Reads settings from a yaml file, falling back to defaults when the file does not exist,
    /// then applies environment overrides.
    pub fn load(path: &Path) -> Result<LoadedSettings, SettingsError> {
        let (mut settings, file_found) = match Self::from_yaml_file(path)? {
            Some(settings) => (settings, true),
            None => (Self::default(), false),
        };
        let warnings = settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(LoadedSettings {
            settings,
            file_found,
            warnings,
        })
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if !self.rate_limit.is_valid() {
            return Err(SettingsError::Invalid {
                field: "rate_limit.per_second",
                reason: format!("must be a positive number, got {}", self.rate_limit.per_second),
            });
        }
        Ok(())
    }

    /// `None` when there is no file at `path`
    fn from_yaml_file(path: &Path) -> Result<Option<Self>, SettingsError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        match serde_yaml::from_str(&contents) {
            Ok(settings) => Ok(Some(settings)),
            Err(source) => Err(SettingsError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Returns a warning for each override that had to be ignored
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(base_url) = var("SPACETRADERS_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(timeout) = var("SPACETRADERS_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warnings.push(format!(
                    "Ignoring SPACETRADERS_TIMEOUT_SECS, not a number: {}",
                    timeout
                )),
            }
        }
        if let Some(token_file) = var("SPACETRADERS_TOKEN_FILE") {
            self.token_file = PathBuf::from(token_file);
        }
        warnings
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
