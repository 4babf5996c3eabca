use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".pr-reviewer.toml";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SUMMARY_BODY: &str = "Automated code review by OpenAI";

pub const ENV_TOKEN: &str = "PAT_TOKEN";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_KEY_HEADER: &str = "OPENAI_API_KEY_HEADER";
pub const ENV_ENDPOINT: &str = "OPENAI_ENDPOINT";
pub const ENV_EVENT_PATH: &str = "GITHUB_EVENT_PATH";
pub const ENV_API_URL: &str = "GITHUB_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read event file {}: {source}", path.display())]
    EventRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse event file {}: {source}", path.display())]
    EventParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where a review comment is anchored inside the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineAnchor {
    /// Always line 1.
    #[default]
    Placeholder,
    /// First added line of the patch, in new-file numbering.
    FirstChange,
}

/// Optional settings read from .pr-reviewer.toml.
/// Secrets never come from this file, only from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub github: FileGitHub,
    #[serde(default)]
    pub completion: FileCompletion,
    #[serde(default)]
    pub review: FileReview,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileGitHub {
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileCompletion {
    pub endpoint: Option<String>,
    pub api_key_header: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileReview {
    pub summary_body: Option<String>,
    pub anchor: Option<LineAnchor>,
}

impl FileConfig {
    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Process-wide settings, resolved once in main and passed by reference.
#[derive(Clone)]
pub struct Config {
    pub github: GitHubConfig,
    pub completion: CompletionConfig,
    pub review: ReviewConfig,
    /// Path to the event descriptor JSON.
    pub event_path: PathBuf,
}

#[derive(Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
}

#[derive(Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_key_header: String,
}

#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub summary_body: String,
    pub anchor: LineAnchor,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            summary_body: DEFAULT_SUMMARY_BODY.to_string(),
            anchor: LineAnchor::Placeholder,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github", &self.github)
            .field("completion", &self.completion)
            .field("review", &self.review)
            .field("event_path", &self.event_path)
            .finish()
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_key_header", &self.api_key_header)
            .finish()
    }
}

impl Config {
    /// Load configuration for this process.
    ///
    /// Reads `config_path` if given, otherwise .pr-reviewer.toml in the
    /// current directory when it exists, then layers the environment on top.
    /// `event_override` wins over GITHUB_EVENT_PATH.
    pub fn load(
        config_path: Option<&Path>,
        event_override: Option<&Path>,
    ) -> Result<Config, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::load_from(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    FileConfig::load_from(path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Self::resolve(file, event_override, |key| std::env::var(key).ok())
    }

    /// Merge file settings with values from `lookup` (environment wins).
    pub fn resolve<F>(
        file: FileConfig,
        event_override: Option<&Path>,
        lookup: F,
    ) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str, fallback: Option<String>| {
            get(key).or(fallback).ok_or(ConfigError::MissingVar(key))
        };

        let token = require(ENV_TOKEN, None)?;
        let api_key = require(ENV_API_KEY, None)?;
        let api_key_header = require(ENV_API_KEY_HEADER, file.completion.api_key_header)?;
        let endpoint = require(ENV_ENDPOINT, file.completion.endpoint)?;

        let event_path = match event_override {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(require(ENV_EVENT_PATH, None)?),
        };

        let api_url = get(ENV_API_URL)
            .or(file.github.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let defaults = ReviewConfig::default();
        let review = ReviewConfig {
            summary_body: file.review.summary_body.unwrap_or(defaults.summary_body),
            anchor: file.review.anchor.unwrap_or(defaults.anchor),
        };

        Ok(Config {
            github: GitHubConfig { api_url, token },
            completion: CompletionConfig {
                endpoint,
                api_key,
                api_key_header,
            },
            review,
            event_path,
        })
    }
}
