//! Configuration loading
//!
//! Read once at startup and handed, immutable, to every component.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strava: StravaConfig,
    pub github: GithubConfig,
}

/// Strava application credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StravaConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Base for the `authorize` and `token` endpoints
    pub oauth_base: String,
    pub api_base: String,
    /// Token cache, relative to the working directory unless absolute
    pub token_file: PathBuf,
    /// How far back to look for the latest activity
    pub lookback_hours: u32,
}

impl Default for StravaConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost/".to_string(),
            oauth_base: "https://www.strava.com/oauth".to_string(),
            api_base: "https://www.strava.com/api/v3".to_string(),
            token_file: PathBuf::from("strava_token.json"),
            lookback_hours: 24,
        }
    }
}

/// Target repository holding the site document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub token: String,
    /// `owner/name`
    pub repository: String,
    /// File to update within the repository
    pub path: String,
    /// Branch to read and commit to; the default branch when unset
    pub branch: Option<String>,
    pub api_base: String,
    /// Opening tag of the element new entries are inserted into
    pub marker: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            repository: String::new(),
            path: "index.html".to_string(),
            branch: None,
            api_base: "https://api.github.com".to_string(),
            marker: r#"<div class="logs">"#.to_string(),
        }
    }
}

impl Config {
    /// Get config file path
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "strava-sitelog", "strava-sitelog")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file yields defaults; secrets from the environment are
    /// applied on top either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::parse(&content)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("STRAVA_CLIENT_ID") {
            self.strava.client_id = v;
        }
        if let Some(v) = lookup("STRAVA_CLIENT_SECRET") {
            self.strava.client_secret = v;
        }
        if let Some(v) = lookup("GITHUB_TOKEN") {
            self.github.token = v;
        }
    }

    /// Check the Strava section is usable.
    pub fn validate_strava(&self) -> Result<()> {
        if self.strava.client_id.is_empty() || self.strava.client_secret.is_empty() {
            bail!("Strava client_id and client_secret must be set (config or STRAVA_CLIENT_*)");
        }
        if self.strava.lookback_hours == 0 {
            bail!("strava.lookback_hours must be positive");
        }
        Ok(())
    }

    /// Check the GitHub section is usable.
    pub fn validate_github(&self) -> Result<()> {
        if self.github.token.is_empty() {
            bail!("GitHub token must be set (config or GITHUB_TOKEN)");
        }
        let well_formed = match self.github.repository.split_once('/') {
            Some((owner, name)) => !owner.is_empty() && !name.is_empty() && !name.contains('/'),
            None => false,
        };
        if !well_formed {
            bail!(
                "github.repository must look like owner/name, got {:?}",
                self.github.repository
            );
        }
        if self.github.marker.is_empty() {
            bail!("github.marker must not be empty");
        }
        Ok(())
    }
}
