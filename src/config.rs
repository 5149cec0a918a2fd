use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::SizeMeasure;
use crate::api::client::{DEFAULT_API_BASE, DEFAULT_USER_AGENT};
use crate::page::ReadyPolicy;

/// Environment variable that overrides the configured access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Configuration loaded from `~/.config/repo-size/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the REST API.
    pub api_base: String,
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Unit selected when a page is first annotated.
    #[serde(default)]
    pub default_unit: SizeMeasure,
    /// How long to wait for the listing table; built-in defaults when missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<ReadyPolicy>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            access_token: None,
            default_unit: SizeMeasure::Auto,
            ready: None,
        }
    }
}

impl AppConfig {
    pub fn ready_policy(&self) -> ReadyPolicy {
        self.ready.unwrap_or_default()
    }

    /// Token precedence: explicit value, then `GITHUB_TOKEN`, then the file.
    pub fn resolve_token(&self, explicit: Option<String>) -> Option<String> {
        explicit
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .or_else(|| self.access_token.clone())
            .filter(|t| !t.trim().is_empty())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("repo-size")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn load_from(path: &Path) -> Result<AppConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: AppConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AppConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api_base, "https://api.github.com");
        assert_eq!(cfg.user_agent, "repo-size");
        assert_eq!(cfg.default_unit, SizeMeasure::Auto);
        assert_eq!(cfg.ready_policy(), ReadyPolicy::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.api_base, cfg.api_base);
        assert_eq!(parsed.default_unit, cfg.default_unit);
        assert!(parsed.access_token.is_none());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            api_base = "https://ghe.example.com/api/v3"
            user_agent = "me"
            access_token = "abc"
            default_unit = "kb"

            [ready]
            max_attempts = 2
            base_delay = 100
            max_delay = 400
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.api_base, "https://ghe.example.com/api/v3");
        assert_eq!(cfg.default_unit, SizeMeasure::KB);
        let ready = cfg.ready_policy();
        assert_eq!(ready.max_attempts, 2);
        assert_eq!(ready.base_delay, Duration::from_millis(100));
        assert_eq!(ready.max_delay, Duration::from_millis(400));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let toml = r#"
            api_base = "https://api.github.com"
            user_agent = "me"
            default_unit = "furlongs"
        "#;
        assert!(toml::from_str::<AppConfig>(toml).is_err());
    }

    #[test]
    fn explicit_token_wins() {
        let cfg = AppConfig {
            access_token: Some("from-file".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.resolve_token(Some("cli".into())).as_deref(), Some("cli"));
        assert_eq!(cfg.resolve_token(Some("  ".into())), None);
    }
}
