use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{LogSearchError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "~/.swo-cli.yaml";
pub const DEFAULT_API_URL: &str = "https://api.na-01.cloud.solarwinds.com";

pub const TOKEN_ENV: &str = "SWO_API_TOKEN";
pub const API_URL_ENV: &str = "SWO_API_URL";

/// 凭据：API 地址与 token。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(rename = "api-url", default)]
    api_url: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub api_url_env: Option<String>,
    pub api_url_flag: Option<String>,
}

impl Overrides {
    pub fn from_env(api_url_flag: Option<String>) -> Self {
        Self {
            token: std::env::var(TOKEN_ENV).ok(),
            api_url_env: std::env::var(API_URL_ENV).ok(),
            api_url_flag,
        }
    }
}

impl Config {
    /// Token: env > file. URL: env > flag > file > default.
    pub fn load(path: &str, overrides: Overrides) -> Result<Config> {
        let path = expand_home(path);
        let file = read_config_file(&path)?;

        let token = pick([overrides.token, file.token]).ok_or(LogSearchError::MissingToken)?;
        let api_url = pick([overrides.api_url_env, overrides.api_url_flag, file.api_url])
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Config { api_url, token })
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            // a missing file is fine as long as the env supplies the token
            if e.kind() == std::io::ErrorKind::NotFound {
                debug!("config file {} not found", path.display());
            } else {
                warn!("could not read config file {}: {}", path.display(), e);
            }
            return Ok(ConfigFile::default());
        }
    };
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&content).map_err(|e| LogSearchError::ConfigError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn pick<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|v| !v.is_empty())
}

/// Resolve a leading `~/` against `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_values_are_used_without_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swo.yaml");
        std::fs::write(&path, "api-url: https://logs.example.com\ntoken: abc123\n").unwrap();

        let cfg = Config::load(path.to_str().unwrap(), Overrides::default()).unwrap();
        assert_eq!(cfg.api_url, "https://logs.example.com");
        assert_eq!(cfg.token, "abc123");
    }

    #[test]
    fn env_beats_flag_beats_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swo.yaml");
        std::fs::write(&path, "api-url: https://file.example.com\ntoken: from-file\n").unwrap();

        let flag_only = Overrides {
            api_url_flag: Some("https://flag.example.com".into()),
            ..Default::default()
        };
        let cfg = Config::load(path.to_str().unwrap(), flag_only).unwrap();
        assert_eq!(cfg.api_url, "https://flag.example.com");

        let env = Overrides {
            token: Some("from-env".into()),
            api_url_env: Some("https://env.example.com".into()),
            api_url_flag: Some("https://flag.example.com".into()),
        };
        let cfg = Config::load(path.to_str().unwrap(), env).unwrap();
        assert_eq!(cfg.api_url, "https://env.example.com");
        assert_eq!(cfg.token, "from-env");
    }

    #[test]
    fn missing_file_needs_token_from_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let err = Config::load(path.to_str().unwrap(), Overrides::default()).unwrap_err();
        assert!(matches!(err, LogSearchError::MissingToken));

        let env = Overrides {
            token: Some("t".into()),
            ..Default::default()
        };
        let cfg = Config::load(path.to_str().unwrap(), env).unwrap();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "token: [unclosed\n").unwrap();

        let err = Config::load(path.to_str().unwrap(), Overrides::default()).unwrap_err();
        assert!(matches!(err, LogSearchError::ConfigError { .. }));
    }

    #[test]
    fn tilde_expands_to_home() {
        let Ok(home) = std::env::var("HOME") else { return };
        assert_eq!(expand_home("~/.swo-cli.yaml"), PathBuf::from(home).join(".swo-cli.yaml"));
        assert_eq!(expand_home("/etc/swo.yaml"), PathBuf::from("/etc/swo.yaml"));
    }
}
