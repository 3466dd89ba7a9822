mod file_config;

pub use file_config::{CatalogConfig, FileConfig, ScrobblerConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// Public endpoint of the Last.fm-compatible API, used when no override is
/// configured.
pub const DEFAULT_SCROBBLE_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

const DEFAULT_TIMEOUT_SEC: u64 = 30;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML
/// config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub identity_db: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub lastfm_api_url: Option<String>,
    pub lastfm_api_key: Option<String>,
    pub lastfm_timeout_sec: Option<u64>,
    pub catalog_url: Option<String>,
    pub catalog_token: Option<String>,
    pub catalog_timeout_sec: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub identity_db: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub scrobbler: ScrobblerSettings,
    /// Absent when no catalog URL is configured; link matching is then
    /// skipped entirely.
    pub catalog: Option<CatalogSettings>,
}

#[derive(Debug, Clone)]
pub struct ScrobblerSettings {
    pub api_url: String,
    pub api_key: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_url: String,
    pub bearer_token: String,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let identity_db = file
            .identity_db
            .map(PathBuf::from)
            .or_else(|| cli.identity_db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("identity_db must be specified via --identity-db or in config file")
            })?;

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|level| parse_logging_level(&level))
            .unwrap_or_else(|| cli.logging_level.clone());

        let scrobbler_file = file.scrobbler.unwrap_or_default();
        let api_key = scrobbler_file
            .api_key
            .or_else(|| cli.lastfm_api_key.clone());
        let Some(api_key) = api_key else {
            bail!("a scrobble service API key must be specified via --lastfm-api-key or in config file");
        };
        let scrobbler = ScrobblerSettings {
            api_url: scrobbler_file
                .api_url
                .or_else(|| cli.lastfm_api_url.clone())
                .unwrap_or_else(|| DEFAULT_SCROBBLE_API_URL.to_string()),
            api_key,
            timeout_sec: scrobbler_file
                .timeout_sec
                .or(cli.lastfm_timeout_sec)
                .unwrap_or(DEFAULT_TIMEOUT_SEC),
        };

        let catalog_file = file.catalog.unwrap_or_default();
        let catalog_url = catalog_file.api_url.or_else(|| cli.catalog_url.clone());
        let catalog = catalog_url.map(|api_url| CatalogSettings {
            api_url,
            bearer_token: catalog_file
                .bearer_token
                .or_else(|| cli.catalog_token.clone())
                .unwrap_or_default(),
            timeout_sec: catalog_file
                .timeout_sec
                .or(cli.catalog_timeout_sec)
                .unwrap_or(DEFAULT_TIMEOUT_SEC),
        });

        Ok(Self {
            identity_db,
            port,
            logging_level,
            scrobbler,
            catalog,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(level: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(level, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> CliConfig {
        CliConfig {
            identity_db: Some(PathBuf::from("/data/identity.db")),
            port: 3007,
            logging_level: RequestsLoggingLevel::Path,
            lastfm_api_key: Some("cli-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_from_cli_only() {
        let config = AppConfig::resolve(&base_cli(), None).unwrap();

        assert_eq!(config.identity_db, PathBuf::from("/data/identity.db"));
        assert_eq!(config.port, 3007);
        assert_eq!(config.scrobbler.api_url, DEFAULT_SCROBBLE_API_URL);
        assert_eq!(config.scrobbler.api_key, "cli-key");
        assert_eq!(config.scrobbler.timeout_sec, 30);
        assert!(config.catalog.is_none());
    }

    #[test]
    fn toml_overrides_cli() {
        let file = FileConfig {
            identity_db: Some("/toml/identity.db".to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            scrobbler: Some(ScrobblerConfig {
                api_key: Some("toml-key".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&base_cli(), Some(file)).unwrap();

        assert_eq!(config.identity_db, PathBuf::from("/toml/identity.db"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.scrobbler.api_key, "toml-key");
    }

    #[test]
    fn missing_identity_db_is_an_error() {
        let cli = CliConfig {
            lastfm_api_key: Some("key".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("identity_db must be specified"));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let cli = CliConfig {
            identity_db: Some(PathBuf::from("/data/identity.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("API key"));
    }

    #[test]
    fn catalog_disabled_without_url() {
        let config = AppConfig::resolve(&base_cli(), None).unwrap();
        assert!(config.catalog.is_none());
    }

    #[test]
    fn catalog_enabled_with_url() {
        let mut cli = base_cli();
        cli.catalog_url = Some("https://catalog.example".to_string());
        cli.catalog_token = Some("token".to_string());

        let config = AppConfig::resolve(&cli, None).unwrap();
        let catalog = config.catalog.unwrap();
        assert_eq!(catalog.api_url, "https://catalog.example");
        assert_eq!(catalog.bearer_token, "token");
        assert_eq!(catalog.timeout_sec, 30);
    }

    #[test]
    fn unknown_logging_level_in_toml_keeps_cli_value() {
        let file = FileConfig {
            logging_level: Some("chatty".to_string()),
            ..Default::default()
        };
        let mut cli = base_cli();
        cli.logging_level = RequestsLoggingLevel::Headers;

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
    }
}
