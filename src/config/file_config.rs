use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub identity_db: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,

    // Collaborator configs
    pub scrobbler: Option<ScrobblerConfig>,
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScrobblerConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_url: Option<String>,
    pub bearer_token: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let content = r#"
            identity_db = "/data/identity.db"
            port = 4000
            logging_level = "headers"

            [scrobbler]
            api_key = "secret"
            timeout_sec = 10

            [catalog]
            api_url = "https://catalog.example"
            bearer_token = "token"
        "#;

        let config: FileConfig = toml::from_str(content).unwrap();
        assert_eq!(config.identity_db.as_deref(), Some("/data/identity.db"));
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.logging_level.as_deref(), Some("headers"));

        let scrobbler = config.scrobbler.unwrap();
        assert_eq!(scrobbler.api_key.as_deref(), Some("secret"));
        assert_eq!(scrobbler.api_url, None);
        assert_eq!(scrobbler.timeout_sec, Some(10));

        let catalog = config.catalog.unwrap();
        assert_eq!(catalog.api_url.as_deref(), Some("https://catalog.example"));
        assert_eq!(catalog.bearer_token.as_deref(), Some("token"));
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.identity_db.is_none());
        assert!(config.scrobbler.is_none());
        assert!(config.catalog.is_none());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 5000").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.port, Some(5000));
    }

    #[test]
    fn load_of_missing_file_is_an_error() {
        let result = FileConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
