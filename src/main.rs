use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scrobble_gateway::catalog_link::{CatalogClient, CatalogSearch};
use scrobble_gateway::config::{AppConfig, CliConfig, FileConfig, DEFAULT_SCROBBLE_API_URL};
use scrobble_gateway::{
    run_server, LastfmClient, RequestsLoggingLevel, ServerConfig, SqliteIdentityStore,
};

fn parse_path(input: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(input);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(err).with_context(|| format!("Error resolving path: {}", input));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite database file for identity storage.
    #[clap(long, value_parser = parse_path)]
    pub identity_db: Option<PathBuf>,

    /// Path to a TOML config file. Values there override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3007)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the scrobbling service API.
    #[clap(long, default_value = DEFAULT_SCROBBLE_API_URL)]
    pub lastfm_api_url: String,

    /// API key for the scrobbling service.
    #[clap(long)]
    pub lastfm_api_key: Option<String>,

    /// Timeout in seconds for scrobbling service requests.
    #[clap(long, default_value_t = 30)]
    pub lastfm_timeout_sec: u64,

    /// Base URL of the external catalog service. Catalog link matching is
    /// disabled when unset.
    #[clap(long)]
    pub catalog_url: Option<String>,

    /// Bearer token for catalog search requests.
    #[clap(long)]
    pub catalog_token: Option<String>,

    /// Timeout in seconds for catalog service requests.
    #[clap(long, default_value_t = 30)]
    pub catalog_timeout_sec: u64,
}

impl CliArgs {
    fn into_cli_config(self) -> CliConfig {
        CliConfig {
            identity_db: self.identity_db,
            port: self.port,
            logging_level: self.logging_level,
            lastfm_api_url: Some(self.lastfm_api_url),
            lastfm_api_key: self.lastfm_api_key,
            lastfm_timeout_sec: Some(self.lastfm_timeout_sec),
            catalog_url: self.catalog_url,
            catalog_token: self.catalog_token,
            catalog_timeout_sec: Some(self.catalog_timeout_sec),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.into_cli_config(), file_config)?;

    info!("Opening SQLite identity database at {:?}...", config.identity_db);
    let identity_store = Arc::new(SqliteIdentityStore::new(&config.identity_db)?);

    let scrobbler = Arc::new(LastfmClient::new(
        &config.scrobbler.api_url,
        &config.scrobbler.api_key,
        config.scrobbler.timeout_sec,
    )?);

    let catalog: Option<Arc<dyn CatalogSearch>> = match &config.catalog {
        Some(settings) => {
            info!("Catalog service configured at {}", settings.api_url);
            Some(Arc::new(CatalogClient::new(
                &settings.api_url,
                &settings.bearer_token,
                settings.timeout_sec,
            )?))
        }
        None => {
            info!("No catalog service configured, link matching disabled");
            None
        }
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        ServerConfig {
            requests_logging_level: config.logging_level,
            port: config.port,
        },
        scrobbler,
        catalog,
        identity_store,
    )
    .await
}
