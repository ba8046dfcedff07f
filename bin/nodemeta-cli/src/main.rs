//! nodemeta CLI - Inspect and update a node's local identity cache
//!
//! Usage:
//!   nodemeta-cli --role worker show
//!   nodemeta-cli --role server --cache-dir /var/lib/nodemeta/server set node-1
//!   nodemeta-cli path

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nodemeta_cache::{CacheState, LocalCache, MetaRecord, ServerMeta, WorkerMeta};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nodemeta-cli")]
#[command(about = "Inspect and update a node's local identity cache")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/nodemeta/node.toml")]
    config: String,

    /// Node role whose cache to use
    #[arg(long, value_enum)]
    role: Option<Role>,

    /// Cache directory (default depends on the role)
    #[arg(long)]
    cache_dir: Option<String>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the recorded node name
    Show {
        /// Print the whole record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a new node name
    Set {
        /// Name to assign
        name: String,

        /// Overwrite a cache that cannot be read or decoded
        #[arg(long)]
        force: bool,
    },
    /// Print the path of the record file
    Path,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
enum Role {
    Server,
    #[default]
    Worker,
}

impl Role {
    const fn default_cache_dir(self) -> &'static str {
        match self {
            Self::Server => "server_cache.data",
            Self::Worker => "worker_cache.data",
        }
    }
}

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
struct Config {
    #[serde(default)]
    node: NodeConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Default)]
struct NodeConfig {
    #[serde(default)]
    role: Role,
    #[serde(default)]
    cache_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoggingConfig {
    #[serde(default = "default_log_level")]
    level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load the config file, falling back to defaults if it does not exist
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Effective settings: CLI flags take precedence over the config file
#[derive(Debug, PartialEq, Eq)]
struct Settings {
    role: Role,
    cache_dir: PathBuf,
    log_level: String,
}

impl Settings {
    fn resolve(args: &Args, config: Config) -> Self {
        let role = args.role.unwrap_or(config.node.role);
        let cache_dir = args
            .cache_dir
            .clone()
            .or(config.node.cache_dir)
            .unwrap_or_else(|| role.default_cache_dir().to_string());
        let log_level = args.log_level.clone().unwrap_or(config.logging.level);

        Self {
            role,
            cache_dir: PathBuf::from(cache_dir),
            log_level,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(Path::new(&args.config))?;
    let settings = Settings::resolve(&args, config);

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match settings.role {
        Role::Server => run::<ServerMeta>(&args.command, &settings.cache_dir),
        Role::Worker => run::<WorkerMeta>(&args.command, &settings.cache_dir),
    }
}

fn run<R: MetaRecord>(command: &Commands, dir: &Path) -> Result<()> {
    match command {
        Commands::Show { json } => {
            if let Some(output) = show::<R>(dir, *json)? {
                println!("{output}");
            } else {
                println!("no {} identity recorded in {}", R::ROLE, dir.display());
            }
        }
        Commands::Set { name, force } => set_name::<R>(dir, name, *force)?,
        Commands::Path => println!("{}", LocalCache::<R>::new(dir).meta_path().display()),
    }
    Ok(())
}

/// Render the recorded identity, or `None` on first run
fn show<R: MetaRecord>(dir: &Path, json: bool) -> Result<Option<String>> {
    let cache = LocalCache::<R>::load(dir)
        .or_fresh()
        .context("failed to load local cache")?;
    if cache.state() == CacheState::Absent {
        return Ok(None);
    }

    let output = if json {
        serde_json::to_string_pretty(cache.record())?
    } else {
        cache.record().node_name().to_string()
    };
    Ok(Some(output))
}

fn set_name<R: MetaRecord>(dir: &Path, name: &str, force: bool) -> Result<()> {
    anyhow::ensure!(!name.is_empty(), "node name must not be empty");

    let (mut cache, err) = LocalCache::<R>::load(dir).into_parts();
    if let Some(e) = err.filter(|e| !e.is_not_found()) {
        if !force {
            return Err(e).context("failed to load local cache (use --force to overwrite)");
        }
        warn!("Overwriting unreadable {} cache: {}", R::ROLE, e);
    }

    let previous = cache.record().node_name().to_string();
    cache.record_mut().set_node_name(name.to_string());
    cache.write().context("failed to write local cache")?;

    if previous.is_empty() {
        info!("Assigned {} name: {}", R::ROLE, name);
    } else {
        info!("Renamed {}: {} -> {}", R::ROLE, previous, name);
    }
    Ok(())
}
