use anyhow::{Context, Result};
use clap::Parser;
use orderload_config::{ConfigLoader, OrderloadConfig};
use orderload_engine::{EntityStateStore, LoadRunner, StateSnapshot};
use orderload_logging::{init_logging_from_config, init_simple_tracing};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod cli;
use cli::{Cli, Commands, ConfigCommands, StateCommands};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<OrderloadConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize logging from config; `--log-level` replaces the configured level
fn init_logging_with_config(config: &OrderloadConfig, log_level: Option<&String>) -> Result<()> {
    let mut logging = config.logging.clone();
    if let Some(level) = log_level {
        match level.parse() {
            Ok(level) => logging.level = level,
            Err(e) => eprintln!("{}, keeping '{}'", e, logging.level),
        }
    }
    init_logging_from_config(&logging)
}

/// Command-line overrides for a run, applied over file and environment
fn apply_run_overrides(
    config: &mut OrderloadConfig,
    duration: Option<u64>,
    users: Option<usize>,
    max_concurrency: Option<usize>,
) {
    if let Some(seconds) = duration {
        config.load.duration = Duration::from_secs(seconds);
    }
    if let Some(users) = users {
        config.load.simulated_users = users;
    }
    if let Some(max_concurrency) = max_concurrency {
        config.load.max_concurrent_requests = max_concurrency;
    }
}

async fn run_command(config: &OrderloadConfig) -> Result<()> {
    config
        .validate_all()
        .context("Invalid configuration after command-line overrides")?;

    let runner = LoadRunner::connect(config)
        .await
        .context("Failed to prepare load run")?;
    let summary = runner.run().await;

    println!("{}", summary.report);
    println!(
        "Waves: {}, dispatched: {}, skipped: {}",
        summary.stats.waves, summary.stats.dispatched, summary.stats.skipped
    );

    let path = summary
        .into_results_path()
        .context("Failed to save run results")?;
    println!("Results saved to {}", path.display());
    Ok(())
}

/// Handle configuration validation
fn handle_config_validate(config_file: Option<&PathBuf>) -> Result<()> {
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(anyhow::anyhow!("Configuration file not found: {:?}", path));
        }
    }

    match load_config(config_file) {
        Ok(_config) => {
            println!("Configuration is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {:#}", e);
            error!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: Option<&PathBuf>, force: bool) -> Result<()> {
    let sample = OrderloadConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", sample);
        return Ok(());
    };

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(output, sample).context(format!("Failed to write {:?}", output))?;

    println!("Sample configuration written to {:?}", output);
    Ok(())
}

fn describe_state(dir: &Path, snapshot: &StateSnapshot) -> String {
    let closed = snapshot.closed_orders.len();
    let items: usize = snapshot.order_items.values().map(Vec::len).sum();
    format!(
        "State directory: {}\nOrders: {} ({} open, {} closed)\nItems: {}",
        dir.display(),
        snapshot.orders.len(),
        snapshot.orders.len().saturating_sub(closed),
        closed,
        items
    )
}

async fn handle_state_show(config: &OrderloadConfig, json: bool) -> Result<()> {
    let dir = &config.storage.state_dir;
    let snapshot = EntityStateStore::open(dir).await.snapshot().await;

    if json {
        let formatted =
            serde_json::to_string_pretty(&snapshot).context("Failed to format state as JSON")?;
        println!("{}", formatted);
    } else {
        println!("{}", describe_state(dir, &snapshot));
    }
    Ok(())
}

async fn handle_state_reset(config: &OrderloadConfig) -> Result<()> {
    let dir = &config.storage.state_dir;
    let store = EntityStateStore::open(dir).await;
    let forgotten = store.len().await;

    store
        .reset()
        .await
        .context(format!("Failed to reset state in {:?}", dir))?;

    println!("Forgot {} orders in {}", forgotten, dir.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = ConfigLoader::load_dotenv().context("Failed to read .env")? {
        debug!("Loaded environment from {:?}", path);
    }

    // Config commands must work even when the configuration does not load
    if let Some(Commands::Config { config_cmd }) = &cli.command {
        init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
        return match config_cmd {
            ConfigCommands::Validate { config_file } => {
                handle_config_validate(config_file.as_ref().or(cli.config.as_ref()))
            }
            ConfigCommands::Generate { output, force } => {
                handle_config_generate(output.as_ref(), *force)
            }
        };
    }

    let mut config = load_config(cli.config.as_ref())?;
    init_logging_with_config(&config, cli.log_level.as_ref())?;
    info!("Orderload CLI starting");

    match &cli.command {
        Some(Commands::Run {
            duration,
            users,
            max_concurrency,
        }) => {
            apply_run_overrides(&mut config, *duration, *users, *max_concurrency);
            run_command(&config).await
        }
        Some(Commands::State { state_cmd }) => match state_cmd {
            StateCommands::Show { json } => handle_state_show(&config, *json).await,
            StateCommands::Reset => handle_state_reset(&config).await,
        },
        Some(Commands::Config { .. }) => Ok(()),
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
