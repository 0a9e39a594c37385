use anyhow::{Context, Result};
use clap::Parser;
use pagecast::app::{run_process_command, run_read_command};
use pagecast::cli::{Cli, Commands, ConfigAction};
use pagecast::config::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    tracing::debug!(version = %pagecast::version_string(), "pagecast starting");

    match cli.command {
        Commands::Process {
            document,
            out,
            jobs,
            timeout,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let failed =
                run_process_command(config, document, out, jobs, timeout, cli.quiet).await?;
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Read {
            document,
            lazy,
            jobs,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_read_command(config, document, lazy, jobs, cli.quiet).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Install the log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `-q` / `-v`.
fn init_tracing(quiet: bool, verbose: u8) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "pagecast=info",
        (false, _) => "pagecast=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/pagecast/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path).with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    let config_path = custom_path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                eprintln!(
                    "Config already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
                std::process::exit(1);
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&config_path, Config::default().to_toml()?)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("Wrote {}", config_path.display());
        }
    }

    Ok(())
}
