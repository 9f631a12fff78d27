//! pricewatch CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use pricewatch::{
    commands::{
        cmd_add, cmd_chart, cmd_check, cmd_history, cmd_init, cmd_list, cmd_watch, print_added,
        print_chart_outcome, print_history, print_products, print_report, WatchOptions,
    },
    config::{Config, CONFIG_FILE_NAME},
    context::AppContext,
    error::Result,
    progress::LogWriterFactory,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(version, about = "Track product prices and get alerted when they drop", long_about = None)]
struct Cli {
    /// Path to config file (or the directory holding config.toml)
    #[arg(short, long, global = true, env = "PRICEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Add a product to track, or update its target price
    Add {
        /// Product page URL
        #[arg(long)]
        url: String,

        /// Alert when the price is at or below this amount
        #[arg(long)]
        target_price: f64,
    },

    /// Check every tracked product once
    Check,

    /// Check prices repeatedly until interrupted
    Watch {
        /// Hours between checks
        #[arg(long)]
        interval: Option<f64>,

        /// Skip the confirmation prompt for intervals under one hour
        #[arg(long)]
        yes: bool,
    },

    /// List tracked products with their latest price
    List,

    /// Show the price history of a product
    History {
        /// Product ID (see 'pricewatch list')
        product_id: i64,
    },

    /// Render a price history chart for a product
    Chart {
        /// Product ID (see 'pricewatch list')
        product_id: i64,

        /// Output image path (.svg or .png); defaults to the charts directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "pricewatch", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Init { force } => {
            let config = cmd_init(&config_path, force).await?;
            println!("✓ pricewatch initialized successfully");
            println!("  Config: {}", config.paths.config_file.display());
            println!("  Database: {}", config.paths.db_file.display());
            println!("\nNext steps:");
            println!("  1. Add an [email] section to the config to receive alerts");
            println!("  2. Track a product: pricewatch add --url <URL> --target-price <PRICE>");
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(&config_path)?;
    let ctx = AppContext::open(config).await?;

    let outcome = dispatch(&ctx, cli.command, cli.json).await;
    ctx.store.close().await;
    outcome
}

async fn dispatch(ctx: &AppContext, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Add { url, target_price } => {
            let added = cmd_add(ctx, &url, target_price).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&added)?);
            } else {
                print_added(&added);
            }
        }

        Commands::Check => {
            if !json {
                println!("Price Tracker - One-time Check");
                println!("==============================");
            }
            let report = cmd_check(ctx).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                println!("\nCompleted price check");
                println!("To set up regular price checking, run: pricewatch watch");
            }
        }

        Commands::Watch { interval, yes } => {
            let options = WatchOptions {
                interval_hours: interval,
                assume_yes: yes,
                json,
            };
            if let Some(summary) = cmd_watch(ctx, options).await? {
                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    println!(
                        "  Cycles completed: {} (failed: {})",
                        summary.cycles_completed, summary.cycles_failed
                    );
                }
            }
        }

        Commands::List => {
            let products = cmd_list(ctx).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&products)?);
            } else {
                print_products(&products);
            }
        }

        Commands::History { product_id } => {
            let history = cmd_history(ctx, product_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print_history(&history);
            }
        }

        Commands::Chart { product_id, output } => {
            let outcome = cmd_chart(ctx, product_id, output).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_chart_outcome(&outcome);
            }
        }

        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

/// `--config` may name the file itself or the directory that holds it.
///
/// An existing file is used as-is whatever its extension; a path that does
/// not exist yet is a file only when it ends in `.toml`.
fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(p) if !p.is_dir() && p.extension().map_or(false, |e| e == "toml") => {
            p.to_path_buf()
        }
        Some(dir) => dir.join(CONFIG_FILE_NAME),
        None => Config::default_config_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_config_path() {
        let tmp = TempDir::new().unwrap();

        let custom = tmp.path().join("pricewatch.conf");
        std::fs::write(&custom, "").unwrap();
        assert_eq!(resolve_config_path(Some(&custom)), custom);

        let fresh = tmp.path().join("fresh.toml");
        assert_eq!(resolve_config_path(Some(&fresh)), fresh);

        assert_eq!(
            resolve_config_path(Some(tmp.path())),
            tmp.path().join(CONFIG_FILE_NAME)
        );

        let missing_dir = tmp.path().join("state");
        assert_eq!(
            resolve_config_path(Some(&missing_dir)),
            missing_dir.join(CONFIG_FILE_NAME)
        );
    }
}
