//! Legacy mwnf3 to inventory import tool
//!
//! Runs the foundation importers in dependency order against a legacy MySQL
//! database and the target inventory database.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use legacy_import::config::{ImportConfig, DEFAULT_CONFIG_FILE};
use legacy_import::driver::{self, Selection};
use legacy_import::legacy_db::{connect_pool, MySqlLegacyDatabase};
use legacy_import::{ImportContext, SampleCollector, SqlWriteStrategy};
use legacy_import_core::{init_tracing, ImportLogger};

#[derive(Parser)]
#[command(name = "legacy-import")]
#[command(about = "Import legacy mwnf3 data into the inventory database")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the import
    Import {
        /// Simulate the import without writing data
        #[arg(long)]
        dry_run: bool,

        /// Collect samples into the SQLite fixture file without writing
        #[arg(long)]
        sample_only: bool,

        /// Start from a specific importer
        #[arg(long, value_name = "IMPORTER")]
        start_at: Option<String>,

        /// Stop after a specific importer
        #[arg(long, value_name = "IMPORTER")]
        stop_at: Option<String>,

        /// Run only the given importer
        #[arg(long, value_name = "IMPORTER")]
        only: Option<String>,

        /// List available importers and exit
        #[arg(long)]
        list_importers: bool,
    },
    /// Check both database connections
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(if cli.verbose {
        "legacy_import=debug,legacy_import_core=debug"
    } else {
        "legacy_import=info,legacy_import_core=info"
    });

    let config = ImportConfig::load_with_env(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Import {
            dry_run,
            sample_only,
            start_at,
            stop_at,
            only,
            list_importers,
        } => {
            if list_importers {
                println!("{}", "\nAvailable Importers:\n".bold());
                for line in driver::list_importers(&driver::registry()) {
                    println!("  {}", line);
                }
                println!();
                return Ok(());
            }

            let selection = Selection {
                only,
                start_at,
                stop_at,
            };
            let has_errors = run_import(&config, selection, dry_run, sample_only).await?;
            if has_errors {
                std::process::exit(1);
            }
        }
        Commands::Validate => {
            if !validate(&config).await {
                println!("{}", "\n✗ Validation failed. Fix errors above before importing.".red());
                std::process::exit(1);
            }
            println!("{}", "\n✓ All connections validated successfully.".green());
        }
    }

    Ok(())
}

/// Run the selected importers. Returns true when any error was recorded.
async fn run_import(
    config: &ImportConfig,
    selection: Selection,
    dry_run: bool,
    sample_only: bool,
) -> Result<bool> {
    let entries = driver::registry();
    let selected = selection.select(&entries)?;

    let logger = ImportLogger::new("ImportDriver", &config.log_dir);
    println!("{}", "=".repeat(80).bold());
    println!("{}", "LEGACY IMPORT".bold().cyan());
    println!("{}", "=".repeat(80).bold());
    println!("{}", format!("Dry-run: {}", if dry_run { "YES" } else { "NO" }).bright_black());
    println!("{}", format!("Sample-only: {}", if sample_only { "YES" } else { "NO" }).bright_black());
    println!("{}", format!("Log file: {}", logger.log_file_path().display()).bright_black());

    info!("Connecting to databases");
    let legacy = Arc::new(MySqlLegacyDatabase::connect(&config.legacy_db).await?);
    let target_pool = connect_pool(&config.target_db)
        .await
        .context("Target database connection failed")?;
    let strategy = Arc::new(SqlWriteStrategy::new(target_pool)?);

    let mut ctx = ImportContext::new(legacy.clone(), strategy.clone(), &config.seed_dir)
        .with_dry_run(dry_run);
    if sample_only {
        let collector = SampleCollector::open(config.samples.clone()).await?;
        ctx = ctx.with_samples(collector, true);
    }

    let summary = driver::run(&mut ctx, &selected, &logger).await;

    if let Some(collector) = ctx.samples.as_ref() {
        match collector.stats().await {
            Ok(stats) => {
                for (category, count) in stats {
                    info!(category = %category, count, "Samples collected");
                }
            }
            Err(e) => error!("Failed to read sample stats: {:#}", e),
        }
        collector.close().await;
    }

    legacy.close().await;
    strategy.close().await;

    info!(
        imported = summary.imported(),
        skipped = summary.skipped(),
        errors = summary.errors(),
        warnings = summary.warnings(),
        "Import finished"
    );
    Ok(summary.has_errors())
}

/// Try both connections; print one line per database
async fn validate(config: &ImportConfig) -> bool {
    println!("{}", "Validating connections...\n".cyan());
    let mut ok = true;

    println!("Testing legacy database connection...");
    let legacy = async {
        let db = MySqlLegacyDatabase::connect(&config.legacy_db).await?;
        db.ping().await?;
        db.close().await;
        anyhow::Ok(())
    };
    match legacy.await {
        Ok(()) => println!("{}", "✓ Legacy database connection successful".green()),
        Err(e) => {
            ok = false;
            println!("{}", format!("✗ Legacy database connection failed: {:#}", e).red());
        }
    }

    println!("Testing target database connection...");
    let target = async {
        let strategy = SqlWriteStrategy::new(connect_pool(&config.target_db).await?)?;
        strategy.ping().await?;
        strategy.close().await;
        anyhow::Ok(())
    };
    match target.await {
        Ok(()) => println!("{}", "✓ Target database connection successful".green()),
        Err(e) => {
            ok = false;
            println!("{}", format!("✗ Target database connection failed: {:#}", e).red());
        }
    }

    ok
}
