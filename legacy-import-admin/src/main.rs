//! Legacy Import Admin - API token management for the inventory importer

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use legacy_import_core::{init_tracing, ImportLogger};

mod client;
mod env_file;
mod login;

use client::DEFAULT_BASE_URL;
use login::LoginHelper;

#[derive(Parser)]
#[command(name = "legacy-import-admin")]
#[command(about = "Log in to the inventory API and manage the import token")]
#[command(version)]
struct Cli {
    /// API base URL
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory holding the .env file
    #[arg(long, default_value = ".")]
    env_dir: PathBuf,

    /// Directory for the log file
    #[arg(long, env = "IMPORT_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a token and store it in .env
    Login,
    /// Check that a token is accepted by the API
    TestToken {
        /// Token to test (defaults to API_TOKEN)
        #[arg(long, env = "API_TOKEN")]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(if cli.verbose {
        "legacy_import_admin=debug,legacy_import_core=debug"
    } else {
        "legacy_import_admin=info,legacy_import_core=info"
    });

    let logger = ImportLogger::new("LoginHelper", &cli.log_dir);
    let helper = LoginHelper::new(&cli.base_url, &cli.env_dir)?.with_logger(logger);

    let outcome = match cli.command {
        Commands::Login => helper.login_flow().await.map(|_| ()),
        Commands::TestToken { token } => match token.filter(|t| !t.is_empty()) {
            Some(token) => helper.test_token(&token).await.map(|_| {
                println!("{}", "✓ Token is valid".green());
            }),
            None => Err(anyhow!("No token given and API_TOKEN is not set")),
        },
    };

    if let Err(e) = outcome {
        eprintln!("{}", format!("✗ {:#}", e).red());
        std::process::exit(1);
    }
    Ok(())
}
