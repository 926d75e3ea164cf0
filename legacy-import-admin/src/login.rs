//! Interactive API login and token validation

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use legacy_import_core::{ApiError, ImportLogger};

use crate::client::{ApiClient, TokenRequest};
use crate::env_file;

pub const DEVICE_NAME: &str = "legacy-import-cli";

const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub device_name: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            device_name: DEVICE_NAME.to_string(),
        }
    }

    /// `API_EMAIL` and `API_PASSWORD`, both non-empty
    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup("API_EMAIL").filter(|v| !v.is_empty())?;
        let password = lookup("API_PASSWORD").filter(|v| !v.is_empty())?;
        Some(Self::new(email, password))
    }
}

pub struct LoginHelper {
    client: ApiClient,
    env_dir: PathBuf,
    logger: Option<ImportLogger>,
}

impl LoginHelper {
    pub fn new(base_url: &str, env_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(base_url)?,
            env_dir: env_dir.into(),
            logger: None,
        })
    }

    pub fn with_logger(mut self, logger: ImportLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.client = self.client.with_timeout(request_timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Credentials from the environment, otherwise from the terminal
    pub async fn get_credentials(&self) -> Result<Credentials> {
        if let Some(credentials) = Credentials::from_env_with(|key| std::env::var(key).ok()) {
            println!(
                "{}",
                format!("Using credentials from environment for: {}", credentials.email)
                    .bright_black()
            );
            return Ok(credentials);
        }
        prompt_credentials().await
    }

    /// Exchange credentials for a token
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let request = TokenRequest {
            email: &credentials.email,
            password: &credentials.password,
            device_name: &credentials.device_name,
        };

        let outcome = async {
            let response = self.client.acquire_token(&request).await?;
            response
                .token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| anyhow!("No token returned from API"))
        }
        .await;

        match outcome {
            Ok(token) => {
                info!(email = %credentials.email, "Token acquired");
                Ok(token)
            }
            Err(e) => {
                let e = e.context("Login failed");
                self.log_failure("Acquiring token", &e);
                Err(e)
            }
        }
    }

    /// Persist the token into `.env` in the configured directory
    pub fn save_token(&self, token: &str) -> Result<PathBuf> {
        let path = env_file::save_token(&self.env_dir, token)?;
        println!("{}", format!("✓ Token saved to {}", path.display()).green());
        Ok(path)
    }

    /// Call an authenticated endpoint with the token
    pub async fn test_token(&self, token: &str) -> Result<()> {
        let client = self.client.clone().with_token(token);
        match client.language_index().await {
            Ok(_) => {
                debug!("Token accepted");
                Ok(())
            }
            Err(e) => {
                let e = match ApiError::find_in(&e).map(|api| api.status) {
                    Some(403) => e.context(
                        "Access denied (403). The user account lacks the required \"view data\" permission.\n\
                         Please use an account with appropriate permissions or ask an administrator to grant you the necessary role.",
                    ),
                    Some(401) => {
                        e.context("Authentication failed (401). The token is invalid or expired.")
                    }
                    _ => e.context("Token validation failed"),
                };
                self.log_failure("Validating token", &e);
                Err(e)
            }
        }
    }

    /// Prompt, log in, save, and validate. Returns the token.
    pub async fn login_flow(&self) -> Result<String> {
        println!("{}", "\nLogin to Inventory Management API".bold().cyan());
        println!("{}", format!("API: {}\n", self.base_url()).bright_black());

        let credentials = self.get_credentials().await?;
        let token = self.login(&credentials).await?;
        self.save_token(&token)?;
        self.test_token(&token).await?;
        println!("{}", "✓ Token validated".green());
        Ok(token)
    }

    fn log_failure(&self, context: &str, err: &anyhow::Error) {
        if let Some(logger) = &self.logger {
            logger.error(context, err, &[("base_url", self.base_url().to_string())]);
        }
    }
}

async fn prompt_credentials() -> Result<Credentials> {
    let email = tokio::task::spawn_blocking(|| -> Result<String> {
        print!("Email: ");
        std::io::stdout().flush()?;
        let mut email = String::new();
        std::io::stdin().lock().read_line(&mut email)?;
        Ok(email.trim().to_string())
    })
    .await
    .context("Credential prompt failed")??;

    let password =
        prompt_with_timeout(PROMPT_TIMEOUT, || rpassword::prompt_password("Password: ")).await?;

    if email.is_empty() || password.is_empty() {
        return Err(anyhow!("Email and password are required"));
    }
    Ok(Credentials::new(email, password))
}

/// Run a blocking password prompt, giving up after `limit`
async fn prompt_with_timeout<F>(limit: Duration, prompt: F) -> Result<String>
where
    F: FnOnce() -> std::io::Result<String> + Send + 'static,
{
    timeout(limit, tokio::task::spawn_blocking(prompt))
        .await
        .map_err(|_| anyhow!("Timed out waiting for password"))?
        .context("Password prompt failed")?
        .context("Failed to read password")
}
