//! `.env` token persistence

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Set `API_TOKEN` in env file content.
///
/// Replaces an existing `API_TOKEN=` line, else inserts right after
/// `API_BASE_URL=`, else appends.
pub fn upsert_token(content: &str, token: &str) -> Result<String> {
    let token_line = Regex::new(r"(?m)^API_TOKEN=.*$")?;
    let line = format!("API_TOKEN={}", token);

    if token_line.is_match(content) {
        return Ok(token_line
            .replace(content, regex::NoExpand(&line))
            .into_owned());
    }

    let base_url_line = Regex::new(r"(?m)^API_BASE_URL=.*$")?;
    if let Some(m) = base_url_line.find(content) {
        let mut updated = String::with_capacity(content.len() + line.len() + 1);
        updated.push_str(&content[..m.end()]);
        updated.push('\n');
        updated.push_str(&line);
        updated.push_str(&content[m.end()..]);
        return Ok(updated);
    }

    Ok(format!("{}\n{}\n", content, line))
}

/// Write the token into `<dir>/.env`, seeding it from `.env.example` when
/// no `.env` exists yet. Returns the written path.
pub fn save_token(dir: &Path, token: &str) -> Result<PathBuf> {
    let env_path = dir.join(".env");
    let example_path = dir.join(".env.example");

    let content = if env_path.exists() {
        std::fs::read_to_string(&env_path)
            .with_context(|| format!("Failed to read {}", env_path.display()))?
    } else if example_path.exists() {
        std::fs::read_to_string(&example_path)
            .with_context(|| format!("Failed to read {}", example_path.display()))?
    } else {
        String::new()
    };

    let updated = upsert_token(&content, token)?;
    std::fs::write(&env_path, updated)
        .with_context(|| format!("Failed to write {}", env_path.display()))?;
    Ok(env_path)
}
