//! Import logging
//!
//! Two channels:
//! - the console gets one colored character per record (`.` imported,
//!   `s` skipped, `×` failed) and one summary line per importer;
//! - the log file gets the full story, including error chains, HTTP
//!   response bodies and backtraces.
//!
//! File writes are synchronous appends. A failed write is dropped: losing a
//! log line must never abort an import.
//!
//! Operational events outside the per-record loop (connections, driver
//! progress) go through `tracing`, set up by [`init_tracing`].

use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::backtrace::BacktraceStatus;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::ApiError;

/// Initialize the `tracing` subscriber for a binary.
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();

    // A second initialization (tests, embedded use) is not an error
    let _ = Registry::default().with(env_filter).with(fmt_layer).try_init();
}

/// Totals of one importer, for the final summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: String,
    pub duration: Duration,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Dual console/file logger for import runs
#[derive(Debug, Clone)]
pub struct ImportLogger {
    name: String,
    log_path: PathBuf,
    started: Instant,
    console: bool,
}

impl ImportLogger {
    /// Create a logger writing to a fresh `import-<timestamp>.log` in `log_dir`
    pub fn new(name: impl Into<String>, log_dir: impl AsRef<Path>) -> Self {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let log_path = log_dir.as_ref().join(format!("import-{}.log", timestamp));
        Self::with_file(name, log_path)
    }

    /// Create a logger appending to a given file, writing its header
    pub fn with_file(name: impl Into<String>, log_path: impl Into<PathBuf>) -> Self {
        let logger = Self {
            name: name.into(),
            log_path: log_path.into(),
            started: Instant::now(),
            console: true,
        };
        logger.init_log_file();
        logger
    }

    /// A logger for another component sharing this logger's file
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log_path: self.log_path.clone(),
            started: self.started,
            console: self.console,
        }
    }

    /// Disable console output; the log file is still written
    pub fn quiet(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_file_path(&self) -> &Path {
        &self.log_path
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn init_log_file(&self) {
        if let Some(parent) = self.log_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!("Failed to create log directory {}: {}", parent.display(), e);
                return;
            }
        }

        let rule = "=".repeat(80);
        let header = format!(
            "{rule}\nLEGACY IMPORT LOG\n{rule}\nStart time: {}\nLog file: {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            self.log_path.display()
        );
        self.append_raw(&header);
    }

    fn append_raw(&self, text: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut file| writeln!(file, "{}", text));

        if let Err(e) = result {
            tracing::debug!("Dropped log line for {}: {}", self.log_path.display(), e);
        }
    }

    fn write_to_file(&self, line: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.append_raw(&format!("[{}] {}", timestamp, line));
    }

    fn console_char(&self, indicator: colored::ColoredString) {
        if !self.console {
            return;
        }
        print!("{}", indicator);
        let _ = std::io::stdout().flush();
    }

    pub fn info(&self, message: &str) {
        self.write_to_file(&format!("[INFO] [{}] {}", self.name, message));
    }

    pub fn warning(&self, message: &str, details: Option<&serde_json::Value>) {
        let details = details
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        self.write_to_file(&format!("[WARN] [{}] {}{}", self.name, message, details));
    }

    /// Record an error with its full context in the log file.
    ///
    /// Console output is a separate call to [`ImportLogger::show_error`].
    pub fn error(&self, context: &str, err: &anyhow::Error, extra: &[(&str, String)]) {
        self.write_to_file(&format!("[ERROR] [{}] {}: {}", self.name, context, err));

        if !extra.is_empty() {
            let map: serde_json::Map<String, serde_json::Value> = extra
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                .collect();
            self.write_to_file(&format!("[CONTEXT] {}", serde_json::Value::Object(map)));
        }

        if let Some(api) = ApiError::find_in(err) {
            self.write_to_file(&format!("[HTTP] status={}", api.status));
            self.write_to_file(&format!("[HTTP] body={}", api.body));
        }

        for cause in err.chain().skip(1) {
            self.write_to_file(&format!("[CAUSE] {}", cause));
        }

        let backtrace = err.backtrace();
        if backtrace.status() == BacktraceStatus::Captured {
            self.write_to_file(&format!("[STACK] {}", backtrace));
        }
    }

    pub fn show_progress(&self) {
        self.console_char(".".bright_black());
    }

    pub fn show_skipped(&self) {
        self.console_char("s".yellow());
    }

    pub fn show_error(&self) {
        self.console_char("×".red());
    }

    /// End the progress line with the importer's totals
    pub fn show_summary(&self, imported: usize, skipped: usize, errors: usize) {
        let summary = format!(
            "Summary: {} imported, {} skipped, {} errors",
            imported, skipped, errors
        );
        if self.console {
            println!("\n[{}] {}", self.name, summary);
        }
        self.write_to_file(&format!("[SUMMARY] [{}] {}", self.name, summary));
    }

    pub fn log_phase_start(&self, phase: &str) {
        let rule = "=".repeat(80);
        self.append_raw(&format!("\n{rule}\nPHASE: {}\n{rule}", phase));
        if self.console {
            println!("\n{}\n", format!("▶ {}", phase).bold().yellow());
        }
    }

    pub fn log_importer_start(&self, importer: &str) {
        self.write_to_file(&format!("Starting {}...", importer));
    }

    pub fn log_importer_complete(
        &self,
        importer: &str,
        imported: usize,
        skipped: usize,
        errors: usize,
        duration: Duration,
    ) {
        let line = format!(
            "{}: {} imported, {} skipped, {} errors ({:.2}s)",
            importer,
            imported,
            skipped,
            errors,
            duration.as_secs_f64()
        );
        self.write_to_file(&format!("Completed {}", line));

        if self.console {
            let status = if errors > 0 { "✗".red() } else { "✓".green() };
            println!("  {} {}", status, line);
        }
    }

    pub fn log_importer_error(&self, importer: &str, message: &str) {
        self.write_to_file(&format!("ERROR in {}: {}", importer, message));
    }

    /// Print the first few errors and the warning count of an importer
    pub fn show_result_details(&self, errors: &[String], warnings: usize) {
        const SHOWN: usize = 5;

        if !self.console {
            return;
        }
        for err in errors.iter().take(SHOWN) {
            println!("{}", format!("      - {}", err).red());
        }
        if errors.len() > SHOWN {
            println!("{}", format!("      ... and {} more errors", errors.len() - SHOWN).red());
        }
        if warnings > 0 {
            println!("{}", format!("    ⚠ {} warnings", warnings).yellow());
        }
    }

    /// Write the run totals to the file and the console
    pub fn log_final_summary(&self, phases: &[PhaseSummary]) {
        let imported: usize = phases.iter().map(|p| p.imported).sum();
        let skipped: usize = phases.iter().map(|p| p.skipped).sum();
        let errors: usize = phases.iter().map(|p| p.errors).sum();
        let total = self.elapsed();
        let rule = "=".repeat(80);

        let mut lines = vec![String::new(), rule.clone(), "IMPORT SUMMARY".to_string(), rule.clone()];
        for p in phases {
            lines.push(format!(
                "{}:\n  Imported: {}, Skipped: {}, Errors: {}, Duration: {:.2}s",
                p.phase,
                p.imported,
                p.skipped,
                p.errors,
                p.duration.as_secs_f64()
            ));
        }
        lines.push(String::new());
        lines.push(format!(
            "TOTALS: {} imported, {} skipped, {} errors",
            imported, skipped, errors
        ));
        lines.push(format!("Total duration: {:.2}s", total.as_secs_f64()));
        lines.push(format!(
            "End time: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        lines.push(rule);
        self.append_raw(&lines.join("\n"));

        if self.console {
            println!("\n{}", "IMPORT SUMMARY".bold().yellow());
            let totals = format!(
                "Total: {} imported, {} skipped, {} errors",
                imported, skipped, errors
            );
            if errors > 0 {
                println!("{}", totals.bold().red());
            } else {
                println!("{}", totals.bold().green());
            }
            println!("{}", format!("Total duration: {:.2}s", total.as_secs_f64()).bright_black());
            println!("{}", format!("Log file: {}", self.log_path.display()).bright_black());
        }
    }
}
