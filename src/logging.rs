//! Logging setup
//!
//! Console output plus an optional plain-text log file named
//! `{name}_{timestamp}.log`. `RUST_LOG` overrides the computed filter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging options
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Debug level instead of info
    pub verbose: bool,
    /// Emit JSON lines on the console instead of text
    pub json: bool,
    /// Directory for the log file; no file when `None`
    pub log_dir: Option<PathBuf>,
    /// Prefix of the log file name
    pub name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            json: false,
            log_dir: None,
            name: "poloniex".to_string(),
        }
    }
}

impl LogConfig {
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Filter directive: base level with noisy HTTP crates held at warn
    pub fn filter_directive(&self) -> String {
        let level = if self.verbose { "debug" } else { "info" };
        format!(
            "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
            level
        )
    }

    fn log_filename(&self) -> String {
        format!(
            "{}_{}.log",
            self.name,
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

/// Install the global subscriber
///
/// Returns the log file path when a file layer was set up. Fails if a
/// global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> Result<Option<PathBuf>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true)
            .boxed()
    };

    let (file_layer, log_path) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let filename = config.log_filename();
            let file_appender = tracing_appender::rolling::never(dir, &filename);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false);
            (Some(layer), Some(dir.join(filename)))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(path) = &log_path {
        tracing::info!("Log file: {}", path.display());
    }

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        let quiet = LogConfig::default();
        assert!(quiet.filter_directive().starts_with("info,"));

        let verbose = LogConfig::default().with_verbose(true);
        assert!(verbose.filter_directive().starts_with("debug,"));
        assert!(verbose.filter_directive().contains("reqwest=warn"));
    }

    #[test]
    fn test_log_filename() {
        let config = LogConfig::default();
        let name = config.log_filename();
        assert!(name.starts_with("poloniex_"));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_setup_with_file_then_reject_second_install() {
        let dir = std::env::temp_dir().join(format!("poloniex_logs_{}", std::process::id()));
        let config = LogConfig::default().with_log_dir(&dir);

        let path = setup_logging(&config).unwrap().unwrap();
        assert!(path.starts_with(&dir));
        assert!(dir.exists());

        assert!(setup_logging(&LogConfig::default()).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
