//! Command-line interface for Mocha.
//!
//! The `mocha` binary renders documents of a site directory from the command
//! line, the same way a web front end would for each request.
//!
//! # Available Commands
//!
//! - `render` - Render a template to HTML (see [`render`])
//! - `exec` - Run the server scripts of an API-style document and print the
//!   result as JSON or XML (see [`exec`])
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output on stderr
//! - `--quiet` - Suppress all log output except errors
//! - `--config` - Path to a site configuration file (see [`crate::config`])
//!
//! Rendered output always goes to stdout (or `--output`), logs to stderr.
//!
//! # Example
//!
//! ```bash
//! # Render the index of ./site
//! mocha render / --root site
//!
//! # Render a page with extra globals
//! mocha render about.html --var title=About --json team='["ada", "linus"]'
//!
//! # Run an API document against a request body
//! mocha exec users.api --accept application/xml --body request.json
//! ```

pub mod common;
pub mod exec;
pub mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so that tests and programmatic callers can
/// drive commands without going through argument parsing.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter for the subscriber. `None` keeps `RUST_LOG` or the default.
    pub log_level: Option<String>,

    /// Site configuration file given with `--config`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the tracing subscriber for this process.
    ///
    /// Logs go to stderr so that rendered output on stdout stays clean.
    /// Installing twice is a no-op.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure for Mocha.
#[derive(Parser, Debug)]
#[command(
    name = "mocha",
    about = "Mocha - render directive-driven HTML templates",
    version,
    long_about = "Mocha renders HTML templates that use data-* directives, ${} interpolation and server-side rhai scripts."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging.
    ///
    /// Shows directive dispatch, cache hits and resource loading on stderr.
    /// Equivalent to `RUST_LOG=debug`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the site configuration file.
    ///
    /// Overrides `MOCHA_CONFIG` and the `mocha.toml` of the site root.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template to HTML.
    Render(render::RenderCommand),

    /// Run the server scripts of a document and print the result.
    Exec(exec::ExecCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns the first error of the command; the caller is expected to
    /// report it through [`crate::core::user_friendly_error`].
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Derive the runtime configuration from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute the command with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error of the command.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Render(cmd) => cmd.execute(config.config_path.as_deref()),
            Commands::Exec(cmd) => cmd.execute(config.config_path.as_deref()),
        }
    }
}
