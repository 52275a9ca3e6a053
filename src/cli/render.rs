//! Render a template to HTML.
//!
//! # Examples
//!
//! ```bash
//! # Render the index of the current directory
//! mocha render /
//!
//! # Render a page of another site with extra globals
//! mocha render /about.html --root site --var title=About --json team='["ada"]'
//!
//! # Write the result to a file
//! mocha render / --output public/index.html
//! ```

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use super::common::{SiteDocument, parse_assignment, write_output};

/// Command to render a template to HTML.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Document to render: a file path or a site path such as `/about.html`
    ///
    /// `/` and directories render the index document.
    pub path: String,

    /// Site root that external scripts and templates resolve against
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Bind a string global (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub vars: Vec<(String, String)>,

    /// Bind a global to a JSON value (repeatable)
    #[arg(long = "json", value_name = "NAME=JSON", value_parser = parse_assignment)]
    pub json: Vec<(String, String)>,

    /// Write the HTML to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl RenderCommand {
    /// Render the document and write the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be located or read, a global
    /// is not valid JSON, or the render fails.
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let document = SiteDocument::locate(&self.path, self.root.as_deref(), config_path)?;
        let mut engine = document.engine()?;

        for (name, value) in &self.vars {
            engine.put(name, value.clone());
        }
        for (name, json) in &self.json {
            engine.put_json(name, json)?;
        }

        let html = engine.parse()?;
        write_output(&html, self.output.as_deref())?;
        info!("Rendered {}", document.path.display());
        Ok(())
    }
}
