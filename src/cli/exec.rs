//! Run the server scripts of an API-style document.
//!
//! Only the scripts run; the value of the last statement is marshalled into
//! the format named by `--accept`. An unsupported media type is rejected
//! before any script runs.
//!
//! # Examples
//!
//! ```bash
//! mocha exec users.api
//! mocha exec /users.api --root site --accept text/xml --body request.json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use super::common::{SiteDocument, write_output};
use crate::constants::{DEFAULT_API_MEDIA_TYPE, REQUEST_BODY_VARIABLE};
use crate::templating::ApiOutputFormat;

/// Command to run the server scripts of a document.
#[derive(Args, Debug)]
pub struct ExecCommand {
    /// Document to run: a file path or a site path such as `/users.api`
    pub path: String,

    /// Site root that external scripts resolve against
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Media type of the result, e.g. `application/json` or `text/xml`
    #[arg(long, value_name = "MEDIA_TYPE", default_value = DEFAULT_API_MEDIA_TYPE)]
    pub accept: String,

    /// JSON file bound as `request_body`
    #[arg(long, value_name = "FILE")]
    pub body: Option<PathBuf>,
}

impl ExecCommand {
    /// Run the document's scripts and print the marshalled result.
    ///
    /// # Errors
    ///
    /// Returns an error if the media type is unsupported, the document or
    /// body cannot be read, or a script fails.
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let format: ApiOutputFormat = self.accept.parse()?;

        let document = SiteDocument::locate(&self.path, self.root.as_deref(), config_path)?;
        let mut engine = document.engine()?;

        if let Some(body) = &self.body {
            let json = std::fs::read_to_string(body)
                .with_context(|| format!("Failed to read request body {}", body.display()))?;
            engine.put_json(REQUEST_BODY_VARIABLE, &json)?;
        }

        let result = engine.exec_to(format)?;
        write_output(&result, None)?;
        info!("Executed {} as {format}", document.path.display());
        Ok(())
    }
}
