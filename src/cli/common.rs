//! Helpers shared by the `render` and `exec` commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::SiteConfig;
use crate::resolver::FileResolver;
use crate::templating::TemplateEngine;
use crate::utils::path_validation::{resolve_within, safe_canonicalize};

/// Parse a `NAME=VALUE` command line argument.
///
/// # Errors
///
/// Returns a message for clap if there is no `=` or the name is empty.
pub fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    let (name, value) =
        arg.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{arg}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// A document of a site, ready to be rendered.
#[derive(Debug)]
pub struct SiteDocument {
    /// Canonical site root; external references resolve against it
    pub root: PathBuf,
    /// Path of the document file
    pub path: PathBuf,
    /// Effective site configuration
    pub config: SiteConfig,
}

impl SiteDocument {
    /// Find the document addressed by `request` in the site rooted at
    /// `root` (or the configured root, or the current directory).
    ///
    /// `request` is either a path that exists on disk or a site path such as
    /// `/about.html`. `/` and directories map to the configured index
    /// document.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the root is
    /// not a directory, or the request leaves the site root.
    pub fn locate(request: &str, root: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let lookup_root = root.unwrap_or_else(|| Path::new("."));
        let config = SiteConfig::load(config_path, lookup_root)?;
        let root = root.unwrap_or_else(|| config.root_or(lookup_root));
        let root = safe_canonicalize(root)
            .with_context(|| format!("Site root {} is not accessible", root.display()))?;

        let as_given = Path::new(request);
        let mut path = if request.trim_matches('/').is_empty() {
            root.clone()
        } else if as_given.exists() {
            safe_canonicalize(as_given)?
        } else {
            resolve_within(&root, request)?
        };
        if path.is_dir() {
            path = path.join(&config.index);
        }
        debug!("Request '{request}' maps to {}", path.display());

        Ok(Self {
            root,
            path,
            config,
        })
    }

    /// Build an engine for the document, with external references resolved
    /// against the site root and the configured globals bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed, or a
    /// configured global cannot be bound.
    pub fn engine(&self) -> Result<TemplateEngine> {
        let html = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read template {}", self.path.display()))?;
        let mut engine = TemplateEngine::from_html(&html)
            .with_context(|| format!("Failed to parse template {}", self.path.display()))?
            .with_resolver(FileResolver::new(&self.root)?);

        for (name, value) in &self.config.globals {
            engine.put_value(name, value)?;
        }
        Ok(engine)
    }
}

/// Write `content` to `output`, or to stdout when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output to {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
