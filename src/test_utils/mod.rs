//! Test utilities for Mocha
//!
//! This module provides helpers for writing tests:
//! - once-guarded logging initialization
//! - [`TestSite`], a temporary site directory with files and a site-rooted
//!   engine constructor
//!
//! # Example
//!
//! ```rust,no_run
//! use mocha_template::test_utils::TestSite;
//!
//! let site = TestSite::new().unwrap();
//! site.write("partials.html", r#"<template data-type="server/template"><b>hi</b></template>"#).unwrap();
//! let engine = site.engine(r#"<p data-include="@partials.html"></p>"#).unwrap();
//! assert_eq!(engine.parse().unwrap(), "<p><b>hi</b></p>");
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::cache::ResourceCaches;
use crate::resolver::FileResolver;
use crate::templating::TemplateEngine;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. The provided level wins over
/// `RUST_LOG`; without either, nothing is logged.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// A temporary site directory.
///
/// Engines built with [`TestSite::engine`] resolve external references
/// against the site and use their own caches, so tests never see each
/// other's resources.
pub struct TestSite {
    dir: TempDir,
    caches: Arc<ResourceCaches>,
}

impl TestSite {
    /// Create an empty site.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temporary site")?,
            caches: Arc::new(ResourceCaches::new()),
        })
    }

    /// Root directory of the site.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file below the site root, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// The caches shared by every engine of this site.
    pub fn caches(&self) -> Arc<ResourceCaches> {
        Arc::clone(&self.caches)
    }

    /// Build an engine for `html` rooted at this site.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse.
    pub fn engine(&self, html: &str) -> Result<TemplateEngine> {
        Ok(TemplateEngine::from_html(html)?
            .with_resolver(FileResolver::new(self.dir.path())?)
            .with_caches(self.caches()))
    }
}
