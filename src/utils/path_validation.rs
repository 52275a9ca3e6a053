//! Path validation for site-relative locations.
//!
//! Templates reference scripts and partials with site-relative locations such
//! as `/partials/nav.html`. These helpers map such a location onto the site
//! directory and refuse anything that would escape it.

use anyhow::{Context, Result, anyhow};
use std::path::{Component, Path, PathBuf};

/// Safely canonicalizes a path.
///
/// # Arguments
/// * `path` - The path to canonicalize
///
/// # Returns
/// The canonicalized path
///
/// # Errors
/// Returns an error if the path does not exist or cannot be canonicalized
pub fn safe_canonicalize(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(anyhow!("Path does not exist: {}", path.display()));
    }

    path.canonicalize()
        .with_context(|| format!("Failed to canonicalize path: {}", path.display()))
}

/// Validates that a path doesn't contain parent directory references.
///
/// # Arguments
/// * `path` - The path to validate
///
/// # Errors
/// Returns an error if the path contains `..`
pub fn validate_no_traversal(path: &Path) -> Result<()> {
    if path.components().any(|component| component == Component::ParentDir) {
        return Err(anyhow!(
            "Path contains parent directory reference (..): {}",
            path.display()
        ));
    }
    Ok(())
}

/// Maps a site-relative location onto a file below `root`.
///
/// A leading `/` is relative to the site root, not the filesystem root.
///
/// # Arguments
/// * `root` - The canonical site directory
/// * `location` - The location as written in a template
///
/// # Returns
/// The canonical path of the file
///
/// # Errors
/// Returns an error if the location contains `..`, does not exist, or
/// resolves (through a symlink) outside `root`
pub fn resolve_within(root: &Path, location: &str) -> Result<PathBuf> {
    let relative = Path::new(location.trim_start_matches('/'));
    validate_no_traversal(relative)?;

    let canonical = safe_canonicalize(&root.join(relative))?;
    if !canonical.starts_with(root) {
        return Err(anyhow!("Path '{location}' escapes the site directory"));
    }

    Ok(canonical)
}
