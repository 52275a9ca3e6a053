//! Site configuration for Mocha
//!
//! A site is a directory of templates, scripts and partials. Its settings
//! live in a small TOML file:
//!
//! ```toml
//! # Directory that external references resolve against
//! root = "site"
//!
//! # Document served for a directory or "/"
//! index = "index.html"
//!
//! # Values bound as globals in every render
//! [globals]
//! site_name = "Example"
//! nav = ["home", "about"]
//! ```
//!
//! # Lookup Order
//!
//! The first of these that is set is used:
//! 1. `--config <FILE>` on the command line
//! 2. the `MOCHA_CONFIG` environment variable
//! 3. `mocha.toml` in the site root, if it exists
//! 4. `mocha/config.toml` in the user's config directory, if it exists
//!
//! When nothing is found the defaults apply. An explicitly named file that
//! does not exist is an error.
//!
//! A relative `root` is taken relative to the directory of the file that
//! sets it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_INDEX};

/// Settings of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site root; `None` means the directory given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Document rendered for a directory request.
    pub index: String,

    /// Globals seeded into every render, with `put_json` semantics.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub globals: BTreeMap<String, serde_json::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: None,
            index: DEFAULT_INDEX.to_string(),
            globals: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load the configuration for a site rooted at `root`.
    ///
    /// `explicit` is the `--config` argument, if any. See the module docs for
    /// the lookup order.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is named but missing, cannot
    /// be read, or is not valid TOML for this structure.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let env = std::env::var_os(CONFIG_ENV_VAR);
        let named = explicit.is_some() || env.as_ref().is_some_and(|v| !v.is_empty());
        match locate(explicit, env, root) {
            Some(path) if named || path.exists() => Self::load_from(&path),
            _ => {
                debug!("No site configuration found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading site configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read site config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse site config from {}", path.display()))?;

        if let Some(root) = config.root.take() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.root = Some(if root.is_relative() { base.join(root) } else { root });
        }
        Ok(config)
    }

    /// The site root to use: the configured one, or `fallback`.
    pub fn root_or<'a>(&'a self, fallback: &'a Path) -> &'a Path {
        self.root.as_deref().unwrap_or(fallback)
    }
}

/// Pick the configuration file for a site rooted at `root`.
///
/// `explicit` and `env` win in that order even if the file does not exist,
/// so that a typo surfaces as an error. Otherwise the site's `mocha.toml` is
/// preferred over the user-wide file.
pub fn locate(explicit: Option<&Path>, env: Option<OsString>, root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let site = root.join(CONFIG_FILE_NAME);
    if site.exists() {
        return Some(site);
    }
    dirs::config_dir().map(|dir| dir.join("mocha").join("config.toml")).filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.index, "index.html");
        assert!(config.root.is_none());
        assert!(config.globals.is_empty());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("mocha.toml");
        std::fs::write(
            &path,
            r#"
root = "public"
index = "home.html"

[globals]
site_name = "Example"
nav = ["home", "about"]
"#,
        )?;

        let config = SiteConfig::load_from(&path)?;
        assert_eq!(config.root, Some(temp.path().join("public")));
        assert_eq!(config.index, "home.html");
        assert_eq!(config.globals["site_name"], serde_json::json!("Example"));
        assert_eq!(config.globals["nav"], serde_json::json!(["home", "about"]));
        Ok(())
    }

    #[test]
    fn test_absolute_root_kept() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("mocha.toml");
        let absolute = temp.path().join("elsewhere");
        std::fs::write(&path, format!("root = {:?}\n", absolute.display().to_string()))?;

        let config = SiteConfig::load_from(&path)?;
        assert_eq!(config.root, Some(absolute));
        Ok(())
    }

    #[test]
    fn test_unknown_keys_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("mocha.toml");
        std::fs::write(&path, "indx = \"typo.html\"\n")?;

        let err = SiteConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse site config"));
        Ok(())
    }

    #[test]
    fn test_locate_order() -> Result<()> {
        let temp = TempDir::new()?;
        let cli = temp.path().join("cli.toml");
        let env = OsString::from(temp.path().join("env.toml"));

        assert_eq!(locate(Some(&cli), Some(env.clone()), temp.path()), Some(cli.clone()));
        assert_eq!(locate(None, Some(env.clone()), temp.path()), Some(PathBuf::from(&env)));

        std::fs::write(temp.path().join("mocha.toml"), "")?;
        assert_eq!(locate(None, None, temp.path()), Some(temp.path().join("mocha.toml")));
        assert_eq!(
            locate(None, Some(OsString::new()), temp.path()),
            Some(temp.path().join("mocha.toml"))
        );
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_missing_site_file_uses_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        unsafe {
            std::env::remove_var(CONFIG_ENV_VAR);
        }
        let config = SiteConfig::load(None, temp.path())?;
        assert_eq!(config.index, SiteConfig::default().index);
        assert_eq!(config.root_or(temp.path()), temp.path());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_from_env() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "index = \"main.html\"\n")?;

        unsafe {
            std::env::set_var(CONFIG_ENV_VAR, &path);
        }
        let result = SiteConfig::load(None, temp.path());
        unsafe {
            std::env::remove_var(CONFIG_ENV_VAR);
        }

        assert_eq!(result?.index, "main.html");
        Ok(())
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        unsafe {
            std::env::remove_var(CONFIG_ENV_VAR);
        }
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let err = SiteConfig::load(Some(&missing), temp.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read site config"));
    }
}
