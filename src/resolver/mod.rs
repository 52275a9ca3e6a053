//! Resolution of external scripts and templates.
//!
//! A template refers to other resources by location: the `src` of a server
//! script or the `@location` of an external include. A [`ResourceResolver`]
//! turns such a location into a canonical [`ResourceKey`] (identity plus
//! modification time) and reads its content. The key is what the
//! [`ResourceCache`](crate::cache::ResourceCache) is validated against, so a
//! resolver must report a new modification time whenever the content changes.
//!
//! Two resolvers are provided:
//! - [`FileResolver`] serves files below a site directory
//! - [`MemoryResolver`] serves in-memory content, for embedding and tests

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::core::{MochaError, Result};
use crate::utils::path_validation::{resolve_within, safe_canonicalize};

/// Canonical identity of a resource at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Canonical location, unique across resolvers of the process
    pub location: String,
    /// Last modification time of the content
    pub modified: SystemTime,
}

/// A resolved resource and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Identity and modification time
    pub key: ResourceKey,
    /// Text content
    pub content: String,
}

/// Maps template locations to content.
pub trait ResourceResolver: Send + Sync + fmt::Debug {
    /// Find the resource behind `location` without reading it.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::ResourceNotFound`] when nothing exists there.
    fn locate(&self, location: &str) -> Result<ResourceKey>;

    /// Read the content of a located resource.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::ResourceNotFound`] if the resource vanished or
    /// [`MochaError::Io`] if reading failed.
    fn read(&self, key: &ResourceKey) -> Result<String>;

    /// Locate and read in one step.
    ///
    /// # Errors
    ///
    /// See [`locate`](Self::locate) and [`read`](Self::read).
    fn resolve(&self, location: &str) -> Result<Resource> {
        let key = self.locate(location)?;
        let content = self.read(&key)?;
        Ok(Resource {
            key,
            content,
        })
    }
}

/// Serves files below a site directory.
///
/// Locations are relative to the site root; a leading `/` is allowed.
/// Locations escaping the directory are reported as not found.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Create a resolver rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::ConfigError`] if `root` is not an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = safe_canonicalize(root).map_err(|e| MochaError::ConfigError {
            message: format!("Site root {}: {e}", root.display()),
        })?;
        if !canonical.is_dir() {
            return Err(MochaError::ConfigError {
                message: format!("Site root {} is not a directory", root.display()),
            });
        }
        Ok(Self {
            root: canonical,
        })
    }

    /// The canonical site directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceResolver for FileResolver {
    fn locate(&self, location: &str) -> Result<ResourceKey> {
        let not_found = || MochaError::ResourceNotFound {
            location: location.to_string(),
        };

        let path = resolve_within(&self.root, location).map_err(|e| {
            debug!("Cannot resolve {location}: {e}");
            not_found()
        })?;
        if !path.is_file() {
            return Err(not_found());
        }
        let modified = path.metadata().and_then(|m| m.modified())?;

        Ok(ResourceKey {
            location: path.to_string_lossy().into_owned(),
            modified,
        })
    }

    fn read(&self, key: &ResourceKey) -> Result<String> {
        std::fs::read_to_string(&key.location).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MochaError::ResourceNotFound {
                location: key.location.clone(),
            },
            _ => MochaError::Io(e),
        })
    }
}

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
struct MemoryEntry {
    content: Arc<str>,
    modified: SystemTime,
}

/// Serves content registered in memory.
///
/// Every resolver gets a unique namespace so that two resolvers sharing the
/// process-wide cache never see each other's entries.
#[derive(Debug)]
pub struct MemoryResolver {
    namespace: u64,
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl Default for MemoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self {
            namespace: NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(self, location: &str, content: &str) -> Self {
        self.insert(location, content);
        self
    }

    /// Register or replace content at `location`.
    ///
    /// Replacing content always advances the modification time, so cached
    /// copies of the old content become stale.
    pub fn insert(&self, location: &str, content: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = normalize(location);
        let modified = match entries.get(&key) {
            Some(previous) => {
                (previous.modified + Duration::from_nanos(1)).max(SystemTime::now())
            }
            None => SystemTime::now(),
        };
        entries.insert(
            key,
            MemoryEntry {
                content: Arc::from(content),
                modified,
            },
        );
    }

    /// Remove the content at `location`.
    pub fn remove(&self, location: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(&normalize(location));
    }

    fn canonical(&self, key: &str) -> String {
        format!("memory://{}/{key}", self.namespace)
    }
}

fn normalize(location: &str) -> String {
    location.trim_start_matches('/').to_string()
}

impl ResourceResolver for MemoryResolver {
    fn locate(&self, location: &str) -> Result<ResourceKey> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = normalize(location);
        let entry = entries.get(&key).ok_or_else(|| MochaError::ResourceNotFound {
            location: location.to_string(),
        })?;
        Ok(ResourceKey {
            location: self.canonical(&key),
            modified: entry.modified,
        })
    }

    fn read(&self, key: &ResourceKey) -> Result<String> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let prefix = self.canonical("");
        key.location
            .strip_prefix(&prefix)
            .and_then(|path| entries.get(path))
            .map(|entry| entry.content.to_string())
            .ok_or_else(|| MochaError::ResourceNotFound {
                location: key.location.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_resolver_reads_below_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lib.rhai"), "let x = 1;").unwrap();

        let resolver = FileResolver::new(dir.path()).unwrap();
        let resource = resolver.resolve("/lib.rhai").unwrap();
        assert_eq!(resource.content, "let x = 1;");
        assert!(resource.key.location.ends_with("lib.rhai"));
    }

    #[test]
    fn test_file_resolver_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let resolver = FileResolver::new(dir.path()).unwrap();

        for location in ["missing.html", "../outside.html", "sub"] {
            let err = resolver.locate(location).unwrap_err();
            assert!(matches!(err, MochaError::ResourceNotFound { .. }), "{location}");
        }
    }

    #[test]
    fn test_file_resolver_rejects_missing_root() {
        let dir = tempdir().unwrap();
        let err = FileResolver::new(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, MochaError::ConfigError { .. }));
    }

    #[test]
    fn test_memory_resolver_updates_advance_time() {
        let resolver = MemoryResolver::new().with("/a.html", "one");
        let first = resolver.locate("a.html").unwrap();
        resolver.insert("a.html", "two");
        let second = resolver.locate("/a.html").unwrap();

        assert_eq!(first.location, second.location);
        assert!(second.modified > first.modified);
        assert_eq!(resolver.read(&second).unwrap(), "two");
    }

    #[test]
    fn test_memory_resolvers_are_namespaced() {
        let a = MemoryResolver::new().with("x", "a");
        let b = MemoryResolver::new().with("x", "b");
        assert_ne!(a.locate("x").unwrap().location, b.locate("x").unwrap().location);
        assert!(b.read(&a.locate("x").unwrap()).is_err());
    }

    #[test]
    fn test_memory_resolver_remove() {
        let resolver = MemoryResolver::new().with("x", "a");
        resolver.remove("/x");
        assert!(matches!(resolver.locate("x"), Err(MochaError::ResourceNotFound { .. })));
    }
}
