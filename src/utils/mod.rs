//! Utility helpers shared by the resolver and the CLI.
//!
//! - [`path_validation`] - canonicalization and containment checks that keep
//!   resource lookups inside the site root

pub mod path_validation;

pub use path_validation::{resolve_within, safe_canonicalize, validate_no_traversal};
