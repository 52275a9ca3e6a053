//! Integration test suite for Mocha
//!
//! End-to-end tests that render real site directories, both through the
//! library and through the `mocha` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **rendering**: Whole documents with external scripts and shared caches
//! - **includes**: External partials, nesting and includes inside loops
//! - **cli**: The `render` and `exec` commands, configuration and error output

mod cli;
mod includes;
mod rendering;
