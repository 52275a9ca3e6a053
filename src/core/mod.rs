//! Core types shared by every part of Mocha.
//!
//! At the moment this is the error model: [`MochaError`] for the rendering
//! core and [`ErrorContext`] / [`user_friendly_error`] for the CLI.

pub mod error;

pub use error::{ErrorContext, MochaError, Result, user_friendly_error};
