//! Error handling for Mocha
//!
//! This module provides the error types used by the rendering core and the
//! user-facing error reporting used by the `mocha` binary. The error system
//! follows two principles:
//! 1. **Strongly-typed errors** so callers can tell a broken expression from a
//!    missing partial or a malformed directive
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`MochaError`] - Enumerated error kinds for every failure of a render
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! Every error aborts the render it occurred in. The core never retries and
//! never returns partial output; presentation (an error page, a coloured
//! message on stderr) is the caller's decision.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mocha_template::core::{MochaError, user_friendly_error};
//!
//! let error = MochaError::ResourceNotFound {
//!     location: "/partials/header.html".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows coloured error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the rendering core.
pub type Result<T, E = MochaError> = std::result::Result<T, E>;

/// The main error type for Mocha operations
///
/// # Error Categories
///
/// ## Rendering
/// - [`Expression`] - The scripting engine rejected or failed an expression
/// - [`MalformedDirective`] - Wrong argument count or unparsable reference
/// - [`ResourceNotFound`] - An external script or template could not be resolved
///
/// ## Input
/// - [`Markup`] - The document could not be tokenized
/// - [`InvalidJson`] - A value seeded through `put_json` is not valid JSON
/// - [`UnsupportedOutputFormat`] - Requested API output format is unknown
///
/// ## Environment
/// - [`Io`] - Reading a template or resource failed
/// - [`ConfigError`] - The site configuration is invalid
///
/// [`Expression`]: MochaError::Expression
/// [`MalformedDirective`]: MochaError::MalformedDirective
/// [`ResourceNotFound`]: MochaError::ResourceNotFound
/// [`Markup`]: MochaError::Markup
/// [`InvalidJson`]: MochaError::InvalidJson
/// [`UnsupportedOutputFormat`]: MochaError::UnsupportedOutputFormat
/// [`Io`]: MochaError::Io
/// [`ConfigError`]: MochaError::ConfigError
#[derive(Error, Debug)]
pub enum MochaError {
    /// The scripting engine failed to compile or evaluate an expression.
    ///
    /// Raised for directive expressions, `${}` spans and server scripts alike.
    #[error("Expression failed: {message}")]
    Expression {
        /// The expression or script text that failed
        expression: String,
        /// Message reported by the scripting engine
        message: String,
    },

    /// A directive attribute could not be applied as written.
    ///
    /// Covers argument-count violations (`data-set` needs exactly one name,
    /// `data-for` one or two) and include references that do not parse.
    #[error("Malformed directive '{attribute}': {reason}")]
    MalformedDirective {
        /// Full attribute name, e.g. `data-set-a-b`
        attribute: String,
        /// Why the directive was rejected
        reason: String,
    },

    /// An external script or template location could not be resolved.
    #[error("Resource not found: {location}")]
    ResourceNotFound {
        /// Location as written in the template
        location: String,
    },

    /// The requested API output format is not supported.
    #[error("'{media_type}' is not a supported output format")]
    UnsupportedOutputFormat {
        /// Media type as supplied by the caller
        media_type: String,
    },

    /// The markup could not be tokenized.
    #[error("Invalid markup at byte {position}: {reason}")]
    Markup {
        /// Byte offset where tokenizing stopped
        position: usize,
        /// Message reported by the tokenizer
        reason: String,
    },

    /// A JSON value handed to the engine did not parse.
    #[error("Invalid JSON for '{name}': {reason}")]
    InvalidJson {
        /// Variable the value was destined for
        name: String,
        /// Parser message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl MochaError {
    /// Build an [`MochaError::Expression`] from anything the scripting engine reports.
    pub fn expression(expression: &str, message: impl fmt::Display) -> Self {
        Self::Expression {
            expression: expression.to_string(),
            message: message.to_string(),
        }
    }

    /// Build a [`MochaError::MalformedDirective`].
    pub fn malformed(attribute: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDirective {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error wrapper adding optional details and a suggestion for display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: MochaError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without any extra context.
    #[must_use]
    pub const fn new(error: MochaError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion shown after the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional details shown after the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Known [`MochaError`] kinds get tailored advice; IO and TOML errors are
/// mapped onto the closest kind; everything else is reported with its full
/// cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<MochaError>() {
        Ok(mocha_error) => return create_error_context(mocha_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(MochaError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check that the file exists and that the path is relative to the site root");
            }
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(MochaError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check the file permissions of the site directory");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(MochaError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of mocha.toml. Verify quotes, brackets and table names");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(MochaError::Other {
        message,
    })
}

fn create_error_context(error: MochaError) -> ErrorContext {
    match &error {
        MochaError::Expression {
            expression,
            ..
        } => {
            let details = format!("While evaluating: {}", expression.trim());
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion(
                    "Expressions use rhai syntax: strings in double quotes, `==` for equality, \
                     functions declared with `fn` in a <script type=\"server/rhai\"> block",
                )
        }
        MochaError::MalformedDirective {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "data-set takes exactly one variable name (data-set-name), data-for one or two \
             (data-for-item or data-for-item-index), external includes use @location[:selector]",
        ),
        MochaError::ResourceNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Locations are resolved relative to the site root; check --root and the path"),
        MochaError::UnsupportedOutputFormat {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use application/json or application/xml"),
        MochaError::Markup {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the template for unterminated tags or attribute quotes"),
        MochaError::InvalidJson {
            ..
        } => ErrorContext::new(error).with_suggestion("Values passed with --json must be valid JSON"),
        _ => ErrorContext::new(error),
    }
}
