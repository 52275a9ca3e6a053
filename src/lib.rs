//! Mocha - a directive-driven HTML template engine
//!
//! Mocha renders plain HTML documents that carry server-side behaviour in
//! ordinary markup: `data-*` directive attributes, `${expression}`
//! interpolation, `<script type="server/rhai">` blocks and
//! `<template data-type="server/template">` partials. Expressions and scripts
//! are written in [Rhai](https://rhai.rs).
//!
//! # Architecture Overview
//!
//! A render goes through four stages:
//! 1. the document is parsed into an arena tree ([`markup`])
//! 2. every server script is collected, removed and run once against the
//!    global scope ([`script`])
//! 3. the tree is walked depth-first; directive attributes run in
//!    declaration order and everything else is interpolated ([`templating`])
//! 4. server templates are removed and the tree is serialized back to HTML
//!
//! External scripts and partials are located through a
//! [`resolver::ResourceResolver`] and kept in modification-time aware caches
//! ([`cache`]) that are shared between renders.
//!
//! # Core Modules
//!
//! - [`cache`] - Concurrent caches for external scripts and parsed partials
//! - [`cli`] - The `mocha` command line (`render`, `exec`)
//! - [`config`] - Site configuration (`mocha.toml`)
//! - [`constants`] - Reserved attribute values and file names
//! - [`core`] - Error types and user-facing error reporting
//! - [`markup`] - HTML tree, parser, serializer and selectors
//! - [`resolver`] - Locating external resources on disk or in memory
//! - [`script`] - The Rhai host and variable scopes
//! - [`templating`] - The template engine, directives and interpolation
//! - [`utils`] - Path validation helpers
//!
//! # Template Example
//!
//! ```html
//! <html>
//! <head>
//!   <script type="server/rhai">
//!     let title = "Team";
//!     let people = [#{ name: "Ada", admin: true }, #{ name: "Linus", admin: false }];
//!   </script>
//! </head>
//! <body>
//!   <h1>${title}</h1>
//!   <ul>
//!     <li data-for-person-i="people" class="row-${i}">
//!       ${person.name}<b data-if="person.admin"> (admin)</b>
//!     </li>
//!   </ul>
//!   <footer data-include="@partials.html:#footer"></footer>
//!   <!-- server-comment not sent to the browser -->
//! </body>
//! </html>
//! ```
//!
//! # Library Usage
//!
//! ```rust
//! use mocha_template::templating::TemplateEngine;
//!
//! let mut engine = TemplateEngine::from_html(r#"<p data-if="show">Hello ${name}</p>"#)?;
//! engine.put("name", "world".to_string());
//! engine.put("show", true);
//! assert_eq!(engine.parse()?, "<p>Hello world</p>");
//! # Ok::<(), mocha_template::core::MochaError>(())
//! ```
//!
//! # Command Line
//!
//! ```bash
//! # Render the site index
//! mocha render / --root ./site
//!
//! # Run an API-style document and print the result as XML
//! mocha exec ./site/users.api --accept text/xml --body request.json
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod markup;
pub mod resolver;
pub mod script;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
