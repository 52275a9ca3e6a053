//! Reserved names and defaults.
//!
//! Templates mark server-side content with these values; anything else is
//! passed through to the output unchanged.

/// Prefix of directive attributes (`data-if`, `data-for-item-index`, ...).
pub const DIRECTIVE_PREFIX: &str = "data-";

/// Separator between instruction and arguments in a directive attribute name.
pub const DIRECTIVE_SEPARATOR: char = '-';

/// `type` of `<script>` elements executed on the server.
pub const SERVER_SCRIPT_TYPE: &str = "server/rhai";

/// `data-type` of `<template>` elements holding server-side partials.
pub const SERVER_TEMPLATE_TYPE: &str = "server/template";

/// Comments whose trimmed body starts with this marker are removed.
pub const SERVER_COMMENT_MARKER: &str = "server-comment";

/// Variable holding the request body in API mode.
pub const REQUEST_BODY_VARIABLE: &str = "request_body";

/// Document served when a directory is requested.
pub const DEFAULT_INDEX: &str = "index.html";

/// Name of the site configuration file looked up in the site root.
pub const CONFIG_FILE_NAME: &str = "mocha.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "MOCHA_CONFIG";

/// Default media type of API output.
pub const DEFAULT_API_MEDIA_TYPE: &str = "application/json";
