//! `${expression}` interpolation.
//!
//! Spans are not nested: the first `}` closes a span. Each span is evaluated
//! left to right and replaced by the textual form of its value.

use std::sync::LazyLock;

use regex::Regex;
use rhai::{Dynamic, FLOAT};

use crate::core::Result;
use crate::script::{Scope, ScriptHost};

static SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("interpolation pattern should be a valid regex")
});

/// Whether `text` contains at least one `${...}` span.
pub fn has_spans(text: &str) -> bool {
    SPAN.is_match(text)
}

/// Replace every `${...}` span in `text` by its value.
///
/// Returns `Ok(None)` when `text` is blank or holds no span, which callers
/// use to leave the original untouched.
///
/// # Errors
///
/// Propagates the first [`Expression`](crate::core::MochaError::Expression)
/// error; spans after it are not evaluated.
pub fn interpolate(host: &ScriptHost, text: &str, scope: &mut Scope) -> Result<Option<String>> {
    interpolate_with(host, text, scope, str::to_string)
}

/// Like [`interpolate`], passing each span's textual value through `filter`
/// before it is spliced in. The text around the spans is kept as written.
///
/// # Errors
///
/// Propagates the first [`Expression`](crate::core::MochaError::Expression)
/// error; spans after it are not evaluated.
pub fn interpolate_with(
    host: &ScriptHost,
    text: &str,
    scope: &mut Scope,
    filter: impl Fn(&str) -> String,
) -> Result<Option<String>> {
    if text.trim().is_empty() || !has_spans(text) {
        return Ok(None);
    }

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for captures in SPAN.captures_iter(text) {
        let (Some(span), Some(expression)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        output.push_str(&text[last..span.start()]);
        let value = host.evaluate(expression.as_str(), scope)?;
        output.push_str(&filter(&format_value(&value)));
        last = span.end();
    }
    output.push_str(&text[last..]);

    Ok(Some(output))
}

/// Textual form of a script value.
///
/// Unit is empty, integers are decimal, floats never use an exponent and
/// drop the fraction when integral. Everything else uses its display form.
pub fn format_value(value: &Dynamic) -> String {
    if value.is_unit() {
        return String::new();
    }
    if let Ok(int) = value.as_int() {
        return int.to_string();
    }
    if let Ok(float) = value.as_float() {
        return format_float(float);
    }
    value.to_string()
}

fn format_float(value: FLOAT) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        // Display for floats is locale independent and never scientific.
        format!("{value}")
    }
}
