//! Marshalling of script results for API-style requests.
//!
//! The format is chosen from a media type such as `application/json` or
//! `text/xml`: only the subtype matters. JSON goes through `serde_json`;
//! XML is written with `quick-xml` under a `<result>` root, with map keys as
//! element names and array items as `<item>` elements.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use rhai::Dynamic;

use crate::core::{MochaError, Result};

static MEDIA_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z_\-]+/([a-z_\-]+)").expect("media type pattern should be a valid regex")
});

/// Supported API output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOutputFormat {
    /// `*/json`
    Json,
    /// `*/xml`
    Xml,
}

impl ApiOutputFormat {
    /// Canonical media type of the format.
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// Marshal `value` into this format.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Other`] when the value holds something that has
    /// no serialized form, such as a function pointer.
    pub fn render(&self, value: &Dynamic) -> Result<String> {
        let json: serde_json::Value =
            rhai::serde::from_dynamic(value).map_err(|e| MochaError::Other {
                message: format!("Cannot serialize script result: {e}"),
            })?;
        match self {
            Self::Json => serde_json::to_string(&json).map_err(|e| MochaError::Other {
                message: format!("Cannot serialize script result: {e}"),
            }),
            Self::Xml => to_xml(&json),
        }
    }
}

impl fmt::Display for ApiOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

impl FromStr for ApiOutputFormat {
    type Err = MochaError;

    fn from_str(media_type: &str) -> Result<Self> {
        let unsupported = || MochaError::UnsupportedOutputFormat {
            media_type: media_type.to_string(),
        };
        let captures = MEDIA_TYPE.captures(media_type.trim()).ok_or_else(unsupported)?;
        let subtype = captures.get(1).map(|m| m.as_str().to_ascii_lowercase()).unwrap_or_default();
        match subtype.as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(unsupported()),
        }
    }
}

fn xml_error(e: impl fmt::Display) -> MochaError {
    MochaError::Other {
        message: format!("Cannot write XML: {e}"),
    }
}

fn to_xml(value: &serde_json::Value) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, "result", value)?;
    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

/// Element name for a map key; characters XML does not allow become `_`.
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &serde_json::Value) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)?;
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::Bool(flag) => {
            writer.write_event(Event::Text(BytesText::new(&flag.to_string()))).map_err(xml_error)?;
        }
        serde_json::Value::Number(number) => {
            writer.write_event(Event::Text(BytesText::new(&number.to_string()))).map_err(xml_error)?;
        }
        serde_json::Value::String(text) => {
            writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_error)?;
        }
        serde_json::Value::Array(items) => {
            for item in items {
                write_element(writer, "item", item)?;
            }
        }
        serde_json::Value::Object(map) => {
            for (key, item) in map {
                write_element(writer, &element_name(key), item)?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)?;
    Ok(())
}
