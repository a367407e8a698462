//! Codec module - Conversions between container data and external representations.
//!
//! Every decoder produces a [`Map`](crate::value::Map); every encoder consumes one.
//! Failures are reported as [`CodecError`] and never panic.
//!
//! - JSON and YAML go through serde.
//! - XML is attribute-aware: attributes live under the `@attributes` key,
//!   object values are escaped with a `serialized_object` marker attribute and
//!   integer keys are written with a configurable element-name prefix.
//! - Simple XML is a looser reading that keeps only element structure.
//! - The serialized format is self-describing CBOR armoured as base64 text.

mod json;
mod serialized;
mod simple_xml;
mod tree;
mod xml;


pub use json::*;
pub use serialized::*;
pub use simple_xml::*;
pub use xml::*;

use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Map key holding the XML attributes of an element.
pub const ATTRIBUTES_KEY: &str = "@attributes";

/// Attribute flagging an element whose text is a serialized value.
pub const SERIALIZED_MARKER: &str = "serialized_object";

/// Text substituted for object values when serializing with objects skipped.
pub const SKIPPED_OBJECT: &str = "{;skipped_object;}";

/// Element-name prefix for integer keys.
pub const DEFAULT_INTEGER_KEY_PREFIX: &str = "integer_key_";

/// Format names an external representation of container data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// In-memory values, taken as they are.
    #[default]
    #[serde(alias = "none")]
    Array,
    Json,
    Xml,
    SimpleXml,
    Serialized,
    Object,
    Yaml,
    /// Flat text export joined by a separator.
    Text,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Array => "array",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::SimpleXml => "simple_xml",
            Format::Serialized => "serialized",
            Format::Object => "object",
            Format::Yaml => "yaml",
            Format::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "array" => Ok(Format::Array),
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            "simple_xml" => Ok(Format::SimpleXml),
            "serialized" => Ok(Format::Serialized),
            "object" => Ok(Format::Object),
            "yaml" => Ok(Format::Yaml),
            "text" => Ok(Format::Text),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

/// CodecError is a structural failure while decoding or encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{format}: {message}")]
pub struct CodecError {
    pub format: Format,
    pub message: String,
}

impl CodecError {
    /// Creates a new codec error.
    pub fn new(format: Format, message: impl Into<String>) -> Self {
        CodecError {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn json(message: impl fmt::Display) -> Self {
        CodecError::new(Format::Json, message.to_string())
    }

    pub(crate) fn xml(message: impl fmt::Display) -> Self {
        CodecError::new(Format::Xml, message.to_string())
    }

    pub(crate) fn serialized(message: impl fmt::Display) -> Self {
        CodecError::new(Format::Serialized, message.to_string())
    }
}

/// Decodes raw input of the declared format into container data.
///
/// `Ok(None)` means the input held nothing to load.
pub fn decode_input(
    data: Value,
    format: Format,
    prefix: &str,
) -> Result<Option<Map>, CodecError> {
    match format {
        Format::Array => Ok(Some(into_data(data))),
        Format::Object => Ok(Some(match data {
            Value::Object(object) => decode_object(&object),
            other => into_data(other),
        })),
        Format::Json => decode_json(input_text(&data, format)?),
        Format::Yaml => decode_yaml(input_text(&data, format)?),
        Format::Xml => decode_xml(input_text(&data, format)?, prefix).map(Some),
        Format::SimpleXml => decode_simple_xml(input_text(&data, format)?).map(Some),
        Format::Serialized => Ok(Some(
            match decode_serialized(input_text(&data, format)?)? {
                Value::Object(object) => {
                    let mut data = Map::new();
                    data.set(object.class.clone(), object);
                    data
                }
                other => into_data(other),
            },
        )),
        Format::Text => Err(CodecError::new(format, "text is an export-only format")),
    }
}

pub(crate) fn input_text(data: &Value, format: Format) -> Result<&str, CodecError> {
    data.as_str().ok_or_else(|| {
        CodecError::new(
            format,
            format!("expected text input, got {}", data.type_name()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("none".parse::<Format>(), Ok(Format::Array));
        assert_eq!("simple_xml".parse::<Format>(), Ok(Format::SimpleXml));
        assert_eq!(Format::SimpleXml.to_string(), "simple_xml");
        assert!("csv".parse::<Format>().is_err());
    }

    #[test]
    fn test_format_deserializes_from_yaml() {
        let format: Format = serde_yaml::from_str("none").unwrap();
        assert_eq!(format, Format::Array);
        let format: Format = serde_yaml::from_str("simple_xml").unwrap();
        assert_eq!(format, Format::SimpleXml);
    }

    #[test]
    fn test_decode_input() {
        let data = decode_input(Value::from(r#"{"a": 1}"#), Format::Json, DEFAULT_INTEGER_KEY_PREFIX)
            .unwrap()
            .unwrap();
        assert_eq!(data.get("a"), Some(&Value::Int(1)));

        let data = decode_input(Value::from("x"), Format::Array, DEFAULT_INTEGER_KEY_PREFIX)
            .unwrap()
            .unwrap();
        assert_eq!(data.get("default"), Some(&Value::from("x")));

        let err = decode_input(Value::Int(3), Format::Xml, DEFAULT_INTEGER_KEY_PREFIX).unwrap_err();
        assert_eq!(err.format, Format::Xml);
        assert!(decode_input(Value::from("a"), Format::Text, DEFAULT_INTEGER_KEY_PREFIX).is_err());
    }
}
