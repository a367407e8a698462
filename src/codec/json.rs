//! JSON, YAML and generic-object conversions.

use super::{CodecError, Format};
use crate::value::{self, Map, Object, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Normalizes an arbitrary value into container data.
///
/// Maps are taken as they are, lists are keyed by position, objects
/// contribute their fields and any other scalar is stored under `default`.
pub fn into_data(value: Value) -> Map {
    match value {
        Value::Map(m) => m,
        Value::List(l) => Value::List(l).into_map().unwrap_or_default(),
        Value::Object(o) => o.fields,
        scalar => {
            let mut data = Map::new();
            data.set("default", scalar);
            data
        }
    }
}

/// Parses JSON text.
///
/// A document that parses to a falsy value (`null`, `false`, `0`, `""`,
/// `[]`, `{}`) yields `Ok(None)`: there is nothing to load, but nothing is wrong.
pub fn decode_json(input: &str) -> Result<Option<Map>, CodecError> {
    let value = value::from_json(input).map_err(CodecError::json)?;
    if !value.is_truthy() {
        return Ok(None);
    }
    Ok(Some(into_data(value)))
}

/// Serializes data as JSON text. Objects are written as their field maps.
pub fn encode_json(data: &Map) -> Result<String, CodecError> {
    serde_json::to_string(data).map_err(CodecError::json)
}

/// Parses YAML text with the same falsy-document rule as [`decode_json`].
pub fn decode_yaml(input: &str) -> Result<Option<Map>, CodecError> {
    let value = value::from_yaml(input).map_err(|e| CodecError::new(Format::Yaml, e.to_string()))?;
    if !value.is_truthy() {
        return Ok(None);
    }
    Ok(Some(into_data(value)))
}

/// Serializes data as YAML text.
pub fn encode_yaml(data: &Map) -> Result<String, CodecError> {
    serde_yaml::to_string(data).map_err(|e| CodecError::new(Format::Yaml, e.to_string()))
}

/// Copies the public fields of an object into container data.
pub fn decode_object(object: &Object) -> Map {
    object.fields.clone()
}

/// Copies the public fields of any serializable type into container data.
pub fn decode_struct<T: Serialize>(input: &T) -> Result<Map, CodecError> {
    value::to_value(input)
        .map(into_data)
        .map_err(|e| CodecError::new(Format::Object, e.to_string()))
}

/// Wraps data as a generic object of the given type name.
pub fn encode_object(data: &Map, class: &str) -> Object {
    Object::new(class, data.clone())
}

/// Builds a typed struct from container data.
pub fn encode_struct<T: DeserializeOwned>(data: &Map) -> Result<T, CodecError> {
    serde_json::to_value(data)
        .and_then(serde_json::from_value)
        .map_err(|e| CodecError::new(Format::Object, e.to_string()))
}
