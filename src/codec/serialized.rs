//! Serialized format: self-describing CBOR, armoured as base64 text.

use super::CodecError;
use crate::value::{Map, Object, Value};
use base64ct::{Base64, Encoding};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Wire mirror of [`Value`]. Externally tagged so objects stay distinct from maps.
#[derive(Debug, Serialize, Deserialize)]
enum Packed {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Packed>),
    Map(IndexMap<String, Packed>),
    Object {
        class: String,
        fields: IndexMap<String, Packed>,
    },
}

impl From<&Value> for Packed {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Packed::Null,
            Value::Bool(b) => Packed::Bool(*b),
            Value::Int(i) => Packed::Int(*i),
            Value::Float(f) => Packed::Float(*f),
            Value::String(s) => Packed::String(s.clone()),
            Value::List(l) => Packed::List(l.iter().map(Packed::from).collect()),
            Value::Map(m) => Packed::Map(pack_map(m)),
            Value::Object(o) => Packed::Object {
                class: o.class.clone(),
                fields: pack_map(&o.fields),
            },
        }
    }
}

impl From<Packed> for Value {
    fn from(packed: Packed) -> Self {
        match packed {
            Packed::Null => Value::Null,
            Packed::Bool(b) => Value::Bool(b),
            Packed::Int(i) => Value::Int(i),
            Packed::Float(f) => Value::Float(f),
            Packed::String(s) => Value::String(s),
            Packed::List(l) => Value::List(l.into_iter().map(Value::from).collect()),
            Packed::Map(m) => Value::Map(unpack_map(m)),
            Packed::Object { class, fields } => Value::Object(Object::new(class, unpack_map(fields))),
        }
    }
}

fn pack_map(map: &Map) -> IndexMap<String, Packed> {
    map.iter().map(|(k, v)| (k.clone(), Packed::from(v))).collect()
}

fn unpack_map(map: IndexMap<String, Packed>) -> Map {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

/// Serializes a value into text.
pub fn encode_serialized(value: &Value) -> Result<String, CodecError> {
    let bytes = serde_cbor::to_vec(&Packed::from(value)).map_err(CodecError::serialized)?;
    Ok(Base64::encode_string(&bytes))
}

/// Restores a value from text produced by [`encode_serialized`].
pub fn decode_serialized(input: &str) -> Result<Value, CodecError> {
    let bytes = Base64::decode_vec(input.trim()).map_err(CodecError::serialized)?;
    let packed: Packed = serde_cbor::from_slice(&bytes).map_err(CodecError::serialized)?;
    Ok(Value::from(packed))
}
