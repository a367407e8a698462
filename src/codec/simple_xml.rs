//! Structure-only XML reading.

use super::tree::{self, Element};
use super::{CodecError, Format, ATTRIBUTES_KEY};
use crate::value::{Map, Value};

/// Decodes an XML document keeping element structure only.
///
/// Elements with text become strings and lose their attributes. Empty
/// elements become empty maps. Repeated sibling names collect into a list.
/// Neither integer-key prefixes nor serialized values are recognized.
pub fn decode_simple_xml(input: &str) -> Result<Map, CodecError> {
    let root = tree::parse(input)
        .map_err(|err| CodecError::new(Format::SimpleXml, err.message))?;
    Ok(match simplify(&root) {
        Value::Map(map) => map,
        other => {
            let mut data = Map::new();
            data.set("0", other);
            data
        }
    })
}

fn simplify(element: &Element) -> Value {
    if element.children.is_empty() {
        let text = element.text.trim();
        if !text.is_empty() {
            return Value::String(text.to_string());
        }
    }

    let mut map = Map::new();
    if !element.attributes.is_empty() {
        let attributes: Map = element
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        map.set(ATTRIBUTES_KEY, attributes);
    }

    for child in &element.children {
        let value = simplify(child);
        match map.get_mut(&child.name) {
            Some(Value::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::Null);
                *existing = Value::List(vec![first, value]);
            }
            None => {
                map.set(child.name.clone(), value);
            }
        }
    }

    Value::Map(map)
}
