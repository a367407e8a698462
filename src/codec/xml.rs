//! Attribute-aware XML conversion.
//!
//! Layout written by [`encode_xml`] and read back by [`decode_xml`]:
//!
//! - the document element is `root`;
//! - every map entry becomes an element named after its key, spaces replaced
//!   with underscores and integer keys prefixed (`3` becomes `integer_key_3`);
//! - an `@attributes` map inside a map becomes the attributes of that map's element;
//! - a map holding only `@attributes` and the key `0` collapses into a single
//!   element carrying both the attributes and the text of `0`;
//! - object values are serialized and written as text of an element flagged
//!   with `serialized_object="true"`.
//!
//! Scalars come back as strings, and empty maps or lists come back as empty strings.

use super::serialized::{decode_serialized, encode_serialized};
use super::tree::{self, Element};
use super::{CodecError, ATTRIBUTES_KEY, DEFAULT_INTEGER_KEY_PREFIX, SERIALIZED_MARKER};
use crate::value::{Map, Value};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const ROOT: &str = "root";
const LEAF_KEY: &str = "0";

/// XmlOptions controls XML output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    /// Wrap text content in CDATA sections instead of escaping it.
    pub cdata: bool,
    /// System identifier written as `<!DOCTYPE root SYSTEM '...'>`.
    pub dtd: Option<String>,
    /// Version written in the XML declaration.
    pub version: String,
    /// Element-name prefix for integer keys.
    pub integer_key_prefix: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        XmlOptions {
            cdata: true,
            dtd: None,
            version: "1.0".to_string(),
            integer_key_prefix: DEFAULT_INTEGER_KEY_PREFIX.to_string(),
        }
    }
}

impl XmlOptions {
    pub fn cdata(mut self, cdata: bool) -> Self {
        self.cdata = cdata;
        self
    }

    pub fn dtd(mut self, dtd: impl Into<String>) -> Self {
        self.dtd = Some(dtd.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn integer_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.integer_key_prefix = prefix.into();
        self
    }
}

fn is_integer_key(key: &str) -> bool {
    !key.is_empty() && key.parse::<i64>().is_ok()
}

/// Returns the element name used for a map key.
pub fn element_name(key: &str, prefix: &str) -> String {
    if is_integer_key(key) {
        format!("{prefix}{key}")
    } else {
        key.replace(' ', "_")
    }
}

/// Returns the map key for an element name; the inverse of [`element_name`]
/// for integer keys.
pub fn key_name(element: &str, prefix: &str) -> String {
    match element.strip_prefix(prefix) {
        Some(rest) if is_integer_key(rest) => rest.to_string(),
        _ => element.to_string(),
    }
}

/// Rejects names that would not produce a well-formed tag.
fn check_name(name: &str) -> Result<(), CodecError> {
    let forbidden = |c: char| {
        c.is_whitespace() || matches!(c, '<' | '>' | '&' | '"' | '\'' | '/' | '=' | '!' | '?')
    };
    let valid = match name.chars().next() {
        None => false,
        Some(first) => {
            !(first.is_ascii_digit() || first == '-' || first == '.') && !name.contains(forbidden)
        }
    };
    if valid {
        Ok(())
    } else {
        Err(CodecError::xml(format!("invalid element name {name:?}")))
    }
}

fn is_flag_set(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Decodes an XML document into container data.
///
/// Attributes of the document element itself are kept under `@attributes`.
pub fn decode_xml(input: &str, prefix: &str) -> Result<Map, CodecError> {
    let root = tree::parse(input)?;
    let mut data = decode_children(&root, prefix)?;
    let attributes = collect_attributes(&root);
    if !attributes.is_empty() {
        data.set(ATTRIBUTES_KEY, attributes);
    }
    Ok(data)
}

fn collect_attributes(element: &Element) -> Map {
    element
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn decode_children(element: &Element, prefix: &str) -> Result<Map, CodecError> {
    let mut data = Map::new();

    for child in &element.children {
        let key = key_name(&child.name, prefix);

        if child.attribute(SERIALIZED_MARKER).is_some_and(is_flag_set) {
            data.set(key, decode_serialized(child.text.trim())?);
            continue;
        }

        let attributes = collect_attributes(child);

        if !child.children.is_empty() {
            let mut nested = decode_children(child, prefix)?;
            if !nested.is_empty() {
                if !attributes.is_empty() {
                    nested.set(ATTRIBUTES_KEY, attributes);
                }
                data.set(key, nested);
                continue;
            }
        }

        if attributes.is_empty() {
            data.set(key, child.text.clone());
        } else {
            let mut leaf = Map::new();
            leaf.set(LEAF_KEY, child.text.clone());
            leaf.set(ATTRIBUTES_KEY, attributes);
            data.set(key, leaf);
        }
    }

    Ok(data)
}

type XmlWriter = Writer<Vec<u8>>;

/// Encodes container data as an XML document.
pub fn encode_xml(data: &Map, options: &XmlOptions) -> Result<String, CodecError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    write(
        &mut writer,
        Event::Decl(BytesDecl::new(&options.version, Some("UTF-8"), None)),
    )?;
    if let Some(dtd) = &options.dtd {
        let doctype = format!("{ROOT} SYSTEM '{dtd}'");
        write(&mut writer, Event::DocType(BytesText::from_escaped(doctype)))?;
    }

    let (attributes, children) = split_attributes(data);
    write_element(&mut writer, ROOT, &attributes, &children, options)?;

    String::from_utf8(writer.into_inner()).map_err(CodecError::xml)
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), CodecError> {
    writer.write_event(event).map_err(CodecError::xml)
}

fn split_attributes(map: &Map) -> (Vec<(String, String)>, Map) {
    let attributes = match map.get(ATTRIBUTES_KEY) {
        Some(Value::Map(attrs)) => attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_text().unwrap_or_default()))
            .collect(),
        _ => Vec::new(),
    };
    let mut children = map.clone();
    children.delete(ATTRIBUTES_KEY);
    (attributes, children)
}

fn start_tag<'a>(
    name: &'a str,
    attributes: &[(String, String)],
) -> Result<BytesStart<'a>, CodecError> {
    let mut start = BytesStart::new(name);
    for (k, v) in attributes {
        check_name(k)?;
        start.push_attribute((k.as_str(), v.as_str()));
    }
    Ok(start)
}

fn write_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(String, String)],
    children: &Map,
    options: &XmlOptions,
) -> Result<(), CodecError> {
    if children.is_empty() {
        return write(writer, Event::Empty(start_tag(name, attributes)?));
    }
    write(writer, Event::Start(start_tag(name, attributes)?))?;
    for (key, value) in children.iter() {
        write_value(writer, key, value, options)?;
    }
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write_value(
    writer: &mut XmlWriter,
    key: &str,
    value: &Value,
    options: &XmlOptions,
) -> Result<(), CodecError> {
    let name = element_name(key, &options.integer_key_prefix);
    check_name(&name)?;

    match value {
        Value::Object(_) => {
            let payload = encode_serialized(value)?;
            let marker = [(SERIALIZED_MARKER.to_string(), "true".to_string())];
            write_leaf(writer, &name, &marker, &payload, options.cdata)
        }
        Value::Map(map) => {
            let (attributes, children) = split_attributes(map);
            if !attributes.is_empty() && children.len() == 1 {
                if let Some(text) = children.get(LEAF_KEY).and_then(Value::to_text) {
                    return write_leaf(writer, &name, &attributes, &text, options.cdata);
                }
            }
            write_element(writer, &name, &attributes, &children, options)
        }
        Value::List(_) => {
            let children = value.clone().into_map().unwrap_or_default();
            write_element(writer, &name, &[], &children, options)
        }
        scalar => {
            let text = scalar.to_text().unwrap_or_default();
            write_leaf(writer, &name, &[], &text, options.cdata)
        }
    }
}

fn write_leaf(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(String, String)],
    text: &str,
    cdata: bool,
) -> Result<(), CodecError> {
    if text.is_empty() {
        return write(writer, Event::Empty(start_tag(name, attributes)?));
    }

    write(writer, Event::Start(start_tag(name, attributes)?))?;
    if cdata {
        // "]]>" cannot appear inside a section; split it across two.
        let mut rest = text;
        while let Some(pos) = rest.find("]]>") {
            write(writer, Event::CData(BytesCData::new(&rest[..pos + 2])))?;
            rest = &rest[pos + 2..];
        }
        write(writer, Event::CData(BytesCData::new(rest)))?;
    } else {
        write(writer, Event::Text(BytesText::new(text)))?;
    }
    write(writer, Event::End(BytesEnd::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_names() {
        assert_eq!(element_name("3", DEFAULT_INTEGER_KEY_PREFIX), "integer_key_3");
        assert_eq!(element_name("first data", DEFAULT_INTEGER_KEY_PREFIX), "first_data");
        assert_eq!(key_name("integer_key_3", DEFAULT_INTEGER_KEY_PREFIX), "3");
        assert_eq!(key_name("integer_key_x", DEFAULT_INTEGER_KEY_PREFIX), "integer_key_x");
        assert_eq!(key_name("idx_7", "idx_"), "7");
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("first_data").is_ok());
        assert!(check_name("integer_key_3").is_ok());
        assert!(check_name("ns:tag").is_ok());
        for bad in ["", "3a", "-x", "a<b", "a/b", "a b", "a&b", "a\"b"] {
            assert!(check_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_flag_values() {
        assert!(is_flag_set("true"));
        assert!(is_flag_set("1"));
        assert!(!is_flag_set("0"));
        assert!(!is_flag_set("false"));
        assert!(!is_flag_set(""));
    }

    #[test]
    fn test_encode_plain_text() {
        let mut data = Map::new();
        data.set("a", "1 < 2");
        let xml = encode_xml(&data, &XmlOptions::default().cdata(false)).unwrap();
        assert!(xml.contains("<a>1 &lt; 2</a>"));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    }

    #[test]
    fn test_encode_cdata_split() {
        let mut data = Map::new();
        data.set("a", "x]]>y");
        let xml = encode_xml(&data, &XmlOptions::default()).unwrap();
        assert!(xml.contains("<![CDATA[x]]]]><![CDATA[>y]]>"));

        let decoded = decode_xml(&xml, DEFAULT_INTEGER_KEY_PREFIX).unwrap();
        assert_eq!(decoded.get("a"), Some(&Value::String("x]]>y".into())));
    }

    #[test]
    fn test_encode_dtd() {
        let xml = encode_xml(&Map::new(), &XmlOptions::default().dtd("root.dtd")).unwrap();
        assert!(xml.contains("<!DOCTYPE root SYSTEM 'root.dtd'>"));
        assert!(xml.contains("<root/>"));
        assert!(decode_xml(&xml, DEFAULT_INTEGER_KEY_PREFIX).unwrap().is_empty());
    }
}
