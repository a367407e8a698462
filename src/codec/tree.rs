//! Minimal element tree built from quick-xml events.

use super::CodecError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Element is one XML element with its attributes, child elements and
/// concatenated direct text (including CDATA sections).
///
/// Whitespace-only text of an element that has child elements is dropped;
/// the text of a leaf element is kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses a document and returns its root element.
pub(crate) fn parse(input: &str) -> Result<Element, CodecError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(CodecError::xml)? {
            Event::Start(e) => stack.push(open(&e)?),
            Event::Empty(e) => {
                let element = open(&e)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::xml("closing tag without an open element"))?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(CodecError::xml)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(CodecError::xml(format!("unclosed element <{}>", unclosed.name)));
    }
    root.ok_or_else(|| CodecError::xml("document has no root element"))
}

fn open(start: &BytesStart<'_>) -> Result<Element, CodecError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(CodecError::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(CodecError::xml)?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn close(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), CodecError> {
    if !element.children.is_empty() && element.text.trim().is_empty() {
        element.text.clear();
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(CodecError::xml(format!(
            "second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let root = parse(
            r#"<?xml version="1.0"?>
<root>
    <a x="1">text</a>
    <b><c/></b>
</root>"#,
        )
        .unwrap();

        assert_eq!(root.name, "root");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].attribute("x"), Some("1"));
        assert_eq!(root.children[0].text, "text");
        assert_eq!(root.children[1].children[0].name, "c");
        assert!(root.text.is_empty());
    }

    #[test]
    fn test_parse_cdata_and_entities() {
        let root = parse("<root><a><![CDATA[<raw>]]></a><b>1 &amp; 2</b></root>").unwrap();
        assert_eq!(root.children[0].text, "<raw>");
        assert_eq!(root.children[1].text, "1 & 2");
    }

    #[test]
    fn test_leaf_whitespace_is_kept() {
        let root = parse("<root>\n    <a>   </a>\n    <b> x </b>\n</root>").unwrap();
        assert!(root.text.is_empty());
        assert_eq!(root.children[0].text, "   ");
        assert_eq!(root.children[1].text, " x ");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("<root><a></root>").is_err());
        assert!(parse("<root>").is_err());
        assert!(parse("").is_err());
        assert!(parse("<a/><b/>").is_err());
    }
}
