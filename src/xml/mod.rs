mod qti;

pub use qti::{items, QtiItem, RespCondition, ResponseLabel};

use std::{fs, path::Path};

use anyhow::Context;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("closing tag </{0}> has no matching opening tag")]
    UnbalancedTag(String),

    #[error("document has no root element")]
    NoRoot,
}

/// An element of a loaded XML document.
///
/// Names are stored without their namespace prefix, so `<blti:title>` is
/// looked up as `title`. Namespace declarations are not kept as attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |element| element.name == name)
    }

    /// Follows a `/`-separated chain of child names, taking the first match
    /// at every step.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .try_fold(self, |element, name| element.child(name))
    }

    /// All elements below this one with the given name, in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for element in self.elements() {
            if element.name == name {
                found.push(element);
            }
            element.collect_descendants(name, found);
        }
    }

    /// Concatenated direct text and CDATA content, `None` when the element
    /// has no text at all.
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for node in &self.children {
            if let XmlNode::Text(value) = node {
                text.get_or_insert_with(String::new).push_str(value);
            }
        }
        text
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    pub fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    fn from_start(start: &BytesStart) -> Result<Self, XmlError> {
        let mut element = XmlElement::new(&String::from_utf8_lossy(start.local_name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

/// Parses a complete XML document and returns its root element.
pub fn parse_str(source: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                let element = stack.pop().ok_or(XmlError::UnbalancedTag(name))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&unescape_text(&text));
                }
            }
            Event::CData(cdata) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(XmlError::NoRoot)
}

/// Reads and parses an XML file.
pub fn load(path: &Path) -> anyhow::Result<XmlElement> {
    let source = fs::read_to_string(path).context(format!("failed to read {}", path.display()))?;
    parse_str(&source).context(format!("failed to parse {}", path.display()))
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.push_element(element),
        None => {
            root.get_or_insert(element);
        }
    }
}

// Course exports routinely carry HTML entities (`&nbsp;`) that plain XML
// does not define.
fn unescape_text(text: &BytesText) -> String {
    match text.unescape() {
        Ok(value) => value.into_owned(),
        Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(text)).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_namespace_prefixes() {
        let root = parse_str(
            r#"<?xml version="1.0"?>
            <cartridge_basiclti_link xmlns:blti="http://www.imsglobal.org/xsd/imsbasiclti_v1p0">
              <blti:title>Tool</blti:title>
              <blti:launch_url>https://example.com/launch</blti:launch_url>
            </cartridge_basiclti_link>"#,
        )
        .unwrap();

        assert_eq!(root.name, "cartridge_basiclti_link");
        assert_eq!(root.attributes().count(), 0);
        let title = root.child("title").and_then(|t| t.text());
        assert_eq!(title.as_deref(), Some("Tool"));
    }

    #[test]
    fn joins_text_and_cdata() {
        let root = parse_str("<mattext>a &lt;b&gt; <![CDATA[<p>c</p>]]></mattext>").unwrap();
        assert_eq!(root.text().as_deref(), Some("a <b> <p>c</p>"));
    }

    #[test]
    fn tolerates_html_entities() {
        let root = parse_str("<text>one&nbsp;two</text>").unwrap();
        assert_eq!(root.text().as_deref(), Some("one\u{a0}two"));
    }

    #[test]
    fn empty_element_has_no_text() {
        let root = parse_str(r#"<topic><text/></topic>"#).unwrap();
        assert_eq!(root.child("text").map(|t| t.text()), Some(None));
    }

    #[test]
    fn finds_descendants_in_document_order() {
        let source = r#"<a><b id="1"><c id="2"/></b><c id="3"><c id="4"/></c></a>"#;
        let root = parse_str(source).unwrap();
        let ids: Vec<_> = root
            .descendants_named("c")
            .iter()
            .filter_map(|c| c.attr("id"))
            .collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
        assert_eq!(root.find("b/c").and_then(|c| c.attr("id")), Some("2"));
    }

    #[test]
    fn rejects_document_without_root() {
        assert!(matches!(parse_str("<?xml version=\"1.0\"?>"), Err(XmlError::NoRoot)));
    }
}
