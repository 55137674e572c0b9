use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// A node of generated OLX markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn cdata(self, text: impl Into<String>) -> Self {
        self.child(Node::CData(text.into()))
    }

    /// Sets an attribute, keeping the position of one that already exists.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    /// Text and CDATA of the whole subtree.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            match node {
                Node::Element(element) => text.push_str(&element.text_content()),
                Node::Text(value) | Node::CData(value) => text.push_str(value),
            }
        }
        text
    }

    pub fn to_xml(&self) -> anyhow::Result<String> {
        to_xml_string(std::slice::from_ref(self))
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> anyhow::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            write_node(child, writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

/// Serializes a sequence of sibling nodes.
pub fn to_xml_string(nodes: &[impl AsNode]) -> anyhow::Result<String> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        node.write_to(&mut writer)?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

pub trait AsNode {
    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> anyhow::Result<()>;
}

impl AsNode for Node {
    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> anyhow::Result<()> {
        write_node(self, writer)
    }
}

impl AsNode for Element {
    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> anyhow::Result<()> {
        self.write(writer)
    }
}

fn write_node<W: std::io::Write>(node: &Node, writer: &mut Writer<W>) -> anyhow::Result<()> {
    match node {
        Node::Element(element) => element.write(writer)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::CData(text) => {
            for section in cdata_sections(text) {
                writer.write_event(Event::CData(BytesCData::new(section)))?;
            }
        }
    }
    Ok(())
}

// A CDATA section cannot contain `]]>`, so the text is split between the
// brackets and the closing angle across consecutive sections.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(position) = rest.find("]]>") {
        sections.push(&rest[..position + 2]);
        rest = &rest[position + 2..];
    }
    sections.push(rest);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_attributes_in_insertion_order() {
        let element = Element::new("video")
            .attr("youtube", "1.00:abc")
            .attr("youtube_id_1_0", "abc");
        assert_eq!(
            element.to_xml().unwrap(),
            r#"<video youtube="1.00:abc" youtube_id_1_0="abc"/>"#
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        let element = Element::new("choice")
            .attr("answer", "a & \"b\"")
            .text("1 < 2");
        assert_eq!(
            element.to_xml().unwrap(),
            r#"<choice answer="a &amp; &quot;b&quot;">1 &lt; 2</choice>"#
        );
    }

    #[test]
    fn splits_cdata_terminators() {
        let element = Element::new("html").cdata("a]]>b");
        assert_eq!(
            element.to_xml().unwrap(),
            "<html><![CDATA[a]]]]><![CDATA[>b]]></html>"
        );
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut element = Element::new("a").attr("x", "1").attr("y", "2");
        element.set_attribute("x", "3");
        assert_eq!(element.attributes[0], ("x".to_string(), "3".to_string()));
        assert_eq!(element.get_attribute("y"), Some("2"));
    }
}
