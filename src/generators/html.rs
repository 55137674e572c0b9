use super::{clean_from_cdata, OlxGenerator};
use crate::content::html::HtmlContent;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

pub struct HtmlGenerator;

impl OlxGenerator for HtmlGenerator {
    type Content = HtmlContent;

    fn create_nodes(
        &self,
        content: &HtmlContent,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        let html = Element::new("html").cdata(clean_from_cdata(&content.html));
        Ok(vec![html.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_markup_in_a_single_cdata_section() {
        let content = HtmlContent::new("<p><![CDATA[x]]> & y</p>");
        let nodes = HtmlGenerator
            .create_nodes(&content, &ConversionOptions::default())
            .unwrap();
        assert_eq!(
            crate::olx::to_xml_string(&nodes).unwrap(),
            "<html><![CDATA[<p>x & y</p>]]></html>"
        );
    }
}
