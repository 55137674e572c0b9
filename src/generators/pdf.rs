use super::OlxGenerator;
use crate::content::pdf::PdfContent;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

pub struct PdfGenerator;

impl OlxGenerator for PdfGenerator {
    type Content = PdfContent;

    fn create_nodes(
        &self,
        content: &PdfContent,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        Ok(vec![Element::new("pdf").attr("url", content.url.as_str()).into()])
    }
}
