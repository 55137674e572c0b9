use serde::Serialize;
use url::Url;

use super::{lookup, parse_web_link, ContentParser, ParsedContent, TextTree, WebContent};
use crate::cartridge::ResourceType;
use crate::processors::{ConversionState, ProcessingContext};
use crate::settings::CustomBlockContentType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfContent {
    pub url: String,
    #[serde(skip)]
    static_file: Option<PdfStaticFile>,
}

#[derive(Debug, Clone, PartialEq)]
struct PdfStaticFile {
    cc_path: String,
    from_web_resources: bool,
}

impl TextTree for PdfContent {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.url.visit_text(visit);
    }
}

impl ParsedContent for PdfContent {
    fn register(&self, state: &mut ConversionState) {
        let Some(static_file) = &self.static_file else {
            return;
        };
        if static_file.from_web_resources {
            state
                .static_paths
                .add_web_resource_path(&self.url, static_file.cc_path.as_str());
        } else {
            state
                .static_paths
                .add_extra_path(&self.url, static_file.cc_path.as_str());
        }
    }
}

/// Converts PDF files and links to PDF documents into PDF components.
/// Only active when the PDF custom block is enabled.
pub struct PdfParser;

impl ContentParser for PdfParser {
    type Content = PdfContent;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        if !cx.options.uses_custom_block(CustomBlockContentType::Pdf) {
            return Ok(None);
        }
        let Some(resource) = lookup(idref, cx.cartridge) else {
            return Ok(None);
        };

        if resource.is(ResourceType::WebContent) {
            let Some(resource_file) = resource.first_file() else {
                return Ok(None);
            };
            let web_content = WebContent::new(cx.cartridge, resource_file);
            if !CustomBlockContentType::Pdf.accepts_file(&web_content.resource_relative_path) {
                return Ok(None);
            }
            return Ok(Some(PdfContent {
                url: web_content.olx_static_path(),
                static_file: Some(PdfStaticFile {
                    cc_path: web_content.resource_relative_path.clone(),
                    from_web_resources: web_content.is_from_web_resources_dir(),
                }),
            }));
        }

        let Some(web_link) = parse_web_link(resource, cx.cartridge)? else {
            return Ok(None);
        };
        if !CustomBlockContentType::Pdf.accepts_file(&url_path(&web_link.href)) {
            return Ok(None);
        }
        Ok(Some(PdfContent {
            url: web_link.href,
            static_file: None,
        }))
    }
}

// Path component of a URL, so query strings do not hide the extension.
fn url_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.split(['?', '#']).next().unwrap_or(href).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/files/guide.pdf?download=1", true)]
    #[case("https://example.com/files/guide.PDF#page=2", true)]
    #[case("https://example.com/view?file=guide.pdf", false)]
    #[case("files/guide.pdf", true)]
    fn checks_extension_of_url_path(#[case] href: &str, #[case] is_pdf: bool) {
        assert_eq!(
            CustomBlockContentType::Pdf.accepts_file(&url_path(href)),
            is_pdf
        );
    }
}
