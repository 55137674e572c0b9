use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{lookup, parse_web_link, ContentParser, ParsedContent, TextTree};
use crate::processors::ProcessingContext;
use crate::settings::CustomBlockContentType;

static GOOGLE_DOCUMENT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://docs\.google\.com/([^/]+)/d/.*$").unwrap());

// Drawings cannot be embedded.
const UNSUPPORTED_DOCUMENT_KIND: &str = "drawings";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoogleDocumentContent {
    pub url: String,
}

impl TextTree for GoogleDocumentContent {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.url.visit_text(visit);
    }
}

impl ParsedContent for GoogleDocumentContent {}

pub struct GoogleDocumentParser;

impl ContentParser for GoogleDocumentParser {
    type Content = GoogleDocumentContent;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        let block = CustomBlockContentType::GoogleDocument;
        if !cx.options.uses_custom_block(block) {
            return Ok(None);
        }
        let Some(resource) = lookup(idref, cx.cartridge) else {
            return Ok(None);
        };
        let Some(web_link) = parse_web_link(resource, cx.cartridge)? else {
            return Ok(None);
        };

        if !is_supported_google_document_url(&web_link.href) {
            return Ok(None);
        }
        let url = web_link.href;
        Ok(Some(GoogleDocumentContent { url }))
    }
}

pub fn is_supported_google_document_url(url: &str) -> bool {
    GOOGLE_DOCUMENT_URL
        .captures(url)
        .is_some_and(|captures| !captures[1].eq_ignore_ascii_case(UNSUPPORTED_DOCUMENT_KIND))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://docs.google.com/document/d/1abc/edit", true)]
    #[case("http://DOCS.google.com/spreadsheets/d/1abc", true)]
    #[case("https://docs.google.com/presentation/d/1abc/pub", true)]
    #[case("https://docs.google.com/drawings/d/1abc/edit", false)]
    #[case("https://drive.google.com/file/d/1abc/view", false)]
    fn recognizes_embeddable_documents(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_supported_google_document_url(url), expected);
    }
}
