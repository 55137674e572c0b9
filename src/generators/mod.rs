//! OLX generators, one per parsed content type.

mod discussion;
mod google_document;
mod html;
mod lti;
mod pdf;
pub mod qti;
mod video;

pub use discussion::DiscussionGenerator;
pub use google_document::GoogleDocumentGenerator;
pub use html::HtmlGenerator;
pub use lti::LtiGenerator;
pub use pdf::PdfGenerator;
pub use qti::QtiGenerator;
pub use video::VideoGenerator;

use std::sync::LazyLock;

use regex::Regex;

use crate::olx::Node;
use crate::settings::ConversionOptions;

static CDATA_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

pub trait OlxGenerator {
    type Content;

    /// A single content item may expand into several sibling nodes.
    fn create_nodes(
        &self,
        content: &Self::Content,
        options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>>;
}

/// Unwraps CDATA sections so the text can be put into a new one.
pub fn clean_from_cdata(text: &str) -> String {
    CDATA_SECTION.replace_all(text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_every_cdata_section() {
        assert_eq!(
            clean_from_cdata("<p><![CDATA[a]]></p><![CDATA[\nb <i>c</i>]]>"),
            "<p>a</p>\nb <i>c</i>"
        );
    }
}
