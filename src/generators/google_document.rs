use super::OlxGenerator;
use crate::content::google_document::GoogleDocumentContent;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

// Iframe settings the Google document XBlock uses by default.
const IFRAME_ATTRIBUTES: [(&str, &str); 6] = [
    ("frameborder", "0"),
    ("width", "960"),
    ("height", "569"),
    ("allowfullscreen", "true"),
    ("mozallowfullscreen", "true"),
    ("webkitallowfullscreen", "true"),
];

pub struct GoogleDocumentGenerator;

impl OlxGenerator for GoogleDocumentGenerator {
    type Content = GoogleDocumentContent;

    fn create_nodes(
        &self,
        content: &GoogleDocumentContent,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        let iframe = embed_code(&content.url);
        let document = Element::new("google-document").attr("embed_code", iframe);
        Ok(vec![document.into()])
    }
}

fn embed_code(url: &str) -> String {
    let mut iframe = String::from("<iframe");
    for (key, value) in IFRAME_ATTRIBUTES {
        iframe.push_str(&format!(" {}=\"{}\"", key, value));
    }
    iframe.push_str(&format!(" src=\"{}\"></iframe>\n", url));
    iframe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_document_in_iframe() {
        assert_eq!(
            embed_code("https://docs.google.com/document/d/1/edit"),
            "<iframe frameborder=\"0\" width=\"960\" height=\"569\" allowfullscreen=\"true\" \
             mozallowfullscreen=\"true\" webkitallowfullscreen=\"true\" \
             src=\"https://docs.google.com/document/d/1/edit\"></iframe>\n"
        );
    }
}
