//! Content processors pairing a parser with its OLX generator, and the
//! ordered chain resources are dispatched through.

use std::collections::BTreeSet;

use anyhow::Context;
use serde::Serialize;
use tracing::debug;

use crate::cartridge::{Cartridge, StaticPathRegistry};
use crate::content::discussion::DiscussionParser;
use crate::content::google_document::GoogleDocumentParser;
use crate::content::html::HtmlParser;
use crate::content::lti::LtiParser;
use crate::content::pdf::PdfParser;
use crate::content::qti::QtiParser;
use crate::content::video::VideoParser;
use crate::content::{ContentParser, ParsedContent};
use crate::generators::{
    DiscussionGenerator, GoogleDocumentGenerator, HtmlGenerator, LtiGenerator, OlxGenerator,
    PdfGenerator, QtiGenerator, VideoGenerator,
};
use crate::links::StaticLinkRewriter;
use crate::olx::Node;
use crate::settings::ConversionOptions;

/// Facts collected across every resource of one conversion run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ConversionState {
    pub static_paths: StaticPathRegistry,
    pub lti_consumer_ids: BTreeSet<String>,
}

/// What a parser sees while processing one resource.
pub struct ProcessingContext<'a> {
    pub cartridge: &'a Cartridge,
    pub options: &'a ConversionOptions,
    pub state: &'a mut ConversionState,
}

/// Output of a processor that accepted a resource.
#[derive(Debug, Clone)]
pub struct Processed {
    pub processor: &'static str,
    /// The rewritten intermediate content.
    pub content: serde_json::Value,
    pub nodes: Vec<Node>,
}

pub trait Process {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the resource is not for this processor.
    fn process(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Processed>>;
}

pub struct ContentProcessor<P, G> {
    name: &'static str,
    parser: P,
    generator: G,
}

impl<P, G> ContentProcessor<P, G> {
    pub fn new(name: &'static str, parser: P, generator: G) -> Self {
        Self {
            name,
            parser,
            generator,
        }
    }
}

impl<P, G> Process for ContentProcessor<P, G>
where
    P: ContentParser,
    G: OlxGenerator<Content = P::Content>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Processed>> {
        let Some(mut content) = self.parser.parse(idref, cx)? else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }

        content.register(cx.state);
        let source = cx.options.relative_links_source.as_deref();
        let rewriter = StaticLinkRewriter::new(cx.cartridge, source, &cx.state.static_paths);
        rewriter.rewrite(&mut content);

        let nodes = self.generator.create_nodes(&content, cx.options)?;
        let content = serde_json::to_value(&content)
            .context(format!("failed to serialize {} content", self.name))?;
        Ok(Some(Processed {
            processor: self.name,
            content,
            nodes,
        }))
    }
}

/// Processors tried in turn; the first producing OLX nodes wins.
pub struct ProcessorChain {
    processors: Vec<Box<dyn Process>>,
}

impl Default for ProcessorChain {
    /// Specific processors first, HTML last as the catch-all.
    fn default() -> Self {
        Self::new(vec![
            Box::new(ContentProcessor::new("video", VideoParser, VideoGenerator)),
            Box::new(ContentProcessor::new("lti", LtiParser, LtiGenerator)),
            Box::new(ContentProcessor::new("qti", QtiParser, QtiGenerator)),
            Box::new(ContentProcessor::new("discussion", DiscussionParser, DiscussionGenerator)),
            Box::new(ContentProcessor::new(
                "google-document",
                GoogleDocumentParser,
                GoogleDocumentGenerator,
            )),
            Box::new(ContentProcessor::new("pdf", PdfParser, PdfGenerator)),
            Box::new(ContentProcessor::new("html", HtmlParser, HtmlGenerator)),
        ])
    }
}

impl ProcessorChain {
    pub fn new(processors: Vec<Box<dyn Process>>) -> Self {
        Self { processors }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors
            .iter()
            .map(|processor| processor.name())
            .collect()
    }

    /// Runs the resource through the chain. `Ok(None)` means no processor
    /// produced anything, which callers treat as an unresolved resource.
    pub fn process(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Processed>> {
        for processor in &self.processors {
            let idref_name = idref.unwrap_or("<none>");
            let context = format!("{} processor failed on {}", processor.name(), idref_name);
            let processed = processor.process(idref, cx).context(context)?;
            if let Some(processed) = processed.filter(|processed| !processed.nodes.is_empty()) {
                debug!(idref, processor = processed.processor, "resource processed");
                return Ok(Some(processed));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Resource;
    use crate::olx::Element;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn specific_processors_come_before_html() {
        assert_eq!(
            ProcessorChain::default().names(),
            vec![
                "video",
                "lti",
                "qti",
                "discussion",
                "google-document",
                "pdf",
                "html",
            ]
        );
    }

    #[test]
    fn html_fallback_handles_unknown_references() {
        let cartridge = Cartridge::new("/nonexistent", Vec::new());
        let options = ConversionOptions::default();
        let mut state = ConversionState::default();
        let mut cx = ProcessingContext {
            cartridge: &cartridge,
            options: &options,
            state: &mut state,
        };

        let chain = ProcessorChain::default();
        let processed = chain.process(Some("ghost"), &mut cx).unwrap().unwrap();

        assert_eq!(processed.processor, "html");
        assert_eq!(
            processed.nodes,
            vec![Node::Element(Element::new("html").cdata("<p>MISSING CONTENT</p>"))]
        );
    }

    #[test]
    fn empty_chain_leaves_resource_unresolved() {
        let cartridge = Cartridge::new("/nonexistent", Vec::new());
        let options = ConversionOptions::default();
        let mut state = ConversionState::default();
        let mut cx = ProcessingContext {
            cartridge: &cartridge,
            options: &options,
            state: &mut state,
        };
        let discussion = ContentProcessor::new("discussion", DiscussionParser, DiscussionGenerator);
        let chain = ProcessorChain::new(vec![Box::new(discussion)]);

        assert!(chain.process(Some("ghost"), &mut cx).unwrap().is_none());
    }

    #[test]
    fn lti_ids_are_registered_once_processed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lti.xml"),
            "<cartridge_basiclti_link><title>Tool</title>\
             <launch_url>https://tool.example.com</launch_url></cartridge_basiclti_link>",
        )
        .unwrap();
        let cartridge = Cartridge::new(
            dir.path(),
            vec![Resource::new("lti", "imsbasiclti_xmlv1p0").with_file("lti.xml")],
        );
        let options = ConversionOptions::default();
        let mut state = ConversionState::default();
        let mut cx = ProcessingContext {
            cartridge: &cartridge,
            options: &options,
            state: &mut state,
        };

        let chain = ProcessorChain::default();
        let processed = chain.process(Some("lti"), &mut cx).unwrap().unwrap();

        assert_eq!(processed.processor, "lti");
        assert_eq!(processed.content["lti_id"], "tool");
        let ids: Vec<_> = state.lti_consumer_ids.iter().collect();
        assert_eq!(ids, vec!["tool"]);
    }
}
