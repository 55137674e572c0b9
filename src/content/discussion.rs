use serde::Serialize;

use super::{lookup, ContentParser, ParsedContent, TextTree};
use crate::cartridge::ResourceType;
use crate::processors::ProcessingContext;
use crate::xml;

/// A discussion topic. `text` is absent for topics without a body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscussionContent {
    pub title: Option<String>,
    pub text: Option<String>,
}

impl TextTree for DiscussionContent {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.title.visit_text(visit);
        self.text.visit_text(visit);
    }
}

impl ParsedContent for DiscussionContent {}

pub struct DiscussionParser;

impl ContentParser for DiscussionParser {
    type Content = DiscussionContent;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        let Some(resource) = lookup(idref, cx.cartridge) else {
            return Ok(None);
        };
        if !resource.is(ResourceType::DiscussionTopic) || resource.files.is_empty() {
            return Ok(None);
        }

        // Later files override earlier ones.
        let mut content = DiscussionContent::default();
        for resource_file in &resource.files {
            let root = xml::load(&cx.cartridge.build_resource_file_path(&resource_file.href))?;
            content.title = root.child("title").and_then(|title| title.text());
            content.text = root.child("text").and_then(|text| text.text());
        }
        Ok(Some(content))
    }
}
