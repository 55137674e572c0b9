use super::{clean_from_cdata, OlxGenerator};
use crate::content::discussion::DiscussionContent;
use crate::content::html::MISSING_CONTENT;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

pub struct DiscussionGenerator;

impl OlxGenerator for DiscussionGenerator {
    type Content = DiscussionContent;

    fn create_nodes(
        &self,
        content: &DiscussionContent,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        let text = content.text.as_deref().unwrap_or(MISSING_CONTENT);
        let title = content.title.as_deref().unwrap_or_default();

        let html = Element::new("html").cdata(clean_from_cdata(text));
        let discussion = Element::new("discussion")
            .attr("display_name", "")
            .attr("discussion_category", title)
            .attr("discussion_target", title);
        Ok(vec![html.into(), discussion.into()])
    }
}
