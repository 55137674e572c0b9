use super::OlxGenerator;
use crate::content::lti::LtiContent;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

pub struct LtiGenerator;

impl OlxGenerator for LtiGenerator {
    type Content = LtiContent;

    fn create_nodes(
        &self,
        content: &LtiContent,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        let custom_parameters = format!(
            "[{}]",
            content
                .custom_parameters
                .iter()
                .map(|(key, value)| format!("\"{}={}\"", key, value))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let lti_consumer = Element::new("lti_consumer")
            .attr("custom_parameters", custom_parameters)
            .attr("description", content.description.as_str())
            .attr("display_name", content.title.as_str())
            .attr("inline_height", content.height.as_str())
            .attr("inline_width", content.width.as_str())
            .attr("launch_url", content.launch_url.as_str())
            .attr("modal_height", content.height.as_str())
            .attr("modal_width", content.width.as_str())
            .attr("xblock-family", "xblock.v1")
            .attr("lti_id", content.lti_id.as_str());
        Ok(vec![lti_consumer.into()])
    }
}
