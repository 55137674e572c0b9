use super::OlxGenerator;
use crate::content::video::VideoContent;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

pub struct VideoGenerator;

impl OlxGenerator for VideoGenerator {
    type Content = VideoContent;

    fn create_nodes(
        &self,
        content: &VideoContent,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        let video = Element::new("video")
            .attr("youtube", format!("1.00:{}", content.youtube))
            .attr("youtube_id_1_0", content.youtube.as_str());
        Ok(vec![video.into()])
    }
}
