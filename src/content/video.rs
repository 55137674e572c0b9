use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{lookup, parse_web_link, ContentParser, ParsedContent, TextTree};
use crate::processors::ProcessingContext;

static YOUTUBE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/watch\?v=(?P<video_id>[-\w]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoContent {
    pub youtube: String,
}

impl TextTree for VideoContent {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.youtube.visit_text(visit);
    }
}

impl ParsedContent for VideoContent {}

/// Turns web links to YouTube videos into video components.
pub struct VideoParser;

impl ContentParser for VideoParser {
    type Content = VideoContent;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        let Some(resource) = lookup(idref, cx.cartridge) else {
            return Ok(None);
        };
        let Some(web_link) = parse_web_link(resource, cx.cartridge)? else {
            return Ok(None);
        };

        Ok(youtube_video_id(&web_link.href).map(|youtube| VideoContent { youtube }))
    }
}

pub fn youtube_video_id(url: &str) -> Option<String> {
    YOUTUBE_LINK
        .captures(url)
        .map(|captures| captures["video_id"].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.youtube.com/watch?v=gQ-cZRmHfs4", Some("gQ-cZRmHfs4"))]
    #[case("https://youtube.com/watch?v=abc_123&t=10", Some("abc_123"))]
    #[case("https://vimeo.com/watch?v=abc", None)]
    #[case("https://www.youtube.com/embed/abc", None)]
    fn extracts_video_id(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(youtube_video_id(url).as_deref(), expected);
    }
}
