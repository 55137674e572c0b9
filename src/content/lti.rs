use github_slugger::Slugger;
use indexmap::IndexMap;
use serde::Serialize;

use super::{lookup, ContentParser, ParsedContent, TextTree};
use crate::cartridge::ResourceType;
use crate::processors::{ConversionState, ProcessingContext};
use crate::xml::{self, XmlElement};

const DEFAULT_WIDTH: &str = "500";
const DEFAULT_HEIGHT: &str = "500";
const CANVAS_PLATFORM: &str = "canvas.instructure.com";

/// An LTI tool link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtiContent {
    pub title: String,
    pub description: String,
    pub launch_url: String,
    pub height: String,
    pub width: String,
    pub custom_parameters: IndexMap<String, String>,
    pub lti_id: String,
}

impl TextTree for LtiContent {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.title.visit_text(visit);
        self.description.visit_text(visit);
        self.launch_url.visit_text(visit);
        self.height.visit_text(visit);
        self.width.visit_text(visit);
        self.custom_parameters.visit_text(visit);
        self.lti_id.visit_text(visit);
    }
}

impl ParsedContent for LtiContent {
    fn register(&self, state: &mut ConversionState) {
        state.lti_consumer_ids.insert(self.lti_id.clone());
    }
}

pub struct LtiParser;

impl ContentParser for LtiParser {
    type Content = LtiContent;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        let (Some(idref), Some(resource)) = (idref, lookup(idref, cx.cartridge)) else {
            return Ok(None);
        };
        if !resource.is(ResourceType::LtiLink) {
            return Ok(None);
        }
        let Some(resource_file) = resource.first_file() else {
            return Ok(None);
        };

        let root = xml::load(&cx.cartridge.build_resource_file_path(&resource_file.href))?;
        let mut content = parse_lti(&root);

        // Canvas keeps the working launch URL in the module meta.
        if cx.cartridge.is_canvas_flavor() {
            if let Some(url) = cx.cartridge.module_meta().external_tool_url(idref) {
                content.launch_url = url.to_string();
            }
        }
        Ok(Some(content))
    }
}

/// Reads a `cartridge_basiclti_link` document.
pub fn parse_lti(root: &XmlElement) -> LtiContent {
    let text_of = |name: &str| root.child(name).and_then(|element| element.text());
    let title = text_of("title").unwrap_or_default();

    let launch_url = root
        .child("secure_launch_url")
        .or_else(|| root.child("launch_url"))
        .and_then(|element| element.text())
        .unwrap_or_default();

    let custom_parameters = root
        .child("custom")
        .map(|custom| {
            custom
                .children_named("property")
                .map(|property| {
                    (
                        property.attr("name").unwrap_or_default().to_string(),
                        property.text().unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let lti_id = extension_property(root, Some(CANVAS_PLATFORM), "tool_id")
        .unwrap_or_else(|| Slugger::default().slug(&title));

    LtiContent {
        description: text_of("description").unwrap_or_default(),
        launch_url,
        height: extension_property(root, None, "selection_height")
            .unwrap_or_else(|| DEFAULT_HEIGHT.to_string()),
        width: extension_property(root, None, "selection_width")
            .unwrap_or_else(|| DEFAULT_WIDTH.to_string()),
        custom_parameters,
        lti_id,
        title,
    }
}

fn extension_property(root: &XmlElement, platform: Option<&str>, name: &str) -> Option<String> {
    root.children_named("extensions")
        .filter(|extensions| platform.is_none() || extensions.attr("platform") == platform)
        .flat_map(|extensions| extensions.children_named("property"))
        .find(|property| property.attr("name") == Some(name))
        .and_then(|property| property.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CANVAS_LINK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <cartridge_basiclti_link xmlns="http://www.imsglobal.org/xsd/imslticc_v1p0"
            xmlns:blti="http://www.imsglobal.org/xsd/imsbasiclti_v1p0"
            xmlns:lticm="http://www.imsglobal.org/xsd/imslticm_v1p0">
          <blti:title>Learning Tool</blti:title>
          <blti:description>Practice problems</blti:description>
          <blti:launch_url>http://tool.example.com/launch</blti:launch_url>
          <blti:secure_launch_url>https://tool.example.com/launch</blti:secure_launch_url>
          <blti:custom>
            <lticm:property name="course">101</lticm:property>
          </blti:custom>
          <blti:extensions platform="canvas.instructure.com">
            <lticm:property name="tool_id">learning_tool</lticm:property>
            <lticm:property name="selection_height">800</lticm:property>
          </blti:extensions>
        </cartridge_basiclti_link>"#;

    #[test]
    fn reads_canvas_link() {
        let content = parse_lti(&xml::parse_str(CANVAS_LINK).unwrap());

        assert_eq!(content.title, "Learning Tool");
        assert_eq!(content.launch_url, "https://tool.example.com/launch");
        assert_eq!(content.height, "800");
        assert_eq!(content.width, "500");
        assert_eq!(content.lti_id, "learning_tool");
        let course = content.custom_parameters.get("course");
        assert_eq!(course.map(String::as_str), Some("101"));
    }

    #[test]
    fn slugs_title_without_tool_id() {
        let root = xml::parse_str(
            "<cartridge_basiclti_link><title>My Quiz Tool</title>\
             <launch_url>https://quiz.example.com</launch_url></cartridge_basiclti_link>",
        )
        .unwrap();
        let content = parse_lti(&root);

        assert_eq!(content.lti_id, "my-quiz-tool");
        assert_eq!(content.launch_url, "https://quiz.example.com");
        assert!(content.custom_parameters.is_empty());
    }
}
