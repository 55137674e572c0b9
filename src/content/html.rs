use std::fs;

use serde::Serialize;
use tracing::{error, info};

use super::{parse_web_link, ContentParser, ParsedContent, TextTree, WebContent, WebLink};
use crate::cartridge::{Resource, ResourceType};
use crate::processors::{ConversionState, ProcessingContext};

pub const MISSING_CONTENT: &str = "MISSING CONTENT";

/// Markup of an HTML component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlContent {
    pub html: String,
    #[serde(skip)]
    static_file: Option<StaticFile>,
}

// Static file discovered while parsing, registered once the content has
// been accepted by the processor.
#[derive(Debug, Clone, PartialEq)]
enum StaticFile {
    WebResource { olx_path: String, cc_path: String },
    Extra { olx_path: String, cc_path: String },
}

impl HtmlContent {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            static_file: None,
        }
    }

    pub fn missing() -> Self {
        Self::new(format!("<p>{}</p>", MISSING_CONTENT))
    }
}

impl TextTree for HtmlContent {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.html.visit_text(visit);
    }
}

impl ParsedContent for HtmlContent {
    fn register(&self, state: &mut ConversionState) {
        let paths = &mut state.static_paths;
        match &self.static_file {
            Some(StaticFile::WebResource { olx_path, cc_path }) => {
                paths.add_web_resource_path(olx_path, cc_path.as_str())
            }
            Some(StaticFile::Extra { olx_path, cc_path }) => {
                paths.add_extra_path(olx_path, cc_path.as_str())
            }
            None => {}
        }
    }
}

/// Fallback parser: produces HTML for every resource, placeholder markup
/// included.
pub struct HtmlParser;

impl ContentParser for HtmlParser {
    type Content = HtmlContent;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        let Some(idref) = idref else {
            return Ok(Some(HtmlContent::missing()));
        };
        let Some(resource) = cx.cartridge.define_resource(idref) else {
            info!("Missing resource: {}", idref);
            return Ok(Some(HtmlContent::missing()));
        };

        let content = if resource.is(ResourceType::WebContent) {
            parse_webcontent(idref, resource, cx)?
        } else if let Some(web_link) = parse_web_link(resource, cx.cartridge)? {
            web_link_html(&web_link)
        } else if is_known_unprocessed_resource_type(resource) {
            HtmlContent::missing()
        } else {
            not_imported_content(resource)
        };
        Ok(Some(content))
    }
}

fn parse_webcontent(
    idref: &str,
    resource: &Resource,
    cx: &ProcessingContext<'_>,
) -> anyhow::Result<HtmlContent> {
    let Some(resource_file) = resource.first_file() else {
        return Ok(HtmlContent::missing());
    };
    let web_content = WebContent::new(cx.cartridge, resource_file);
    let path = &web_content.resource_file_path;

    let is_html = path.extension().is_some_and(|ext| ext == "html");
    if is_html {
        let html = fs::read_to_string(path).inspect_err(|_| {
            error!("Failure reading {} from id {}", path.display(), idref);
        })?;
        return Ok(HtmlContent::new(html));
    }

    if !web_content.is_from_web_resources_dir() {
        let olx_path = web_content.olx_static_path();
        return Ok(HtmlContent {
            html: external_webcontent_html(&olx_path, &web_content.resource_relative_path),
            static_file: Some(StaticFile::Extra {
                olx_path,
                cc_path: web_content.resource_relative_path.clone(),
            }),
        });
    }

    match web_content.static_filename() {
        Some(static_filename) if web_content.is_image()? => {
            let olx_path = web_content.olx_static_path();
            Ok(HtmlContent {
                html: image_webcontent_html(&olx_path, &static_filename),
                static_file: Some(StaticFile::WebResource {
                    olx_path,
                    cc_path: web_content.resource_relative_path.clone(),
                }),
            })
        }
        _ => {
            info!("Skipping webcontent: {}", path.display());
            Ok(HtmlContent::missing())
        }
    }
}

fn image_webcontent_html(olx_static_path: &str, static_filename: &str) -> String {
    format!(
        "<html>\n<body>\n<p><img src=\"{}\" alt=\"{}\"></p>\n</body>\n</html>\n",
        olx_static_path, static_filename
    )
}

fn external_webcontent_html(olx_static_path: &str, resource_relative_path: &str) -> String {
    format!(
        "<html>\n<body>\n<p><a href=\"{}\">{}</a></p>\n</body>\n</html>\n",
        olx_static_path, resource_relative_path
    )
}

fn web_link_html(web_link: &WebLink) -> HtmlContent {
    HtmlContent::new(format!(
        "<a href=\"{}\">{}</a>",
        web_link.href,
        web_link.text.as_deref().unwrap_or_default()
    ))
}

fn is_known_unprocessed_resource_type(resource: &Resource) -> bool {
    [
        ResourceType::LtiLink,
        ResourceType::QtiAssessment,
        ResourceType::DiscussionTopic,
    ]
    .into_iter()
    .any(|resource_type| resource.is(resource_type))
}

fn not_imported_content(resource: &Resource) -> HtmlContent {
    let mut text = format!("Not imported content: type = '{}'", resource.resource_type);
    if let Some(href) = &resource.href {
        text.push_str(&format!(", href = '{}'", href));
    }
    info!("{}", text);
    HtmlContent::new(text)
}
