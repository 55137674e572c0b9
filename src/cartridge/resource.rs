use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::xml::XmlElement;

/// One `<resource>` of the cartridge manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub identifier: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub href: Option<String>,
    /// `<file href>` children, in manifest order.
    pub files: Vec<ResourceFile>,
    /// `identifierref` of every `<dependency>` child.
    pub dependencies: Vec<String>,
    /// All attributes as written in the manifest.
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceFile {
    pub href: String,
}

impl Resource {
    pub fn new(identifier: &str, resource_type: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            resource_type: resource_type.to_string(),
            href: None,
            files: Vec::new(),
            dependencies: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, href: &str) -> Self {
        self.files.push(ResourceFile {
            href: href.to_string(),
        });
        self
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    /// Builds a resource from its manifest element. Returns `None` for a
    /// resource without an identifier.
    pub fn from_xml(element: &XmlElement) -> Option<Self> {
        let identifier = element.attr("identifier")?;
        let mut resource = Resource::new(identifier, element.attr("type").unwrap_or_default());
        resource.href = element.attr("href").map(str::to_string);
        resource.attributes = element
            .attributes()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        for child in element.elements() {
            match child.name.as_str() {
                "file" => {
                    if let Some(href) = child.attr("href") {
                        resource.files.push(ResourceFile {
                            href: href.to_string(),
                        });
                    }
                }
                "dependency" => {
                    if let Some(identifierref) = child.attr("identifierref") {
                        resource.dependencies.push(identifierref.to_string());
                    }
                }
                _ => {}
            }
        }

        Some(resource)
    }

    pub fn is(&self, resource_type: ResourceType) -> bool {
        resource_type.matches(&self.resource_type)
    }

    pub fn first_file(&self) -> Option<&ResourceFile> {
        self.files.first()
    }
}

/// The Common Cartridge resource types the converter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    WebContent,
    WebLink,
    LtiLink,
    QtiAssessment,
    DiscussionTopic,
}

static WEB_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^imswl_xmlv\d+p\d+$").unwrap());
static LTI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^imsbasiclti_xmlv\d+p\d+$").unwrap());
static QTI_ASSESSMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^imsqti_xmlv\d+p\d+/imscc_xmlv\d+p\d+/assessment$").unwrap()
});
static DISCUSSION_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^imsdt_xmlv\d+p\d+$").unwrap());

impl ResourceType {
    pub fn matches(&self, resource_type: &str) -> bool {
        match self {
            ResourceType::WebContent => resource_type == "webcontent",
            ResourceType::WebLink => WEB_LINK.is_match(resource_type),
            ResourceType::LtiLink => LTI_LINK.is_match(resource_type),
            ResourceType::QtiAssessment => QTI_ASSESSMENT.is_match(resource_type),
            ResourceType::DiscussionTopic => DISCUSSION_TOPIC.is_match(resource_type),
        }
    }
}
