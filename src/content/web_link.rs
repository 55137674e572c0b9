use serde::Serialize;

use crate::cartridge::{Cartridge, Resource, ResourceType};
use crate::xml;

/// Target and label of an `imswl` web link resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebLink {
    pub href: String,
    pub text: Option<String>,
}

/// Reads the web link behind `resource`, or `None` for any other type.
pub fn parse_web_link(
    resource: &Resource,
    cartridge: &Cartridge,
) -> anyhow::Result<Option<WebLink>> {
    if !resource.is(ResourceType::WebLink) {
        return Ok(None);
    }
    let Some(resource_file) = resource.first_file() else {
        return Ok(None);
    };

    let root = xml::load(&cartridge.build_resource_file_path(&resource_file.href))?;
    Ok(Some(WebLink {
        href: root
            .child("url")
            .and_then(|url| url.attr("href"))
            .unwrap_or_default()
            .to_string(),
        text: root.child("title").and_then(|title| title.text()),
    }))
}
