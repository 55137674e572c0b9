mod module_meta;
mod resource;
mod static_paths;

pub use module_meta::ModuleMeta;
pub use resource::{Resource, ResourceFile, ResourceType};
pub use static_paths::StaticPathRegistry;

use std::path::{Path, PathBuf};

use anyhow::Context;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::xml;

pub const MANIFEST_FILE: &str = "imsmanifest.xml";
pub const WEB_RESOURCES_DIR_NAME: &str = "web_resources";
pub const OLX_STATIC_DIR: &str = "static";

const CANVAS_EXPORT_FILE: &str = "course_settings/canvas_export.txt";
const MODULE_META_FILE: &str = "course_settings/module_meta.xml";

#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("no imsmanifest.xml found in {}", .0.display())]
    MissingManifest(PathBuf),

    #[error("manifest resource #{0} has no identifier")]
    ResourceWithoutIdentifier(usize),
}

/// `/static/<path>` address of a file in the OLX course.
pub fn olx_static_path(static_file_path: &str) -> String {
    format!("/{}/{}", OLX_STATIC_DIR, static_file_path)
}

/// An extracted Common Cartridge and its manifest resources.
#[derive(Debug, Clone)]
pub struct Cartridge {
    directory: PathBuf,
    resources: IndexMap<String, Resource>,
    resource_id_by_href: IndexMap<String, String>,
    canvas_flavor: bool,
    module_meta: ModuleMeta,
}

impl Cartridge {
    /// Builds a cartridge from already known resources.
    pub fn new(directory: impl Into<PathBuf>, resources: Vec<Resource>) -> Self {
        let directory = directory.into();
        let mut resource_id_by_href = IndexMap::new();
        for resource in &resources {
            if let Some(href) = &resource.href {
                resource_id_by_href.insert(href.clone(), resource.identifier.clone());
            }
            for file in &resource.files {
                resource_id_by_href.insert(file.href.clone(), resource.identifier.clone());
            }
        }

        Self {
            canvas_flavor: directory.join(CANVAS_EXPORT_FILE).is_file(),
            directory,
            resources: resources
                .into_iter()
                .map(|resource| (resource.identifier.clone(), resource))
                .collect(),
            resource_id_by_href,
            module_meta: ModuleMeta::default(),
        }
    }

    /// Loads the manifest of a cartridge extracted into `directory`.
    pub fn load(directory: &Path) -> anyhow::Result<Self> {
        let manifest_path = directory.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(CartridgeError::MissingManifest(directory.to_path_buf()).into());
        }

        let manifest = xml::load(&manifest_path)?;
        let resources = manifest
            .child("resources")
            .map(|resources| resources.children_named("resource").collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                Resource::from_xml(element).ok_or(CartridgeError::ResourceWithoutIdentifier(index))
            })
            .collect::<Result<Vec<Resource>, CartridgeError>>()
            .context(format!("invalid manifest {}", manifest_path.display()))?;

        let mut cartridge = Cartridge::new(directory, resources);

        let module_meta_path = directory.join(MODULE_META_FILE);
        if module_meta_path.is_file() {
            cartridge.module_meta =
                ModuleMeta::load(&module_meta_path).context("failed to load Canvas module meta")?;
        }

        debug!(
            directory = %directory.display(),
            resources = cartridge.resources.len(),
            canvas = cartridge.canvas_flavor,
            "loaded cartridge manifest"
        );
        Ok(cartridge)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn define_resource(&self, identifier: &str) -> Option<&Resource> {
        self.resources.get(identifier)
    }

    /// Resource identifiers in manifest order.
    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn build_resource_file_path(&self, href: &str) -> PathBuf {
        self.directory.join(href)
    }

    /// Resource and file hrefs mapped to the identifier of their resource,
    /// in manifest order.
    pub fn resource_id_by_href(&self) -> &IndexMap<String, String> {
        &self.resource_id_by_href
    }

    pub fn is_canvas_flavor(&self) -> bool {
        self.canvas_flavor
    }

    pub fn module_meta(&self) -> &ModuleMeta {
        &self.module_meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_manifest_resources_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <manifest identifier="m" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1">
              <resources>
                <resource identifier="b" type="webcontent" href="wiki_content/b.html">
                  <file href="wiki_content/b.html"/>
                </resource>
                <resource identifier="a" type="imsdt_xmlv1p1">
                  <file href="a.xml"/>
                </resource>
              </resources>
            </manifest>"#,
        )
        .unwrap();

        let cartridge = Cartridge::load(dir.path()).unwrap();

        assert_eq!(cartridge.resource_ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(cartridge.resource_id_by_href()["wiki_content/b.html"], "b");
        let path = cartridge.build_resource_file_path("a.xml");
        assert_eq!(path, dir.path().join("a.xml"));
        assert!(!cartridge.is_canvas_flavor());
    }

    #[test]
    fn missing_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Cartridge::load(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CartridgeError>(),
            Some(CartridgeError::MissingManifest(_))
        ));
    }

    #[test]
    fn detects_canvas_flavor_and_module_meta() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("course_settings")).unwrap();
        fs::write(dir.path().join(CANVAS_EXPORT_FILE), "").unwrap();
        fs::write(
            dir.path().join(MODULE_META_FILE),
            "<modules><module><items><item>\
             <content_type>ContextExternalTool</content_type>\
             <identifierref>lti</identifierref><url>https://tool/launch</url>\
             </item></items></module></modules>",
        )
        .unwrap();
        let manifest = "<manifest><resources/></manifest>";
        fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();

        let cartridge = Cartridge::load(dir.path()).unwrap();

        assert!(cartridge.is_canvas_flavor());
        let url = cartridge.module_meta().external_tool_url("lti");
        assert_eq!(url, Some("https://tool/launch"));
    }
}
