use std::fs;

use tempfile::TempDir;

/// Writes files into a fresh cartridge directory.
pub struct CartridgeBuilder {
    dir: TempDir,
    resources: Vec<String>,
}

impl CartridgeBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            resources: Vec::new(),
        }
    }

    pub fn file(self, href: &str, content: impl AsRef<[u8]>) -> Self {
        let path = self.dir.path().join(href);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn resource(mut self, identifier: &str, resource_type: &str, href: &str) -> Self {
        self.resources.push(format!(
            r#"<resource identifier="{identifier}" type="{resource_type}" href="{href}"><file href="{href}"/></resource>"#
        ));
        self
    }

    pub fn build(self) -> TempDir {
        let manifest = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <manifest identifier="course" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1">
              <organizations/>
              <resources>{}</resources>
            </manifest>"#,
            self.resources.concat()
        );
        fs::write(self.dir.path().join("imsmanifest.xml"), manifest).unwrap();
        self.dir
    }
}

pub fn discussion_topic(title: &str, text: Option<&str>) -> String {
    let text = text
        .map(|text| format!(r#"<text texttype="text/html">{text}</text>"#))
        .unwrap_or_default();
    format!(
        r#"<topic xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imsdt_v1p1"><title>{title}</title>{text}</topic>"#
    )
}

pub fn web_link(title: &str, href: &str) -> String {
    format!(
        r#"<webLink xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imswl_v1p1"><title>{title}</title><url href="{href}"/></webLink>"#
    )
}
