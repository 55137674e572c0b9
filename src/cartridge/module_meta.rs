use std::collections::HashMap;
use std::path::Path;

use crate::xml::{self, XmlElement};

const EXTERNAL_TOOL_CONTENT_TYPE: &str = "ContextExternalTool";

/// Canvas `course_settings/module_meta.xml`.
///
/// Canvas keeps the real launch URL of external tool links in the module
/// items rather than in the LTI resource itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModuleMeta {
    external_tool_urls: HashMap<String, String>,
}

impl ModuleMeta {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_xml(&xml::load(path)?))
    }

    pub fn from_xml(root: &XmlElement) -> Self {
        let external_tool_urls = root
            .descendants_named("item")
            .into_iter()
            .filter(|item| {
                item.child("content_type")
                    .and_then(|t| t.text())
                    .is_some_and(|t| t.trim() == EXTERNAL_TOOL_CONTENT_TYPE)
            })
            .filter_map(|item| {
                let idref = item.child("identifierref")?.text()?;
                let url = item.child("url")?.text()?;
                Some((idref.trim().to_string(), url.trim().to_string()))
            })
            .collect();

        Self { external_tool_urls }
    }

    pub fn external_tool_url(&self, idref: &str) -> Option<&str> {
        self.external_tool_urls.get(idref).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_external_tool_items() {
        let root = xml::parse_str(
            r#"<modules>
                 <module identifier="m1">
                   <items>
                     <item identifier="i1">
                       <content_type>ContextExternalTool</content_type>
                       <identifierref>lti_1</identifierref>
                       <url>https://tool.example.com/launch</url>
                     </item>
                     <item identifier="i2">
                       <content_type>WikiPage</content_type>
                       <identifierref>page_1</identifierref>
                     </item>
                   </items>
                 </module>
               </modules>"#,
        )
        .unwrap();
        let meta = ModuleMeta::from_xml(&root);

        let url = meta.external_tool_url("lti_1");
        assert_eq!(url, Some("https://tool.example.com/launch"));
        assert_eq!(meta.external_tool_url("page_1"), None);
    }
}
