use std::collections::BTreeMap;

use serde::Serialize;

/// OLX static path to cartridge path mappings collected while parsing.
///
/// `web_resources` holds files from the cartridge `web_resources` directory,
/// which is copied as a whole. `extra` holds files living elsewhere in the
/// cartridge that must be copied one by one.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StaticPathRegistry {
    web_resources: BTreeMap<String, String>,
    extra: BTreeMap<String, String>,
}

impl StaticPathRegistry {
    pub fn add_web_resource_path(
        &mut self,
        olx_static_path: &str,
        cc_static_path: impl Into<String>,
    ) {
        self.web_resources
            .insert(olx_static_path.to_string(), cc_static_path.into());
    }

    pub fn add_extra_path(&mut self, olx_static_path: &str, cc_static_path: impl Into<String>) {
        self.extra
            .insert(olx_static_path.to_string(), cc_static_path.into());
    }

    pub fn web_resources(&self) -> &BTreeMap<String, String> {
        &self.web_resources
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Whether either mapping knows the OLX path.
    pub fn contains(&self, olx_static_path: &str) -> bool {
        self.extra.contains_key(olx_static_path) || self.web_resources.contains_key(olx_static_path)
    }

    pub fn get(&self, olx_static_path: &str) -> Option<&str> {
        self.extra
            .get(olx_static_path)
            .or_else(|| self.web_resources.get(olx_static_path))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_view_prefers_extra() {
        let mut registry = StaticPathRegistry::default();
        registry.add_web_resource_path("/static/a.png", "web_resources/a.png");
        registry.add_extra_path("/static/a.png", "files/a.png");
        registry.add_extra_path("/static/b.pdf", "files/b.pdf");

        assert!(registry.contains("/static/a.png"));
        assert!(!registry.contains("/static/c.png"));
        assert_eq!(registry.get("/static/a.png"), Some("files/a.png"));
        assert_eq!(registry.extra().len(), 2);
        assert_eq!(registry.web_resources().len(), 1);
    }
}
