//! Resource parsers producing the intermediate content of each processor.

pub mod discussion;
pub mod google_document;
pub mod html;
pub mod lti;
pub mod pdf;
pub mod qti;
pub mod video;
mod web_content;
mod web_link;

pub use web_content::WebContent;
pub use web_link::{parse_web_link, WebLink};

use indexmap::IndexMap;
use serde::Serialize;

use crate::cartridge::{Cartridge, Resource};
use crate::processors::{ConversionState, ProcessingContext};

/// Intermediate content whose string leaves can be visited and rewritten.
///
/// Implemented for the leaf (`String`) and container (`Option`, `Vec`,
/// `IndexMap`) shapes, and by every parsed record through its fields.
pub trait TextTree {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String));
}

impl TextTree for String {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        visit(self)
    }
}

impl<T: TextTree> TextTree for Option<T> {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        if let Some(value) = self {
            value.visit_text(visit);
        }
    }
}

impl<T: TextTree> TextTree for Vec<T> {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        for value in self.iter_mut() {
            value.visit_text(visit);
        }
    }
}

impl<T: TextTree> TextTree for IndexMap<String, T> {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        for value in self.values_mut() {
            value.visit_text(visit);
        }
    }
}

/// Output of a [`ContentParser`], consumed by the matching generator.
pub trait ParsedContent: TextTree + Serialize {
    /// Empty content counts as a parse miss.
    fn is_empty(&self) -> bool {
        false
    }

    /// Records run-wide facts about the content before OLX generation.
    fn register(&self, _state: &mut ConversionState) {}
}

impl<T: TextTree + Serialize> ParsedContent for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

pub trait ContentParser {
    type Content: ParsedContent;

    /// Parses the resource behind `idref`.
    ///
    /// `Ok(None)` means the resource is absent or not of this parser's type,
    /// letting the next processor try.
    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>>;
}

pub(crate) fn lookup<'a>(idref: Option<&str>, cartridge: &'a Cartridge) -> Option<&'a Resource> {
    idref.and_then(|idref| cartridge.define_resource(idref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn visits_every_string_leaf() {
        let mut map: IndexMap<String, Vec<Option<String>>> = IndexMap::new();
        map.insert("a".into(), vec![Some("x".into()), None, Some("y".into())]);
        map.insert("b".into(), vec![Some("z".into())]);

        map.visit_text(&mut |text| text.make_ascii_uppercase());

        assert_eq!(
            map["a"],
            vec![Some("X".to_string()), None, Some("Y".to_string())]
        );
        assert_eq!(map["b"], vec![Some("Z".to_string())]);
    }
}
