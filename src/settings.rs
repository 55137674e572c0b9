use serde::Serialize;

/// Options shared by every content processor of one conversion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOptions {
    /// Origin that relative links of the source course are resolved
    /// against, e.g. `https://canvas.example.edu`.
    pub relative_links_source: Option<String>,

    /// Content types converted into dedicated XBlocks instead of plain HTML.
    pub content_types_with_custom_blocks: Vec<CustomBlockContentType>,
}

impl ConversionOptions {
    pub fn uses_custom_block(&self, content_type: CustomBlockContentType) -> bool {
        self.content_types_with_custom_blocks
            .contains(&content_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CustomBlockContentType {
    Pdf,
    GoogleDocument,
}

impl CustomBlockContentType {
    pub fn file_extensions(&self) -> &'static [&'static str] {
        match self {
            CustomBlockContentType::Pdf => &[".pdf"],
            CustomBlockContentType::GoogleDocument => &[],
        }
    }

    pub fn accepts_file(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.file_extensions()
            .iter()
            .any(|extension| path.ends_with(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_blocks_are_opt_in() {
        let options = ConversionOptions {
            content_types_with_custom_blocks: vec![CustomBlockContentType::Pdf],
            ..Default::default()
        };
        assert!(options.uses_custom_block(CustomBlockContentType::Pdf));
        assert!(!options.uses_custom_block(CustomBlockContentType::GoogleDocument));
    }

    #[test]
    fn pdf_extension_check_ignores_case() {
        assert!(CustomBlockContentType::Pdf.accepts_file("files/Syllabus.PDF"));
        assert!(!CustomBlockContentType::Pdf.accepts_file("files/notes.docx"));
    }
}
