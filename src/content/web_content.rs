use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;

use crate::cartridge::{olx_static_path, Cartridge, ResourceFile, WEB_RESOURCES_DIR_NAME};

/// A `webcontent` resource file and where it lands in the OLX course.
#[derive(Debug, Clone)]
pub struct WebContent {
    pub resource_relative_path: String,
    pub resource_file_path: PathBuf,
}

impl WebContent {
    pub fn new(cartridge: &Cartridge, resource_file: &ResourceFile) -> Self {
        Self {
            resource_file_path: cartridge.build_resource_file_path(&resource_file.href),
            resource_relative_path: resource_file.href.clone(),
        }
    }

    pub fn is_from_web_resources_dir(&self) -> bool {
        self.resource_file_path
            .to_string_lossy()
            .contains(WEB_RESOURCES_DIR_NAME)
    }

    /// Path of the file below `web_resources/`, if it lives there.
    pub fn static_filename(&self) -> Option<String> {
        let path = self.resource_file_path.to_string_lossy();
        path.split_once(&format!("{}/", WEB_RESOURCES_DIR_NAME))
            .map(|(_, rest)| rest.to_string())
    }

    pub fn olx_static_path(&self) -> String {
        match self.static_filename() {
            Some(static_filename) => olx_static_path(&static_filename),
            None => olx_static_path(&self.resource_relative_path),
        }
    }

    /// Sniffs the leading bytes of the file for a known image signature.
    pub fn is_image(&self) -> anyhow::Result<bool> {
        let mut file = File::open(&self.resource_file_path)
            .context(format!("failed to open {}", self.resource_file_path.display()))?;
        let mut magic = [0u8; 12];
        let read = file
            .read(&mut magic)
            .context(format!("failed to read {}", self.resource_file_path.display()))?;
        Ok(is_image_signature(&magic[..read]))
    }
}

fn is_image_signature(magic: &[u8]) -> bool {
    // PNG: 0x89 "PNG"
    magic.starts_with(&[0x89, b'P', b'N', b'G'])
        // JPEG: 0xFF 0xD8 0xFF
        || magic.starts_with(&[0xFF, 0xD8, 0xFF])
        || magic.starts_with(b"GIF87a")
        || magic.starts_with(b"GIF89a")
        || magic.starts_with(b"BM")
        // TIFF, little and big endian
        || magic.starts_with(b"II*\0")
        || magic.starts_with(b"MM\0*")
        || (magic.len() >= 12 && magic.starts_with(b"RIFF") && &magic[8..12] == b"WEBP")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resource_file(href: &str) -> ResourceFile {
        ResourceFile { href: href.into() }
    }

    #[test]
    fn static_path_strips_web_resources_dir() {
        let cartridge = Cartridge::new("/tmp/course", Vec::new());
        let image = resource_file("web_resources/QuizImages/fractal.jpg");
        let content = WebContent::new(&cartridge, &image);
        assert!(content.is_from_web_resources_dir());
        assert_eq!(content.olx_static_path(), "/static/QuizImages/fractal.jpg");

        let handout = resource_file("files/handout.pdf");
        let outside = WebContent::new(&cartridge, &handout);
        assert!(!outside.is_from_web_resources_dir());
        assert_eq!(outside.olx_static_path(), "/static/files/handout.pdf");
    }

    #[test]
    fn sniffs_images_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A];
        fs::write(dir.path().join("logo.bin"), png_header).unwrap();
        fs::write(dir.path().join("notes.png"), b"plain text").unwrap();
        let cartridge = Cartridge::new(dir.path(), Vec::new());

        let image = WebContent::new(&cartridge, &resource_file("logo.bin"));
        let text = WebContent::new(&cartridge, &resource_file("notes.png"));

        assert!(image.is_image().unwrap());
        assert!(!text.is_image().unwrap());
    }
}
