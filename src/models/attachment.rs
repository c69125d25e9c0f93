//! Attachment references derived from download links.

use std::path::PathBuf;

use crate::error::Result;
use crate::utils::resolve;
use crate::utils::slug::{AttachmentName, thumbnail_url};

/// A remote attachment and where its two variants live locally.
///
/// Never persisted itself; only the downloaded files are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Absolute URL of the full asset
    pub download_url: String,
    /// Absolute URL of the thumbnail variant
    pub thumbnail_url: String,
    /// Version parsed from the `version` query parameter
    pub version: u64,
    /// Full asset path relative to the mirror root
    pub local_path: PathBuf,
    /// Thumbnail path relative to the mirror root
    pub thumbnail_path: PathBuf,
}

impl AttachmentRef {
    /// Build from a `_links.download` value, resolved against `server`.
    pub fn from_download_link(server: &str, link: &str) -> Result<Self> {
        let name = AttachmentName::parse(link)?;
        let thumb_link = thumbnail_url(link);
        let thumb_name = AttachmentName::parse(&thumb_link)?;

        Ok(Self {
            download_url: resolve(server, link),
            thumbnail_url: resolve(server, &thumb_link),
            version: name.version,
            local_path: name.local_path(),
            thumbnail_path: thumb_name.local_path(),
        })
    }

    /// Both variants as (remote URL, local relative path) pairs.
    pub fn variants(&self) -> [(&str, &PathBuf); 2] {
        [
            (self.download_url.as_str(), &self.local_path),
            (self.thumbnail_url.as_str(), &self.thumbnail_path),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_download_link() {
        let attachment = AttachmentRef::from_download_link(
            "https://wiki.example.com/",
            "/download/attachments/123/pic.png?version=2&api=v2",
        )
        .unwrap();

        assert_eq!(attachment.version, 2);
        assert_eq!(
            attachment.download_url,
            "https://wiki.example.com/download/attachments/123/pic.png?version=2&api=v2"
        );
        assert_eq!(
            attachment.thumbnail_url,
            "https://wiki.example.com/download/thumbnails/123/pic.png?version=2&api=v2"
        );
        assert_eq!(
            attachment.local_path,
            PathBuf::from("download/attachments/123/pic_version2.png")
        );
        assert_eq!(
            attachment.thumbnail_path,
            PathBuf::from("download/thumbnails/123/pic_version2.png")
        );
    }

    #[test]
    fn test_missing_version_fails() {
        assert!(
            AttachmentRef::from_download_link("https://wiki.example.com", "/download/attachments/1/a.png")
                .is_err()
        );
    }
}
