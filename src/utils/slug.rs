// src/utils/slug.rs

//! Stable local names derived from titles and attachment URLs.
//!
//! Output names double as identity keys for re-runs: a post is re-rendered
//! into the same file and an attachment already on disk is never fetched
//! again, so everything here must be deterministic.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AppError, Result};

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^_\w\s-]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{0,4}[A-Za-z][A-Za-z0-9]{0,4}$").expect("valid regex"));

/// Turn a title into a filesystem-safe token.
///
/// NFKC-normalizes, drops everything but word characters, whitespace,
/// `_` and `-`, joins whitespace runs with `_` and trims `-`/`_` at both ends.
pub fn slugify(value: &str) -> String {
    let normalized: String = value.nfkc().collect();
    let kept = DISALLOWED.replace_all(&normalized, "");
    let joined = WHITESPACE.replace_all(&kept, "_");
    joined.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Pieces of a versioned attachment URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentName {
    /// Relative folder, e.g. `download/attachments/123`
    pub folder: PathBuf,
    /// File name without extensions, percent-decoded
    pub base: String,
    /// Trailing extensions including their dots, e.g. `.tar.gz`
    pub extensions: String,
    /// Value of the `version` query parameter
    pub version: u64,
}

impl AttachmentName {
    /// Parse a download link (absolute URL or server-relative path).
    pub fn parse(url: &str) -> Result<Self> {
        let malformed = || AppError::MalformedAttachmentUrl(url.to_string());

        let (path, query) = match url::Url::parse(url) {
            Ok(parsed) => (parsed.path().to_string(), parsed.query().map(str::to_string)),
            Err(_) => match url.split_once('?') {
                Some((path, query)) => (path.to_string(), Some(query.to_string())),
                None => (url.to_string(), None),
            },
        };

        let version = query
            .as_deref()
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(key, _)| key == "version")
                    .and_then(|(_, value)| value.parse::<u64>().ok())
            })
            .ok_or_else(malformed)?;

        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(malformed());
        }

        let file_name = relative
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(malformed)?;
        let file_name = urlencoding::decode(file_name)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| file_name.to_string());
        let (base, extensions) = split_extensions(&file_name);

        Ok(Self {
            folder: relative.parent().map(Path::to_path_buf).unwrap_or_default(),
            base: base.to_string(),
            extensions: extensions.to_string(),
            version,
        })
    }

    /// Local file name: `{slug(base)}_version{N}{extensions}`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_version{}{}",
            slugify(&self.base),
            self.version,
            self.extensions
        )
    }

    /// Relative path under the mirror root.
    pub fn local_path(&self) -> PathBuf {
        self.folder.join(self.file_name())
    }
}

/// Map a versioned attachment URL to its path relative to the mirror root.
///
/// Fails with [`AppError::MalformedAttachmentUrl`] when no integer
/// `version` query parameter is present.
pub fn attachment_local_path(url: &str) -> Result<PathBuf> {
    AttachmentName::parse(url).map(|name| name.local_path())
}

/// Swap the `/attachments/` path segment for `/thumbnails/`.
pub fn thumbnail_url(url: &str) -> String {
    url.replace("/attachments/", "/thumbnails/")
}

/// Split `name.tar.gz` into (`name`, `.tar.gz`).
///
/// Only short alphanumeric suffixes containing a letter count as extensions,
/// so `Report 2021.05.pdf` keeps `2021.05` in its base.
fn split_extensions(file_name: &str) -> (&str, &str) {
    let mut cut = file_name.len();
    while let Some(dot) = file_name[..cut].rfind('.') {
        if dot == 0 || !EXTENSION.is_match(&file_name[dot + 1..cut]) {
            break;
        }
        cut = dot;
    }
    file_name.split_at(cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "Hello_World");
        assert_eq!(slugify("  --Release notes 2.0--  "), "Release_notes_20");
        assert_eq!(slugify("a   b\tc"), "a_b_c");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Café crème"), "Café_crème");
        // NFKC folds compatibility forms
        assert_eq!(slugify("ﬁle №1"), "file_No1");
        assert_eq!(slugify("장학금 신청 안내"), "장학금_신청_안내");
    }

    #[test]
    fn test_slugify_total_and_stable() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        let title = "Weekly update: what's new?";
        assert_eq!(slugify(title), slugify(title));
        assert_eq!(slugify(title), "Weekly_update_whats_new");
    }

    #[test]
    fn test_attachment_local_path() {
        let path =
            attachment_local_path("/download/attachments/123/pic.png?version=2&api=v2").unwrap();
        assert_eq!(
            path,
            PathBuf::from("download/attachments/123/pic_version2.png")
        );
    }

    #[test]
    fn test_attachment_local_path_decodes_and_slugs() {
        let path =
            attachment_local_path("/download/attachments/9/My%20Chart%20(final).tar.gz?version=11")
                .unwrap();
        assert_eq!(
            path,
            PathBuf::from("download/attachments/9/My_Chart_final_version11.tar.gz")
        );
    }

    #[test]
    fn test_attachment_local_path_absolute_url() {
        let path = attachment_local_path(
            "https://confluence.example.com/download/attachments/5/doc.pdf?version=1",
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("download/attachments/5/doc_version1.pdf"));
    }

    #[test]
    fn test_numeric_suffix_stays_in_base() {
        let name = AttachmentName::parse("/download/attachments/1/Report 2021.05.pdf?version=3")
            .unwrap();
        assert_eq!(name.base, "Report 2021.05");
        assert_eq!(name.extensions, ".pdf");
        assert_eq!(name.file_name(), "Report_202105_version3.pdf");
    }

    #[test]
    fn test_versions_map_to_distinct_paths() {
        let v1 = attachment_local_path("/download/attachments/1/a.png?version=1").unwrap();
        let v2 = attachment_local_path("/download/attachments/1/a.png?version=2").unwrap();
        assert_ne!(v1, v2);
        let again = attachment_local_path("/download/attachments/1/a.png?version=1").unwrap();
        assert_eq!(v1, again);
    }

    #[test]
    fn test_missing_version_is_malformed() {
        for url in [
            "/download/attachments/1/a.png",
            "/download/attachments/1/a.png?api=v2",
            "/download/attachments/1/a.png?version=latest",
        ] {
            assert!(matches!(
                attachment_local_path(url),
                Err(AppError::MalformedAttachmentUrl(_))
            ));
        }
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        assert!(attachment_local_path("/download/../../etc/passwd?version=1").is_err());
    }

    #[test]
    fn test_thumbnail_url() {
        assert_eq!(
            thumbnail_url("/download/attachments/123/pic.png?version=2"),
            "/download/thumbnails/123/pic.png?version=2"
        );
    }
}
