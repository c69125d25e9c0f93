// src/services/attachments.rs

//! Attachment materializer.
//!
//! Lists the attachments of a content item and stores both the full asset
//! and its thumbnail under the mirror root. Files already on disk are never
//! fetched again, so a re-run only downloads what is missing.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::AttachmentRef;
use crate::models::api::{ChildPage, decode};
use crate::storage::LocalStorage;
use crate::utils::http::Transport;

/// Per-item download counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeReport {
    pub downloaded: usize,
    pub cached: usize,
    pub failed: usize,
}

impl MaterializeReport {
    pub fn absorb(&mut self, other: MaterializeReport) {
        self.downloaded += other.downloaded;
        self.cached += other.cached;
        self.failed += other.failed;
    }
}

enum Fetched {
    Downloaded,
    Cached,
}

/// Downloads attachment variants into a [`LocalStorage`].
pub struct AttachmentMaterializer<'a> {
    transport: &'a dyn Transport,
    storage: &'a LocalStorage,
    server: &'a str,
    page_limit: u32,
    concurrency: usize,
}

impl<'a> AttachmentMaterializer<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        storage: &'a LocalStorage,
        server: &'a str,
        page_limit: u32,
        concurrency: usize,
    ) -> Self {
        Self {
            transport,
            storage,
            server,
            page_limit,
            concurrency: concurrency.max(1),
        }
    }

    /// Materialize every attachment of the item at `content_url`.
    ///
    /// A failed listing, a result without download link or a download link
    /// without usable version fails the call. A single asset that cannot be
    /// fetched is logged, counted in `failed` and skipped.
    pub async fn materialize(&self, content_url: &str) -> Result<MaterializeReport> {
        let url = format!("{content_url}/child/attachment");
        let page: ChildPage = decode(
            self.transport
                .fetch_json(&url, &[("limit", self.page_limit.to_string())])
                .await?,
            &url,
        )?;

        let mut attachments = Vec::with_capacity(page.results.len());
        for child in page.results {
            let link = child.links.download.ok_or_else(|| {
                AppError::malformed(&url, format!("attachment {} has no download link", child.id))
            })?;
            attachments.push(AttachmentRef::from_download_link(self.server, &link)?);
        }

        let jobs: Vec<(String, PathBuf)> = attachments
            .iter()
            .flat_map(|a| a.variants().map(|(url, path)| (url.to_string(), path.clone())))
            .collect();

        let mut report = MaterializeReport::default();
        let mut downloads = stream::iter(jobs)
            .map(|(url, path)| async move {
                let result = self.fetch_variant(&url, &path).await;
                (url, result)
            })
            .buffered(self.concurrency);

        while let Some((url, result)) = downloads.next().await {
            match result {
                Ok(Fetched::Downloaded) => report.downloaded += 1,
                Ok(Fetched::Cached) => report.cached += 1,
                Err(error) if error.is_transport() => {
                    report.failed += 1;
                    log::warn!("Skipping attachment {url}: {error}");
                }
                Err(error) => return Err(error),
            }
        }

        if report.downloaded + report.failed > 0 {
            log::info!(
                "Attachments of {content_url}: {} downloaded, {} cached, {} failed",
                report.downloaded,
                report.cached,
                report.failed
            );
        }
        Ok(report)
    }

    async fn fetch_variant(&self, url: &str, path: &Path) -> Result<Fetched> {
        if self.storage.exists(path).await {
            log::debug!("Already downloaded: {}", path.display());
            return Ok(Fetched::Cached);
        }
        log::info!("Downloading {}", path.display());
        let bytes = self.transport.fetch_bytes(url).await?;
        self.storage.write_bytes(path, &bytes).await?;
        Ok(Fetched::Downloaded)
    }
}
