// src/pipeline/list.rs

//! Listing of the space blog into the mirror index.

use crate::error::Result;
use crate::services::{Lister, StopRule};
use crate::storage::ExportReport;
use crate::storage::index::export;

use super::mirror::Mirror;

/// What a listing run exported.
#[derive(Debug, Default)]
pub struct ListReport {
    pub pages: usize,
    pub entries: usize,
    pub exports: Vec<ExportReport>,
}

impl Mirror {
    /// First page of the space blog listing.
    pub fn list_url(&self) -> String {
        format!(
            "{}/rest/api/space/{}/content/blogpost",
            self.server(),
            self.config.server.space
        )
    }

    /// List blog posts from offset `start` until `end` (or the last page)
    /// and write them to the index.
    pub async fn list_posts(&self, start: u64, end: Option<u64>, merge: bool) -> Result<ListReport> {
        log::info!(
            "Listing blog posts of {} from {start}{}",
            self.config.server.space,
            end.map(|e| format!(" to {e}")).unwrap_or_default()
        );
        let url = self.list_url();
        self.scrape_list(&url, &[("start", start.to_string())], StopRule::from_end(end), merge)
            .await
    }

    /// Walk any listing endpoint and export what it returned.
    ///
    /// Whatever was collected is written to the index before an error that
    /// interrupted the walk is returned, so an interrupted run still keeps
    /// the pages it got through.
    pub async fn scrape_list(
        &self,
        url: &str,
        query: &[(&str, String)],
        stop: StopRule,
        merge: bool,
    ) -> Result<ListReport> {
        let lister = Lister::new(self.transport.as_ref(), self.server(), stop).with_delay(self.delay());
        let outcome = lister.collect(url, query).await;

        let exports = export(self.storage.root(), &outcome.entries, merge)?;
        if let Some(error) = outcome.error {
            return Err(error);
        }

        Ok(ListReport {
            pages: outcome.pages,
            entries: outcome.entries.len(),
            exports,
        })
    }
}
