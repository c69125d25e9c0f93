// src/services/lister.rs

//! Paginated lister.
//!
//! Walks a cursor-linked listing (`_links.next`) and accumulates entries in
//! a buffer owned by a single call. The buffer is handed back even when a
//! page fails, so the caller can always flush what was collected.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::ListedEntry;
use crate::models::api::{ListPage, decode};
use crate::utils::http::Transport;
use crate::utils::resolve;

/// Extra condition, besides a missing `next` link, that ends a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopRule {
    /// Follow `next` links to the end.
    #[default]
    Never,
    /// Stop once `start + limit` of a page reaches this offset.
    OffsetBound(u64),
}

impl StopRule {
    pub fn from_end(end: Option<u64>) -> Self {
        end.map_or(StopRule::Never, StopRule::OffsetBound)
    }

    pub fn should_stop(&self, page: &ListPage) -> bool {
        match self {
            StopRule::Never => false,
            StopRule::OffsetBound(end) => page.start + page.limit >= *end,
        }
    }
}

/// Everything a listing call collected, plus the error that ended it early.
#[derive(Debug, Default)]
pub struct ListOutcome {
    pub entries: Vec<ListedEntry>,
    pub pages: usize,
    pub error: Option<AppError>,
}

/// Walks a listing endpoint page by page.
pub struct Lister<'a> {
    transport: &'a dyn Transport,
    server: &'a str,
    stop: StopRule,
    delay: Duration,
}

impl<'a> Lister<'a> {
    /// `server` is the root that relative `next` links are resolved against.
    pub fn new(transport: &'a dyn Transport, server: &'a str, stop: StopRule) -> Self {
        Self {
            transport,
            server,
            stop,
            delay: Duration::ZERO,
        }
    }

    /// Pause between page requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Collect entries from `url` and every following page.
    ///
    /// Never fails: a transport or decoding error stops the walk and is
    /// returned next to the entries gathered so far.
    pub async fn collect(&self, url: &str, query: &[(&str, String)]) -> ListOutcome {
        let mut outcome = ListOutcome::default();
        if let Err(error) = self.walk(url, query, &mut outcome).await {
            log::warn!(
                "Listing stopped after {} page(s) and {} entries: {}",
                outcome.pages,
                outcome.entries.len(),
                error
            );
            outcome.error = Some(error);
        }
        outcome
    }

    async fn walk(&self, url: &str, query: &[(&str, String)], outcome: &mut ListOutcome) -> Result<()> {
        let mut page: ListPage = decode(self.transport.fetch_json(url, query).await?, url)?;
        loop {
            outcome.pages += 1;
            let found = page.start + page.size;
            outcome
                .entries
                .extend(page.results.drain(..).map(ListedEntry::from));

            match self.stop {
                StopRule::OffsetBound(end) => log::info!("Found {found} / {end} entries"),
                StopRule::Never => log::info!("Found {found} entries"),
            }

            let Some(next) = page.next() else { break };
            if self.stop.should_stop(&page) {
                break;
            }
            let next_url = resolve(self.server, next);
            log::debug!("Continuing with {next_url}");

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            page = decode(self.transport.fetch_json(&next_url, &[]).await?, &next_url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CrawlerConfig;
    use crate::utils::http::{HttpTransport, create_async_client};
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIST_PATH: &str = "/rest/api/space/KEY/content/blogpost";

    fn transport() -> HttpTransport {
        HttpTransport::new(create_async_client(&CrawlerConfig::default(), None).unwrap(), None)
    }

    fn page(start: u64, ids: &[&str], next: Option<&str>) -> Value {
        let results: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "type": "blogpost", "title": format!("Post {id}")}))
            .collect();
        let mut links = json!({"self": LIST_PATH});
        if let Some(next) = next {
            links["next"] = json!(next);
        }
        json!({"results": results, "start": start, "size": ids.len(), "limit": 2, "_links": links})
    }

    async fn mount_page(server: &MockServer, start: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .and(query_param("start", start))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn next_link(start: u64) -> String {
        format!("{LIST_PATH}?limit=2&start={start}")
    }

    #[test]
    fn test_stop_rule() {
        let page: ListPage = serde_json::from_value(page(4, &["1", "2"], None)).unwrap();
        assert!(!StopRule::Never.should_stop(&page));
        assert!(StopRule::OffsetBound(6).should_stop(&page));
        assert!(!StopRule::OffsetBound(7).should_stop(&page));
        assert_eq!(StopRule::from_end(None), StopRule::Never);
    }

    #[tokio::test]
    async fn test_follows_next_links_to_the_end() {
        let server = MockServer::start().await;
        mount_page(&server, "0", page(0, &["1", "2"], Some(&next_link(2)))).await;
        mount_page(&server, "2", page(2, &["3", "4"], Some(&next_link(4)))).await;
        mount_page(&server, "4", page(4, &["5"], None)).await;

        let transport = transport();
        let uri = server.uri();
        let lister = Lister::new(&transport, &uri, StopRule::Never);
        let outcome = lister
            .collect(&format!("{uri}{LIST_PATH}"), &[("start", "0".to_string())])
            .await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.pages, 3);
        let ids: Vec<&str> = outcome.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_offset_bound_stops_early() {
        let server = MockServer::start().await;
        mount_page(&server, "0", page(0, &["1", "2"], Some(&next_link(2)))).await;
        mount_page(&server, "2", page(2, &["3", "4"], Some(&next_link(4)))).await;

        let transport = transport();
        let uri = server.uri();
        let lister = Lister::new(&transport, &uri, StopRule::OffsetBound(4));
        let outcome = lister
            .collect(&format!("{uri}{LIST_PATH}"), &[("start", "0".to_string())])
            .await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.entries.len(), 4);
    }

    #[tokio::test]
    async fn test_failure_keeps_collected_entries() {
        let server = MockServer::start().await;
        mount_page(&server, "0", page(0, &["1", "2"], Some(&next_link(2)))).await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .and(query_param("start", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = transport();
        let uri = server.uri();
        let lister = Lister::new(&transport, &uri, StopRule::Never);
        let outcome = lister
            .collect(&format!("{uri}{LIST_PATH}"), &[("start", "0".to_string())])
            .await;

        assert_eq!(outcome.entries.len(), 2);
        assert!(matches!(
            outcome.error,
            Some(AppError::Transport { status: 500, .. })
        ));
    }
}
