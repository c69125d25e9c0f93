// src/pipeline/mirror.rs

//! Mirror orchestrator.
//!
//! Ties the services to one configured space: a post goes from its id to a
//! rendered document under `blog/`, with its comment tree and attachments
//! on disk before the document that links to them is written.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::render::render_post;
use crate::services::{AttachmentMaterializer, ContentRetriever, MaterializeReport};
use crate::storage::index::{index_path, read_ids};
use crate::storage::{BLOG_DIR, LocalStorage};
use crate::utils::http::{HttpTransport, Probe, Transport, create_async_client};
use crate::utils::log::summary;

/// Kind of listed content mirrored by default.
pub const BLOGPOST_KIND: &str = "blogpost";

/// Where the ids of a batch scrape come from.
#[derive(Debug, Clone)]
pub enum PostSource {
    /// Explicit ids
    Ids(Vec<String>),
    /// An index or id-list file
    File { path: PathBuf, has_header: bool },
    /// The blog post index of the mirror root
    DefaultIndex,
}

/// One exported post.
#[derive(Debug, Clone)]
pub struct ScrapedItem {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
    pub comments: usize,
    pub attachments: MaterializeReport,
}

/// Result of a batch scrape.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub scraped: Vec<ScrapedItem>,
    /// Ids skipped because they are not numeric
    pub invalid: Vec<String>,
    /// Ids whose scrape failed, with the reason
    pub failures: Vec<(String, AppError)>,
    /// Exports that replaced the document of another post of this batch
    pub collisions: usize,
    pub attachments: MaterializeReport,
}

/// A configured space mirror.
pub struct Mirror {
    pub(super) config: Arc<Config>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) storage: LocalStorage,
}

impl Mirror {
    /// Build a mirror talking HTTP to the configured server.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = create_async_client(&config.crawler, config.server.proxy.as_deref())?;
        let transport = HttpTransport::new(client, config.server.credentials());
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a mirror over any [`Transport`].
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let storage = LocalStorage::new(config.mirror_root());
        Self {
            config: Arc::new(config),
            transport,
            storage,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub(super) fn server(&self) -> &str {
        self.config.server.base_url()
    }

    pub(super) fn delay(&self) -> Duration {
        Duration::from_millis(self.config.crawler.request_delay_ms)
    }

    /// Index file listing the blog posts of the space.
    pub fn default_index_path(&self) -> PathBuf {
        index_path(self.storage.root(), BLOGPOST_KIND)
    }

    /// Probe the space listing and log what the answer means.
    ///
    /// Fails unless the server answers 2xx with a JSON body.
    pub async fn test_connection(&self) -> Result<Probe> {
        let url = format!("{}/rest/api/space", self.server());
        log::info!("Testing connection to {url}");
        let probe = self.transport.probe(&url).await?;
        log::info!("Status {}: {}", probe.status, connection_hint(probe.status));

        if (200..300).contains(&probe.status) && probe.json {
            Ok(probe)
        } else if (200..300).contains(&probe.status) {
            Err(AppError::malformed(&url, "answer is not JSON, is this the wiki root?"))
        } else {
            Err(AppError::Transport {
                url,
                status: probe.status,
            })
        }
    }

    /// Fetch, render and export a single post.
    ///
    /// Order is fixed: post, comment tree (with comment attachments), post
    /// attachments, render, write. Ids that are not numeric fail with
    /// [`AppError::InvalidIdentifier`] before any request is sent.
    pub async fn scrape_item(&self, id: &str) -> Result<ScrapedItem> {
        let id = check_identifier(id)?;
        let server = self.server();
        let crawler = &self.config.crawler;

        let materializer = AttachmentMaterializer::new(
            self.transport.as_ref(),
            &self.storage,
            server,
            crawler.attachment_page_limit,
            crawler.max_concurrent,
        );
        let retriever = ContentRetriever::new(
            self.transport.as_ref(),
            &materializer,
            server,
            crawler.attachment_page_limit,
        );

        let mut attachments = MaterializeReport::default();
        let post = retriever.fetch_post(id, &mut attachments).await?;
        attachments.absorb(materializer.materialize(&retriever.content_url(id)).await?);

        let document = render_post(&post);
        let key = Path::new(BLOG_DIR).join(post.document_filename());
        let path = self.storage.write_bytes(&key, document.as_bytes()).await?;
        log::info!(
            "Saved {} ({} comments) to {}",
            post.title,
            post.comment_count(),
            key.display()
        );

        Ok(ScrapedItem {
            id: id.to_string(),
            title: post.title.clone(),
            path,
            comments: post.comment_count(),
            attachments,
        })
    }

    /// Scrape every id of `source`, then rebuild the index document.
    ///
    /// A failing id is logged and recorded in the report; it never stops the
    /// other ones. Only reading the source or rebuilding the index can fail
    /// the whole call.
    pub async fn scrape_items(&self, source: PostSource) -> Result<BatchReport> {
        let ids = self.resolve_ids(source)?;
        let total = ids.len();
        let delay = self.delay();
        log::info!("Scraping {total} posts");

        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };
        let mut results = stream::iter(ids)
            .map(|id| async move {
                let result = self.scrape_item(&id).await;
                (id, result)
            })
            .buffered(self.config.crawler.max_concurrent.max(1));

        let mut written: HashMap<PathBuf, String> = HashMap::new();
        let mut done = 0;
        while let Some((id, result)) = results.next().await {
            done += 1;
            match result {
                Ok(item) => {
                    log::info!("[{done}/{total}] {id}: {}", item.title);
                    if let Some(other) = written.insert(item.path.clone(), item.id.clone()) {
                        log::warn!(
                            "Posts {other} and {} share the document {}, only one of them is kept",
                            item.id,
                            item.path.display()
                        );
                        report.collisions += 1;
                    }
                    report.attachments.absorb(item.attachments);
                    report.scraped.push(item);
                }
                Err(AppError::InvalidIdentifier(bad)) => {
                    log::warn!("[{done}/{total}] Skipping post {bad:?}: not a valid ID");
                    report.invalid.push(bad);
                }
                Err(error) => {
                    log::error!("[{done}/{total}] Failed to scrape post {id}: {error}");
                    report.failures.push((id, error));
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        summary(
            "Scrape",
            &[
                ("Posts", report.total.to_string()),
                ("Exported", report.scraped.len().to_string()),
                ("Invalid ids", report.invalid.len().to_string()),
                ("Failed", report.failures.len().to_string()),
                ("Name collisions", report.collisions.to_string()),
                (
                    "Attachments",
                    format!(
                        "{} downloaded, {} cached, {} failed",
                        report.attachments.downloaded,
                        report.attachments.cached,
                        report.attachments.failed
                    ),
                ),
            ],
        );

        self.rebuild_index().await?;
        Ok(report)
    }

    /// Ids of a source, in order, each kept once.
    ///
    /// Ids are compared with surrounding blanks ignored, the way
    /// [`check_identifier`] reads them.
    pub(super) fn resolve_ids(&self, source: PostSource) -> Result<Vec<String>> {
        let ids = match source {
            PostSource::Ids(ids) => ids,
            PostSource::File { path, has_header } => read_ids(&path, has_header)?,
            PostSource::DefaultIndex => {
                let path = self.default_index_path();
                if !path.exists() {
                    return Err(AppError::config(format!(
                        "no index at {}, run `list` first",
                        path.display()
                    )));
                }
                read_ids(&path, true)?
            }
        };

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(id.trim().to_string()) {
                unique.push(id);
            } else {
                log::warn!("Post {id} requested twice, scraping it once");
            }
        }
        Ok(unique)
    }
}

/// Accept ids made of ASCII digits only, surrounding blanks ignored.
pub fn check_identifier(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        Ok(trimmed)
    } else {
        Err(AppError::InvalidIdentifier(id.to_string()))
    }
}

/// What a status code of the connection check most likely means.
pub fn connection_hint(status: u16) -> &'static str {
    match status {
        200..=299 => "connection OK",
        401 => "authentication error, check username and password",
        403 => "access denied, check the account permissions",
        404 => "URL not found, or the account lacks permission",
        429 => "too many requests, raise crawler.request_delay_ms",
        500..=599 => "server error, try again later",
        _ => "unexpected answer",
    }
}
