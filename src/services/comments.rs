// src/services/comments.rs

//! Content retriever.
//!
//! Fetches a post or comment with its body and history, and walks the
//! comment tree below it depth-first. Every comment gets its attachments
//! materialized on the way, since its body may embed them.

use std::collections::HashSet;

use futures::future::BoxFuture;

use crate::error::{AppError, Result};
use crate::models::api::{ChildPage, ContentPage, decode};
use crate::models::{ContentItem, ContentKind, parse_timestamp};
use crate::services::attachments::{AttachmentMaterializer, MaterializeReport};
use crate::services::markup::clean_body;
use crate::utils::http::Transport;

const CONTENT_EXPAND: &str = "body.view,history";

/// Fetches content items and their comment trees.
pub struct ContentRetriever<'a> {
    transport: &'a dyn Transport,
    materializer: &'a AttachmentMaterializer<'a>,
    server: &'a str,
    page_limit: u32,
}

impl<'a> ContentRetriever<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        materializer: &'a AttachmentMaterializer<'a>,
        server: &'a str,
        page_limit: u32,
    ) -> Self {
        Self {
            transport,
            materializer,
            server,
            page_limit,
        }
    }

    /// REST URL of a content item.
    pub fn content_url(&self, id: &str) -> String {
        format!("{}/rest/api/content/{id}", self.server)
    }

    /// Fetch one item and clean its body. `comments` is left empty.
    pub async fn fetch_item(
        &self,
        id: &str,
        kind: ContentKind,
        parent_id: Option<&str>,
    ) -> Result<ContentItem> {
        let url = self.content_url(id);
        let page: ContentPage = decode(
            self.transport
                .fetch_json(&url, &[("expand", CONTENT_EXPAND.to_string())])
                .await?,
            &url,
        )?;

        let created = parse_timestamp(&page.history.created_date).ok_or_else(|| {
            AppError::malformed(
                &url,
                format!("unreadable createdDate {:?}", page.history.created_date),
            )
        })?;

        Ok(ContentItem {
            kind,
            id: id.to_string(),
            title: page.title,
            author: page.history.created_by.display_name,
            created,
            body: clean_body(&page.body.view.value),
            parent_id: parent_id.map(str::to_string),
            comments: Vec::new(),
        })
    }

    /// Fetch the comments under `parent_id`, recursively.
    ///
    /// Comments are returned in listing order, each carrying its own replies
    /// at `depth + 1`. Ids already in `visited` are skipped, which keeps a
    /// misbehaving server from looping the walk. Attachment counts of every
    /// comment are added to `report`.
    pub fn fetch_comments<'s>(
        &'s self,
        parent_id: &'s str,
        depth: usize,
        visited: &'s mut HashSet<String>,
        report: &'s mut MaterializeReport,
    ) -> BoxFuture<'s, Result<Vec<ContentItem>>> {
        Box::pin(async move {
            let url = format!("{}/child/comment", self.content_url(parent_id));
            let page: ChildPage = decode(
                self.transport
                    .fetch_json(&url, &[("limit", self.page_limit.to_string())])
                    .await?,
                &url,
            )?;

            let mut comments = Vec::with_capacity(page.results.len());
            for child in page.results {
                if !visited.insert(child.id.clone()) {
                    log::warn!("Comment {} listed twice under {parent_id}, skipping", child.id);
                    continue;
                }

                let mut comment = self
                    .fetch_item(&child.id, ContentKind::Comment { depth }, Some(parent_id))
                    .await?;
                report.absorb(
                    self.materializer
                        .materialize(&self.content_url(&child.id))
                        .await?,
                );
                comment.comments = self
                    .fetch_comments(&child.id, depth + 1, visited, report)
                    .await?;
                comments.push(comment);
            }
            Ok(comments)
        })
    }

    /// Fetch a post with its whole comment tree.
    pub async fn fetch_post(&self, id: &str, report: &mut MaterializeReport) -> Result<ContentItem> {
        let mut post = self.fetch_item(id, ContentKind::BlogPost, None).await?;
        let mut visited = HashSet::from([id.to_string()]);
        post.comments = self
            .fetch_comments(id, ContentKind::BlogPost.child_depth(), &mut visited, report)
            .await?;
        Ok(post)
    }
}
