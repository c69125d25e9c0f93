//! Content items and their comment trees.

use chrono::{DateTime, FixedOffset};

use crate::utils::slug::slugify;

/// What kind of content an item is.
///
/// Root comments of a post sit at depth 0, replies one deeper than the
/// comment they answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    BlogPost,
    Comment { depth: usize },
}

impl ContentKind {
    /// Depth assigned to comments fetched under an item of this kind.
    pub fn child_depth(self) -> usize {
        match self {
            ContentKind::BlogPost => 0,
            ContentKind::Comment { depth } => depth + 1,
        }
    }
}

/// A fetched post or comment with its cleaned body.
///
/// Each item owns its replies; `parent_id` is a plain id back-reference to
/// the item it was fetched under (`None` for a post).
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub id: String,
    pub title: String,
    pub author: String,
    pub created: DateTime<FixedOffset>,
    /// Cleaned body HTML, without a wrapping `<body>`
    pub body: String,
    pub parent_id: Option<String>,
    pub comments: Vec<ContentItem>,
}

impl ContentItem {
    /// Comment depth, `None` for posts.
    pub fn depth(&self) -> Option<usize> {
        match self.kind {
            ContentKind::BlogPost => None,
            ContentKind::Comment { depth } => Some(depth),
        }
    }

    /// Creation time in the locale-style `%c` form.
    pub fn date_formatted(&self) -> String {
        self.created.format("%c").to_string()
    }

    /// Creation date as `YYYY-MM-DD`.
    pub fn date_iso(&self) -> String {
        self.created.format("%Y-%m-%d").to_string()
    }

    /// `{date}_{slug}.html`; the date prefix is what the index sorts on.
    pub fn document_filename(&self) -> String {
        format!("{}_{}.html", self.date_iso(), slugify(&self.title))
    }

    /// Number of comments in the whole tree.
    pub fn comment_count(&self) -> usize {
        self.comments
            .iter()
            .map(|c| 1 + c.comment_count())
            .sum()
    }

    /// Depth-first, pre-order walk over all comments.
    pub fn walk_comments(&self) -> Vec<&ContentItem> {
        let mut out = Vec::new();
        let mut stack: Vec<&ContentItem> = self.comments.iter().rev().collect();
        while let Some(comment) = stack.pop() {
            out.push(comment);
            stack.extend(comment.comments.iter().rev());
        }
        out
    }
}

/// Parse an API timestamp such as `2021-03-01T09:30:00.000+01:00`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, kind: ContentKind, comments: Vec<ContentItem>) -> ContentItem {
        ContentItem {
            kind,
            id: id.to_string(),
            title: format!("Title {id}"),
            author: "Ann".to_string(),
            created: parse_timestamp("2021-03-01T09:30:00.000+01:00").unwrap(),
            body: String::new(),
            parent_id: None,
            comments,
        }
    }

    #[test]
    fn test_child_depth() {
        assert_eq!(ContentKind::BlogPost.child_depth(), 0);
        assert_eq!(ContentKind::Comment { depth: 0 }.child_depth(), 1);
        assert_eq!(ContentKind::Comment { depth: 3 }.child_depth(), 4);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let with_colon = parse_timestamp("2021-03-01T23:30:00.000+01:00").unwrap();
        let without_colon = parse_timestamp("2021-03-01T23:30:00.000+0100").unwrap();
        assert_eq!(with_colon, without_colon);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_dates_use_own_offset() {
        let mut post = item("1", ContentKind::BlogPost, vec![]);
        post.created = parse_timestamp("2021-03-01T23:30:00.000-05:00").unwrap();
        assert_eq!(post.date_iso(), "2021-03-01");
        assert_eq!(post.date_formatted(), "Mon Mar  1 23:30:00 2021");
    }

    #[test]
    fn test_document_filename() {
        let mut post = item("1", ContentKind::BlogPost, vec![]);
        post.title = "Sprint review: week 9".to_string();
        assert_eq!(post.document_filename(), "2021-03-01_Sprint_review_week_9.html");
    }

    #[test]
    fn test_walk_is_preorder() {
        let reply = item("3", ContentKind::Comment { depth: 1 }, vec![]);
        let first = item("2", ContentKind::Comment { depth: 0 }, vec![reply]);
        let second = item("4", ContentKind::Comment { depth: 0 }, vec![]);
        let post = item("1", ContentKind::BlogPost, vec![first, second]);

        let order: Vec<&str> = post.walk_comments().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["2", "3", "4"]);
        assert_eq!(post.comment_count(), 3);
    }
}
