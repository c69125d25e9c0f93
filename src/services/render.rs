// src/services/render.rs

//! Standalone HTML document for a post and its comment tree.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::models::ContentItem;
use crate::services::markup::link_attachment_images;

/// MathJax bundle loaded by every document for `\(...\)` math.
pub const MATHJAX_SRC: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";

/// Way back from `blog/` to the mirror root.
const ROOT_PREFIX: &str = "../";

/// Render a post as a complete document.
///
/// Comments follow the post body in depth-first order, each indented by
/// `2 * depth` em. Replies link back to the comment they answer. Nothing
/// time-dependent goes into the output, so rendering is repeatable.
pub fn render_post(post: &ContentItem) -> String {
    let comments = post.walk_comments();
    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (post.title) }
                script id="MathJax-script" src=(MATHJAX_SRC) {}
            }
            body {
                header {
                    h1 { (post.title) }
                    address {
                        "By " (post.author) " on " (post.date_formatted()) " (ID " (post.id) ")"
                    }
                }
                main {
                    (PreEscaped(link_attachment_images(&post.body, ROOT_PREFIX)))
                }
                @if !comments.is_empty() {
                    h2 { "Comments" }
                    @for comment in &comments {
                        (render_comment(comment))
                    }
                }
            }
        }
    };
    markup.into_string()
}

fn render_comment(comment: &ContentItem) -> Markup {
    let depth = comment.depth().unwrap_or(0);
    html! {
        article style=(format!("margin-left: {}em", 2 * depth)) {
            header {
                address {
                    "By " (comment.author) " on " (comment.date_formatted()) " "
                    a id=(format!("comment-{}", comment.id)) { "(ID " (comment.id) ")" }
                    @if depth > 0 {
                        @if let Some(parent) = &comment.parent_id {
                            " - "
                            a href=(format!("#comment-{parent}")) { "parent" }
                        }
                    }
                }
            }
            (PreEscaped(link_attachment_images(&comment.body, ROOT_PREFIX)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentKind, parse_timestamp};

    fn item(id: &str, kind: ContentKind, parent: Option<&str>, body: &str) -> ContentItem {
        ContentItem {
            kind,
            id: id.to_string(),
            title: format!("Title {id}"),
            author: "Ann".to_string(),
            created: parse_timestamp("2021-03-01T09:30:00.000+01:00").unwrap(),
            body: body.to_string(),
            parent_id: parent.map(str::to_string),
            comments: Vec::new(),
        }
    }

    fn sample_post() -> ContentItem {
        let mut first = item("2", ContentKind::Comment { depth: 0 }, Some("1"), "<p>first</p>");
        first.comments.push(item(
            "3",
            ContentKind::Comment { depth: 1 },
            Some("2"),
            "<p>reply</p>",
        ));
        let mut post = item(
            "1",
            ContentKind::BlogPost,
            None,
            "<p>Body <img data-image-src=\"/download/attachments/1/a.png?version=3\"></p>",
        );
        post.comments.push(first);
        post
    }

    #[test]
    fn test_document_structure() {
        let html = render_post(&sample_post());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Title 1</title>"));
        assert!(html.contains(MATHJAX_SRC));
        assert!(html.contains("<h1>Title 1</h1>"));
        assert!(html.contains("<address>By Ann on Mon Mar  1 09:30:00 2021 (ID 1)</address>"));
        assert!(html.contains(
            "<a href=\"../download/attachments/1/a_version3.png\">\
             <img src=\"../download/thumbnails/1/a_version3.png\"></a>"
        ));
        assert!(html.contains("<h2>Comments</h2>"));
    }

    #[test]
    fn test_comments_are_indented_in_preorder() {
        let html = render_post(&sample_post());

        let first = html.find("margin-left: 0em").unwrap();
        let reply = html.find("margin-left: 2em").unwrap();
        assert!(first < reply);
        assert!(html.find("<p>first</p>").unwrap() < html.find("<p>reply</p>").unwrap());
        assert!(html.contains("<a id=\"comment-2\">(ID 2)</a>"));
        assert!(html.contains("<a id=\"comment-3\">(ID 3)</a>"));
    }

    #[test]
    fn test_only_replies_link_to_parent() {
        let html = render_post(&sample_post());
        assert!(html.contains(" - <a href=\"#comment-2\">parent</a>"));
        assert!(!html.contains("href=\"#comment-1\""));
    }

    #[test]
    fn test_post_without_comments() {
        let post = item("1", ContentKind::BlogPost, None, "<p>alone</p>");
        let html = render_post(&post);
        assert!(!html.contains("Comments"));
        assert!(html.contains("<main><p>alone</p></main>"));
    }

    #[test]
    fn test_render_is_repeatable() {
        let post = sample_post();
        assert_eq!(render_post(&post), render_post(&post));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut post = item("1", ContentKind::BlogPost, None, "");
        post.title = "Fish & <Chips>".to_string();
        assert!(render_post(&post).contains("<h1>Fish &amp; &lt;Chips&gt;</h1>"));
    }
}
