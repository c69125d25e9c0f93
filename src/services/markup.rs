// src/services/markup.rs

//! Body HTML cleaning and attachment link rewriting.
//!
//! Both operations parse with `scraper` and re-serialize the tree through a
//! small writer that applies the transformation on the way out. Attributes
//! are written in sorted order and adjacent text nodes are coalesced, so the
//! same input always yields the same bytes.

use std::path::Path;

use scraper::{ElementRef, Html, Node};

use crate::utils::slug::{attachment_local_path, thumbnail_url};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];
/// Elements whose first newline is dropped by the parser.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["listing", "pre", "textarea"];
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];
const UNWRAPPED_SPAN_CLASSES: &[&str] = &["latexmath-mathinline", "confluence-embedded-file-wrapper"];
const MATHJAX_PREVIEW_CLASS: &str = "MathJax_Preview";

/// Marker of image sources served from the attachment store.
///
/// Whatever precedes it (scheme, host, context path such as `/wiki`) is not
/// part of the local path.
pub const ATTACHMENT_SOURCE: &str = "/download/attachments/";

/// Clean a raw body as returned by the API.
///
/// Removes `<script>` elements, unwraps inline-math and embedded-file wrapper
/// spans, turns MathJax preview spans into `\(...\)` text and drops the
/// `<body>` wrapper so the result can be spliced into another document.
/// Applying it twice gives the same result as applying it once; the newline
/// a parser strips after `<pre>`, `<textarea>` or `<listing>` is written back.
pub fn clean_body(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let root = document.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
        .unwrap_or(root);

    let mut writer = Writer::new(Pass::Clean);
    writer.write_children(body);
    writer.finish()
}

/// Replace attachment images by a thumbnail linking to the full asset.
///
/// Every `<img>` whose `data-image-src` points into the attachment store
/// becomes `<a href="{prefix}{asset}"><img src="{prefix}{thumbnail}"></a>`,
/// with both paths computed by the filename codec. `prefix` is the way from
/// the rendered document back to the mirror root, e.g. `../`.
pub fn link_attachment_images(fragment: &str, prefix: &str) -> String {
    let html = Html::parse_fragment(fragment);
    let mut writer = Writer::new(Pass::LinkImages { prefix });
    writer.write_children(html.root_element());
    writer.finish()
}

/// Join path components with `/` whatever the platform separator.
pub fn href(prefix: &str, path: &Path) -> String {
    let joined: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{prefix}{}", joined.join("/"))
}

#[derive(Clone, Copy)]
enum Pass<'a> {
    Clean,
    LinkImages { prefix: &'a str },
}

struct Writer<'a> {
    pass: Pass<'a>,
    out: String,
    /// Pending text, flushed as one node
    text: String,
}

impl<'a> Writer<'a> {
    fn new(pass: Pass<'a>) -> Self {
        Self {
            pass,
            out: String::new(),
            text: String::new(),
        }
    }

    fn finish(mut self) -> String {
        self.flush_text(false);
        self.out
    }

    fn flush_text(&mut self, raw: bool) {
        if self.text.is_empty() {
            return;
        }
        if raw {
            self.out.push_str(&self.text);
        } else {
            self.out.push_str(&html_escape::encode_text(&self.text));
        }
        self.text.clear();
    }

    fn write_children(&mut self, parent: ElementRef<'_>) {
        let raw = RAW_TEXT_ELEMENTS.contains(&parent.value().name());
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => self.text.push_str(text),
                Node::Comment(comment) => {
                    self.flush_text(raw);
                    self.out.push_str("<!--");
                    self.out.push_str(comment);
                    self.out.push_str("-->");
                }
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.write_element(element, raw);
                    }
                }
                _ => {}
            }
        }
        self.flush_text(raw);
    }

    fn write_element(&mut self, element: ElementRef<'_>, parent_raw: bool) {
        let value = element.value();
        let name = value.name();

        match self.pass {
            Pass::Clean => {
                if name == "script" {
                    return;
                }
                if name == "span" {
                    if value.classes().any(|c| c == MATHJAX_PREVIEW_CLASS) {
                        let tex: String = element.text().collect();
                        self.text.push_str(&format!("\\({tex}\\)"));
                        return;
                    }
                    if value
                        .classes()
                        .any(|c| UNWRAPPED_SPAN_CLASSES.contains(&c))
                    {
                        self.write_children(element);
                        return;
                    }
                }
            }
            Pass::LinkImages { prefix } => {
                if name == "img" {
                    if let Some(link) = value
                        .attr("data-image-src")
                        .filter(|src| src.contains(ATTACHMENT_SOURCE))
                        .and_then(|src| image_link(src, prefix))
                    {
                        self.flush_text(parent_raw);
                        self.out.push_str(&link);
                        return;
                    }
                }
            }
        }

        self.flush_text(parent_raw);
        self.out.push('<');
        self.out.push_str(name);
        let mut attrs: Vec<(String, &str)> = value
            .attrs
            .iter()
            .map(|(key, val)| {
                let key = match &key.prefix {
                    Some(prefix) => format!("{prefix}:{}", key.local),
                    None => key.local.to_string(),
                };
                (key, &**val)
            })
            .collect();
        attrs.sort_unstable();
        for (key, val) in attrs {
            self.out.push(' ');
            self.out.push_str(&key);
            self.out.push_str("=\"");
            self.out
                .push_str(&html_escape::encode_double_quoted_attribute(val));
            self.out.push('"');
        }
        self.out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        if LEADING_NEWLINE_ELEMENTS.contains(&name) {
            let leading_newline = element.first_child().is_some_and(|child| {
                matches!(child.value(), Node::Text(text) if text.starts_with('\n'))
            });
            if leading_newline {
                self.out.push('\n');
            }
        }
        self.write_children(element);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}

/// `<a><img></a>` markup for an attachment image, if its URL is usable.
fn image_link(src: &str, prefix: &str) -> Option<String> {
    let stored = &src[src.find(ATTACHMENT_SOURCE)?..];
    let paths = attachment_local_path(stored)
        .and_then(|asset| Ok((asset, attachment_local_path(&thumbnail_url(stored))?)));
    match paths {
        Ok((asset, thumbnail)) => {
            let asset = href(prefix, &asset);
            let thumbnail = href(prefix, &thumbnail);
            log::debug!("Replacing link to {asset}");
            Some(format!(
                "<a href=\"{}\"><img src=\"{}\"></a>",
                html_escape::encode_double_quoted_attribute(&asset),
                html_escape::encode_double_quoted_attribute(&thumbnail)
            ))
        }
        Err(e) => {
            log::warn!("Keeping image {src} unchanged: {e}");
            None
        }
    }
}
