// src/pipeline/index.rs

//! Chronological index of the rendered documents.
//!
//! Documents are named `YYYY-MM-DD_slug.html`, so sorting the names sorts
//! them by date and grouping only has to notice when the year or month
//! changes from one name to the next.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use maud::{DOCTYPE, html};

use crate::error::Result;
use crate::models::api::{SpacePage, decode};
use crate::storage::{BLOG_DIR, INDEX_FILE};

use super::mirror::Mirror;

/// Documents of one month, in name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    pub month: u32,
    /// Full month name, e.g. `March`
    pub name: String,
    pub documents: Vec<String>,
}

/// Months of one year, in the order first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup {
    pub year: i32,
    pub months: Vec<MonthGroup>,
}

/// Group sorted document names by year, then by month.
///
/// Names without a `YYYY-MM-DD` prefix are skipped with a warning.
pub fn group_documents(names: &[String]) -> Vec<YearGroup> {
    let mut years: Vec<YearGroup> = Vec::new();
    for name in names {
        let Some(date) = name
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        else {
            log::warn!("Skipping {name}: no date prefix");
            continue;
        };

        if years.last().map(|y| y.year) != Some(date.year()) {
            log::debug!("Indexing posts from {}", date.year());
            years.push(YearGroup {
                year: date.year(),
                months: Vec::new(),
            });
        }
        let Some(year) = years.last_mut() else {
            continue;
        };

        if year.months.last().map(|m| m.month) != Some(date.month()) {
            year.months.push(MonthGroup {
                month: date.month(),
                name: date.format("%B").to_string(),
                documents: Vec::new(),
            });
        }
        if let Some(month) = year.months.last_mut() {
            month.documents.push(name.clone());
        }
    }
    years
}

/// Render the index page: one `h2` per year, one `h3` and list per month.
pub fn render_index(title: &str, groups: &[YearGroup]) -> String {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                header {
                    h1 { (title) }
                }
                main {
                    @for year in groups {
                        h2 { (year.year) }
                        @for month in &year.months {
                            h3 { (month.name) }
                            ul {
                                @for document in &month.documents {
                                    li {
                                        a href=(format!("{BLOG_DIR}/{document}")) { (document) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    .into_string()
}

impl Mirror {
    /// Display name of the space, or its key when it cannot be fetched.
    pub async fn space_name(&self) -> String {
        let space = &self.config.server.space;
        let url = format!("{}/rest/api/space/{space}", self.server());
        let fetched = match self.transport.fetch_json(&url, &[]).await {
            Ok(value) => decode::<SpacePage>(value, &url).map(|page| page.name),
            Err(error) => Err(error),
        };
        fetched.unwrap_or_else(|error| {
            log::warn!("Using space key as index title: {error}");
            space.clone()
        })
    }

    /// Rewrite `index.html` from the documents currently under `blog/`.
    pub async fn rebuild_index(&self) -> Result<PathBuf> {
        let names = self.storage.list_documents().await?;
        let groups = group_documents(&names);
        let title = self.space_name().await;

        let page = render_index(&title, &groups);
        let path = self.storage.write_bytes(INDEX_FILE, page.as_bytes()).await?;
        log::info!("Indexed {} documents in {}", names.len(), path.display());
        Ok(path)
    }
}
