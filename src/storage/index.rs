//! Mirror index: the persisted `id → entry` record of discovered items.
//!
//! One CSV file per content kind (`list_blogposts.csv`, ...) with the header
//! `ID,type,title`. Writes merge with what is already on disk and drop
//! duplicate ids, so re-running a listing never loses or repeats rows.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::ListedEntry;

/// Outcome of writing one index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Rows in the file after the write
    pub written: usize,
    /// Rows already present before the write
    pub previous: usize,
    /// Ids repeated within the freshly fetched buffer
    pub duplicates: usize,
}

/// Path of the index file for a content kind.
pub fn index_path(root: &Path, kind: &str) -> PathBuf {
    root.join(format!("list_{kind}s.csv"))
}

/// Merge two batches, keeping the first occurrence of every id.
///
/// Rows from `new` win over rows from `old`; the result holds each id once.
pub fn merge_entries(new: &[ListedEntry], old: &[ListedEntry]) -> Vec<ListedEntry> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(new.len() + old.len());
    for entry in new.iter().chain(old) {
        if seen.insert(entry.id.as_str()) {
            merged.push(entry.clone());
        }
    }
    merged
}

/// Number of rows whose id already appeared earlier in `entries`.
pub fn count_duplicates(entries: &[ListedEntry]) -> usize {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            duplicates += 1;
        }
    }
    duplicates
}

/// Load all rows of an index file.
pub fn load_entries(path: &Path) -> Result<Vec<ListedEntry>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for row in reader.deserialize() {
        entries.push(row?);
    }
    Ok(entries)
}

/// Replace an index file with `entries`.
pub fn write_entries(path: &Path, entries: &[ListedEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("csv.part");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write the buffer of a listing run, one file per content kind.
///
/// With `merge`, existing rows are kept and duplicates dropped; otherwise the
/// file is overwritten. Duplicate ids inside the buffer itself are only
/// reported: they mean the remote collection shifted during pagination and
/// some items were never returned.
pub fn export(root: &Path, entries: &[ListedEntry], merge: bool) -> Result<Vec<ExportReport>> {
    let mut by_kind: BTreeMap<&str, Vec<ListedEntry>> = BTreeMap::new();
    for entry in entries {
        by_kind
            .entry(entry.kind.as_str())
            .or_default()
            .push(entry.clone());
    }

    let mut reports = Vec::new();
    for (kind, batch) in by_kind {
        let path = index_path(root, kind);
        let duplicates = count_duplicates(&batch);
        if duplicates > 0 {
            log::warn!(
                "The API returned {duplicates} duplicated {kind} entries: as many others were \
                 skipped by pagination and will only be mirrored if their ids were collected before."
            );
        }

        let previous = if merge && path.exists() {
            load_entries(&path)?
        } else {
            Vec::new()
        };
        if !previous.is_empty() {
            log::info!(
                "Merging {} new {kind} entries with {} previous ones",
                batch.len(),
                previous.len()
            );
        }

        let merged = merge_entries(&batch, &previous);
        log::info!("Saving {} {kind} entries in {}", merged.len(), path.display());
        write_entries(&path, &merged)?;

        reports.push(ExportReport {
            path,
            written: merged.len(),
            previous: previous.len(),
            duplicates,
        });
    }
    Ok(reports)
}

/// Read the ids to scrape from an index or id-list file.
///
/// With a header row the `ID` column is used when present, the first column
/// otherwise. Without a header every row's first column is an id.
pub fn read_ids(path: &Path, has_header: bool) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_path(path)?;

    let column = if has_header {
        reader
            .headers()?
            .iter()
            .position(|h| h.trim() == "ID")
            .unwrap_or(0)
    } else {
        0
    };

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(column).map(str::trim) {
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        }
    }
    Ok(ids)
}
