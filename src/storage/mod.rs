//! Storage for the local mirror tree and the mirror index.
//!
//! - `local`: rendered documents, attachments and thumbnails under
//!   `{folder}/{space}/`, written atomically
//! - `index`: the `list_{type}s.csv` record of every listed item

pub mod index;
pub mod local;

// Re-export for convenience
pub use index::ExportReport;
pub use local::{BLOG_DIR, INDEX_FILE, LocalStorage};
