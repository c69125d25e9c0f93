//! Pipeline entry points for mirror operations.
//!
//! - `Mirror::list_posts`: Collect blog post ids into the mirror index
//! - `Mirror::scrape_items`: Export posts, comments and attachments
//! - `Mirror::rebuild_index`: Write the chronological `index.html`
//! - `run_pipeline`: All of the above in order

pub mod index;
pub mod list;
pub mod mirror;
#[allow(clippy::module_inception)]
pub mod pipeline;

pub use index::{MonthGroup, YearGroup, group_documents, render_index};
pub use list::ListReport;
pub use mirror::{BatchReport, Mirror, PostSource, ScrapedItem, check_identifier};
pub use pipeline::run_pipeline;
