//! Service layer for the mirror.
//!
//! This module contains the business logic for:
//! - Blog listing (`Lister`)
//! - Content and comment retrieval (`ContentRetriever`)
//! - Attachment downloads (`AttachmentMaterializer`)
//! - Body cleaning and document rendering (`markup`, `render`)

mod attachments;
mod comments;
mod lister;
pub mod markup;
pub mod render;

pub use attachments::{AttachmentMaterializer, MaterializeReport};
pub use comments::ContentRetriever;
pub use lister::{ListOutcome, Lister, StopRule};
