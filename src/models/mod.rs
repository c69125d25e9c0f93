// src/models/mod.rs

//! Domain models for the mirror.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

pub mod api;
mod attachment;
mod config;
mod content;
mod entry;

// Re-export all public types
pub use attachment::AttachmentRef;
pub use config::{
    Config, CrawlerConfig, Credentials, ListingConfig, OutputConfig, PASSWORD_ENV, ServerConfig,
};
pub use content::{ContentItem, ContentKind, parse_timestamp};
pub use entry::ListedEntry;
