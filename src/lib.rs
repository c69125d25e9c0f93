// src/lib.rs

//! Blog mirror library
//!
//! Lists the blog posts of a Confluence space and exports each post, its
//! comment tree and its attachments into a static, browsable folder.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
