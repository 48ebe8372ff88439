// src/services/mod.rs

//! External collaborators and the record parser.
//!
//! - `fetch`: activity-page fetch collaborator
//! - `parser`: HTML listing → [`PostRecord`](crate::models::PostRecord)s
//! - `notify`: batch formatting and the push collaborator

pub mod fetch;
pub mod notify;
pub mod parser;

pub use fetch::{HttpFetcher, PageFetcher};
pub use notify::{PushChannel, ServerChan, format_batch, format_failure};
pub use parser::PostParser;
