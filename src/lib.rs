// src/lib.rs

//! postwatch library
//!
//! Watches a single forum user's activity page, reconciles the parsed posts
//! against a durable history file, and pushes genuinely-new posts once.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
