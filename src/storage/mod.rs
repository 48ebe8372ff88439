//! Persistence for the history store.
//!
//! One JSON file, written atomically (temp-then-rename) so a partial write
//! never corrupts the previous valid state.

pub mod local;

pub use local::HistoryFile;
