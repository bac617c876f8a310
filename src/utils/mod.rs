//! Shared building blocks.
//!
//! - [`charmap`] - per-character classification into normalized fragments
//! - [`tokenizer`] - streaming word extraction with incremental hashing
//! - [`classify`] - binary/text detection before content indexing
//! - [`app_data`] - app data directory and JSON config
//! - [`progress`] - directory-walk spinner, inert without the `progress` feature

pub mod app_data;
pub mod charmap;
pub mod classify;
pub mod progress;
pub mod tokenizer;

pub use tokenizer::{tokenize_str, Token, Tokens};
