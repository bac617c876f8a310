pub mod search;

pub use search::{normalize_query, search, SearchHit};
