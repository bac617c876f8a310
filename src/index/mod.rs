pub mod accumulator;
pub mod build;
pub mod stats;
pub mod types;

pub use accumulator::Accumulator;
pub use build::Indexer;
pub use types::*;
