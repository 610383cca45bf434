// Re-export the query engine components
mod engine;
mod errors;

pub use engine::{SearchEngine, DEFAULT_TOP_K};
pub use errors::EngineError;
