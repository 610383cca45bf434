use std::io;
use std::path::PathBuf;

/// Startup failures of the query engine, one variant per artifact so callers
/// can tell which file is missing or corrupt.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load meta index from {path}: {source}")]
    MetaIndexLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to open index file {path}: {source}")]
    IndexOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load url registry from {path}: {source}")]
    UrlRegistryLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
