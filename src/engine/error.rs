use std::path::PathBuf;

/// Failures while reading the rating and item sources.
///
/// Both variants are fatal for the whole pipeline: no partial graph is ever
/// built from a dataset that failed to load.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Data source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed data source {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Errors raised by graph construction and propagation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A raw item identifier has no dense index (the item was never liked)
    #[error("Item {0} has no dense index")]
    ItemUnmapped(i64),
}

pub type EngineResult<T> = Result<T, EngineError>;
