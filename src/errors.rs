use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cache I/O error on {key}: {source}")]
    CacheIo {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cache entry {key} is not valid JSON: {source}")]
    CacheFormat {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache store lock poisoned")]
    CachePoisoned,
}
