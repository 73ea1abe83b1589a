use thiserror::Error;

/// A failed fetch of a single URL. Never fatal for a crawl or a download batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} not found")]
    NotFound { url: String },
}

/// Failures that end extraction of one document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not load {path}: {reason}")]
    MalformedDocument { path: String, reason: String },
    #[error(
        "problem numbering differs at position {position}: question {question}, solution {solution}"
    )]
    StructuralMismatch {
        position: usize,
        question: u32,
        solution: u32,
    },
}
