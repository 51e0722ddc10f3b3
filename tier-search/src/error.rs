//! Error types for the tier-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Connection URLs and credentials never appear
//! in error messages.

/// Errors that can occur during tiered search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The backing index cannot be reached at all. Fatal for a search.
    #[error("index unreachable: {0}")]
    IndexUnreachable(String),

    /// The backing index rejected a single query.
    #[error("index query failed: {0}")]
    IndexQuery(String),

    /// The backing index replied with something that could not be decoded.
    #[error("malformed index reply: {0}")]
    MalformedReply(String),

    /// The per-call deadline elapsed before the search finished.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// The query itself is unusable (blank text, zero limit).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration, or a configuration resource that could not be read.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for tier-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
