/// Errors from archive encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The input is not a gzip stream.
    #[error("data is not a gzip archive: {0}")]
    NotGzip(String),

    /// The tar stream inside the gzip wrapper is unreadable.
    #[error("tar error: {0}")]
    Tar(#[from] std::io::Error),

    /// A chart subtree has no descriptor file.
    #[error("missing Chart.yaml under {0}")]
    MissingDescriptor(String),

    /// A descriptor or values document failed to parse.
    #[error("yaml error in {name}: {source}")]
    Yaml {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A values document is not a mapping at the top level.
    #[error("values of {0} must be a mapping")]
    InvalidValues(String),

    /// The tar layout violates the single-root convention.
    #[error("malformed archive: {0}")]
    Malformed(String),
}

/// Result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
