use thiserror::Error;

/// Why a playlist could not be generated. Every variant ends the request.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Blank mood or wrong number of seeds. Raised before the catalog is touched.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Fewer distinct tracks resolved than ids requested. Covers unknown ids
    /// and repeated ids alike, since a repeated id resolves to a single track.
    #[error("Only {found} of {requested} seed tracks were found in the catalog")]
    SeedNotFound { requested: usize, found: usize },

    /// A catalog query failed; the underlying error is kept as the source.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[source] anyhow::Error),
}

impl GenerateError {
    /// Process exit code used by the CLI for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => 2,
            Self::SeedNotFound { .. } => 3,
            Self::CatalogUnavailable(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
