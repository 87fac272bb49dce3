use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no candidate found for '{query}' after {tiers} tiers")]
    NotFound { query: String, tiers: usize },
}
