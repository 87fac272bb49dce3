use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog reference '{0}'")]
    InvalidReference(String),

    #[error("missing catalog credentials: set client_id and client_secret")]
    MissingCredentials,

    #[error("catalog request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("unexpected catalog response: {0}")]
    Response(#[from] std::io::Error),

    #[error("track {0} not found in catalog")]
    TrackNotFound(String),

    #[error("track {track} is missing {field}")]
    MissingField { track: String, field: &'static str },
}

impl From<ureq::Error> for CatalogError {
    fn from(err: ureq::Error) -> Self {
        CatalogError::Http(Box::new(err))
    }
}
