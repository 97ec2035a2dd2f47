use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrantsGovError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Grants.gov API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid opportunity id: {0}")]
    InvalidOpportunityId(String),
}

pub type Result<T> = std::result::Result<T, GrantsGovError>;
