use crate::client::Endpoint;

/// A call to the prediction service did not produce a usable response.
///
/// Transport failures, non-success statuses and undecodable bodies all end
/// up here; the cause is kept in `detail` for logging only.
#[derive(Debug, thiserror::Error)]
#[error("request to {endpoint} failed")]
pub struct RequestFailed {
    pub endpoint: Endpoint,
    pub detail: anyhow::Error,
}

impl RequestFailed {
    pub fn new(endpoint: Endpoint, detail: anyhow::Error) -> Self {
        Self { endpoint, detail }
    }
}

pub type ApiResult<T> = Result<T, RequestFailed>;

/// A form field could not be turned into a request value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidField {
    #[error("field '{0}' is missing")]
    Missing(String),
    #[error("field '{name}' is not a number: {value:?}")]
    NotANumber { name: String, value: String },
    #[error("field '{0}' is empty")]
    Empty(String),
}
