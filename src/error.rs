use thiserror::Error;

/// Failure talking to the odds board API
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} API error: {status} - {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("server reported: {0}")]
    Upstream(String),

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type BoardResult<T> = std::result::Result<T, BoardError>;
