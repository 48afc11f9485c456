use thiserror::Error;

/// Errors returned by the intent classifier client.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("classifier API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The reply held no text block to parse.
    #[error("classifier returned no text content")]
    EmptyResponse,

    /// The reply text did not contain a valid intent object.
    #[error("could not parse intent from classifier reply: {source}")]
    Parse {
        reply: String,
        #[source]
        source: serde_json::Error,
    },
}
