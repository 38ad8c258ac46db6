use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail delivery to {to} failed")]
    MailRejected { to: String },
    #[error("invalid mail endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("mail gateway request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to serialize relay message: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("relay {address} unreachable: {source}")]
    RelayIo {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("relay {address} did not accept a connection within {seconds} seconds")]
    RelayTimeout { address: String, seconds: u64 },
}
