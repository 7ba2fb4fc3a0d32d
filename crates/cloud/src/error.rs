/// Errors from the external storage and data model services.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Data API error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    /// The GraphQL endpoint answered with an `errors` array.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Failed to sign storage URL: {0}")]
    Presign(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Cloud configuration error: {0}")]
    Config(String),
}
