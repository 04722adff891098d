use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Request-scoped failures. Nothing here is fatal to the process; the
/// webhook handler acknowledges the provider with 200 regardless and only
/// the side effects differ.
#[derive(Debug, Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("whatsapp request failed: {0}")]
    Whatsapp(String),

    #[error("courier request failed: {0}")]
    Courier(String),
}
