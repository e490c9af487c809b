pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid HMAC key length: {0}")]
    InvalidKeyLength(#[from] hmac::digest::InvalidLength),
    #[error("System time error: {0}")]
    TimeError(#[from] std::time::SystemTimeError),
    #[error("Malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
    #[error("Invalid user id encoding: {0}")]
    InvalidUid(String),
}
