use csrf_plus_store::StoreError;
use thiserror::Error;

/// Configuration errors, raised once by [`CsrfConfigBuilder::build`](crate::CsrfConfigBuilder::build).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Stateful CSRF protection requires a secret store")]
    MissingStore,

    #[error("Stateless CSRF protection requires a non-empty signing key")]
    MissingStatelessKey,

    #[error("Secret length must be at least 1 byte, got {0}")]
    InvalidSecretLength(usize),

    #[error("Stateless token lifetime must be positive, got {0} ms")]
    InvalidTtl(i64),

    #[error("Invalid name for {0}")]
    InvalidName(&'static str),
}

/// Failures at the text codec and mask codec boundaries.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("Token is not valid URL-safe base64")]
    InvalidEncoding,

    #[error("Malformed token")]
    MalformedToken,
}

/// Reasons a protected request is refused.
///
/// Messages are safe to return to the client; none of them echo token,
/// secret, or session material.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("Request origin does not match host")]
    OriginMismatch,

    #[error("Missing CSRF token")]
    TokenMissing,

    #[error("Missing CSRF session")]
    SessionMissing,

    #[error("No CSRF secret for this session")]
    SecretMissing,

    #[error("Malformed CSRF token")]
    TokenMalformed,

    #[error("CSRF token length mismatch")]
    LengthMismatch,

    #[error("Invalid CSRF token")]
    ValueMismatch,

    #[error("Invalid CSRF token signature")]
    TokenInvalid,

    #[error("CSRF token expired")]
    TokenExpired,
}

impl Rejection {
    /// Stable machine-readable tag for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::OriginMismatch => "origin_mismatch",
            Rejection::TokenMissing => "token_missing",
            Rejection::SessionMissing => "session_missing",
            Rejection::SecretMissing => "secret_missing",
            Rejection::TokenMalformed => "token_malformed",
            Rejection::LengthMismatch => "length_mismatch",
            Rejection::ValueMismatch => "value_mismatch",
            Rejection::TokenInvalid => "token_invalid",
            Rejection::TokenExpired => "token_expired",
        }
    }

    /// HTTP status for a refused request
    pub fn status_code(&self) -> u16 {
        403
    }
}

/// Outcome of a failed verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("{0}")]
    Rejected(Rejection),

    /// Something unanticipated went wrong. Details are logged, never returned.
    #[error("CSRF validation failed")]
    Internal,
}

impl VerifyError {
    /// HTTP status the host should respond with
    pub fn status_code(&self) -> u16 {
        match self {
            VerifyError::Rejected(rejection) => rejection.status_code(),
            VerifyError::Internal => 500,
        }
    }

    /// The rejection reason, if this was an ordinary refusal
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            VerifyError::Rejected(rejection) => Some(*rejection),
            VerifyError::Internal => None,
        }
    }
}

impl From<Rejection> for VerifyError {
    fn from(rejection: Rejection) -> Self {
        VerifyError::Rejected(rejection)
    }
}

/// Errors raised while cookie headers are handed to the response.
#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Invalid Set-Cookie header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Cookie rejected by response: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum CsrfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Secret store error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CsrfError>;
