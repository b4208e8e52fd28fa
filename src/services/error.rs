use thiserror::Error;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("smtp error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),
    #[error("mail build error: {0}")]
    MailBuildError(#[from] lettre::error::Error),
    #[error("mail address error: {0}")]
    MailAddressError(#[from] lettre::address::AddressError),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("database error: {0}")]
    DatabaseError(#[from] crate::model::DatabaseError),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
