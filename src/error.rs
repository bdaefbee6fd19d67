use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum QpcrError {
    #[error("invalid export format tag: {0}")]
    InvalidFormatTag(String),

    #[error("quantification API request failed: {0}")]
    ApiHttp(String),

    #[error("quantification API returned status {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("rate limit exceeded, retry after {}", .retry_after.as_deref().unwrap_or("the current window"))]
    #[diagnostic(help("wait for the indicated window to pass, or supply a consumer token"))]
    RateLimited { retry_after: Option<String> },

    #[error("malformed API response: {0}")]
    ApiDecode(String),

    #[error("no reference detector: pass --mock or include a 'mock' detector row in the export")]
    MissingReference,

    #[error("detector not present in results: {0}")]
    UnknownDetector(String),

    #[error("experiment results not fetched yet")]
    ResultsNotFetched,

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
