mod error;
mod extract;

pub use error::{ApiError, ErrorBody, MessageBody};
pub use extract::JsonBody;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
