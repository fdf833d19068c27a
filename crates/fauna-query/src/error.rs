//! Errors raised while rendering queries or decoding wire fragments.
//!
//! Building an expression never fails: malformed arity or argument types are
//! encoded as-is and left for the server to reject. Lambda bodies that fail
//! surface their own error type through [`crate::try_lambda_query`], so the
//! variants here only cover the codec and the wrapped value types.

/// Errors that can occur in the query library.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Float {0} has no JSON representation")]
    NonFiniteFloat(f64),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Convenience result type.
pub type QueryResult<T> = Result<T, QueryError>;
