pub mod openapi;

pub use openapi::OpenApiParser;

use thiserror::Error;

/// Errors raised while obtaining or converting an API description.
/// Conversion is all-or-nothing: any of these means no spec was produced.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document unreachable: {0}")]
    Unreachable(String),

    #[error("document rejected by grammar: {0}")]
    Grammar(String),

    #[error("conversion failed: {0}")]
    Conversion(String),
}
