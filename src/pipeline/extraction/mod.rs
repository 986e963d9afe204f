pub mod extractor;
pub mod parser;
pub mod prompt;

pub use extractor::*;
pub use parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("{0}")]
    Validation(String),

    /// The generation oracle was unreachable, timed out, or returned an
    /// error status. Parse failures are not in this enum — they degrade
    /// the record instead of failing the call.
    #[error("Extraction oracle error: {0}")]
    Oracle(#[from] crate::oracle::OracleError),
}
