// Error types for the ledger and the interpreter
//
// Validation failures are recovered by the interpreter and turned into a
// friendly reply. Persistence failures are reported as such, never folded
// into a usage hint.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or missing arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Table file could not be opened, written or synced
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Table file could not be encoded or decoded
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// True for failures of the underlying storage
    pub fn is_persistence(&self) -> bool {
        matches!(self, LedgerError::Io(_) | LedgerError::Csv(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            LedgerError::Validation(reason) => reason.clone(),
            LedgerError::Io(e) => {
                format!("Could not reach the data files. Check permissions. Details: {}", e)
            }
            LedgerError::Csv(e) => format!("A data file could not be read or written. Details: {}", e),
        }
    }
}
