//! Error types for the mechanics engine.

/// Errors that can occur during mechanics operations.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A roll formula could not be parsed.
    #[error("invalid formula '{formula}': {reason}")]
    InvalidFormula {
        /// The rejected input.
        formula: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A scripted roller ran out of prepared faces.
    #[error("scripted roller exhausted")]
    ScriptExhausted,
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
