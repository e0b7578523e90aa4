use crate::id::EntrantId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building descriptors or loading entrant data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A session needs at least one actor.
    #[error("a group check needs at least one actor")]
    NoActors,

    /// The same entrant was listed twice.
    #[error("entrant listed more than once: {0}")]
    DuplicateEntrant(EntrantId),

    /// A fixed DC must be positive.
    #[error("invalid DC {0}: must be positive")]
    InvalidDc(i32),

    /// A roster file could not be parsed.
    #[error("invalid roster: {0}")]
    InvalidRoster(#[from] serde_json::Error),
}
