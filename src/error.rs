use thiserror::Error;

/// Caller-visible failures. Every variant is rejected before any mutation:
/// a failed call leaves the bracket snapshot exactly as it was.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PicksError {
    /// Nonexistent round/match, a TBD slot, or a player not in the match.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Mutating operation attempted after the picks were locked.
    #[error("picks are locked for this tournament")]
    SessionLocked,

    /// Lock attempted while the bracket still has open matches.
    #[error("bracket is incomplete")]
    IncompleteBracket,

    /// Malformed seed bracket or fixture file.
    #[error("invalid bracket: {0}")]
    InvalidBracket(String),

    /// The persistence gateway failed; the session keeps its prior state.
    #[error("persistence failure: {0}")]
    Persistence(String),
}
