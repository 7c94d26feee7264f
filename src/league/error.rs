use uuid::Uuid;

use crate::models::fixture::MatchStatus;
use crate::models::league::LeagueStatus;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("At least 2 participants are required to generate fixtures, found {found}")]
    InsufficientParticipants { found: usize },

    #[error("Unknown league format '{0}', expected 'single' or 'double'")]
    InvalidFormat(String),

    #[error("A man of the match must be selected to finalize a match")]
    MissingMotm,

    #[error("Man of the match {motm_user_id} did not play in match {match_id}")]
    InvalidMotm { match_id: Uuid, motm_user_id: Uuid },

    #[error("League {league_id} is {status}, expected {expected}")]
    StaleTransition {
        league_id: Uuid,
        status: LeagueStatus,
        expected: LeagueStatus,
    },

    #[error("Cannot {action} match {match_id} while it is {status}")]
    InvalidMatchTransition {
        match_id: Uuid,
        status: MatchStatus,
        action: &'static str,
    },

    #[error("Match {match_id} was modified concurrently, reload and retry")]
    ConcurrentUpdate { match_id: Uuid },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Store operation '{operation}' failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl LeagueError {
    /// Tags a store failure with the operation that hit it, for use with `map_err`.
    pub fn store(operation: &'static str) -> impl FnOnce(StoreError) -> LeagueError {
        move |source| LeagueError::Store { operation, source }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LeagueError::InsufficientParticipants { .. } => "insufficient_participants",
            LeagueError::InvalidFormat(_) => "invalid_format",
            LeagueError::MissingMotm => "missing_motm",
            LeagueError::InvalidMotm { .. } => "invalid_motm",
            LeagueError::StaleTransition { .. } => "stale_transition",
            LeagueError::InvalidMatchTransition { .. } => "invalid_match_transition",
            LeagueError::ConcurrentUpdate { .. } => "concurrent_update",
            LeagueError::NotFound(_) => "not_found",
            LeagueError::Forbidden(_) => "forbidden",
            LeagueError::Validation(_) => "validation",
            LeagueError::Store { .. } => "store_unavailable",
        }
    }
}
