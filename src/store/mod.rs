use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::models::fixture::{Match, MatchStatus, MatchUpdate, NewMatch};
use crate::models::league::{League, LeagueStatus, NewLeague, NewParticipant, OfficialTeam, Participant};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLeagueStore;
pub use postgres::PgLeagueStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            if db_error.is_unique_violation() {
                return StoreError::Conflict(db_error.message().to_string());
            }
        }
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(error.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, StoreError>>;

/// Everything the league service needs from persistent storage.
///
/// Implementations must make `activate_league` all-or-nothing and
/// `update_match` a compare-and-set on the match status. Methods returning
/// `Option` use `None` for "the row is gone or not in the expected state".
pub trait LeagueStore: Send + Sync {
    /// Insert a league together with its admin as the first participant.
    /// A taken invite code yields `StoreError::Conflict`.
    fn create_league(&self, league: NewLeague, admin: NewParticipant) -> StoreFuture<'_, (League, Participant)>;

    fn get_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>>;

    fn find_league_by_invite_code(&self, invite_code: String) -> StoreFuture<'_, Option<League>>;

    /// Leagues the user participates in, newest first.
    fn list_leagues_for_user(&self, user_id: Uuid, status: Option<LeagueStatus>) -> StoreFuture<'_, Vec<League>>;

    /// Delete a league with its participants and matches.
    fn delete_league(&self, league_id: Uuid) -> StoreFuture<'_, bool>;

    /// Move an active league to completed and freeze the table derived from
    /// its matches onto the participants, in the same unit of work.
    fn complete_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>>;

    /// Participants in join order.
    fn list_participants(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Participant>>;

    /// Add a participant while the league is in lobby. `None` when the league
    /// has left the lobby; `StoreError::Conflict` when the user already joined.
    fn add_participant(&self, participant: NewParticipant) -> StoreFuture<'_, Option<Participant>>;

    /// Remove a participant while the league is in lobby.
    fn remove_participant(&self, league_id: Uuid, user_id: Uuid) -> StoreFuture<'_, bool>;

    /// Insert the generated fixtures and move the league from lobby to active
    /// with the cursor at 1, as one unit. `None` if the league is not in lobby,
    /// in which case nothing is written.
    fn activate_league(&self, league_id: Uuid, matches: Vec<NewMatch>) -> StoreFuture<'_, Option<League>>;

    /// Matches of a league ordered by `match_order`.
    fn list_matches(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Match>>;

    fn get_match(&self, match_id: Uuid) -> StoreFuture<'_, Option<Match>>;

    /// Replace the mutable fields of a match if its status still is `expected`.
    fn update_match(&self, match_id: Uuid, expected: MatchStatus, update: MatchUpdate) -> StoreFuture<'_, Option<Match>>;

    /// Recompute the participant counters and the play-order cursor of an
    /// active league from the matches committed so far, and store them.
    /// The matches are read under the same lock the write holds, so the last
    /// sync to finish reflects every match update before it. Returns `false`
    /// when the league is no longer active.
    fn sync_standings(&self, league_id: Uuid) -> StoreFuture<'_, bool>;

    /// Finalized matches the user played in, across all leagues.
    fn list_completed_matches_for_user(&self, user_id: Uuid) -> StoreFuture<'_, Vec<Match>>;

    fn get_career_reset(&self, user_id: Uuid) -> StoreFuture<'_, Option<DateTime<Utc>>>;

    fn set_career_reset(&self, user_id: Uuid, reset_at: DateTime<Utc>) -> StoreFuture<'_, ()>;

    /// Official teams whose name contains `search`, case-insensitive, by name.
    fn search_official_teams(&self, search: String, limit: i64) -> StoreFuture<'_, Vec<OfficialTeam>>;

    fn get_official_team(&self, team_id: Uuid) -> StoreFuture<'_, Option<OfficialTeam>>;
}
