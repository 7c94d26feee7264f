use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use matchday_backend::models::fixture::{Match, MatchStatus, MatchUpdate, NewMatch};
use matchday_backend::models::league::{League, LeagueStatus, NewLeague, NewParticipant, OfficialTeam, Participant};
use matchday_backend::store::{LeagueStore, MemoryLeagueStore, StoreError, StoreFuture};

/// Memory store whose writes can be made to fail or stall on demand.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryLeagueStore,
    pub fail_activation: AtomicBool,
    pub fail_sync_standings: AtomicBool,
    /// Delay applied once, to the next standings sync only.
    pub delay_next_sync_ms: AtomicU64,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn unavailable<T: Send + 'static>(operation: &str) -> StoreFuture<'static, T> {
        let message = format!("{} timed out", operation);
        Box::pin(async move { Err(StoreError::Unavailable(message)) })
    }
}

impl LeagueStore for FailingStore {
    fn create_league(&self, league: NewLeague, admin: NewParticipant) -> StoreFuture<'_, (League, Participant)> {
        self.inner.create_league(league, admin)
    }

    fn get_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>> {
        self.inner.get_league(league_id)
    }

    fn find_league_by_invite_code(&self, invite_code: String) -> StoreFuture<'_, Option<League>> {
        self.inner.find_league_by_invite_code(invite_code)
    }

    fn list_leagues_for_user(&self, user_id: Uuid, status: Option<LeagueStatus>) -> StoreFuture<'_, Vec<League>> {
        self.inner.list_leagues_for_user(user_id, status)
    }

    fn delete_league(&self, league_id: Uuid) -> StoreFuture<'_, bool> {
        self.inner.delete_league(league_id)
    }

    fn complete_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>> {
        self.inner.complete_league(league_id)
    }

    fn list_participants(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Participant>> {
        self.inner.list_participants(league_id)
    }

    fn add_participant(&self, participant: NewParticipant) -> StoreFuture<'_, Option<Participant>> {
        self.inner.add_participant(participant)
    }

    fn remove_participant(&self, league_id: Uuid, user_id: Uuid) -> StoreFuture<'_, bool> {
        self.inner.remove_participant(league_id, user_id)
    }

    fn activate_league(&self, league_id: Uuid, matches: Vec<NewMatch>) -> StoreFuture<'_, Option<League>> {
        if self.fail_activation.load(Ordering::SeqCst) {
            return Self::unavailable("activate_league");
        }
        self.inner.activate_league(league_id, matches)
    }

    fn list_matches(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Match>> {
        self.inner.list_matches(league_id)
    }

    fn get_match(&self, match_id: Uuid) -> StoreFuture<'_, Option<Match>> {
        self.inner.get_match(match_id)
    }

    fn update_match(&self, match_id: Uuid, expected: MatchStatus, update: MatchUpdate) -> StoreFuture<'_, Option<Match>> {
        self.inner.update_match(match_id, expected, update)
    }

    fn sync_standings(&self, league_id: Uuid) -> StoreFuture<'_, bool> {
        if self.fail_sync_standings.load(Ordering::SeqCst) {
            return Self::unavailable("sync_standings");
        }
        let delay = self.delay_next_sync_ms.swap(0, Ordering::SeqCst);
        Box::pin(async move {
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            self.inner.sync_standings(league_id).await
        })
    }

    fn search_official_teams(&self, search: String, limit: i64) -> StoreFuture<'_, Vec<OfficialTeam>> {
        self.inner.search_official_teams(search, limit)
    }

    fn get_official_team(&self, team_id: Uuid) -> StoreFuture<'_, Option<OfficialTeam>> {
        self.inner.get_official_team(team_id)
    }

    fn list_completed_matches_for_user(&self, user_id: Uuid) -> StoreFuture<'_, Vec<Match>> {
        self.inner.list_completed_matches_for_user(user_id)
    }

    fn get_career_reset(&self, user_id: Uuid) -> StoreFuture<'_, Option<DateTime<Utc>>> {
        self.inner.get_career_reset(user_id)
    }

    fn set_career_reset(&self, user_id: Uuid, reset_at: DateTime<Utc>) -> StoreFuture<'_, ()> {
        self.inner.set_career_reset(user_id, reset_at)
    }
}
