use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::league::standings::derive_table;
use crate::models::fixture::{Match, MatchStatus, MatchUpdate, NewMatch};
use crate::models::league::{
    League, LeagueStatus, NewLeague, NewParticipant, OfficialTeam, Participant, ParticipantStats,
};
use crate::models::standings::StandingsRow;
use crate::store::{LeagueStore, StoreError, StoreFuture};

#[derive(Default)]
struct MemoryState {
    leagues: HashMap<Uuid, League>,
    // join order is the vector order
    participants: Vec<Participant>,
    matches: HashMap<Uuid, Match>,
    career_resets: HashMap<Uuid, DateTime<Utc>>,
    official_teams: HashMap<Uuid, OfficialTeam>,
}

impl MemoryState {
    fn league_status(&self, league_id: Uuid) -> Option<LeagueStatus> {
        self.leagues.get(&league_id).map(|league| league.status)
    }

    fn new_participant(&self, participant: NewParticipant, joined_at: DateTime<Utc>) -> Result<Participant, StoreError> {
        let logo_url = match participant.team_id {
            Some(team_id) => match self.official_teams.get(&team_id) {
                Some(team) => team.logo_url.clone(),
                None => return Err(StoreError::Conflict(format!("official team {} does not exist", team_id))),
            },
            None => None,
        };
        Ok(Participant {
            id: Uuid::new_v4(),
            league_id: participant.league_id,
            user_id: participant.user_id,
            team_name: participant.team_name,
            team_id: participant.team_id,
            logo_url,
            stats: ParticipantStats::default(),
            joined_at,
        })
    }

    /// Recompute the table of a league from the matches held right now.
    fn refresh_stats(&mut self, league_id: Uuid) -> Option<i32> {
        let scoring = self.leagues.get(&league_id)?.scoring;
        let participants: Vec<Participant> =
            self.participants.iter().filter(|p| p.league_id == league_id).cloned().collect();
        let mut matches: Vec<Match> = self.matches.values().filter(|m| m.league_id == league_id).cloned().collect();
        matches.sort_by_key(|m| m.match_order);

        let (table, cursor) = derive_table(&matches, &participants, &scoring);
        self.apply_stats(league_id, &table);
        Some(cursor)
    }

    fn apply_stats(&mut self, league_id: Uuid, standings: &[StandingsRow]) {
        let by_user: HashMap<Uuid, ParticipantStats> =
            standings.iter().map(|row| (row.user_id, row.stats)).collect();
        for participant in self.participants.iter_mut().filter(|p| p.league_id == league_id) {
            if let Some(stats) = by_user.get(&participant.user_id) {
                participant.stats = *stats;
            }
        }
    }
}

/// In-process store with the same guarantees as the Postgres one. Every
/// operation runs under a single lock, which makes each one atomic.
#[derive(Default)]
pub struct MemoryLeagueStore {
    state: RwLock<MemoryState>,
}

impl MemoryLeagueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the official team catalogue.
    pub async fn add_official_team(&self, team: OfficialTeam) {
        self.state.write().await.official_teams.insert(team.id, team);
    }
}

impl LeagueStore for MemoryLeagueStore {
    fn create_league(&self, league: NewLeague, admin: NewParticipant) -> StoreFuture<'_, (League, Participant)> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.leagues.values().any(|l| l.invite_code == league.invite_code) {
                return Err(StoreError::Conflict(format!("invite code {} is taken", league.invite_code)));
            }
            if state.leagues.contains_key(&league.id) {
                return Err(StoreError::Conflict(format!("league {} already exists", league.id)));
            }

            let now = Utc::now();
            let created = League {
                id: league.id,
                admin_id: league.admin_id,
                name: league.name,
                format: league.format,
                scoring: league.scoring,
                invite_code: league.invite_code,
                status: LeagueStatus::Lobby,
                current_match_order: 0,
                created_at: now,
            };
            let admin = state.new_participant(admin, now)?;

            state.leagues.insert(created.id, created.clone());
            state.participants.push(admin.clone());
            Ok((created, admin))
        })
    }

    fn get_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move { Ok(self.state.read().await.leagues.get(&league_id).cloned()) })
    }

    fn find_league_by_invite_code(&self, invite_code: String) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.leagues.values().find(|l| l.invite_code == invite_code).cloned())
        })
    }

    fn list_leagues_for_user(&self, user_id: Uuid, status: Option<LeagueStatus>) -> StoreFuture<'_, Vec<League>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut leagues: Vec<League> = state
                .participants
                .iter()
                .filter(|p| p.user_id == user_id)
                .filter_map(|p| state.leagues.get(&p.league_id))
                .filter(|l| status.map_or(true, |s| l.status == s))
                .cloned()
                .collect();
            leagues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(leagues)
        })
    }

    fn delete_league(&self, league_id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.leagues.remove(&league_id).is_none() {
                return Ok(false);
            }
            state.participants.retain(|p| p.league_id != league_id);
            state.matches.retain(|_, m| m.league_id != league_id);
            Ok(true)
        })
    }

    fn complete_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.league_status(league_id) != Some(LeagueStatus::Active) {
                return Ok(None);
            }
            let cursor = state.refresh_stats(league_id);
            let league = state.leagues.get_mut(&league_id).map(|league| {
                league.status = LeagueStatus::Completed;
                if let Some(cursor) = cursor {
                    league.current_match_order = cursor;
                }
                league.clone()
            });
            Ok(league)
        })
    }

    fn list_participants(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Participant>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.participants.iter().filter(|p| p.league_id == league_id).cloned().collect())
        })
    }

    fn add_participant(&self, participant: NewParticipant) -> StoreFuture<'_, Option<Participant>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.league_status(participant.league_id) != Some(LeagueStatus::Lobby) {
                return Ok(None);
            }
            if state
                .participants
                .iter()
                .any(|p| p.league_id == participant.league_id && p.user_id == participant.user_id)
            {
                return Err(StoreError::Conflict(format!(
                    "user {} already participates in league {}",
                    participant.user_id, participant.league_id
                )));
            }

            let created = state.new_participant(participant, Utc::now())?;
            state.participants.push(created.clone());
            Ok(Some(created))
        })
    }

    fn remove_participant(&self, league_id: Uuid, user_id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.league_status(league_id) != Some(LeagueStatus::Lobby) {
                return Ok(false);
            }
            let before = state.participants.len();
            state.participants.retain(|p| !(p.league_id == league_id && p.user_id == user_id));
            Ok(state.participants.len() < before)
        })
    }

    fn activate_league(&self, league_id: Uuid, matches: Vec<NewMatch>) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.league_status(league_id) != Some(LeagueStatus::Lobby) {
                return Ok(None);
            }

            // Check every row before writing any of them, as a database
            // constraint failure would abort the whole transaction.
            let mut orders = std::collections::HashSet::with_capacity(matches.len());
            for fixture in &matches {
                if fixture.league_id != league_id {
                    return Err(StoreError::Conflict(format!("match belongs to league {}", fixture.league_id)));
                }
                if fixture.home_user_id == fixture.away_user_id {
                    return Err(StoreError::Conflict("a match needs two different sides".into()));
                }
                if fixture.match_order < 1 || !orders.insert(fixture.match_order) {
                    return Err(StoreError::Conflict(format!("match_order {} is invalid or taken", fixture.match_order)));
                }
            }

            for fixture in matches {
                let id = Uuid::new_v4();
                state.matches.insert(
                    id,
                    Match {
                        id,
                        league_id: fixture.league_id,
                        home_user_id: fixture.home_user_id,
                        away_user_id: fixture.away_user_id,
                        home_score: None,
                        away_score: None,
                        is_completed: fixture.is_completed,
                        status: fixture.status,
                        round_number: fixture.round_number,
                        match_order: fixture.match_order,
                        motm_user_id: None,
                        played_at: None,
                    },
                );
            }

            let league = state.leagues.get_mut(&league_id).map(|league| {
                league.status = LeagueStatus::Active;
                league.current_match_order = 1;
                league.clone()
            });
            Ok(league)
        })
    }

    fn list_matches(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Match>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut matches: Vec<Match> = state.matches.values().filter(|m| m.league_id == league_id).cloned().collect();
            matches.sort_by_key(|m| m.match_order);
            Ok(matches)
        })
    }

    fn get_match(&self, match_id: Uuid) -> StoreFuture<'_, Option<Match>> {
        Box::pin(async move { Ok(self.state.read().await.matches.get(&match_id).cloned()) })
    }

    fn update_match(&self, match_id: Uuid, expected: MatchStatus, update: MatchUpdate) -> StoreFuture<'_, Option<Match>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            match state.matches.get_mut(&match_id) {
                Some(fixture) if fixture.status == expected => {
                    *fixture = fixture.clone().with_update(&update);
                    Ok(Some(fixture.clone()))
                }
                _ => Ok(None),
            }
        })
    }

    fn sync_standings(&self, league_id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.league_status(league_id) != Some(LeagueStatus::Active) {
                return Ok(false);
            }
            let Some(cursor) = state.refresh_stats(league_id) else {
                return Ok(false);
            };
            if let Some(league) = state.leagues.get_mut(&league_id) {
                league.current_match_order = cursor;
            }
            Ok(true)
        })
    }

    fn list_completed_matches_for_user(&self, user_id: Uuid) -> StoreFuture<'_, Vec<Match>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut matches: Vec<Match> = state
                .matches
                .values()
                .filter(|m| m.involves(user_id) && m.final_score().is_some())
                .cloned()
                .collect();
            matches.sort_by(|a, b| a.played_at.cmp(&b.played_at).then_with(|| a.id.cmp(&b.id)));
            Ok(matches)
        })
    }

    fn get_career_reset(&self, user_id: Uuid) -> StoreFuture<'_, Option<DateTime<Utc>>> {
        Box::pin(async move { Ok(self.state.read().await.career_resets.get(&user_id).copied()) })
    }

    fn set_career_reset(&self, user_id: Uuid, reset_at: DateTime<Utc>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.state.write().await.career_resets.insert(user_id, reset_at);
            Ok(())
        })
    }

    fn search_official_teams(&self, search: String, limit: i64) -> StoreFuture<'_, Vec<OfficialTeam>> {
        Box::pin(async move {
            let needle = search.to_lowercase();
            let state = self.state.read().await;
            let mut teams: Vec<OfficialTeam> = state
                .official_teams
                .values()
                .filter(|team| team.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            teams.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            teams.truncate(usize::try_from(limit).unwrap_or(0));
            Ok(teams)
        })
    }

    fn get_official_team(&self, team_id: Uuid) -> StoreFuture<'_, Option<OfficialTeam>> {
        Box::pin(async move { Ok(self.state.read().await.official_teams.get(&team_id).cloned()) })
    }
}
