use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::league::career::compute_career;
use crate::league::error::LeagueError;
use crate::league::fixtures::generate_fixtures;
use crate::league::matches::{plan_transition, MatchAction, Transition};
use crate::league::standings::{compute_standings, next_match_order, rank_participants};
use crate::league::validation::{LeagueValidator, INVITE_CODE_LENGTH};
use crate::models::events::{LeagueEvent, LeagueEventType};
use crate::models::fixture::{Match, MatchWithParticipants, ReportScoreRequest};
use crate::models::league::*;
use crate::models::standings::{CareerStats, StandingsResponse, StandingsRow};
use crate::services::LeagueEventPublisher;
use crate::store::{LeagueStore, StoreError};

const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const INVITE_CODE_ATTEMPTS: usize = 5;
// one reload after losing a compare-and-set race
const MATCH_UPDATE_ATTEMPTS: usize = 2;
const TEAM_SEARCH_MIN_CHARS: usize = 2;
const TEAM_SEARCH_LIMIT: i64 = 15;

/// Main league service that orchestrates all league-related operations
pub struct LeagueService {
    store: Arc<dyn LeagueStore>,
    events: LeagueEventPublisher,
    validator: LeagueValidator,
}

impl LeagueService {
    pub fn new(store: Arc<dyn LeagueStore>, events: LeagueEventPublisher) -> Self {
        Self {
            store,
            events,
            validator: LeagueValidator::new(),
        }
    }

    /// Create a league in lobby with the caller as admin and first participant
    pub async fn create_league(
        &self,
        admin_id: Uuid,
        request: CreateLeagueRequest,
    ) -> Result<LobbyResponse, LeagueError> {
        let (name, format, scoring, team_name) = self.validator.validate_create_league_request(&request)?;
        self.require_official_team(request.team_id).await?;
        let league_id = Uuid::new_v4();

        for attempt in 1..=INVITE_CODE_ATTEMPTS {
            let new_league = NewLeague {
                id: league_id,
                admin_id,
                name: name.clone(),
                format,
                scoring,
                invite_code: generate_invite_code(),
            };

            let admin = NewParticipant {
                league_id,
                user_id: admin_id,
                team_name: team_name.clone(),
                team_id: request.team_id,
            };

            match self.store.create_league(new_league, admin).await {
                Ok((league, admin)) => {
                    tracing::info!("Created {} league {} '{}' with invite code {}", league.format, league.id, league.name, league.invite_code);
                    return Ok(LobbyResponse {
                        league,
                        participants: vec![admin],
                    });
                }
                Err(StoreError::Conflict(reason)) => {
                    tracing::warn!("Invite code collision on attempt {}: {}", attempt, reason);
                }
                Err(e) => return Err(LeagueError::store("create_league")(e)),
            }
        }

        Err(LeagueError::Store {
            operation: "create_league",
            source: StoreError::Conflict(format!("no free invite code after {} attempts", INVITE_CODE_ATTEMPTS)),
        })
    }

    /// Join a lobby by invite code. Joining a league twice returns the existing entry.
    pub async fn join_league(&self, user_id: Uuid, request: JoinLeagueRequest) -> Result<Participant, LeagueError> {
        let invite_code = self.validator.normalize_invite_code(&request.invite_code)?;
        let team_name = self.validator.validate_and_sanitize_team_name(&request.team_name)?;

        let league = self
            .store
            .find_league_by_invite_code(invite_code.clone())
            .await
            .map_err(LeagueError::store("find_league_by_invite_code"))?
            .ok_or_else(|| LeagueError::NotFound(format!("League with invite code {}", invite_code)))?;

        let participants = self.participants(league.id).await?;
        if let Some(existing) = participants.iter().find(|p| p.user_id == user_id) {
            return Ok(existing.clone());
        }

        require_status(&league, LeagueStatus::Lobby)?;
        self.validator.validate_participant_count(participants.len())?;
        self.require_official_team(request.team_id).await?;

        let new_participant = NewParticipant {
            league_id: league.id,
            user_id,
            team_name,
            team_id: request.team_id,
        };

        match self.store.add_participant(new_participant).await {
            Ok(Some(participant)) => {
                tracing::info!("User {} joined league {} as '{}'", user_id, league.id, participant.team_name);
                self.events
                    .publish(LeagueEvent::for_user(LeagueEventType::ParticipantJoined, league.id, user_id))
                    .await;
                Ok(participant)
            }
            Ok(None) => Err(self.stale(league.id, LeagueStatus::Lobby).await),
            Err(StoreError::Conflict(_)) => {
                // lost a race against our own second request
                self.participants(league.id)
                    .await?
                    .into_iter()
                    .find(|p| p.user_id == user_id)
                    .ok_or_else(|| LeagueError::Validation("Could not join the league, try again".into()))
            }
            Err(e) => Err(LeagueError::store("add_participant")(e)),
        }
    }

    /// Leave a league that has not started yet
    pub async fn leave_league(&self, user_id: Uuid, league_id: Uuid) -> Result<(), LeagueError> {
        let league = self.load_league(league_id).await?;
        if league.is_admin(user_id) {
            return Err(LeagueError::Forbidden(
                "The league admin cannot leave the league, delete it instead".into(),
            ));
        }
        self.remove_from_lobby(&league, user_id).await
    }

    /// Remove another participant from the lobby (admin only)
    pub async fn kick_participant(&self, admin_id: Uuid, league_id: Uuid, user_id: Uuid) -> Result<(), LeagueError> {
        let league = self.load_league(league_id).await?;
        require_admin(&league, admin_id, "remove participants")?;
        if user_id == admin_id {
            return Err(LeagueError::Validation("The admin cannot be removed from their own league".into()));
        }
        self.remove_from_lobby(&league, user_id).await
    }

    /// Delete a league in any status, along with its participants and matches
    pub async fn delete_league(&self, admin_id: Uuid, league_id: Uuid) -> Result<(), LeagueError> {
        let league = self.load_league(league_id).await?;
        require_admin(&league, admin_id, "delete the league")?;

        let deleted = self
            .store
            .delete_league(league_id)
            .await
            .map_err(LeagueError::store("delete_league"))?;
        if !deleted {
            return Err(LeagueError::NotFound(format!("League {}", league_id)));
        }

        tracing::info!("Deleted league {} ({})", league_id, league.status);
        self.events
            .publish(LeagueEvent::new(LeagueEventType::LeagueDeleted, league_id))
            .await;
        Ok(())
    }

    /// Generate the fixture list and activate the league in one store transaction.
    /// A second start, concurrent or not, fails with `StaleTransition` and writes nothing.
    pub async fn start_league(&self, admin_id: Uuid, league_id: Uuid) -> Result<StartLeagueResponse, LeagueError> {
        let league = self.load_league(league_id).await?;
        require_admin(&league, admin_id, "start the league")?;
        require_status(&league, LeagueStatus::Lobby)?;

        let participants = self.participants(league_id).await?;
        let refs: Vec<ParticipantRef> = participants.iter().map(ParticipantRef::from).collect();

        let fixtures = {
            let mut rng = rand::thread_rng();
            generate_fixtures(league_id, &refs, league.format, &mut rng)?
        };
        let match_count = fixtures.len();

        let activated = self
            .store
            .activate_league(league_id, fixtures)
            .await
            .map_err(LeagueError::store("activate_league"))?;

        let Some(league) = activated else {
            tracing::warn!("League {} left the lobby before it could be started", league_id);
            return Err(self.stale(league_id, LeagueStatus::Lobby).await);
        };

        tracing::info!(
            "Started league {} with {} participants and {} matches",
            league_id,
            refs.len(),
            match_count
        );
        self.events
            .publish(LeagueEvent::new(LeagueEventType::LeagueActivated, league_id))
            .await;

        Ok(StartLeagueResponse { league, match_count })
    }

    /// End an active league and freeze its standings onto the participants
    pub async fn finish_league(&self, admin_id: Uuid, league_id: Uuid) -> Result<StandingsResponse, LeagueError> {
        let league = self.load_league(league_id).await?;
        require_admin(&league, admin_id, "finish the league")?;
        require_status(&league, LeagueStatus::Active)?;

        let completed = self
            .store
            .complete_league(league_id)
            .await
            .map_err(LeagueError::store("complete_league"))?;

        let Some(league) = completed else {
            return Err(self.stale(league_id, LeagueStatus::Active).await);
        };
        let standings = rank_participants(&self.participants(league_id).await?);

        tracing::info!("Finished league {}", league_id);
        self.events
            .publish(LeagueEvent::new(LeagueEventType::LeagueCompleted, league_id))
            .await;

        Ok(StandingsResponse {
            league_id,
            league_status: league.status,
            standings,
        })
    }

    pub async fn get_league(&self, league_id: Uuid) -> Result<League, LeagueError> {
        self.load_league(league_id).await
    }

    /// League details with its participants in join order
    pub async fn lobby(&self, league_id: Uuid) -> Result<LobbyResponse, LeagueError> {
        let league = self.load_league(league_id).await?;
        let participants = self.participants(league_id).await?;
        Ok(LobbyResponse { league, participants })
    }

    /// Standings recomputed from the current match snapshot
    pub async fn standings(&self, league_id: Uuid) -> Result<StandingsResponse, LeagueError> {
        let league = self.load_league(league_id).await?;
        let standings = self.live_table(&league).await?;
        Ok(StandingsResponse {
            league_id,
            league_status: league.status,
            standings,
        })
    }

    /// The table frozen onto the participants when the league was finished
    pub async fn final_standings(&self, league_id: Uuid) -> Result<StandingsResponse, LeagueError> {
        let league = self.load_league(league_id).await?;
        require_status(&league, LeagueStatus::Completed)?;
        let participants = self.participants(league_id).await?;
        Ok(StandingsResponse {
            league_id,
            league_status: league.status,
            standings: rank_participants(&participants),
        })
    }

    /// All matches in play order with both sides resolved
    pub async fn fixture(&self, league_id: Uuid) -> Result<Vec<MatchWithParticipants>, LeagueError> {
        self.load_league(league_id).await?;
        let (matches, profiles) = self.matches_and_profiles(league_id).await?;
        Ok(matches.into_iter().map(|m| with_participants(m, &profiles)).collect())
    }

    /// The match at the play-order cursor, `None` once every match is completed
    pub async fn next_match(&self, league_id: Uuid) -> Result<Option<MatchWithParticipants>, LeagueError> {
        self.load_league(league_id).await?;
        let (matches, profiles) = self.matches_and_profiles(league_id).await?;
        let cursor = next_match_order(&matches);
        Ok(matches
            .into_iter()
            .find(|m| m.match_order == cursor && !m.is_completed)
            .map(|m| with_participants(m, &profiles)))
    }

    pub async fn user_matches(&self, league_id: Uuid, user_id: Uuid) -> Result<Vec<MatchWithParticipants>, LeagueError> {
        self.load_league(league_id).await?;
        let (matches, profiles) = self.matches_and_profiles(league_id).await?;
        Ok(matches
            .into_iter()
            .filter(|m| m.involves(user_id))
            .map(|m| with_participants(m, &profiles))
            .collect())
    }

    /// Completed leagues the user took part in, newest first
    pub async fn past_leagues(&self, user_id: Uuid) -> Result<Vec<League>, LeagueError> {
        self.store
            .list_leagues_for_user(user_id, Some(LeagueStatus::Completed))
            .await
            .map_err(LeagueError::store("list_leagues_for_user"))
    }

    pub async fn start_match(&self, admin_id: Uuid, match_id: Uuid) -> Result<Match, LeagueError> {
        self.apply_match_action(admin_id, match_id, MatchAction::Start).await
    }

    /// Record a score. `finalize = false` keeps it provisional on a live match;
    /// `finalize = true` completes the match and requires a man of the match.
    pub async fn report_score(
        &self,
        admin_id: Uuid,
        match_id: Uuid,
        request: ReportScoreRequest,
    ) -> Result<Match, LeagueError> {
        self.validator.validate_scores(request.home_score, request.away_score)?;

        let action = if request.finalize {
            MatchAction::Finalize {
                home_score: request.home_score,
                away_score: request.away_score,
                motm_user_id: request.motm_user_id,
            }
        } else {
            MatchAction::LiveUpdate {
                home_score: request.home_score,
                away_score: request.away_score,
            }
        };

        self.apply_match_action(admin_id, match_id, action).await
    }

    /// Put a completed match back to pending. Undoing an unfinished match is a no-op.
    pub async fn undo_match(&self, admin_id: Uuid, match_id: Uuid) -> Result<Match, LeagueError> {
        self.apply_match_action(admin_id, match_id, MatchAction::Undo).await
    }

    pub async fn career(&self, user_id: Uuid) -> Result<CareerStats, LeagueError> {
        let matches = self
            .store
            .list_completed_matches_for_user(user_id)
            .await
            .map_err(LeagueError::store("list_completed_matches_for_user"))?;
        let reset_at = self
            .store
            .get_career_reset(user_id)
            .await
            .map_err(LeagueError::store("get_career_reset"))?;
        Ok(compute_career(user_id, &matches, reset_at))
    }

    /// Start the career record over from now
    pub async fn reset_career(&self, user_id: Uuid) -> Result<DateTime<Utc>, LeagueError> {
        let reset_at = Utc::now();
        self.store
            .set_career_reset(user_id, reset_at)
            .await
            .map_err(LeagueError::store("set_career_reset"))?;
        tracing::info!("Reset career statistics of user {}", user_id);
        Ok(reset_at)
    }

    /// Official teams to pick from when creating or joining a league. Terms
    /// shorter than two characters return nothing.
    pub async fn search_official_teams(&self, search: &str) -> Result<Vec<OfficialTeam>, LeagueError> {
        let term = self.validator.sanitize_string_input(search);
        if term.chars().count() < TEAM_SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        self.store
            .search_official_teams(term, TEAM_SEARCH_LIMIT)
            .await
            .map_err(LeagueError::store("search_official_teams"))
    }

    /// Handle a change notification for the league currently on screen.
    /// Returns a fresh table when the event can have changed it.
    pub async fn refresh_on_event(
        &self,
        event: &LeagueEvent,
        current_league: Uuid,
    ) -> Result<Option<StandingsResponse>, LeagueError> {
        if event.league_id != current_league || !event.affects_standings() {
            return Ok(None);
        }
        self.standings(current_league).await.map(Some)
    }

    async fn apply_match_action(&self, actor: Uuid, match_id: Uuid, action: MatchAction) -> Result<Match, LeagueError> {
        let mut league: Option<League> = None;

        for attempt in 1..=MATCH_UPDATE_ATTEMPTS {
            let fixture = self
                .store
                .get_match(match_id)
                .await
                .map_err(LeagueError::store("get_match"))?
                .ok_or_else(|| LeagueError::NotFound(format!("Match {}", match_id)))?;

            let current_league = match league.take() {
                Some(l) => l,
                None => {
                    let l = self.load_league(fixture.league_id).await?;
                    require_admin(&l, actor, "manage matches")?;
                    require_status(&l, LeagueStatus::Active)?;
                    l
                }
            };

            let update = match plan_transition(&fixture, &action, Utc::now()) {
                Ok(Transition::Apply(update)) => update,
                Ok(Transition::NoOp) => {
                    tracing::debug!("Match {} already {}, nothing to {}", match_id, fixture.status, action.name());
                    return Ok(fixture);
                }
                Err(e) => {
                    tracing::warn!("Rejected {} on match {}: {}", action.name(), match_id, e);
                    return Err(e);
                }
            };

            let updated = self
                .store
                .update_match(match_id, fixture.status, update)
                .await
                .map_err(LeagueError::store("update_match"))?;

            match updated {
                Some(updated) => {
                    tracing::info!(
                        "Match {} in league {}: {} -> {}",
                        match_id,
                        updated.league_id,
                        fixture.status,
                        updated.status
                    );
                    if action.affects_standings() {
                        self.sync_standings(current_league.id).await;
                    }
                    self.events
                        .publish(LeagueEvent::for_match(event_type(&action), updated.league_id, match_id))
                        .await;
                    return Ok(updated);
                }
                None => {
                    tracing::warn!(
                        "Match {} changed while applying {} (attempt {}), reloading",
                        match_id,
                        action.name(),
                        attempt
                    );
                    league = Some(current_league);
                }
            }
        }

        Err(LeagueError::ConcurrentUpdate { match_id })
    }

    /// Refresh the counters and cursor stored on the league. They are a cache
    /// of the match list, so failures are only logged.
    async fn sync_standings(&self, league_id: Uuid) {
        match self.store.sync_standings(league_id).await {
            Ok(true) => tracing::debug!("Synced standings of league {}", league_id),
            Ok(false) => tracing::warn!("League {} is no longer active, standings not synced", league_id),
            Err(e) => tracing::error!("Store operation 'sync_standings' failed for league {}: {}", league_id, e),
        }
    }

    async fn require_official_team(&self, team_id: Option<Uuid>) -> Result<(), LeagueError> {
        let Some(team_id) = team_id else {
            return Ok(());
        };
        self.store
            .get_official_team(team_id)
            .await
            .map_err(LeagueError::store("get_official_team"))?
            .map(|_| ())
            .ok_or_else(|| LeagueError::NotFound(format!("Official team {}", team_id)))
    }

    async fn remove_from_lobby(&self, league: &League, user_id: Uuid) -> Result<(), LeagueError> {
        require_status(league, LeagueStatus::Lobby)?;

        let participants = self.participants(league.id).await?;
        if !participants.iter().any(|p| p.user_id == user_id) {
            return Err(LeagueError::NotFound(format!("Participant {} in league {}", user_id, league.id)));
        }

        let removed = self
            .store
            .remove_participant(league.id, user_id)
            .await
            .map_err(LeagueError::store("remove_participant"))?;
        if !removed {
            return Err(self.stale(league.id, LeagueStatus::Lobby).await);
        }

        tracing::info!("User {} left league {}", user_id, league.id);
        self.events
            .publish(LeagueEvent::for_user(LeagueEventType::ParticipantLeft, league.id, user_id))
            .await;
        Ok(())
    }

    async fn live_table(&self, league: &League) -> Result<Vec<StandingsRow>, LeagueError> {
        let participants = self.participants(league.id).await?;
        let matches = self.matches(league.id).await?;
        let refs: Vec<ParticipantRef> = participants.iter().map(ParticipantRef::from).collect();
        Ok(compute_standings(&matches, &refs, &league.scoring))
    }

    async fn matches_and_profiles(
        &self,
        league_id: Uuid,
    ) -> Result<(Vec<Match>, HashMap<Uuid, ParticipantProfile>), LeagueError> {
        let participants = self.participants(league_id).await?;
        let matches = self.matches(league_id).await?;
        let profiles = participants
            .iter()
            .map(|p| (p.user_id, ParticipantProfile::from(p)))
            .collect();
        Ok((matches, profiles))
    }

    async fn load_league(&self, league_id: Uuid) -> Result<League, LeagueError> {
        self.store
            .get_league(league_id)
            .await
            .map_err(LeagueError::store("get_league"))?
            .ok_or_else(|| LeagueError::NotFound(format!("League {}", league_id)))
    }

    async fn participants(&self, league_id: Uuid) -> Result<Vec<Participant>, LeagueError> {
        self.store
            .list_participants(league_id)
            .await
            .map_err(LeagueError::store("list_participants"))
    }

    async fn matches(&self, league_id: Uuid) -> Result<Vec<Match>, LeagueError> {
        self.store
            .list_matches(league_id)
            .await
            .map_err(LeagueError::store("list_matches"))
    }

    /// Build the error for a transition the store refused because the
    /// league moved on, reporting the status it is in now.
    async fn stale(&self, league_id: Uuid, expected: LeagueStatus) -> LeagueError {
        match self.load_league(league_id).await {
            Ok(league) => LeagueError::StaleTransition {
                league_id,
                status: league.status,
                expected,
            },
            Err(e) => e,
        }
    }
}

fn require_admin(league: &League, user_id: Uuid, action: &str) -> Result<(), LeagueError> {
    if league.is_admin(user_id) {
        return Ok(());
    }
    tracing::warn!("User {} tried to {} in league {} without being admin", user_id, action, league.id);
    Err(LeagueError::Forbidden(format!("Only the league admin can {}", action)))
}

fn require_status(league: &League, expected: LeagueStatus) -> Result<(), LeagueError> {
    if league.status == expected {
        return Ok(());
    }
    Err(LeagueError::StaleTransition {
        league_id: league.id,
        status: league.status,
        expected,
    })
}

fn event_type(action: &MatchAction) -> LeagueEventType {
    match action {
        MatchAction::Start => LeagueEventType::MatchStarted,
        MatchAction::LiveUpdate { .. } => LeagueEventType::ScoreUpdated,
        MatchAction::Finalize { .. } => LeagueEventType::MatchFinalized,
        MatchAction::Undo => LeagueEventType::MatchUndone,
    }
}

fn with_participants(fixture: Match, profiles: &HashMap<Uuid, ParticipantProfile>) -> MatchWithParticipants {
    MatchWithParticipants {
        home_participant: profiles.get(&fixture.home_user_id).cloned(),
        away_participant: profiles.get(&fixture.away_user_id).cloned(),
        fixture,
    }
}

fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_codes_are_six_uppercase_alphanumerics() {
        let validator = LeagueValidator::new();
        for _ in 0..200 {
            let code = generate_invite_code();
            assert_eq!(code.len(), INVITE_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            assert_eq!(validator.normalize_invite_code(&code.to_lowercase()).unwrap(), code);
        }
    }

    #[test]
    fn test_only_score_operations_touch_standings() {
        assert!(MatchAction::Undo.affects_standings());
        assert!(MatchAction::Finalize { home_score: 1, away_score: 0, motm_user_id: None }.affects_standings());
        assert!(!MatchAction::Start.affects_standings());
        assert!(!MatchAction::LiveUpdate { home_score: 1, away_score: 0 }.affects_standings());
        assert_eq!(event_type(&MatchAction::Undo), LeagueEventType::MatchUndone);
    }
}
