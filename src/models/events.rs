use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeagueEventType {
    ParticipantJoined,
    ParticipantLeft,
    LeagueActivated,
    MatchStarted,
    ScoreUpdated,
    MatchFinalized,
    MatchUndone,
    LeagueCompleted,
    LeagueDeleted,
}

impl LeagueEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueEventType::ParticipantJoined => "participant_joined",
            LeagueEventType::ParticipantLeft => "participant_left",
            LeagueEventType::LeagueActivated => "league_activated",
            LeagueEventType::MatchStarted => "match_started",
            LeagueEventType::ScoreUpdated => "score_updated",
            LeagueEventType::MatchFinalized => "match_finalized",
            LeagueEventType::MatchUndone => "match_undone",
            LeagueEventType::LeagueCompleted => "league_completed",
            LeagueEventType::LeagueDeleted => "league_deleted",
        }
    }
}

/// Change notification for one league, published after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueEvent {
    pub event_type: LeagueEventType,
    pub league_id: Uuid,
    pub match_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl LeagueEvent {
    pub fn new(event_type: LeagueEventType, league_id: Uuid) -> Self {
        Self {
            event_type,
            league_id,
            match_id: None,
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn for_match(event_type: LeagueEventType, league_id: Uuid, match_id: Uuid) -> Self {
        Self {
            match_id: Some(match_id),
            ..Self::new(event_type, league_id)
        }
    }

    pub fn for_user(event_type: LeagueEventType, league_id: Uuid, user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::new(event_type, league_id)
        }
    }

    /// Whether a standings table built before this event may now be stale.
    /// Live score updates never are: provisional scores do not count.
    pub fn affects_standings(&self) -> bool {
        matches!(
            self.event_type,
            LeagueEventType::ParticipantJoined
                | LeagueEventType::ParticipantLeft
                | LeagueEventType::MatchFinalized
                | LeagueEventType::MatchUndone
        )
    }

    pub fn channel(&self) -> String {
        format!("league_events:{}", self.league_id)
    }
}
