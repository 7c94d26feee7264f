// src/models/league.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::league::error::LeagueError;

/// Round-robin variant a league is played in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LeagueFormat {
    /// Every pair meets once.
    Single,
    /// Every pair meets twice, home and away.
    Double,
}

impl LeagueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueFormat::Single => "single",
            LeagueFormat::Double => "double",
        }
    }

    /// Number of fixtures a league of `participant_count` produces in this format.
    pub fn fixture_count(&self, participant_count: usize) -> usize {
        let pairs = participant_count * participant_count.saturating_sub(1) / 2;
        match self {
            LeagueFormat::Single => pairs,
            LeagueFormat::Double => pairs * 2,
        }
    }
}

impl FromStr for LeagueFormat {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(LeagueFormat::Single),
            "double" => Ok(LeagueFormat::Double),
            other => Err(LeagueError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LeagueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a league. Transitions only ever move forward.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LeagueStatus {
    Lobby,
    Active,
    Completed,
}

impl LeagueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueStatus::Lobby => "lobby",
            LeagueStatus::Active => "active",
            LeagueStatus::Completed => "completed",
        }
    }
}

impl FromStr for LeagueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lobby" => Ok(LeagueStatus::Lobby),
            "active" => Ok(LeagueStatus::Active),
            "completed" => Ok(LeagueStatus::Completed),
            other => Err(format!("unknown league status '{}'", other)),
        }
    }
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points awarded per result.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub win_points: i32,
    pub draw_points: i32,
    pub loss_points: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            win_points: 3,
            draw_points: 1,
            loss_points: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct League {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub name: String,
    pub format: LeagueFormat,
    #[serde(flatten)]
    pub scoring: ScoringRules,
    pub invite_code: String,
    pub status: LeagueStatus,
    /// Play-order cursor: the lowest `match_order` not yet completed.
    pub current_match_order: i32,
    pub created_at: DateTime<Utc>,
}

impl League {
    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admin_id == user_id
    }
}

/// League row as handed to the store on creation.
#[derive(Debug, Clone)]
pub struct NewLeague {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub name: String,
    pub format: LeagueFormat,
    pub scoring: ScoringRules,
    pub invite_code: String,
}

/// Aggregate counters kept per participant.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticipantStats {
    pub points: i32,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub motm_count: i32,
}

impl ParticipantStats {
    pub fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Participant {
    pub id: Uuid,
    pub league_id: Uuid,
    pub user_id: Uuid,
    pub team_name: String,
    /// Official team the participant plays as, if one was picked.
    pub team_id: Option<Uuid>,
    pub logo_url: Option<String>,
    #[serde(flatten)]
    pub stats: ParticipantStats,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub league_id: Uuid,
    pub user_id: Uuid,
    pub team_name: String,
    pub team_id: Option<Uuid>,
}

/// The identity part of a participant: all the fixture generator and the
/// standings engine need.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParticipantRef {
    pub id: Uuid,
    pub league_id: Uuid,
    pub user_id: Uuid,
    pub team_name: String,
    pub logo_url: Option<String>,
}

impl From<&Participant> for ParticipantRef {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            league_id: participant.league_id,
            user_id: participant.user_id,
            team_name: participant.team_name.clone(),
            logo_url: participant.logo_url.clone(),
        }
    }
}

/// Display data for one side of a fixture.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParticipantProfile {
    pub user_id: Uuid,
    pub team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl From<&Participant> for ParticipantProfile {
    fn from(participant: &Participant) -> Self {
        Self {
            user_id: participant.user_id,
            team_name: participant.team_name.clone(),
            logo_url: participant.logo_url.clone(),
        }
    }
}

/// Entry of the official team catalogue participants can play as.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OfficialTeam {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamSearchQuery {
    #[serde(default)]
    pub search: String,
}

// Request/Response DTOs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateLeagueRequest {
    pub name: String,
    pub format: String,
    #[serde(default)]
    pub win_points: Option<i32>,
    #[serde(default)]
    pub draw_points: Option<i32>,
    #[serde(default)]
    pub loss_points: Option<i32>,
    pub team_name: String,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JoinLeagueRequest {
    pub invite_code: String,
    pub team_name: String,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LobbyResponse {
    pub league: League,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartLeagueResponse {
    pub league: League,
    pub match_count: usize,
}
