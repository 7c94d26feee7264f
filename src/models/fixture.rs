use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::league::ParticipantProfile;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "live" => Ok(MatchStatus::Live),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(format!("unknown match status '{}'", other)),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub league_id: Uuid,
    pub home_user_id: Uuid,
    pub away_user_id: Uuid,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_completed: bool,
    pub status: MatchStatus,
    /// 1 for the first leg, 2 for the reverse leg of a double round-robin.
    pub round_number: i32,
    pub match_order: i32,
    pub motm_user_id: Option<Uuid>,
    pub played_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.home_user_id == user_id || self.away_user_id == user_id
    }

    /// The final score, present only once the result counts towards standings.
    /// Live scores are provisional and never returned here.
    pub fn final_score(&self) -> Option<(i32, i32)> {
        if !(self.is_completed && self.status == MatchStatus::Completed) {
            return None;
        }
        Some((self.home_score?, self.away_score?))
    }

    /// Current values of every field a score operation may touch.
    pub fn current_update(&self) -> MatchUpdate {
        MatchUpdate {
            home_score: self.home_score,
            away_score: self.away_score,
            is_completed: self.is_completed,
            status: self.status,
            motm_user_id: self.motm_user_id,
            played_at: self.played_at,
        }
    }

    pub fn with_update(mut self, update: &MatchUpdate) -> Self {
        self.home_score = update.home_score;
        self.away_score = update.away_score;
        self.is_completed = update.is_completed;
        self.status = update.status;
        self.motm_user_id = update.motm_user_id;
        self.played_at = update.played_at;
        self
    }
}

/// Fixture row produced by the generator, before the store assigns an id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub league_id: Uuid,
    pub home_user_id: Uuid,
    pub away_user_id: Uuid,
    pub status: MatchStatus,
    pub is_completed: bool,
    pub round_number: i32,
    pub match_order: i32,
}

/// Full replacement of the mutable fields of a match. Identity fields
/// (league, sides, round, order) are never part of an update.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchUpdate {
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_completed: bool,
    pub status: MatchStatus,
    pub motm_user_id: Option<Uuid>,
    pub played_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchWithParticipants {
    #[serde(flatten)]
    pub fixture: Match,
    pub home_participant: Option<ParticipantProfile>,
    pub away_participant: Option<ParticipantProfile>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportScoreRequest {
    pub home_score: i32,
    pub away_score: i32,
    #[serde(default)]
    pub motm_user_id: Option<Uuid>,
    /// `false` records a provisional live score, `true` makes the result final.
    #[serde(default)]
    pub finalize: bool,
}
