use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::league::{LeagueStatus, ParticipantStats};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StandingsRow {
    pub position: u32,
    pub participant_id: Uuid,
    pub user_id: Uuid,
    pub team_name: String,
    pub logo_url: Option<String>,
    #[serde(flatten)]
    pub stats: ParticipantStats,
    pub goal_difference: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StandingsResponse {
    pub league_id: Uuid,
    pub league_status: LeagueStatus,
    pub standings: Vec<StandingsRow>,
}

/// A user's record across every league they played in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct CareerStats {
    pub total_matches: i32,
    pub total_wins: i32,
    pub total_draws: i32,
    pub total_losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub total_motm: i32,
}

impl CareerStats {
    pub fn win_rate(&self) -> f64 {
        if self.total_matches == 0 {
            return 0.0;
        }
        f64::from(self.total_wins) / f64::from(self.total_matches) * 100.0
    }
}
