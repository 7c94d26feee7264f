use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::league::error::LeagueError;
use crate::models::fixture::{Match, MatchStatus, MatchUpdate};

/// Score operations a match can go through.
///
/// ```text
/// pending --start--> live --finalize--> completed --undo--> pending
///                    live --live_update--> live
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum MatchAction {
    Start,
    LiveUpdate { home_score: i32, away_score: i32 },
    Finalize { home_score: i32, away_score: i32, motm_user_id: Option<Uuid> },
    Undo,
}

impl MatchAction {
    pub fn name(&self) -> &'static str {
        match self {
            MatchAction::Start => "start",
            MatchAction::LiveUpdate { .. } => "update the live score of",
            MatchAction::Finalize { .. } => "finalize",
            MatchAction::Undo => "undo",
        }
    }

    /// Whether applying this action can change the standings.
    pub fn affects_standings(&self) -> bool {
        matches!(self, MatchAction::Finalize { .. } | MatchAction::Undo)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Replace the mutable fields of the match with these values.
    Apply(MatchUpdate),
    /// The match already is in the requested state.
    NoOp,
}

/// Work out what `action` does to `fixture` without touching any storage.
pub fn plan_transition(
    fixture: &Match,
    action: &MatchAction,
    now: DateTime<Utc>,
) -> Result<Transition, LeagueError> {
    let rejected = || LeagueError::InvalidMatchTransition {
        match_id: fixture.id,
        status: fixture.status,
        action: action.name(),
    };

    match action {
        MatchAction::Start => match fixture.status {
            MatchStatus::Pending => Ok(Transition::Apply(MatchUpdate {
                status: MatchStatus::Live,
                ..fixture.current_update()
            })),
            MatchStatus::Live => Ok(Transition::NoOp),
            MatchStatus::Completed => Err(rejected()),
        },

        MatchAction::LiveUpdate { home_score, away_score } => match fixture.status {
            MatchStatus::Live => Ok(Transition::Apply(MatchUpdate {
                home_score: Some(*home_score),
                away_score: Some(*away_score),
                ..fixture.current_update()
            })),
            MatchStatus::Pending | MatchStatus::Completed => Err(rejected()),
        },

        MatchAction::Finalize { home_score, away_score, motm_user_id } => {
            let motm = motm_user_id.ok_or(LeagueError::MissingMotm)?;
            if !fixture.involves(motm) {
                return Err(LeagueError::InvalidMotm {
                    match_id: fixture.id,
                    motm_user_id: motm,
                });
            }

            match fixture.status {
                MatchStatus::Pending => Err(rejected()),
                MatchStatus::Completed
                    if fixture.is_completed
                        && fixture.home_score == Some(*home_score)
                        && fixture.away_score == Some(*away_score)
                        && fixture.motm_user_id == Some(motm) =>
                {
                    Ok(Transition::NoOp)
                }
                // a live match, or a correction of an already final result.
                // Corrections keep the original kickoff time so career resets still apply.
                MatchStatus::Live | MatchStatus::Completed => Ok(Transition::Apply(MatchUpdate {
                    home_score: Some(*home_score),
                    away_score: Some(*away_score),
                    is_completed: true,
                    status: MatchStatus::Completed,
                    motm_user_id: Some(motm),
                    played_at: match fixture.status {
                        MatchStatus::Completed => fixture.played_at.or(Some(now)),
                        _ => Some(now),
                    },
                })),
            }
        }

        MatchAction::Undo => match fixture.status {
            MatchStatus::Completed => Ok(Transition::Apply(MatchUpdate {
                home_score: Some(0),
                away_score: Some(0),
                is_completed: false,
                status: MatchStatus::Pending,
                motm_user_id: None,
                played_at: None,
            })),
            MatchStatus::Pending | MatchStatus::Live => Ok(Transition::NoOp),
        },
    }
}
