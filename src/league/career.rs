use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::fixture::Match;
use crate::models::standings::CareerStats;

/// Aggregate a user's record over finalized matches from any league.
///
/// Matches played at or before `reset_at` are left out, which is how a
/// career reset works without rewriting history.
pub fn compute_career(user_id: Uuid, matches: &[Match], reset_at: Option<DateTime<Utc>>) -> CareerStats {
    let mut career = CareerStats::default();

    for fixture in matches.iter().filter(|m| m.involves(user_id)) {
        let Some((home_score, away_score)) = fixture.final_score() else {
            continue;
        };
        if let (Some(reset_at), Some(played_at)) = (reset_at, fixture.played_at) {
            if played_at <= reset_at {
                continue;
            }
        }

        let (scored, conceded) = if fixture.home_user_id == user_id {
            (home_score, away_score)
        } else {
            (away_score, home_score)
        };

        career.total_matches += 1;
        career.goals_for += scored;
        career.goals_against += conceded;
        match scored.cmp(&conceded) {
            Ordering::Greater => career.total_wins += 1,
            Ordering::Equal => career.total_draws += 1,
            Ordering::Less => career.total_losses += 1,
        }
        if fixture.motm_user_id == Some(user_id) {
            career.total_motm += 1;
        }
    }

    career
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixture::MatchStatus;
    use chrono::Duration;

    fn finished(home: Uuid, away: Uuid, score: (i32, i32), motm: Uuid, played_at: DateTime<Utc>) -> Match {
        Match {
            id: Uuid::new_v4(),
            league_id: Uuid::new_v4(),
            home_user_id: home,
            away_user_id: away,
            home_score: Some(score.0),
            away_score: Some(score.1),
            is_completed: true,
            status: MatchStatus::Completed,
            round_number: 1,
            match_order: 1,
            motm_user_id: Some(motm),
            played_at: Some(played_at),
        }
    }

    #[test]
    fn test_career_spans_leagues_and_sides() {
        let me = Uuid::new_v4();
        let rival = Uuid::new_v4();
        let other = Uuid::new_v4();
        let now = Utc::now();

        let matches = vec![
            finished(me, rival, (3, 1), me, now),
            finished(other, me, (2, 2), other, now),
            finished(rival, me, (1, 0), rival, now),
            finished(rival, other, (5, 0), rival, now),
        ];

        let career = compute_career(me, &matches, None);
        assert_eq!(career.total_matches, 3);
        assert_eq!((career.total_wins, career.total_draws, career.total_losses), (1, 1, 1));
        assert_eq!((career.goals_for, career.goals_against), (5, 4));
        assert_eq!(career.total_motm, 1);
    }

    #[test]
    fn test_unfinished_matches_are_ignored() {
        let me = Uuid::new_v4();
        let rival = Uuid::new_v4();
        let mut live = finished(me, rival, (4, 0), me, Utc::now());
        live.status = MatchStatus::Live;
        live.is_completed = false;

        assert_eq!(compute_career(me, &[live], None), CareerStats::default());
    }

    #[test]
    fn test_reset_hides_earlier_matches() {
        let me = Uuid::new_v4();
        let rival = Uuid::new_v4();
        let reset_at = Utc::now();

        let matches = vec![
            finished(me, rival, (1, 0), me, reset_at - Duration::days(3)),
            finished(me, rival, (0, 2), rival, reset_at + Duration::minutes(5)),
        ];

        let career = compute_career(me, &matches, Some(reset_at));
        assert_eq!(career.total_matches, 1);
        assert_eq!(career.total_losses, 1);
        assert_eq!(career.total_motm, 0);
        assert_eq!(career.win_rate(), 0.0);
    }
}
