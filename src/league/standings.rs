use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::models::fixture::Match;
use crate::models::league::{Participant, ParticipantRef, ParticipantStats, ScoringRules};
use crate::models::standings::StandingsRow;

/// Derive the standings table from a snapshot of a league's matches.
///
/// Only finalized matches contribute; pending and live matches are ignored
/// even when they carry a provisional score. The function is pure and
/// order-independent: any permutation of `matches` yields the same table.
/// Participants without a finished match appear with zeroed counters.
pub fn compute_standings(
    matches: &[Match],
    participants: &[ParticipantRef],
    scoring: &ScoringRules,
) -> Vec<StandingsRow> {
    let mut stats: HashMap<Uuid, ParticipantStats> = participants
        .iter()
        .map(|p| (p.user_id, ParticipantStats::default()))
        .collect();

    for fixture in matches {
        let Some((home_score, away_score)) = fixture.final_score() else {
            continue;
        };

        // A side that is no longer a participant is skipped, its opponent still counts.
        if let Some(home) = stats.get_mut(&fixture.home_user_id) {
            apply_result(home, home_score, away_score, scoring);
        }
        if let Some(away) = stats.get_mut(&fixture.away_user_id) {
            apply_result(away, away_score, home_score, scoring);
        }

        if let Some(motm) = fixture.motm_user_id.filter(|id| fixture.involves(*id)) {
            if let Some(entry) = stats.get_mut(&motm) {
                entry.motm_count += 1;
            }
        }
    }

    let rows = participants
        .iter()
        .map(|p| {
            let participant_stats = stats.get(&p.user_id).copied().unwrap_or_default();
            unranked(p.id, p.user_id, &p.team_name, p.logo_url.as_deref(), participant_stats)
        })
        .collect();

    rank(rows)
}

/// Rank participants by the counters already stored on them, e.g. the frozen
/// table of a completed league.
pub fn rank_participants(participants: &[Participant]) -> Vec<StandingsRow> {
    let rows = participants
        .iter()
        .map(|p| unranked(p.id, p.user_id, &p.team_name, p.logo_url.as_deref(), p.stats))
        .collect();
    rank(rows)
}

/// The play-order cursor: lowest `match_order` of a match that is not
/// completed, or one past the last match when everything has been played.
pub fn next_match_order(matches: &[Match]) -> i32 {
    matches
        .iter()
        .filter(|m| !m.is_completed)
        .map(|m| m.match_order)
        .min()
        .unwrap_or_else(|| matches.iter().map(|m| m.match_order).max().unwrap_or(0) + 1)
}

/// Table and cursor for a consistent snapshot of one league.
pub fn derive_table(
    matches: &[Match],
    participants: &[Participant],
    scoring: &ScoringRules,
) -> (Vec<StandingsRow>, i32) {
    let refs: Vec<ParticipantRef> = participants.iter().map(ParticipantRef::from).collect();
    (compute_standings(matches, &refs, scoring), next_match_order(matches))
}

fn apply_result(stats: &mut ParticipantStats, scored: i32, conceded: i32, scoring: &ScoringRules) {
    stats.played += 1;
    stats.goals_for += scored;
    stats.goals_against += conceded;

    match scored.cmp(&conceded) {
        Ordering::Greater => {
            stats.won += 1;
            stats.points += scoring.win_points;
        }
        Ordering::Equal => {
            stats.drawn += 1;
            stats.points += scoring.draw_points;
        }
        Ordering::Less => {
            stats.lost += 1;
            stats.points += scoring.loss_points;
        }
    }
}

fn unranked(
    participant_id: Uuid,
    user_id: Uuid,
    team_name: &str,
    logo_url: Option<&str>,
    stats: ParticipantStats,
) -> StandingsRow {
    StandingsRow {
        position: 0,
        participant_id,
        user_id,
        team_name: team_name.to_string(),
        logo_url: logo_url.map(str::to_string),
        goal_difference: stats.goal_difference(),
        stats,
    }
}

fn rank(mut table: Vec<StandingsRow>) -> Vec<StandingsRow> {
    table.sort_by(compare_rows);
    for (index, row) in table.iter_mut().enumerate() {
        row.position = (index + 1) as u32;
    }
    table
}

/// Points, then goal difference, then goals scored, all descending. Team name
/// and user id settle anything left so the order never depends on input order.
fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.stats
        .points
        .cmp(&a.stats.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.stats.goals_for.cmp(&a.stats.goals_for))
        .then_with(|| a.team_name.cmp(&b.team_name))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixture::MatchStatus;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    struct Table {
        league_id: Uuid,
        players: Vec<ParticipantRef>,
    }

    impl Table {
        fn new(names: &[&str]) -> Self {
            let league_id = Uuid::new_v4();
            let players = names
                .iter()
                .map(|name| ParticipantRef {
                    id: Uuid::new_v4(),
                    league_id,
                    user_id: Uuid::new_v4(),
                    team_name: name.to_string(),
                    logo_url: None,
                })
                .collect();
            Self { league_id, players }
        }

        fn user(&self, index: usize) -> Uuid {
            self.players[index].user_id
        }

        fn fixture(&self, order: i32, home: usize, away: usize) -> Match {
            Match {
                id: Uuid::new_v4(),
                league_id: self.league_id,
                home_user_id: self.user(home),
                away_user_id: self.user(away),
                home_score: None,
                away_score: None,
                is_completed: false,
                status: MatchStatus::Pending,
                round_number: 1,
                match_order: order,
                motm_user_id: None,
                played_at: None,
            }
        }

        fn played(&self, order: i32, home: usize, away: usize, score: (i32, i32), motm: usize) -> Match {
            Match {
                home_score: Some(score.0),
                away_score: Some(score.1),
                is_completed: true,
                status: MatchStatus::Completed,
                motm_user_id: Some(self.user(motm)),
                played_at: Some(Utc::now()),
                ..self.fixture(order, home, away)
            }
        }
    }

    fn row<'a>(rows: &'a [StandingsRow], user_id: Uuid) -> &'a StandingsRow {
        rows.iter().find(|r| r.user_id == user_id).unwrap()
    }

    #[test]
    fn test_home_win_awards_points_goals_and_motm() {
        let table = Table::new(&["A", "B"]);
        let matches = vec![table.played(1, 0, 1, (2, 1), 0)];

        let rows = compute_standings(&matches, &table.players, &ScoringRules::default());

        let a = row(&rows, table.user(0));
        assert_eq!(a.position, 1);
        assert_eq!(a.stats.played, 1);
        assert_eq!(a.stats.won, 1);
        assert_eq!(a.stats.points, 3);
        assert_eq!(a.stats.goals_for, 2);
        assert_eq!(a.stats.goals_against, 1);
        assert_eq!(a.stats.motm_count, 1);
        assert_eq!(a.goal_difference, 1);

        let b = row(&rows, table.user(1));
        assert_eq!(b.position, 2);
        assert_eq!(b.stats.played, 1);
        assert_eq!(b.stats.lost, 1);
        assert_eq!(b.stats.points, 0);
        assert_eq!(b.stats.goals_for, 1);
        assert_eq!(b.stats.goals_against, 2);
        assert_eq!(b.stats.motm_count, 0);
    }

    #[test]
    fn test_draw_and_custom_weights() {
        let table = Table::new(&["A", "B", "C"]);
        let scoring = ScoringRules { win_points: 2, draw_points: 1, loss_points: -1 };
        let matches = vec![
            table.played(1, 0, 1, (1, 1), 1),
            table.played(2, 2, 0, (0, 3), 0),
        ];

        let rows = compute_standings(&matches, &table.players, &scoring);

        let a = row(&rows, table.user(0));
        assert_eq!((a.stats.won, a.stats.drawn, a.stats.lost), (1, 1, 0));
        assert_eq!(a.stats.points, 3);
        let b = row(&rows, table.user(1));
        assert_eq!((b.stats.drawn, b.stats.points, b.stats.motm_count), (1, 1, 1));
        let c = row(&rows, table.user(2));
        assert_eq!((c.stats.lost, c.stats.points, c.goal_difference), (1, -1, -3));
    }

    #[test]
    fn test_live_and_pending_matches_do_not_count() {
        let table = Table::new(&["A", "B"]);
        let mut live = table.fixture(1, 0, 1);
        live.status = MatchStatus::Live;
        live.home_score = Some(4);
        live.away_score = Some(0);
        live.motm_user_id = Some(table.user(0));

        // flagged completed but status never moved: still not a final result
        let mut half_written = table.fixture(2, 1, 0);
        half_written.is_completed = true;
        half_written.home_score = Some(1);
        half_written.away_score = Some(0);

        let rows = compute_standings(&[live, half_written, table.fixture(3, 0, 1)], &table.players, &ScoringRules::default());

        for r in &rows {
            assert_eq!(r.stats, ParticipantStats::default());
        }
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let table = Table::new(&["A", "B", "C", "D"]);
        let mut matches = vec![
            table.played(1, 0, 1, (2, 0), 0),
            table.played(2, 2, 3, (1, 1), 3),
            table.played(3, 0, 2, (0, 1), 2),
            table.played(4, 1, 3, (3, 2), 1),
            table.fixture(5, 0, 3),
            table.played(6, 1, 2, (0, 0), 1),
        ];
        let scoring = ScoringRules::default();
        let expected = compute_standings(&matches, &table.players, &scoring);
        assert_eq!(expected, compute_standings(&matches, &table.players, &scoring));

        let mut rng = StdRng::seed_from_u64(17);
        let mut players = table.players.clone();
        for _ in 0..50 {
            matches.shuffle(&mut rng);
            players.shuffle(&mut rng);
            assert_eq!(compute_standings(&matches, &players, &scoring), expected);
        }
    }

    #[test]
    fn test_goal_difference_breaks_points_tie() {
        let table = Table::new(&["Alpha", "Zeta", "Mid", "Low"]);
        let matches = vec![
            table.played(1, 1, 3, (3, 0), 1),
            table.played(2, 0, 2, (2, 1), 0),
            table.played(3, 2, 3, (0, 0), 2),
        ];
        let scoring = ScoringRules { win_points: 3, draw_points: 0, loss_points: 0 };
        let rows = compute_standings(&matches, &table.players, &scoring);
        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid", "Low"]);
    }

    #[test]
    fn test_goals_scored_breaks_goal_difference_tie() {
        let table = Table::new(&["Able", "Zed", "P", "Q"]);
        let matches = vec![
            table.played(1, 1, 2, (3, 2), 1),
            table.played(2, 0, 3, (1, 0), 0),
        ];
        let rows = compute_standings(&matches, &table.players, &ScoringRules::default());
        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Able", "P", "Q"]);
        assert_eq!(rows[0].goal_difference, rows[1].goal_difference);
    }

    #[test]
    fn test_full_tie_falls_back_to_team_name() {
        let table = Table::new(&["Bravo", "Alpha"]);
        let rows = compute_standings(&[], &table.players, &ScoringRules::default());
        assert_eq!(rows[0].team_name, "Alpha");
        assert_eq!(rows[1].team_name, "Bravo");
        assert_eq!((rows[0].position, rows[1].position), (1, 2));
    }

    #[test]
    fn test_motm_outside_the_match_is_ignored() {
        let table = Table::new(&["A", "B", "C"]);
        let mut fixture = table.played(1, 0, 1, (1, 0), 0);
        fixture.motm_user_id = Some(table.user(2));
        let rows = compute_standings(&[fixture], &table.players, &ScoringRules::default());
        assert!(rows.iter().all(|r| r.stats.motm_count == 0));
    }

    #[test]
    fn test_departed_opponent_still_credits_remaining_side() {
        let table = Table::new(&["A", "B"]);
        let fixture = table.played(1, 0, 1, (0, 2), 1);
        let remaining = vec![table.players[1].clone()];
        let rows = compute_standings(&[fixture], &remaining, &ScoringRules::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stats.won, 1);
        assert_eq!(rows[0].stats.motm_count, 1);
    }

    #[test]
    fn test_next_match_order_cursor() {
        let table = Table::new(&["A", "B", "C"]);
        let mut matches = vec![
            table.played(1, 0, 1, (1, 0), 0),
            table.fixture(2, 1, 2),
            table.fixture(3, 2, 0),
        ];
        assert_eq!(next_match_order(&matches), 2);

        matches[1] = table.played(2, 1, 2, (0, 0), 1);
        matches[2] = table.played(3, 2, 0, (0, 1), 0);
        assert_eq!(next_match_order(&matches), 4);
        assert_eq!(next_match_order(&[]), 1);
    }

    #[test]
    fn test_rank_participants_uses_stored_counters() {
        let league_id = Uuid::new_v4();
        let make = |name: &str, points: i32, goals_for: i32| Participant {
            id: Uuid::new_v4(),
            league_id,
            user_id: Uuid::new_v4(),
            team_name: name.to_string(),
            team_id: None,
            logo_url: None,
            stats: ParticipantStats { points, goals_for, played: 2, ..Default::default() },
            joined_at: Utc::now(),
        };
        let participants = vec![make("A", 1, 0), make("B", 4, 3), make("C", 4, 5)];
        let rows = rank_participants(&participants);
        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }
}
