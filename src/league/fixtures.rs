use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::league::error::LeagueError;
use crate::models::fixture::{MatchStatus, NewMatch};
use crate::models::league::{LeagueFormat, ParticipantRef};

/// Generate the complete round-robin fixture list for a league.
///
/// Every unordered pair `(i, j)` with `i < j` in `participants` meets once with
/// `i` at home in round 1. A double round-robin adds the reverse leg with `j`
/// at home in round 2. The list is then shuffled uniformly (Fisher-Yates via
/// [`SliceRandom::shuffle`]) and numbered with a dense 1-based `match_order`.
pub fn generate_fixtures<R: Rng + ?Sized>(
    league_id: Uuid,
    participants: &[ParticipantRef],
    format: LeagueFormat,
    rng: &mut R,
) -> Result<Vec<NewMatch>, LeagueError> {
    let participant_count = participants.len();
    if participant_count < 2 {
        tracing::warn!("Cannot generate fixtures with {} participants", participant_count);
        return Err(LeagueError::InsufficientParticipants { found: participant_count });
    }

    let mut seen = HashSet::with_capacity(participant_count);
    for participant in participants {
        if !seen.insert(participant.user_id) {
            return Err(LeagueError::Validation(format!(
                "User {} appears more than once in the participant list",
                participant.user_id
            )));
        }
    }

    let mut matches = Vec::with_capacity(format.fixture_count(participant_count));

    for i in 0..participant_count {
        for j in (i + 1)..participant_count {
            let home = participants[i].user_id;
            let away = participants[j].user_id;

            matches.push(pending_match(league_id, home, away, 1));

            if format == LeagueFormat::Double {
                matches.push(pending_match(league_id, away, home, 2));
            }
        }
    }

    matches.shuffle(rng);
    for (index, fixture) in matches.iter_mut().enumerate() {
        fixture.match_order = (index + 1) as i32;
    }

    tracing::info!(
        "Generated {} {} round-robin fixtures for {} participants in league {}",
        matches.len(),
        format,
        participant_count,
        league_id
    );

    Ok(matches)
}

fn pending_match(league_id: Uuid, home_user_id: Uuid, away_user_id: Uuid, round_number: i32) -> NewMatch {
    NewMatch {
        league_id,
        home_user_id,
        away_user_id,
        status: MatchStatus::Pending,
        is_completed: false,
        round_number,
        // assigned after the shuffle
        match_order: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn participants(n: usize, league_id: Uuid) -> Vec<ParticipantRef> {
        (0..n)
            .map(|i| ParticipantRef {
                id: Uuid::new_v4(),
                league_id,
                user_id: Uuid::new_v4(),
                team_name: format!("Team {}", i),
                logo_url: None,
            })
            .collect()
    }

    fn unordered(m: &NewMatch) -> (Uuid, Uuid) {
        if m.home_user_id < m.away_user_id {
            (m.home_user_id, m.away_user_id)
        } else {
            (m.away_user_id, m.home_user_id)
        }
    }

    #[test]
    fn test_single_round_robin_pairs_everyone_once() {
        let league_id = Uuid::new_v4();
        let mut rng = StdRng::seed_from_u64(7);

        for n in 2..=9 {
            let players = participants(n, league_id);
            let matches = generate_fixtures(league_id, &players, LeagueFormat::Single, &mut rng).unwrap();

            assert_eq!(matches.len(), n * (n - 1) / 2);
            let pairs: HashSet<_> = matches.iter().map(unordered).collect();
            assert_eq!(pairs.len(), matches.len(), "no pair may repeat");
            assert!(matches.iter().all(|m| m.home_user_id != m.away_user_id));
            assert!(matches.iter().all(|m| m.round_number == 1));
            assert!(matches.iter().all(|m| m.league_id == league_id));
            assert!(matches.iter().all(|m| m.status == MatchStatus::Pending && !m.is_completed));
        }
    }

    #[test]
    fn test_double_round_robin_has_both_legs() {
        let league_id = Uuid::new_v4();
        let mut rng = StdRng::seed_from_u64(11);

        for n in 2..=8 {
            let players = participants(n, league_id);
            let matches = generate_fixtures(league_id, &players, LeagueFormat::Double, &mut rng).unwrap();
            assert_eq!(matches.len(), n * (n - 1));

            let mut legs: HashMap<(Uuid, Uuid), Vec<&NewMatch>> = HashMap::new();
            for m in &matches {
                legs.entry(unordered(m)).or_default().push(m);
            }
            assert_eq!(legs.len(), n * (n - 1) / 2);

            for pair in legs.values() {
                assert_eq!(pair.len(), 2);
                let (a, b) = (pair[0], pair[1]);
                assert_eq!(a.home_user_id, b.away_user_id);
                assert_eq!(a.away_user_id, b.home_user_id);
                let mut rounds = vec![a.round_number, b.round_number];
                rounds.sort();
                assert_eq!(rounds, vec![1, 2]);
            }
        }
    }

    #[test]
    fn test_first_leg_home_follows_participant_order() {
        let league_id = Uuid::new_v4();
        let players = participants(4, league_id);
        let mut rng = StdRng::seed_from_u64(3);
        let matches = generate_fixtures(league_id, &players, LeagueFormat::Double, &mut rng).unwrap();

        let index: HashMap<Uuid, usize> = players.iter().enumerate().map(|(i, p)| (p.user_id, i)).collect();
        for m in &matches {
            let home = index[&m.home_user_id];
            let away = index[&m.away_user_id];
            if m.round_number == 1 {
                assert!(home < away);
            } else {
                assert!(home > away);
            }
        }
    }

    #[test]
    fn test_match_order_is_dense_permutation() {
        let league_id = Uuid::new_v4();
        let players = participants(6, league_id);
        let mut rng = StdRng::seed_from_u64(42);

        for format in [LeagueFormat::Single, LeagueFormat::Double] {
            let matches = generate_fixtures(league_id, &players, format, &mut rng).unwrap();
            let mut orders: Vec<i32> = matches.iter().map(|m| m.match_order).collect();
            orders.sort();
            let expected: Vec<i32> = (1..=matches.len() as i32).collect();
            assert_eq!(orders, expected);
        }
    }

    #[test]
    fn test_same_seed_gives_same_order() {
        let league_id = Uuid::new_v4();
        let players = participants(5, league_id);

        let first = generate_fixtures(league_id, &players, LeagueFormat::Double, &mut StdRng::seed_from_u64(99)).unwrap();
        let second = generate_fixtures(league_id, &players, LeagueFormat::Double, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_is_not_biased_towards_generation_order() {
        // With 3 participants (3 matches) every one of the 6 orderings should show up
        // roughly 1/6 of the time.
        let league_id = Uuid::new_v4();
        let players = participants(3, league_id);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts: HashMap<Vec<(Uuid, Uuid)>, usize> = HashMap::new();
        let runs = 6000;

        for _ in 0..runs {
            let mut matches = generate_fixtures(league_id, &players, LeagueFormat::Single, &mut rng).unwrap();
            matches.sort_by_key(|m| m.match_order);
            let ordering = matches.iter().map(|m| (m.home_user_id, m.away_user_id)).collect();
            *counts.entry(ordering).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        for count in counts.values() {
            assert!((800..=1200).contains(count), "ordering seen {} times out of {}", count, runs);
        }
    }

    #[test]
    fn test_fewer_than_two_participants_is_rejected() {
        let league_id = Uuid::new_v4();
        let mut rng = StdRng::seed_from_u64(1);

        for n in 0..2 {
            let players = participants(n, league_id);
            let result = generate_fixtures(league_id, &players, LeagueFormat::Single, &mut rng);
            assert!(matches!(result, Err(LeagueError::InsufficientParticipants { found }) if found == n));
        }
    }

    #[test]
    fn test_duplicate_user_is_rejected() {
        let league_id = Uuid::new_v4();
        let mut players = participants(3, league_id);
        players[2].user_id = players[0].user_id;
        let result = generate_fixtures(league_id, &players, LeagueFormat::Single, &mut StdRng::seed_from_u64(5));
        assert!(matches!(result, Err(LeagueError::Validation(_))));
    }

    #[test]
    fn test_unknown_format_string_is_rejected() {
        let parsed = "knockout".parse::<LeagueFormat>();
        assert!(matches!(parsed, Err(LeagueError::InvalidFormat(f)) if f == "knockout"));
        assert_eq!("double".parse::<LeagueFormat>().unwrap(), LeagueFormat::Double);
    }
}
