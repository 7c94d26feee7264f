use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::league::standings::derive_table;
use crate::models::fixture::{Match, MatchStatus, MatchUpdate, NewMatch};
use crate::models::league::{
    League, LeagueFormat, LeagueStatus, NewLeague, NewParticipant, OfficialTeam, Participant, ParticipantStats,
    ScoringRules,
};
use crate::models::standings::StandingsRow;
use crate::store::{LeagueStore, StoreError, StoreFuture};

const LEAGUE_COLUMNS: &str = "id, admin_id, name, format, win_points, draw_points, loss_points, \
     invite_code, status, current_match_order, created_at";

// `p` is league_participants, `t` the official team it plays as
const PARTICIPANT_COLUMNS: &str = "p.id, p.league_id, p.user_id, p.team_name, p.team_id, t.logo_url, \
     p.points, p.played, p.won, p.drawn, p.lost, p.goals_for, p.goals_against, p.motm_count, p.joined_at";

const MATCH_COLUMNS: &str = "id, league_id, home_user_id, away_user_id, home_score, away_score, \
     is_completed, status, round_number, match_order, motm_user_id, played_at";

#[derive(sqlx::FromRow)]
struct LeagueRow {
    id: Uuid,
    admin_id: Uuid,
    name: String,
    format: String,
    win_points: i32,
    draw_points: i32,
    loss_points: i32,
    invite_code: String,
    status: String,
    current_match_order: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeagueRow> for League {
    type Error = StoreError;

    fn try_from(row: LeagueRow) -> Result<Self, Self::Error> {
        let format = row
            .format
            .parse::<LeagueFormat>()
            .map_err(|e| StoreError::Corrupt(format!("league {}: {}", row.id, e)))?;
        let status = row
            .status
            .parse::<LeagueStatus>()
            .map_err(|e| StoreError::Corrupt(format!("league {}: {}", row.id, e)))?;

        Ok(League {
            id: row.id,
            admin_id: row.admin_id,
            name: row.name,
            format,
            scoring: ScoringRules {
                win_points: row.win_points,
                draw_points: row.draw_points,
                loss_points: row.loss_points,
            },
            invite_code: row.invite_code,
            status,
            current_match_order: row.current_match_order,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    id: Uuid,
    league_id: Uuid,
    user_id: Uuid,
    team_name: String,
    team_id: Option<Uuid>,
    logo_url: Option<String>,
    points: i32,
    played: i32,
    won: i32,
    drawn: i32,
    lost: i32,
    goals_for: i32,
    goals_against: i32,
    motm_count: i32,
    joined_at: DateTime<Utc>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Participant {
            id: row.id,
            league_id: row.league_id,
            user_id: row.user_id,
            team_name: row.team_name,
            team_id: row.team_id,
            logo_url: row.logo_url,
            stats: ParticipantStats {
                points: row.points,
                played: row.played,
                won: row.won,
                drawn: row.drawn,
                lost: row.lost,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                motm_count: row.motm_count,
            },
            joined_at: row.joined_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MatchRow {
    id: Uuid,
    league_id: Uuid,
    home_user_id: Uuid,
    away_user_id: Uuid,
    home_score: Option<i32>,
    away_score: Option<i32>,
    is_completed: bool,
    status: String,
    round_number: i32,
    match_order: i32,
    motm_user_id: Option<Uuid>,
    played_at: Option<DateTime<Utc>>,
}

impl TryFrom<MatchRow> for Match {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<MatchStatus>()
            .map_err(|e| StoreError::Corrupt(format!("match {}: {}", row.id, e)))?;

        Ok(Match {
            id: row.id,
            league_id: row.league_id,
            home_user_id: row.home_user_id,
            away_user_id: row.away_user_id,
            home_score: row.home_score,
            away_score: row.away_score,
            is_completed: row.is_completed,
            status,
            round_number: row.round_number,
            match_order: row.match_order,
            motm_user_id: row.motm_user_id,
            played_at: row.played_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    logo_url: Option<String>,
}

impl From<TeamRow> for OfficialTeam {
    fn from(row: TeamRow) -> Self {
        OfficialTeam {
            id: row.id,
            name: row.name,
            logo_url: row.logo_url,
        }
    }
}

fn into_leagues(rows: Vec<LeagueRow>) -> Result<Vec<League>, StoreError> {
    rows.into_iter().map(League::try_from).collect()
}

fn into_matches(rows: Vec<MatchRow>) -> Result<Vec<Match>, StoreError> {
    rows.into_iter().map(Match::try_from).collect()
}

/// `LeagueStore` on Postgres. Multi-row writes run inside one transaction
/// and lock the league row first, so they serialise against each other.
#[derive(Debug, Clone)]
pub struct PgLeagueStore {
    pool: PgPool,
}

impl PgLeagueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write participant counters inside an open transaction.
    async fn write_stats(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        league_id: Uuid,
        standings: &[StandingsRow],
    ) -> Result<(), StoreError> {
        for row in standings {
            sqlx::query(
                r#"
                UPDATE league_participants
                SET points = $3, played = $4, won = $5, drawn = $6, lost = $7,
                    goals_for = $8, goals_against = $9, motm_count = $10
                WHERE league_id = $1 AND user_id = $2
                "#,
            )
            .bind(league_id)
            .bind(row.user_id)
            .bind(row.stats.points)
            .bind(row.stats.played)
            .bind(row.stats.won)
            .bind(row.stats.drawn)
            .bind(row.stats.lost)
            .bind(row.stats.goals_for)
            .bind(row.stats.goals_against)
            .bind(row.stats.motm_count)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Lock the league row for the rest of the transaction.
    async fn lock_league(tx: &mut sqlx::Transaction<'_, Postgres>, league_id: Uuid) -> Result<Option<League>, StoreError> {
        let row: Option<LeagueRow> =
            sqlx::query_as(&format!("SELECT {} FROM leagues WHERE id = $1 FOR UPDATE", LEAGUE_COLUMNS))
                .bind(league_id)
                .fetch_optional(&mut **tx)
                .await?;
        row.map(League::try_from).transpose()
    }

    /// Recompute and write the counters of a locked league. Returns the cursor.
    async fn refresh_stats(tx: &mut sqlx::Transaction<'_, Postgres>, league: &League) -> Result<i32, StoreError> {
        let participants = fetch_participants(&mut **tx, league.id).await?;
        let matches = fetch_matches(&mut **tx, league.id).await?;
        let (table, cursor) = derive_table(&matches, &participants, &league.scoring);
        Self::write_stats(tx, league.id, &table).await?;
        Ok(cursor)
    }

    async fn insert_participant(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        participant: &NewParticipant,
    ) -> Result<Participant, StoreError> {
        let row: ParticipantRow = sqlx::query_as(&format!(
            r#"
            WITH p AS (
                INSERT INTO league_participants (id, league_id, user_id, team_name, team_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {}
            FROM p LEFT JOIN official_teams t ON t.id = p.team_id
            "#,
            PARTICIPANT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(participant.league_id)
        .bind(participant.user_id)
        .bind(&participant.team_name)
        .bind(participant.team_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(Participant::from(row))
    }

    async fn lock_league_status(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        league_id: Uuid,
    ) -> Result<Option<LeagueStatus>, StoreError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM leagues WHERE id = $1 FOR UPDATE")
            .bind(league_id)
            .fetch_optional(&mut **tx)
            .await?;

        status
            .map(|s| s.parse::<LeagueStatus>().map_err(StoreError::Corrupt))
            .transpose()
    }
}

impl LeagueStore for PgLeagueStore {
    fn create_league(&self, league: NewLeague, admin: NewParticipant) -> StoreFuture<'_, (League, Participant)> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            let row: LeagueRow = sqlx::query_as(&format!(
                r#"
                INSERT INTO leagues (id, admin_id, name, format, win_points, draw_points, loss_points, invite_code, status, current_match_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'lobby', 0)
                RETURNING {}
                "#,
                LEAGUE_COLUMNS
            ))
            .bind(league.id)
            .bind(league.admin_id)
            .bind(&league.name)
            .bind(league.format.as_str())
            .bind(league.scoring.win_points)
            .bind(league.scoring.draw_points)
            .bind(league.scoring.loss_points)
            .bind(&league.invite_code)
            .fetch_one(&mut *tx)
            .await?;

            let admin = Self::insert_participant(&mut tx, &admin).await?;

            tx.commit().await?;
            Ok((League::try_from(row)?, admin))
        })
    }

    fn get_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let row: Option<LeagueRow> = sqlx::query_as(&format!("SELECT {} FROM leagues WHERE id = $1", LEAGUE_COLUMNS))
                .bind(league_id)
                .fetch_optional(&self.pool)
                .await?;
            row.map(League::try_from).transpose()
        })
    }

    fn find_league_by_invite_code(&self, invite_code: String) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let row: Option<LeagueRow> =
                sqlx::query_as(&format!("SELECT {} FROM leagues WHERE invite_code = $1", LEAGUE_COLUMNS))
                    .bind(&invite_code)
                    .fetch_optional(&self.pool)
                    .await?;
            row.map(League::try_from).transpose()
        })
    }

    fn list_leagues_for_user(&self, user_id: Uuid, status: Option<LeagueStatus>) -> StoreFuture<'_, Vec<League>> {
        Box::pin(async move {
            let rows: Vec<LeagueRow> = sqlx::query_as(&format!(
                r#"
                SELECT {}
                FROM leagues l
                WHERE EXISTS (
                    SELECT 1 FROM league_participants p WHERE p.league_id = l.id AND p.user_id = $1
                )
                AND ($2::text IS NULL OR l.status = $2)
                ORDER BY l.created_at DESC, l.id
                "#,
                LEAGUE_COLUMNS
            ))
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
            into_leagues(rows)
        })
    }

    fn delete_league(&self, league_id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            // participants and matches go with it through ON DELETE CASCADE
            let result = sqlx::query("DELETE FROM leagues WHERE id = $1")
                .bind(league_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn complete_league(&self, league_id: Uuid) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            let league = match Self::lock_league(&mut tx, league_id).await? {
                Some(league) if league.status == LeagueStatus::Active => league,
                _ => {
                    tx.rollback().await?;
                    return Ok(None);
                }
            };

            let cursor = Self::refresh_stats(&mut tx, &league).await?;

            let row: LeagueRow = sqlx::query_as(&format!(
                "UPDATE leagues SET status = 'completed', current_match_order = $2 WHERE id = $1 RETURNING {}",
                LEAGUE_COLUMNS
            ))
            .bind(league_id)
            .bind(cursor)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            League::try_from(row).map(Some)
        })
    }

    fn list_participants(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Participant>> {
        Box::pin(async move { fetch_participants(&self.pool, league_id).await })
    }

    fn add_participant(&self, participant: NewParticipant) -> StoreFuture<'_, Option<Participant>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            if Self::lock_league_status(&mut tx, participant.league_id).await? != Some(LeagueStatus::Lobby) {
                tx.rollback().await?;
                return Ok(None);
            }

            // the UNIQUE (league_id, user_id) constraint turns a second join into Conflict
            let created = Self::insert_participant(&mut tx, &participant).await?;

            tx.commit().await?;
            Ok(Some(created))
        })
    }

    fn remove_participant(&self, league_id: Uuid, user_id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                DELETE FROM league_participants p
                USING leagues l
                WHERE p.league_id = l.id AND l.id = $1 AND l.status = 'lobby' AND p.user_id = $2
                "#,
            )
            .bind(league_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn activate_league(&self, league_id: Uuid, matches: Vec<NewMatch>) -> StoreFuture<'_, Option<League>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            // A concurrent start blocks here until the first one commits, then
            // sees 'active' and backs off without writing.
            if Self::lock_league_status(&mut tx, league_id).await? != Some(LeagueStatus::Lobby) {
                tx.rollback().await?;
                return Ok(None);
            }

            if !matches.is_empty() {
                let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                    "INSERT INTO matches (id, league_id, home_user_id, away_user_id, status, is_completed, round_number, match_order) ",
                );
                builder.push_values(matches.iter(), |mut b, fixture| {
                    b.push_bind(Uuid::new_v4())
                        .push_bind(fixture.league_id)
                        .push_bind(fixture.home_user_id)
                        .push_bind(fixture.away_user_id)
                        .push_bind(fixture.status.as_str())
                        .push_bind(fixture.is_completed)
                        .push_bind(fixture.round_number)
                        .push_bind(fixture.match_order);
                });
                builder.build().execute(&mut *tx).await?;
            }

            let row: LeagueRow = sqlx::query_as(&format!(
                "UPDATE leagues SET status = 'active', current_match_order = 1 WHERE id = $1 RETURNING {}",
                LEAGUE_COLUMNS
            ))
            .bind(league_id)
            .fetch_one(&mut *tx)
            .await?;

            // Dropping the transaction on any error above rolls it back.
            tx.commit().await?;
            League::try_from(row).map(Some)
        })
    }

    fn list_matches(&self, league_id: Uuid) -> StoreFuture<'_, Vec<Match>> {
        Box::pin(async move { fetch_matches(&self.pool, league_id).await })
    }

    fn get_match(&self, match_id: Uuid) -> StoreFuture<'_, Option<Match>> {
        Box::pin(async move {
            let row: Option<MatchRow> = sqlx::query_as(&format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS))
                .bind(match_id)
                .fetch_optional(&self.pool)
                .await?;
            row.map(Match::try_from).transpose()
        })
    }

    fn update_match(&self, match_id: Uuid, expected: MatchStatus, update: MatchUpdate) -> StoreFuture<'_, Option<Match>> {
        Box::pin(async move {
            let row: Option<MatchRow> = sqlx::query_as(&format!(
                r#"
                UPDATE matches
                SET home_score = $3, away_score = $4, is_completed = $5, status = $6,
                    motm_user_id = $7, played_at = $8
                WHERE id = $1 AND status = $2
                RETURNING {}
                "#,
                MATCH_COLUMNS
            ))
            .bind(match_id)
            .bind(expected.as_str())
            .bind(update.home_score)
            .bind(update.away_score)
            .bind(update.is_completed)
            .bind(update.status.as_str())
            .bind(update.motm_user_id)
            .bind(update.played_at)
            .fetch_optional(&self.pool)
            .await?;
            row.map(Match::try_from).transpose()
        })
    }

    fn sync_standings(&self, league_id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            // Syncs of one league queue up on this lock. Each one reads the
            // matches only once it holds it, so the last writer saw every
            // match update committed before it started.
            let league = match Self::lock_league(&mut tx, league_id).await? {
                Some(league) if league.status == LeagueStatus::Active => league,
                _ => {
                    tx.rollback().await?;
                    return Ok(false);
                }
            };

            let cursor = Self::refresh_stats(&mut tx, &league).await?;

            sqlx::query("UPDATE leagues SET current_match_order = $2 WHERE id = $1")
                .bind(league_id)
                .bind(cursor)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(true)
        })
    }

    fn list_completed_matches_for_user(&self, user_id: Uuid) -> StoreFuture<'_, Vec<Match>> {
        Box::pin(async move {
            let rows: Vec<MatchRow> = sqlx::query_as(&format!(
                r#"
                SELECT {}
                FROM matches
                WHERE (home_user_id = $1 OR away_user_id = $1)
                  AND is_completed = TRUE AND status = 'completed'
                ORDER BY played_at, id
                "#,
                MATCH_COLUMNS
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            into_matches(rows)
        })
    }

    fn get_career_reset(&self, user_id: Uuid) -> StoreFuture<'_, Option<DateTime<Utc>>> {
        Box::pin(async move {
            let reset_at: Option<DateTime<Utc>> = sqlx::query_scalar("SELECT reset_at FROM user_career_resets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(reset_at)
        })
    }

    fn set_career_reset(&self, user_id: Uuid, reset_at: DateTime<Utc>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r#"
                INSERT INTO user_career_resets (user_id, reset_at)
                VALUES ($1, $2)
                ON CONFLICT (user_id) DO UPDATE SET reset_at = EXCLUDED.reset_at
                "#,
            )
            .bind(user_id)
            .bind(reset_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn search_official_teams(&self, search: String, limit: i64) -> StoreFuture<'_, Vec<OfficialTeam>> {
        Box::pin(async move {
            let rows: Vec<TeamRow> = sqlx::query_as(
                r#"
                SELECT id, name, logo_url
                FROM official_teams
                WHERE name ILIKE '%' || $1 || '%' ESCAPE '\'
                ORDER BY name, id
                LIMIT $2
                "#,
            )
            .bind(escape_like(&search))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(OfficialTeam::from).collect())
        })
    }

    fn get_official_team(&self, team_id: Uuid) -> StoreFuture<'_, Option<OfficialTeam>> {
        Box::pin(async move {
            let row: Option<TeamRow> = sqlx::query_as("SELECT id, name, logo_url FROM official_teams WHERE id = $1")
                .bind(team_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row.map(OfficialTeam::from))
        })
    }
}

async fn fetch_participants<'e, E: PgExecutor<'e>>(executor: E, league_id: Uuid) -> Result<Vec<Participant>, StoreError> {
    let rows: Vec<ParticipantRow> = sqlx::query_as(&format!(
        r#"
        SELECT {}
        FROM league_participants p LEFT JOIN official_teams t ON t.id = p.team_id
        WHERE p.league_id = $1
        ORDER BY p.joined_at, p.id
        "#,
        PARTICIPANT_COLUMNS
    ))
    .bind(league_id)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(Participant::from).collect())
}

async fn fetch_matches<'e, E: PgExecutor<'e>>(executor: E, league_id: Uuid) -> Result<Vec<Match>, StoreError> {
    let rows: Vec<MatchRow> = sqlx::query_as(&format!(
        "SELECT {} FROM matches WHERE league_id = $1 ORDER BY match_order",
        MATCH_COLUMNS
    ))
    .bind(league_id)
    .fetch_all(executor)
    .await?;
    into_matches(rows)
}

/// Make `%`, `_` and `\` in a search term match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
