use crate::domain::{
    Match, MatchStats, MatchStatus, Player, PointValue, ScoreState, SetScore, Side, Tournament,
};
use crate::error::{HardcourtError, Result};
use crate::persistence::MatchStore;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::{debug, info, instrument};

const MATCH_COLUMNS: &str = r#"
    m.id, m.tournament_id, m.player1_id, m.player2_id, m.status, m.round,
    m.start_time, m.end_time, m.winner_id, m.is_simulated,
    m.sets_p1, m.sets_p2, m.games_p1, m.games_p2, m.points_p1, m.points_p2, m.serving,
    m.stats, m.sets, m.win_prob_p1, m.leverage_index, m.fatigue_p1, m.fatigue_p2,
    p1.name AS p1_name, p1.country_code AS p1_country, p1.rank AS p1_rank, p1.points AS p1_points,
    p2.name AS p2_name, p2.country_code AS p2_country, p2.rank AS p2_rank, p2.points AS p2_points,
    t.name AS t_name, t.surface AS t_surface, t.city AS t_city
"#;

const MATCH_JOINS: &str = r#"
    FROM matches m
    LEFT JOIN players p1 ON m.player1_id = p1.id
    LEFT JOIN players p2 ON m.player2_id = p2.id
    LEFT JOIN tournaments t ON m.tournament_id = t.id
"#;

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn small(value: u8) -> i16 {
    value as i16
}

fn unsmall(row: &PgRow, column: &str) -> Result<u8> {
    let value: i16 = row.try_get(column)?;
    u8::try_from(value)
        .map_err(|_| HardcourtError::Internal(format!("{} out of range: {}", column, value)))
}

fn parse_point(row: &PgRow, column: &str) -> Result<PointValue> {
    let raw: String = row.try_get(column)?;
    PointValue::try_from(raw.as_str()).map_err(HardcourtError::Internal)
}

fn match_from_row(row: &PgRow) -> Result<Match> {
    let status: String = row.try_get("status")?;
    let serving = Side::try_from(unsmall(row, "serving")?).map_err(HardcourtError::Internal)?;
    let stats: Json<MatchStats> = row.try_get("stats")?;
    let sets: Json<Vec<SetScore>> = row.try_get("sets")?;

    let player1_id: String = row.try_get("player1_id")?;
    let player2_id: String = row.try_get("player2_id")?;
    let tournament_id: String = row.try_get("tournament_id")?;

    let player = |id: &str, prefix: &str| -> Result<Option<Player>> {
        let name: Option<String> = row.try_get(format!("{}_name", prefix).as_str())?;
        Ok(match name {
            Some(name) => Some(Player {
                id: id.to_string(),
                name,
                country_code: row
                    .try_get::<Option<String>, _>(format!("{}_country", prefix).as_str())?
                    .unwrap_or_default(),
                rank: row
                    .try_get::<Option<i32>, _>(format!("{}_rank", prefix).as_str())?
                    .unwrap_or_default(),
                points: row
                    .try_get::<Option<i32>, _>(format!("{}_points", prefix).as_str())?
                    .unwrap_or_default(),
            }),
            None => None,
        })
    };

    let tournament = match row.try_get::<Option<String>, _>("t_name")? {
        Some(name) => Some(Tournament {
            id: tournament_id.clone(),
            name,
            surface: row
                .try_get::<Option<String>, _>("t_surface")?
                .unwrap_or_default(),
            city: row.try_get::<Option<String>, _>("t_city")?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Match {
        id: row.try_get("id")?,
        player1: player(&player1_id, "p1")?,
        player2: player(&player2_id, "p2")?,
        tournament,
        tournament_id,
        player1_id,
        player2_id,
        status: MatchStatus::try_from(status.as_str()).map_err(HardcourtError::Internal)?,
        round: row.try_get("round")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        winner_id: row.try_get("winner_id")?,
        is_simulated: row.try_get("is_simulated")?,
        score: ScoreState {
            sets_p1: unsmall(row, "sets_p1")?,
            sets_p2: unsmall(row, "sets_p2")?,
            games_p1: unsmall(row, "games_p1")?,
            games_p2: unsmall(row, "games_p2")?,
            points_p1: parse_point(row, "points_p1")?,
            points_p2: parse_point(row, "points_p2")?,
            serving,
        },
        stats: stats.0,
        sets: sets.0,
        win_probability_p1: row.try_get("win_prob_p1")?,
        leverage_index: row.try_get("leverage_index")?,
        fatigue_p1: row.try_get("fatigue_p1")?,
        fatigue_p2: row.try_get("fatigue_p2")?,
    })
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn upsert_tournament(&self, tournament: &Tournament) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tournaments (id, name, surface, city)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                surface = EXCLUDED.surface,
                city = EXCLUDED.city,
                updated_at = NOW()
            "#,
        )
        .bind(&tournament.id)
        .bind(&tournament.name)
        .bind(&tournament.surface)
        .bind(&tournament.city)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO players (id, name, country_code, rank, points)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                country_code = EXCLUDED.country_code,
                rank = EXCLUDED.rank,
                points = CASE WHEN EXCLUDED.points > 0 THEN EXCLUDED.points ELSE players.points END,
                updated_at = NOW()
            "#,
        )
        .bind(&player.id)
        .bind(&player.name)
        .bind(&player.country_code)
        .bind(player.rank)
        .bind(player.points)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, m), fields(match_id = %m.id))]
    async fn upsert_match(&self, m: &Match) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO matches (
                id, tournament_id, player1_id, player2_id, status, round,
                start_time, end_time, winner_id, is_simulated,
                sets_p1, sets_p2, games_p1, games_p2, points_p1, points_p2, serving,
                stats, sets, win_prob_p1, leverage_index, fatigue_p1, fatigue_p2
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                round = EXCLUDED.round,
                end_time = EXCLUDED.end_time,
                winner_id = EXCLUDED.winner_id,
                sets_p1 = EXCLUDED.sets_p1,
                sets_p2 = EXCLUDED.sets_p2,
                games_p1 = EXCLUDED.games_p1,
                games_p2 = EXCLUDED.games_p2,
                points_p1 = EXCLUDED.points_p1,
                points_p2 = EXCLUDED.points_p2,
                serving = EXCLUDED.serving,
                stats = EXCLUDED.stats,
                sets = EXCLUDED.sets,
                win_prob_p1 = EXCLUDED.win_prob_p1,
                leverage_index = EXCLUDED.leverage_index,
                fatigue_p1 = EXCLUDED.fatigue_p1,
                fatigue_p2 = EXCLUDED.fatigue_p2,
                updated_at = NOW()
            "#,
        )
        .bind(&m.id)
        .bind(&m.tournament_id)
        .bind(&m.player1_id)
        .bind(&m.player2_id)
        .bind(m.status.as_str())
        .bind(&m.round)
        .bind(m.start_time)
        .bind(m.end_time)
        .bind(&m.winner_id)
        .bind(m.is_simulated)
        .bind(small(m.score.sets_p1))
        .bind(small(m.score.sets_p2))
        .bind(small(m.score.games_p1))
        .bind(small(m.score.games_p2))
        .bind(m.score.points_p1.as_str())
        .bind(m.score.points_p2.as_str())
        .bind(small(m.score.serving.as_u8()))
        .bind(Json(&m.stats))
        .bind(Json(&m.sets))
        .bind(m.win_probability_p1)
        .bind(m.leverage_index)
        .bind(m.fatigue_p1)
        .bind(m.fatigue_p2)
        .execute(&self.pool)
        .await?;

        debug!("Upserted match");
        Ok(())
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>> {
        let sql = format!("SELECT {} {} WHERE m.id = $1", MATCH_COLUMNS, MATCH_JOINS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, status: Option<MatchStatus>) -> Result<Vec<Match>> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} {} WHERE m.status = $1 ORDER BY m.start_time DESC",
                    MATCH_COLUMNS, MATCH_JOINS
                );
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} {} ORDER BY m.start_time DESC",
                    MATCH_COLUMNS, MATCH_JOINS
                );
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        rows.iter().map(match_from_row).collect()
    }

    async fn get_player(&self, id: &str) -> Result<Option<Player>> {
        let row = sqlx::query("SELECT id, name, country_code, rank, points FROM players WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Player {
            id: r.get("id"),
            name: r.get("name"),
            country_code: r.get("country_code"),
            rank: r.get("rank"),
            points: r.get("points"),
        }))
    }

    async fn get_tournament(&self, id: &str) -> Result<Option<Tournament>> {
        let row = sqlx::query("SELECT id, name, surface, city FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Tournament {
            id: r.get("id"),
            name: r.get("name"),
            surface: r.get("surface"),
            city: r.get("city"),
        }))
    }

    async fn delete_simulated(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM matches WHERE is_simulated = TRUE")
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("Deleted {} simulated matches", removed);
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
