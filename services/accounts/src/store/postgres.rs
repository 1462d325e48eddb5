//! PostgreSQL player store
//!
//! Players live in a single `players` table. The session list is a JSONB
//! column so a player is read and written as one document, and `version`
//! guards session writes against lost updates.

use common::error::DatabaseError;
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use tracing::info;
use uuid::Uuid;

use super::{PlayerStore, StoreError, StoreResult};
use crate::models::{NewPlayer, Player, Session};

const PLAYER_COLUMNS: &str =
    "id, username, password_hash, gmail, wins, losses, active_sessions, version, created_at";

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    info!("Running player store migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

#[derive(Clone)]
pub struct PgPlayerStore {
    pool: PgPool,
}

impl PgPlayerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(DatabaseError::Query(e))
}

/// Map a unique-constraint violation to the field it protects
fn insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("players_username_key") => return StoreError::Duplicate("username"),
                Some("players_gmail_key") => return StoreError::Duplicate("gmail"),
                _ => {}
            }
        }
    }
    query_error(e)
}

fn counter(row: &PgRow, column: &str) -> StoreResult<u32> {
    let value: i64 = row.try_get(column).map_err(query_error)?;
    u32::try_from(value).map_err(|_| {
        StoreError::Database(DatabaseError::Corrupt(format!(
            "{} out of range: {}",
            column, value
        )))
    })
}

fn player_from_row(row: &PgRow) -> StoreResult<Player> {
    let Json(active_sessions): Json<Vec<Session>> =
        row.try_get("active_sessions").map_err(query_error)?;

    Ok(Player {
        id: row.try_get("id").map_err(query_error)?,
        username: row.try_get("username").map_err(query_error)?,
        password_hash: row.try_get("password_hash").map_err(query_error)?,
        gmail: row.try_get("gmail").map_err(query_error)?,
        wins: counter(row, "wins")?,
        losses: counter(row, "losses")?,
        active_sessions,
        version: row.try_get("version").map_err(query_error)?,
        created_at: row.try_get("created_at").map_err(query_error)?,
    })
}

impl PlayerStore for PgPlayerStore {
    async fn insert(&self, new_player: NewPlayer) -> StoreResult<Player> {
        info!("Creating new player: {}", new_player.username);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO players (id, username, password_hash, gmail, wins, losses)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_player.username)
        .bind(&new_player.password_hash)
        .bind(&new_player.gmail)
        .bind(i64::from(new_player.wins))
        .bind(i64::from(new_player.losses))
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;

        player_from_row(&row)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Player>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn find_by_gmail(&self, gmail: &str) -> StoreResult<Option<Player>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE gmail = $1"
        ))
        .bind(gmail)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn list_ranked(&self) -> StoreResult<Vec<Player>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players ORDER BY wins DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(player_from_row).collect()
    }

    async fn replace_sessions(
        &self,
        id: Uuid,
        expected_version: i64,
        sessions: &[Session],
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE players
            SET active_sessions = $3, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(Json(sessions))
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        sessions: &[Session],
    ) -> StoreResult<Option<Player>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE players
            SET password_hash = $2, active_sessions = $3, version = version + 1
            WHERE id = $1
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(password_hash)
        .bind(Json(sessions))
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn update_score(
        &self,
        username: &str,
        wins: u32,
        losses: u32,
    ) -> StoreResult<Option<Player>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE players
            SET wins = $2, losses = $3, version = version + 1
            WHERE username = $1
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(i64::from(wins))
        .bind(i64::from(losses))
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(player_from_row).transpose()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(common::database::health_check(&self.pool).await?)
    }
}
