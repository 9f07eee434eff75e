//! PostgreSQL implementation of SessionStore.
//!
//! The full aggregate lives in a JSONB column; stage, category and the
//! timestamps are duplicated into columns for maintenance queries. Updates
//! lock the row (`SELECT ... FOR UPDATE`) so concurrent requests for the same
//! session apply in arrival order against the latest record.

use async_trait::async_trait;
use chrono::Duration;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::foundation::SessionId;
use crate::domain::session::{ClientContext, Session, SessionUpdate, Turn};
use crate::ports::{SessionStore, SessionStoreError};

/// PostgreSQL implementation of SessionStore.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    async fn insert(&self, session: &Session) -> Result<(), SessionStoreError> {
        sqlx::query(
            r#"
            INSERT INTO intake_sessions (
                id, stage, category, data, created_at, updated_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.stage().as_str())
        .bind(session.category())
        .bind(Json(session))
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .bind(session.expires_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert session", e))?;
        Ok(())
    }

    /// Locks and loads a live session inside `tx`.
    async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: &SessionId,
    ) -> Result<Option<Session>, SessionStoreError> {
        let row = sqlx::query(
            r#"
            SELECT data FROM intake_sessions
            WHERE id = $1 AND expires_at > now()
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| db_error("lock session", e))?;

        row.map(|row| decode(id, &row)).transpose()
    }

    async fn write(
        tx: &mut Transaction<'_, Postgres>,
        session: &Session,
    ) -> Result<(), SessionStoreError> {
        sqlx::query(
            r#"
            UPDATE intake_sessions SET
                stage = $2,
                category = $3,
                data = $4,
                updated_at = $5,
                expires_at = $6
            WHERE id = $1
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.stage().as_str())
        .bind(session.category())
        .bind(Json(session))
        .bind(session.updated_at().as_datetime())
        .bind(session.expires_at().as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("update session", e))?;
        Ok(())
    }

    /// Runs `mutate` against the locked row and commits the result.
    async fn modify<F>(&self, id: &SessionId, mutate: F) -> Result<Option<Session>, SessionStoreError>
    where
        F: FnOnce(&mut Session) -> Result<(), SessionStoreError> + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let Some(mut session) = Self::lock(&mut tx, id).await? else {
            return Ok(None);
        };
        // Dropping `tx` on a rejected mutation rolls back and releases the lock.
        mutate(&mut session)?;
        Self::write(&mut tx, &session).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit transaction", e))?;
        Ok(Some(session))
    }
}

fn db_error(action: &str, err: sqlx::Error) -> SessionStoreError {
    SessionStoreError::unavailable(format!("failed to {action}: {err}"))
}

fn corrupt(id: &SessionId, message: impl ToString) -> SessionStoreError {
    SessionStoreError::Corrupt {
        id: *id,
        message: message.to_string(),
    }
}

fn decode(id: &SessionId, row: &sqlx::postgres::PgRow) -> Result<Session, SessionStoreError> {
    let Json(data): Json<serde_json::Value> = row.try_get("data").map_err(|e| corrupt(id, e))?;
    session_from_data(id, data)
}

/// Rebuilds the aggregate from the `data` column. A record whose id does not
/// match its row is treated as corrupt.
fn session_from_data(id: &SessionId, data: serde_json::Value) -> Result<Session, SessionStoreError> {
    let session: Session = serde_json::from_value(data).map_err(|e| corrupt(id, e))?;
    if session.id() != id {
        return Err(corrupt(id, format!("record belongs to {}", session.id())));
    }
    Ok(session)
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn create(&self, client: ClientContext) -> Result<Session, SessionStoreError> {
        let session = Session::new(client, self.ttl);
        self.insert(&session).await?;
        Ok(session)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
        let row = sqlx::query(
            r#"
            SELECT data FROM intake_sessions
            WHERE id = $1 AND expires_at > now()
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch session", e))?;

        row.map(|row| decode(id, &row)).transpose()
    }

    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Option<Session>, SessionStoreError> {
        let ttl = self.ttl;
        self.modify(id, move |session| {
            session.apply(update, ttl)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        let result = sqlx::query("DELETE FROM intake_sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_transcript(
        &self,
        id: &SessionId,
        turn: Turn,
    ) -> Result<bool, SessionStoreError> {
        let ttl = self.ttl;
        let updated = self
            .modify(id, move |session| {
                session.append_turn(turn, ttl);
                Ok(())
            })
            .await?;
        Ok(updated.is_some())
    }

    async fn clear_transcript(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        let ttl = self.ttl;
        let updated = self
            .modify(id, move |session| {
                session.clear_transcript(ttl);
                Ok(())
            })
            .await?;
        Ok(updated.is_some())
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM intake_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("purge expired sessions", e))?;
        Ok(result.rows_affected())
    }
}
