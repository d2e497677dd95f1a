//! PostgreSQL implementation of the email token repository.
//!
//! Tokens live in the `email_tokens` table keyed by their code. Consuming or
//! expiring a token deletes its row.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idea_board_shared::types::{EmailToken, NewEmailToken};

use crate::{EmailTokenRepository, RepositoryError};

#[derive(sqlx::FromRow)]
struct EmailTokenRow {
    code: String,
    user_id: i64,
    created_at: DateTime<Utc>,
}

impl From<EmailTokenRow> for EmailToken {
    fn from(row: EmailTokenRow) -> Self {
        EmailToken {
            code: row.code,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed email token repository.
pub struct PostgresEmailTokenRepository {
    pool: sqlx::PgPool,
}

impl PostgresEmailTokenRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTokenRepository for PostgresEmailTokenRepository {
    async fn insert(&self, token: &NewEmailToken) -> Result<EmailToken, RepositoryError> {
        let row = sqlx::query_as::<_, EmailTokenRow>(
            "INSERT INTO email_tokens (code, user_id, created_at) VALUES ($1, $2, $3) \
             RETURNING code, user_id, created_at",
        )
        .bind(&token.code)
        .bind(token.user_id)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find(&self, code: &str) -> Result<Option<EmailToken>, RepositoryError> {
        let row = sqlx::query_as::<_, EmailTokenRow>(
            "SELECT code, user_id, created_at FROM email_tokens WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(EmailToken::from))
    }

    async fn delete(&self, code: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM email_tokens WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
