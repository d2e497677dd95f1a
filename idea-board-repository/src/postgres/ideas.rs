use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idea_board_shared::types::{Idea, IdeaId, NewIdea, Visibility};
use tracing::debug;

use super::{parse_status, visibility_filter};
use crate::{IdeaRepository, RepositoryError};

pub(crate) const IDEA_COLUMNS: &str =
    "id, headline, description, user_id, domain_id, status, created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
pub(crate) struct IdeaRow {
    id: i64,
    headline: String,
    description: Option<String>,
    user_id: i64,
    domain_id: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<IdeaRow> for Idea {
    type Error = RepositoryError;

    fn try_from(row: IdeaRow) -> Result<Self, Self::Error> {
        Ok(Idea {
            id: row.id,
            headline: row.headline,
            description: row.description,
            user_id: row.user_id,
            domain_id: row.domain_id,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// PostgreSQL-backed idea repository.
pub struct PostgresIdeaRepository {
    pool: sqlx::PgPool,
}

impl PostgresIdeaRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdeaRepository for PostgresIdeaRepository {
    async fn find_by_id(
        &self,
        id: IdeaId,
        visibility: Visibility,
    ) -> Result<Option<Idea>, RepositoryError> {
        let sql = format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE id = $1 AND {}",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, IdeaRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Idea::try_from)
            .transpose()
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Idea>, RepositoryError> {
        let sql = format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE {} ORDER BY id",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, IdeaRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Idea::try_from)
            .collect()
    }

    async fn insert(&self, idea: &NewIdea) -> Result<Idea, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO ideas (headline, description, user_id, domain_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {IDEA_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, IdeaRow>(&sql)
            .bind(&idea.headline)
            .bind(&idea.description)
            .bind(idea.user_id)
            .bind(idea.domain_id)
            .fetch_one(&self.pool)
            .await?;
        Idea::try_from(row)
    }

    async fn update(&self, idea: &Idea) -> Result<Idea, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE ideas SET
                headline = $2,
                description = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING {IDEA_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, IdeaRow>(&sql)
            .bind(idea.id)
            .bind(&idea.headline)
            .bind(&idea.description)
            .fetch_one(&self.pool)
            .await?;
        Idea::try_from(row)
    }

    async fn soft_delete(&self, id: IdeaId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE ideas SET status = 'deleted', deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        debug!(idea_id = id, rows = result.rows_affected(), "Idea soft-deleted");
        Ok(result.rows_affected())
    }
}
