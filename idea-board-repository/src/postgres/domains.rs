use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idea_board_shared::types::{Domain, DomainId, NewDomain, UserId, Visibility};
use tracing::debug;

use super::{parse_status, visibility_filter};
use crate::{DomainRepository, RepositoryError};

const DOMAIN_COLUMNS: &str = "id, name, user_id, has_verified_dns, last_verified_dns, status, \
     created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
struct DomainRow {
    id: i64,
    name: String,
    user_id: i64,
    has_verified_dns: bool,
    last_verified_dns: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DomainRow> for Domain {
    type Error = RepositoryError;

    fn try_from(row: DomainRow) -> Result<Self, Self::Error> {
        Ok(Domain {
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            has_verified_dns: row.has_verified_dns,
            last_verified_dns: row.last_verified_dns,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// PostgreSQL-backed domain repository.
pub struct PostgresDomainRepository {
    pool: sqlx::PgPool,
}

impl PostgresDomainRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainRepository for PostgresDomainRepository {
    async fn find_by_id(
        &self,
        id: DomainId,
        visibility: Visibility,
    ) -> Result<Option<Domain>, RepositoryError> {
        let sql = format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = $1 AND {}",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, DomainRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Domain::try_from)
            .transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Domain>, RepositoryError> {
        let sql =
            format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = $1 AND status = 'active'");
        sqlx::query_as::<_, DomainRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(Domain::try_from)
            .transpose()
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Domain>, RepositoryError> {
        let sql = format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE {} ORDER BY id",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, DomainRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Domain::try_from)
            .collect()
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Domain>, RepositoryError> {
        let sql = format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE user_id = $1 AND status = 'active' ORDER BY id"
        );
        sqlx::query_as::<_, DomainRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Domain::try_from)
            .collect()
    }

    async fn insert(&self, domain: &NewDomain) -> Result<Domain, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO domains (name, user_id, has_verified_dns, last_verified_dns)
            VALUES ($1, $2, $3, $4)
            RETURNING {DOMAIN_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(&domain.name)
            .bind(domain.user_id)
            .bind(domain.has_verified_dns)
            .bind(domain.last_verified_dns)
            .fetch_one(&self.pool)
            .await?;
        Domain::try_from(row)
    }

    async fn update(&self, domain: &Domain) -> Result<Domain, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE domains SET
                name = $2,
                has_verified_dns = $3,
                last_verified_dns = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING {DOMAIN_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(domain.id)
            .bind(&domain.name)
            .bind(domain.has_verified_dns)
            .bind(domain.last_verified_dns)
            .fetch_one(&self.pool)
            .await?;
        Domain::try_from(row)
    }

    async fn soft_delete(&self, id: DomainId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE domains SET status = 'deleted', deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        debug!(domain_id = id, rows = result.rows_affected(), "Domain soft-deleted");
        Ok(result.rows_affected())
    }
}
