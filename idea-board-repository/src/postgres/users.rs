use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idea_board_shared::types::{NewUser, Role, User, UserId, Visibility};
use tracing::debug;

use super::{parse_status, visibility_filter};
use crate::{RepositoryError, UserRepository};

const USER_COLUMNS: &str = "id, username, normalized_username, email, normalized_email, \
     has_verified_email, password_hash, roles, status, created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    normalized_username: String,
    email: String,
    normalized_email: String,
    has_verified_email: bool,
    password_hash: Option<String>,
    roles: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|role| Role::parse(role).ok_or_else(|| RepositoryError::InvalidRole(role.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(User {
            id: row.id,
            username: row.username,
            normalized_username: row.normalized_username,
            email: row.email,
            normalized_email: row.normalized_email,
            has_verified_email: row.has_verified_email,
            password_hash: row.password_hash,
            roles,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_string()).collect()
}

/// PostgreSQL-backed user repository.
pub struct PostgresUserRepository {
    pool: sqlx::PgPool,
}

impl PostgresUserRepository {
    /// Creates a new repository over a pool whose schema has been migrated.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {predicate} = $1 AND status = 'active'"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(
        &self,
        id: UserId,
        visibility: Visibility,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND {}",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_normalized_username(
        &self,
        normalized_username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("normalized_username", normalized_username).await
    }

    async fn find_by_normalized_email(
        &self,
        normalized_email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("normalized_email", normalized_email).await
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} ORDER BY id",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, normalized_username, email, normalized_email, password_hash, roles)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.normalized_username)
            .bind(&user.email)
            .bind(&user.normalized_email)
            .bind(&user.password_hash)
            .bind(role_names(&user.roles))
            .fetch_one(&self.pool)
            .await?;
        User::try_from(row)
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE users SET
                username = $2,
                normalized_username = $3,
                email = $4,
                normalized_email = $5,
                has_verified_email = $6,
                password_hash = $7,
                roles = $8,
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.normalized_username)
            .bind(&user.email)
            .bind(&user.normalized_email)
            .bind(user.has_verified_email)
            .bind(&user.password_hash)
            .bind(role_names(&user.roles))
            .fetch_one(&self.pool)
            .await?;
        User::try_from(row)
    }

    async fn soft_delete(&self, id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET status = 'deleted', deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        debug!(user_id = id, rows = result.rows_affected(), "User soft-deleted");
        Ok(result.rows_affected())
    }
}
