use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idea_board_shared::types::{
    DomainId, Idea, IdeaId, NewVote, RankedIdea, UserId, Visibility, Vote, VoteId, VoteValue,
};
use tracing::debug;

use super::ideas::IdeaRow;
use super::{parse_status, visibility_filter};
use crate::{RepositoryError, VoteRepository};

const VOTE_COLUMNS: &str =
    "id, user_id, idea_id, vote_type, status, created_at, updated_at, deleted_at";

/// Converts a vote value to its `SMALLINT` encoding.
pub(crate) fn vote_type_to_i16(value: VoteValue) -> i16 {
    match value {
        VoteValue::Up => 0,
        VoteValue::Down => 1,
        VoteValue::Removed => 2,
    }
}

/// Converts a stored `SMALLINT` back into a vote value.
pub(crate) fn vote_type_from_i16(value: i16) -> Result<VoteValue, RepositoryError> {
    match value {
        0 => Ok(VoteValue::Up),
        1 => Ok(VoteValue::Down),
        2 => Ok(VoteValue::Removed),
        other => Err(RepositoryError::InvalidVoteType(other)),
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: i64,
    user_id: i64,
    idea_id: i64,
    vote_type: i16,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<VoteRow> for Vote {
    type Error = RepositoryError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Vote {
            id: row.id,
            user_id: row.user_id,
            idea_id: row.idea_id,
            vote_type: vote_type_from_i16(row.vote_type)?,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RankedIdeaRow {
    #[sqlx(flatten)]
    idea: IdeaRow,
    score: i64,
}

impl TryFrom<RankedIdeaRow> for RankedIdea {
    type Error = RepositoryError;

    fn try_from(row: RankedIdeaRow) -> Result<Self, Self::Error> {
        Ok(RankedIdea {
            idea: Idea::try_from(row.idea)?,
            score: row.score,
        })
    }
}

/// PostgreSQL-backed vote repository.
///
/// Vote types are stored as `SMALLINT` (`0` up, `1` down, `2` removed). The
/// partial unique index `votes_user_idea_active_key` rejects a second active
/// vote by the same user on the same idea.
pub struct PostgresVoteRepository {
    pool: sqlx::PgPool,
}

impl PostgresVoteRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all_where(
        &self,
        predicate: &str,
        id: i64,
    ) -> Result<Vec<Vote>, RepositoryError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE {predicate} = $1 AND status = 'active' ORDER BY id"
        );
        sqlx::query_as::<_, VoteRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn find_by_id(
        &self,
        id: VoteId,
        visibility: Visibility,
    ) -> Result<Option<Vote>, RepositoryError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE id = $1 AND {}",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, VoteRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Vote::try_from)
            .transpose()
    }

    async fn find_active(
        &self,
        user_id: UserId,
        idea_id: IdeaId,
    ) -> Result<Option<Vote>, RepositoryError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes \
             WHERE user_id = $1 AND idea_id = $2 AND status = 'active'"
        );
        sqlx::query_as::<_, VoteRow>(&sql)
            .bind(user_id)
            .bind(idea_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Vote::try_from)
            .transpose()
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Vote>, RepositoryError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE {} ORDER BY id",
            visibility_filter(visibility)
        );
        sqlx::query_as::<_, VoteRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Vote>, RepositoryError> {
        self.fetch_all_where("user_id", user_id).await
    }

    async fn list_by_idea(&self, idea_id: IdeaId) -> Result<Vec<Vote>, RepositoryError> {
        self.fetch_all_where("idea_id", idea_id).await
    }

    async fn insert(&self, vote: &NewVote) -> Result<Vote, RepositoryError> {
        let sql = format!(
            "INSERT INTO votes (user_id, idea_id, vote_type) VALUES ($1, $2, $3) \
             RETURNING {VOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VoteRow>(&sql)
            .bind(vote.user_id)
            .bind(vote.idea_id)
            .bind(vote_type_to_i16(vote.vote_type))
            .fetch_one(&self.pool)
            .await?;
        Vote::try_from(row)
    }

    async fn update(&self, vote: &Vote) -> Result<Option<Vote>, RepositoryError> {
        let sql = format!(
            "UPDATE votes SET vote_type = $2, updated_at = now() \
             WHERE id = $1 AND status = 'active' \
             RETURNING {VOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VoteRow>(&sql)
            .bind(vote.id)
            .bind(vote_type_to_i16(vote.vote_type))
            .fetch_optional(&self.pool)
            .await?;
        row.map(Vote::try_from).transpose()
    }

    async fn soft_delete(&self, id: VoteId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE votes SET status = 'deleted', deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        debug!(vote_id = id, rows = result.rows_affected(), "Vote soft-deleted");
        Ok(result.rows_affected())
    }

    async fn rank_ideas_for_domain(
        &self,
        domain_id: DomainId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedIdea>, RepositoryError> {
        let rows = sqlx::query_as::<_, RankedIdeaRow>(
            r#"
            SELECT
                i.id, i.headline, i.description, i.user_id, i.domain_id, i.status,
                i.created_at, i.updated_at, i.deleted_at,
                COALESCE(SUM(
                    CASE v.vote_type WHEN 0 THEN 1 WHEN 1 THEN -1 ELSE 0 END
                ), 0)::BIGINT AS score
            FROM ideas i
            LEFT JOIN votes v ON v.idea_id = i.id AND v.status = 'active'
            WHERE i.domain_id = $1 AND i.status = 'active'
            GROUP BY i.id
            ORDER BY score DESC, i.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(domain_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RankedIdea::try_from).collect()
    }
}
