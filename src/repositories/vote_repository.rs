use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{IdeaVote, VoteType, VoterIdentity},
    repositories::VoteRepository,
};

#[derive(Clone)]
pub struct PgVoteRepository {
    db: PgPool,
}

impl PgVoteRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VoteRepository for PgVoteRepository {
    async fn find_for_identity(
        &self,
        idea_id: Uuid,
        identity: &VoterIdentity,
    ) -> Result<Option<IdeaVote>> {
        let vote = if let Some(user_id) = identity.user_id {
            sqlx::query_as::<_, IdeaVote>(
                r#"
                SELECT * FROM idea_votes
                WHERE idea_id = $1 AND user_id = $2
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(idea_id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, IdeaVote>(
                r#"
                SELECT * FROM idea_votes
                WHERE idea_id = $1 AND user_id IS NULL
                AND ip_address = $2 AND user_agent = $3
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(idea_id)
            .bind(&identity.ip_address)
            .bind(&identity.user_agent)
            .fetch_optional(&self.db)
            .await?
        };

        Ok(vote)
    }

    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<IdeaVote>> {
        let votes = sqlx::query_as::<_, IdeaVote>(
            "SELECT * FROM idea_votes WHERE idea_id = $1 ORDER BY created_at",
        )
        .bind(idea_id)
        .fetch_all(&self.db)
        .await?;

        Ok(votes)
    }

    async fn insert(&self, vote: &IdeaVote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO idea_votes (id, user_id, idea_id, vote_type, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(vote.id)
        .bind(vote.user_id)
        .bind(vote.idea_id)
        .bind(vote.vote_type)
        .bind(&vote.ip_address)
        .bind(&vote.user_agent)
        .bind(vote.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_vote_type(
        &self,
        vote_id: Uuid,
        vote_type: VoteType,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE idea_votes SET vote_type = $2, created_at = $3 WHERE id = $1")
            .bind(vote_id)
            .bind(vote_type)
            .bind(created_at)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn delete(&self, vote_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM idea_votes WHERE id = $1")
            .bind(vote_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
