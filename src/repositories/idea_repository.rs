use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::Idea,
    repositories::IdeaRepository,
};

#[derive(Clone)]
pub struct PgIdeaRepository {
    db: PgPool,
}

impl PgIdeaRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdeaRepository for PgIdeaRepository {
    async fn find_by_id(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        let idea = sqlx::query_as::<_, Idea>(
            "SELECT id, user_id, title, description, created_at FROM ideas WHERE id = $1",
        )
        .bind(idea_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(idea)
    }

    async fn list_recent(&self, limit: u32, offset: u32) -> Result<Vec<Idea>> {
        let ideas = sqlx::query_as::<_, Idea>(
            r#"
            SELECT id, user_id, title, description, created_at
            FROM ideas
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(ideas)
    }

    async fn count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM ideas")
            .fetch_one(&self.db)
            .await?;

        idea_total(row.get::<i64, _>("count"))
    }
}

fn idea_total(count: i64) -> Result<u32> {
    u32::try_from(count).map_err(|_| AppError::Internal(format!("Idea count out of range: {}", count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idea_total_rejects_counts_outside_u32() {
        assert_eq!(idea_total(42).unwrap(), 42);
        assert!(matches!(
            idea_total(i64::from(u32::MAX) + 1),
            Err(AppError::Internal(_))
        ));
    }
}
