use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::GenerationCounter,
    repositories::GenerationCounterRepository,
};

#[derive(Clone)]
pub struct PgGenerationCounterRepository {
    db: PgPool,
}

impl PgGenerationCounterRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GenerationCounterRepository for PgGenerationCounterRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<GenerationCounter>> {
        let counter = sqlx::query_as::<_, GenerationCounter>(
            r#"
            SELECT generation_attempts_count, generation_attempts_reset_time,
                   generation_attempts_is_rate_limited
            FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(counter)
    }

    async fn save(&self, user_id: Uuid, counter: &GenerationCounter) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET generation_attempts_count = $2,
                generation_attempts_reset_time = $3,
                generation_attempts_is_rate_limited = $4
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(counter.count)
        .bind(counter.reset_time)
        .bind(counter.is_rate_limited)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }
}
