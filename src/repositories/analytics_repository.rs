use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{DateRange, FeatureAnalytics, NewFeatureAnalytics},
    repositories::{AnalyticsRepository, range_bounds},
};

#[derive(Clone)]
pub struct PgAnalyticsRepository {
    db: PgPool,
}

impl PgAnalyticsRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn insert(&self, event: NewFeatureAnalytics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feature_analytics (
                id, user_id, feature, action, status, tokens_used, input_tokens,
                output_tokens, metadata, duration_ms, recorded_at, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(&event.feature)
        .bind(&event.action)
        .bind(event.status)
        .bind(event.tokens_used)
        .bind(event.input_tokens)
        .bind(event.output_tokens)
        .bind(&event.metadata)
        .bind(event.duration_ms)
        .bind(chrono::Utc::now())
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list(&self, range: DateRange, user_id: Option<Uuid>) -> Result<Vec<FeatureAnalytics>> {
        let (from, until) = range_bounds(range);

        // NULL parameters disable their filter
        let rows = sqlx::query_as::<_, FeatureAnalytics>(
            r#"
            SELECT * FROM feature_analytics
            WHERE ($1::timestamptz IS NULL OR recorded_at >= $1)
            AND ($2::timestamptz IS NULL OR recorded_at < $2)
            AND ($3::uuid IS NULL OR user_id = $3)
            ORDER BY recorded_at
            "#,
        )
        .bind(from)
        .bind(until)
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
