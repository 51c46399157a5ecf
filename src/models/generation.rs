use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// The generation-attempt columns of a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct GenerationCounter {
    #[sqlx(rename = "generation_attempts_count")]
    pub count: i32,
    #[sqlx(rename = "generation_attempts_reset_time")]
    pub reset_time: Option<DateTime<Utc>>,
    #[sqlx(rename = "generation_attempts_is_rate_limited")]
    pub is_rate_limited: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub remaining_attempts: i32,
    pub reset_time: DateTime<Utc>,
    pub is_rate_limited: bool,
}
