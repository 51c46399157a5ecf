use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{GenerationCounter, RateLimitStatus},
    repositories::GenerationCounterRepository,
};

/// Counter with any elapsed window rolled over. A missing row behaves as a
/// fresh window starting now.
pub fn advance_window(
    counter: Option<GenerationCounter>,
    now: DateTime<Utc>,
    window: Duration,
) -> GenerationCounter {
    let fresh = GenerationCounter {
        count: 0,
        reset_time: Some(now + window),
        is_rate_limited: false,
    };

    match counter {
        Some(c) if c.reset_time.is_some_and(|reset| reset >= now) => c,
        _ => fresh,
    }
}

pub fn rate_limit_status(
    counter: &GenerationCounter,
    limit: i32,
    now: DateTime<Utc>,
    window: Duration,
) -> RateLimitStatus {
    RateLimitStatus {
        remaining_attempts: (limit - counter.count).max(0),
        reset_time: counter.reset_time.unwrap_or(now + window),
        is_rate_limited: counter.count >= limit,
    }
}

pub async fn check_generation_limit(
    counters: &dyn GenerationCounterRepository,
    user_id: Uuid,
    limit: i32,
    window: Duration,
) -> Result<RateLimitStatus> {
    let now = Utc::now();
    let stored = counters.get(user_id).await?;
    let counter = advance_window(stored, now, window);

    // Write back only when the window rolled over on an existing row
    if stored.is_some() && stored != Some(counter) {
        tracing::debug!(user_id = %user_id, "Generation window reset");
        counters.save(user_id, &counter).await?;
    }

    Ok(rate_limit_status(&counter, limit, now, window))
}

/// Records one generation attempt, failing with `RateLimit` once the window is
/// exhausted. Check and increment are not atomic.
pub async fn consume_generation_attempt(
    counters: &dyn GenerationCounterRepository,
    user_id: Uuid,
    limit: i32,
    window: Duration,
) -> Result<RateLimitStatus> {
    let now = Utc::now();
    let mut counter = advance_window(counters.get(user_id).await?, now, window);

    if counter.count >= limit {
        if !counter.is_rate_limited {
            counter.is_rate_limited = true;
            counters.save(user_id, &counter).await?;
        }
        tracing::info!(user_id = %user_id, "Generation rate limit reached");
        return Err(AppError::RateLimit);
    }

    counter.count += 1;
    counter.is_rate_limited = counter.count >= limit;
    counters.save(user_id, &counter).await?;

    Ok(rate_limit_status(&counter, limit, now, window))
}
