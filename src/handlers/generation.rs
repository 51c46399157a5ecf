use axum::{extract::State, http::HeaderMap, response::Json};
use serde_json::json;

use crate::{
    AppState,
    auth::{AuthUser, client_ip, client_user_agent},
    error::Result,
    models::{AnalyticsStatus, NewFeatureAnalytics, RateLimitStatus},
    services::{analytics_service, generation_service},
};

pub async fn get_generation_limit(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<RateLimitStatus>> {
    let status = generation_service::check_generation_limit(
        state.counters.as_ref(),
        auth_user.user_id,
        state.config.generation_limit,
        state.config.generation_window(),
    )
    .await?;

    Ok(Json(status))
}

pub async fn record_generation_attempt(
    State(state): State<AppState>,
    auth_user: AuthUser,
    headers: HeaderMap,
) -> Result<Json<RateLimitStatus>> {
    let status = generation_service::consume_generation_attempt(
        state.counters.as_ref(),
        auth_user.user_id,
        state.config.generation_limit,
        state.config.generation_window(),
    )
    .await?;

    let mut event = NewFeatureAnalytics::new("idea_generation", "attempt", AnalyticsStatus::Success)
        .with_user(auth_user.user_id)
        .with_metadata(json!({
            "remainingAttempts": status.remaining_attempts
        }));
    event.ip_address = Some(client_ip(&headers));
    event.user_agent = Some(client_user_agent(&headers));
    analytics_service::track(state.analytics.clone(), event);

    Ok(Json(status))
}
