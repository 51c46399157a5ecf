use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use chrono::Utc;

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{AnalyticsQuery, AnalyticsReport, TokenUsageResponse},
    services::analytics_service,
};

pub async fn get_token_usage(
    State(state): State<AppState>,
    auth_user: AuthUser,
    params: std::result::Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<TokenUsageResponse>> {
    let Query(params) = params?;
    let range = analytics_service::token_usage_range(&params, Utc::now().date_naive())?;

    let usage =
        analytics_service::token_usage_for_user(state.analytics.as_ref(), auth_user.user_id, range)
            .await?;

    Ok(Json(usage))
}

// Admin authorization is enforced upstream; here a session is enough.
pub async fn get_analytics_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    params: std::result::Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsReport>> {
    let Query(params) = params?;
    let range = analytics_service::validate_range(&params)?;

    tracing::info!(user_id = %auth_user.user_id, ?range, "Building analytics report");

    let report = analytics_service::build_report(
        state.analytics.as_ref(),
        range,
        &state.config.tracked_features,
    )
    .await?;

    Ok(Json(report))
}
