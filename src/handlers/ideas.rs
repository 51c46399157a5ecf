use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{GetIdeasQuery, IdeaResponse, VoterIdentity},
    services::vote_service,
};

pub async fn get_ideas(
    State(state): State<AppState>,
    Query(params): Query<GetIdeasQuery>,
) -> Result<Json<Value>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(25).clamp(1, 100); // Max 100 per page
    let offset = (page - 1).saturating_mul(limit);

    let ideas = state.ideas.list_recent(limit, offset).await?;
    let total_count = state.ideas.count().await?;

    Ok(Json(json!({
        "ideas": ideas,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total_count,
            "pages": total_count.div_ceil(limit)
        }
    })))
}

pub async fn get_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    identity: VoterIdentity,
) -> Result<Json<IdeaResponse>> {
    let idea = state
        .ideas
        .find_by_id(idea_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Idea not found".to_string()))?;

    let votes =
        vote_service::get_votes(state.ideas.as_ref(), state.votes.as_ref(), idea_id, &identity)
            .await?;

    Ok(Json(IdeaResponse { idea, votes }))
}
