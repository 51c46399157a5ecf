use axum::{
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
};
use validator::Validate;

use crate::{
    AppState,
    error::Result,
    models::{CastVoteRequest, CastVoteResponse, VoteAction, VoteSummary, VoterIdentity, VotesQuery},
    services::vote_service,
};

pub async fn cast_vote(
    State(state): State<AppState>,
    identity: VoterIdentity,
    payload: std::result::Result<Json<CastVoteRequest>, JsonRejection>,
) -> Result<Json<CastVoteResponse>> {
    let Json(payload) = payload?;
    payload.validate()?;

    let idea_id = vote_service::parse_idea_id(payload.idea_id.as_deref().unwrap_or_default())?;
    let vote_type =
        vote_service::parse_vote_type(payload.vote_type.as_deref().unwrap_or_default())?;

    let action = vote_service::cast_vote(
        state.ideas.as_ref(),
        state.votes.as_ref(),
        idea_id,
        &identity,
        vote_type,
    )
    .await?;

    let votes =
        vote_service::get_votes(state.ideas.as_ref(), state.votes.as_ref(), idea_id, &identity)
            .await?;

    let message = match action {
        VoteAction::Added => "Vote added",
        VoteAction::Removed => "Vote removed",
        VoteAction::Updated => "Vote updated",
    };

    Ok(Json(CastVoteResponse {
        action,
        message: message.to_string(),
        votes,
    }))
}

pub async fn get_votes(
    State(state): State<AppState>,
    identity: VoterIdentity,
    params: std::result::Result<Query<VotesQuery>, QueryRejection>,
) -> Result<Json<VoteSummary>> {
    let Query(params) = params?;
    params.validate()?;

    let idea_id = vote_service::parse_idea_id(params.idea_id.as_deref().unwrap_or_default())?;

    let votes =
        vote_service::get_votes(state.ideas.as_ref(), state.votes.as_ref(), idea_id, &identity)
            .await?;

    Ok(Json(votes))
}

