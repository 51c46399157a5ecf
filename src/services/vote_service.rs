use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{IdeaVote, VoteAction, VoteSummary, VoteType, VoterIdentity},
    repositories::{IdeaRepository, VoteRepository},
};

/// Storage step a cast resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Insert,
    Delete(Uuid),
    Update(Uuid),
}

impl VoteChange {
    pub fn action(self) -> VoteAction {
        match self {
            VoteChange::Insert => VoteAction::Added,
            VoteChange::Delete(_) => VoteAction::Removed,
            VoteChange::Update(_) => VoteAction::Updated,
        }
    }
}

/// Repeating the current vote toggles it off, the other type switches it.
pub fn decide_vote(existing: Option<&IdeaVote>, requested: VoteType) -> VoteChange {
    match existing {
        None => VoteChange::Insert,
        Some(vote) if vote.vote_type == requested => VoteChange::Delete(vote.id),
        Some(vote) => VoteChange::Update(vote.id),
    }
}

pub fn tally_votes(votes: &[IdeaVote], identity: &VoterIdentity) -> VoteSummary {
    let up_votes = votes
        .iter()
        .filter(|v| v.vote_type == VoteType::Up)
        .count() as i64;
    let down_votes = votes
        .iter()
        .filter(|v| v.vote_type == VoteType::Down)
        .count() as i64;

    VoteSummary {
        up_votes,
        down_votes,
        total_votes: up_votes + down_votes,
        user_vote: votes
            .iter()
            .rev()
            .find(|v| identity.owns(v))
            .map(|v| v.vote_type),
    }
}

pub fn parse_idea_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation("ideaId must be a valid UUID".to_string()))
}

pub fn parse_vote_type(raw: &str) -> Result<VoteType> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation("voteType must be 'up' or 'down'".to_string()))
}

async fn ensure_idea_exists(ideas: &dyn IdeaRepository, idea_id: Uuid) -> Result<()> {
    ideas
        .find_by_id(idea_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Idea not found".to_string()))
}

pub async fn cast_vote(
    ideas: &dyn IdeaRepository,
    votes: &dyn VoteRepository,
    idea_id: Uuid,
    identity: &VoterIdentity,
    vote_type: VoteType,
) -> Result<VoteAction> {
    ensure_idea_exists(ideas, idea_id).await?;

    // Read-then-write; concurrent casts from one identity are not serialized.
    let existing = votes.find_for_identity(idea_id, identity).await?;
    let change = decide_vote(existing.as_ref(), vote_type);
    let now = Utc::now();

    match change {
        VoteChange::Insert => {
            let vote = IdeaVote {
                id: Uuid::new_v4(),
                user_id: identity.user_id,
                idea_id,
                vote_type,
                ip_address: identity.ip_address.clone(),
                user_agent: identity.user_agent.clone(),
                created_at: now,
            };
            votes.insert(&vote).await?;
        }
        VoteChange::Delete(vote_id) => votes.delete(vote_id).await?,
        VoteChange::Update(vote_id) => votes.update_vote_type(vote_id, vote_type, now).await?,
    }

    tracing::debug!(
        idea_id = %idea_id,
        authenticated = identity.user_id.is_some(),
        action = ?change.action(),
        "Vote cast"
    );

    Ok(change.action())
}

pub async fn get_votes(
    ideas: &dyn IdeaRepository,
    votes: &dyn VoteRepository,
    idea_id: Uuid,
    identity: &VoterIdentity,
) -> Result<VoteSummary> {
    ensure_idea_exists(ideas, idea_id).await?;

    let rows = votes.list_for_idea(idea_id).await?;
    Ok(tally_votes(&rows, identity))
}
