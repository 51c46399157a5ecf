use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "vote_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl FromStr for VoteType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "Up" => Ok(VoteType::Up),
            "down" | "Down" => Ok(VoteType::Down),
            _ => Err(format!("Unknown VoteType: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdeaVote {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub idea_id: Uuid,
    pub vote_type: VoteType,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// Who is voting. Authenticated callers are matched by `user_id`; anonymous
/// ones by the raw `(ip_address, user_agent)` pair, which is trivially
/// spoofable and only deduplicates casual repeat votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterIdentity {
    pub user_id: Option<Uuid>,
    pub ip_address: String,
    pub user_agent: String,
}

impl VoterIdentity {
    pub fn user(user_id: Uuid, ip_address: &str, user_agent: &str) -> Self {
        Self {
            user_id: Some(user_id),
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn anonymous(ip_address: &str, user_agent: &str) -> Self {
        Self {
            user_id: None,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Whether `vote` was cast by this identity.
    pub fn owns(&self, vote: &IdeaVote) -> bool {
        match self.user_id {
            Some(user_id) => vote.user_id == Some(user_id),
            None => {
                vote.user_id.is_none()
                    && vote.ip_address == self.ip_address
                    && vote.user_agent == self.user_agent
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Added,
    Removed,
    Updated,
}

// Vote request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[validate(required(message = "ideaId is required"))]
    pub idea_id: Option<String>,
    #[validate(required(message = "voteType is required"))]
    pub vote_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VotesQuery {
    #[validate(required(message = "ideaId is required"))]
    pub idea_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub up_votes: i64,
    pub down_votes: i64,
    pub total_votes: i64,
    pub user_vote: Option<VoteType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteResponse {
    pub action: VoteAction,
    pub message: String,
    pub votes: VoteSummary,
}
