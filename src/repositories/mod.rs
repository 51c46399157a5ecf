//! Storage seams. Services only see these traits; `Pg*` types back them with
//! PostgreSQL and the integration tests swap in in-memory versions.

pub mod analytics_repository;
pub mod generation_repository;
pub mod idea_repository;
pub mod vote_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        DateRange, FeatureAnalytics, GenerationCounter, Idea, IdeaVote, NewFeatureAnalytics,
        VoteType, VoterIdentity,
    },
};

pub use analytics_repository::PgAnalyticsRepository;
pub use generation_repository::PgGenerationCounterRepository;
pub use idea_repository::PgIdeaRepository;
pub use vote_repository::PgVoteRepository;

#[async_trait]
pub trait IdeaRepository: Send + Sync {
    async fn find_by_id(&self, idea_id: Uuid) -> Result<Option<Idea>>;
    async fn list_recent(&self, limit: u32, offset: u32) -> Result<Vec<Idea>>;
    async fn count(&self) -> Result<u32>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// The vote `identity` has on `idea_id`, if any.
    async fn find_for_identity(
        &self,
        idea_id: Uuid,
        identity: &VoterIdentity,
    ) -> Result<Option<IdeaVote>>;
    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<IdeaVote>>;
    async fn insert(&self, vote: &IdeaVote) -> Result<()>;
    async fn update_vote_type(
        &self,
        vote_id: Uuid,
        vote_type: VoteType,
        created_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn delete(&self, vote_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn insert(&self, event: NewFeatureAnalytics) -> Result<()>;
    /// Rows inside `range`, optionally restricted to one user, oldest first.
    async fn list(&self, range: DateRange, user_id: Option<Uuid>) -> Result<Vec<FeatureAnalytics>>;
}

#[async_trait]
pub trait GenerationCounterRepository: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<GenerationCounter>>;
    async fn save(&self, user_id: Uuid, counter: &GenerationCounter) -> Result<()>;
}

/// Converts an inclusive day range into a half-open `[from, until)` instant range.
pub fn range_bounds(range: DateRange) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let from = range
        .start
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    let until = range
        .end
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    (from, until)
}
