#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, header};
use axum_test::{TestRequest, TestServer};
use chrono::{DateTime, Utc};
use intellectra::{
    AppState,
    auth::{Claims, SessionStore},
    config::Config,
    create_app,
    error::{AppError, Result},
    models::{
        DateRange, FeatureAnalytics, GenerationCounter, Idea, IdeaVote, NewFeatureAnalytics,
        VoteType, VoterIdentity,
    },
    repositories::{
        AnalyticsRepository, GenerationCounterRepository, IdeaRepository, VoteRepository,
        range_bounds,
    },
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";

#[derive(Default)]
pub struct MemoryIdeas {
    pub ideas: Mutex<Vec<Idea>>,
}

#[async_trait]
impl IdeaRepository for MemoryIdeas {
    async fn find_by_id(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        Ok(self
            .ideas
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == idea_id)
            .cloned())
    }

    async fn list_recent(&self, limit: u32, offset: u32) -> Result<Vec<Idea>> {
        let mut ideas = self.ideas.lock().unwrap().clone();
        ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ideas
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u32> {
        Ok(self.ideas.lock().unwrap().len() as u32)
    }
}

#[derive(Default)]
pub struct MemoryVotes {
    pub votes: Mutex<Vec<IdeaVote>>,
}

#[async_trait]
impl VoteRepository for MemoryVotes {
    async fn find_for_identity(
        &self,
        idea_id: Uuid,
        identity: &VoterIdentity,
    ) -> Result<Option<IdeaVote>> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.idea_id == idea_id && identity.owns(v))
            .cloned())
    }

    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<IdeaVote>> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, vote: &IdeaVote) -> Result<()> {
        self.votes.lock().unwrap().push(vote.clone());
        Ok(())
    }

    async fn update_vote_type(
        &self,
        vote_id: Uuid,
        vote_type: VoteType,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut votes = self.votes.lock().unwrap();
        if let Some(vote) = votes.iter_mut().find(|v| v.id == vote_id) {
            vote.vote_type = vote_type;
            vote.created_at = created_at;
        }
        Ok(())
    }

    async fn delete(&self, vote_id: Uuid) -> Result<()> {
        self.votes.lock().unwrap().retain(|v| v.id != vote_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAnalytics {
    pub rows: Mutex<Vec<FeatureAnalytics>>,
    pub fail_inserts: bool,
}

impl MemoryAnalytics {
    pub fn push(&self, row: FeatureAnalytics) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalyticsRepository for MemoryAnalytics {
    async fn insert(&self, event: NewFeatureAnalytics) -> Result<()> {
        if self.fail_inserts {
            return Err(AppError::Internal("analytics store unavailable".to_string()));
        }
        self.push(event.into_record(Uuid::new_v4(), Utc::now()));
        Ok(())
    }

    async fn list(&self, range: DateRange, user_id: Option<Uuid>) -> Result<Vec<FeatureAnalytics>> {
        let (from, until) = range_bounds(range);
        let mut rows: Vec<FeatureAnalytics> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| from.is_none_or(|from| r.timestamp >= from))
            .filter(|r| until.is_none_or(|until| r.timestamp < until))
            .filter(|r| user_id.is_none() || r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryCounters {
    pub counters: Mutex<HashMap<Uuid, GenerationCounter>>,
}

impl MemoryCounters {
    pub fn set(&self, user_id: Uuid, counter: GenerationCounter) {
        self.counters.lock().unwrap().insert(user_id, counter);
    }

    pub fn get_now(&self, user_id: Uuid) -> Option<GenerationCounter> {
        self.counters.lock().unwrap().get(&user_id).copied()
    }
}

#[async_trait]
impl GenerationCounterRepository for MemoryCounters {
    async fn get(&self, user_id: Uuid) -> Result<Option<GenerationCounter>> {
        Ok(self.get_now(user_id))
    }

    async fn save(&self, user_id: Uuid, counter: &GenerationCounter) -> Result<()> {
        self.set(user_id, *counter);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessions {
    pub sessions: Mutex<HashMap<String, String>>,
    pub unavailable: AtomicBool,
}

impl MemorySessions {
    /// Makes every later lookup fail as if the store were down.
    pub fn go_down(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn get_session(&self, session_id: &str) -> Result<Option<String>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("session store unavailable".to_string()));
        }
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub ideas: Arc<MemoryIdeas>,
    pub votes: Arc<MemoryVotes>,
    pub analytics: Arc<MemoryAnalytics>,
    pub counters: Arc<MemoryCounters>,
    pub sessions: Arc<MemorySessions>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_analytics(MemoryAnalytics::default())
    }

    pub fn with_analytics(analytics: MemoryAnalytics) -> Self {
        let ideas = Arc::new(MemoryIdeas::default());
        let votes = Arc::new(MemoryVotes::default());
        let analytics = Arc::new(analytics);
        let counters = Arc::new(MemoryCounters::default());
        let sessions = Arc::new(MemorySessions::default());

        let state = AppState {
            ideas: ideas.clone(),
            votes: votes.clone(),
            analytics: analytics.clone(),
            counters: counters.clone(),
            sessions: sessions.clone(),
            config: Arc::new(Config::for_tests(JWT_SECRET)),
        };

        let server = TestServer::new(create_app(state)).unwrap();

        Self {
            server,
            ideas,
            votes,
            analytics,
            counters,
            sessions,
        }
    }

    pub fn add_idea(&self, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.ideas.ideas.lock().unwrap().push(Idea {
            id,
            user_id: None,
            title: title.to_string(),
            description: Some(format!("{} description", title)),
            created_at: Utc::now(),
        });
        id
    }

    /// Opens a session for `user_id` and returns its bearer token.
    pub fn sign_in(&self, user_id: Uuid) -> String {
        let (token, claims) = Claims::new(user_id, JWT_SECRET).unwrap();
        self.sessions
            .sessions
            .lock()
            .unwrap()
            .insert(claims.jti, user_id.to_string());
        token
    }
}

pub fn as_visitor(request: TestRequest, ip: &str, user_agent: &str) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_str(ip).unwrap(),
        )
        .add_header(header::USER_AGENT, HeaderValue::from_str(user_agent).unwrap())
}

pub fn with_token(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}
