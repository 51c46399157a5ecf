use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "analytics_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsStatus {
    Success,
    Error,
}

/// One instrumented action. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAnalytics {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub feature: String,
    pub action: String,
    pub status: AnalyticsStatus,
    pub tokens_used: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub metadata: Option<serde_json::Value>,
    pub duration_ms: Option<i64>,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// What call sites hand to the tracker; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewFeatureAnalytics {
    pub user_id: Option<Uuid>,
    pub feature: String,
    pub action: String,
    pub status: AnalyticsStatus,
    pub tokens_used: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub metadata: Option<serde_json::Value>,
    pub duration_ms: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewFeatureAnalytics {
    pub fn new(feature: &str, action: &str, status: AnalyticsStatus) -> Self {
        Self {
            user_id: None,
            feature: feature.to_string(),
            action: action.to_string(),
            status,
            tokens_used: 0,
            input_tokens: 0,
            output_tokens: 0,
            metadata: None,
            duration_ms: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_tokens(mut self, input_tokens: i64, output_tokens: i64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self.tokens_used = input_tokens + output_tokens;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn into_record(self, id: Uuid, timestamp: DateTime<Utc>) -> FeatureAnalytics {
        FeatureAnalytics {
            id,
            user_id: self.user_id,
            feature: self.feature,
            action: self.action,
            status: self.status,
            tokens_used: self.tokens_used,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            metadata: self.metadata,
            duration_ms: self.duration_ms,
            timestamp,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        }
    }
}

/// Inclusive calendar-day range, both ends optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_actions: i64,
    pub successful_actions: i64,
    pub failed_actions: i64,
    pub success_rate: f64,
    pub total_tokens: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub average_tokens: f64,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSummary {
    pub feature: String,
    #[serde(flatten)]
    pub summary: UsageSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserUsageSummary {
    pub user_id: Uuid,
    pub total_actions: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTokenUsage {
    pub date: NaiveDate,
    pub total_tokens: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub actions: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub overall: UsageSummary,
    pub features: Vec<FeatureSummary>,
    pub users: Vec<UserUsageSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageResponse {
    pub user_id: Uuid,
    pub total_tokens: i64,
    pub days: Vec<DailyTokenUsage>,
}
