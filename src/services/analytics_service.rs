use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        AnalyticsQuery, AnalyticsReport, AnalyticsStatus, DailyTokenUsage, DateRange,
        FeatureAnalytics, FeatureSummary, NewFeatureAnalytics, TokenUsageResponse, UsageSummary,
        UserUsageSummary,
    },
    repositories::AnalyticsRepository,
};

pub const MAX_RANGE_DAYS: i64 = 366;
pub const DEFAULT_TOKEN_USAGE_DAYS: i64 = 30;

/// Records an event without making the caller wait or fail. Telemetry must
/// never block the action that produced it, so errors are only logged.
pub fn track(analytics: Arc<dyn AnalyticsRepository>, event: NewFeatureAnalytics) {
    tokio::spawn(async move {
        let feature = event.feature.clone();
        let action = event.action.clone();
        if let Err(e) = analytics.insert(event).await {
            tracing::warn!(%feature, %action, "Failed to record feature analytics: {}", e);
        }
    });
}

pub fn validate_range(query: &AnalyticsQuery) -> Result<DateRange> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
        if (end - start).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!(
                "Date range cannot exceed {} days",
                MAX_RANGE_DAYS
            )));
        }
    }

    Ok(DateRange {
        start: query.start_date,
        end: query.end_date,
    })
}

/// Token usage defaults to the last 30 days ending `today`; a single given
/// bound is completed from the other.
pub fn token_usage_range(query: &AnalyticsQuery, today: NaiveDate) -> Result<DateRange> {
    let span = Duration::days(DEFAULT_TOKEN_USAGE_DAYS - 1);
    let (start, end) = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start + span),
        (None, Some(end)) => (end - span, end),
        (None, None) => (today - span, today),
    };

    validate_range(&AnalyticsQuery {
        start_date: Some(start),
        end_date: Some(end),
    })
}

pub fn summarize<'a, I>(rows: I) -> UsageSummary
where
    I: IntoIterator<Item = &'a FeatureAnalytics>,
{
    let mut summary = UsageSummary::default();
    let mut duration_total = 0i64;
    let mut duration_samples = 0i64;

    for row in rows {
        summary.total_actions += 1;
        match row.status {
            AnalyticsStatus::Success => summary.successful_actions += 1,
            AnalyticsStatus::Error => summary.failed_actions += 1,
        }
        summary.total_tokens += row.tokens_used;
        summary.input_tokens += row.input_tokens;
        summary.output_tokens += row.output_tokens;
        if let Some(duration) = row.duration_ms {
            duration_total += duration;
            duration_samples += 1;
        }
    }

    if summary.total_actions > 0 {
        let total = summary.total_actions as f64;
        summary.success_rate = round2(summary.successful_actions as f64 / total * 100.0);
        summary.average_tokens = round2(summary.total_tokens as f64 / total);
    }
    if duration_samples > 0 {
        summary.average_duration_ms = round2(duration_total as f64 / duration_samples as f64);
    }

    summary
}

/// Per-feature summaries, busiest first. Every tracked feature is present even
/// without rows.
pub fn summarize_by_feature(
    rows: &[FeatureAnalytics],
    tracked_features: &[String],
) -> Vec<FeatureSummary> {
    let mut grouped: BTreeMap<&str, Vec<&FeatureAnalytics>> = tracked_features
        .iter()
        .map(|feature| (feature.as_str(), Vec::new()))
        .collect();

    for row in rows {
        grouped.entry(row.feature.as_str()).or_default().push(row);
    }

    let mut features: Vec<FeatureSummary> = grouped
        .into_iter()
        .map(|(feature, rows)| FeatureSummary {
            feature: feature.to_string(),
            summary: summarize(rows),
        })
        .collect();

    features.sort_by(|a, b| {
        b.summary
            .total_actions
            .cmp(&a.summary.total_actions)
            .then_with(|| a.feature.cmp(&b.feature))
    });
    features
}

/// Per-user totals, heaviest token users first. Anonymous rows are skipped.
pub fn summarize_by_user(rows: &[FeatureAnalytics]) -> Vec<UserUsageSummary> {
    let mut users: HashMap<Uuid, UserUsageSummary> = HashMap::new();

    for row in rows {
        let Some(user_id) = row.user_id else {
            continue;
        };
        let entry = users.entry(user_id).or_insert(UserUsageSummary {
            user_id,
            total_actions: 0,
            total_tokens: 0,
        });
        entry.total_actions += 1;
        entry.total_tokens += row.tokens_used;
    }

    let mut users: Vec<UserUsageSummary> = users.into_values().collect();
    users.sort_by(|a, b| {
        b.total_tokens
            .cmp(&a.total_tokens)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    users
}

/// Token sums per UTC calendar day. With a closed range every day in it is
/// listed, zero-filled where nothing was recorded.
pub fn daily_token_usage(rows: &[FeatureAnalytics], range: DateRange) -> Vec<DailyTokenUsage> {
    let mut days: BTreeMap<NaiveDate, DailyTokenUsage> = BTreeMap::new();

    if let (Some(start), Some(end)) = (range.start, range.end) {
        for date in start.iter_days().take_while(|d| *d <= end) {
            days.insert(date, empty_day(date));
        }
    }

    for row in rows {
        let date = row.timestamp.date_naive();
        let day = days.entry(date).or_insert_with(|| empty_day(date));
        day.total_tokens += row.tokens_used;
        day.input_tokens += row.input_tokens;
        day.output_tokens += row.output_tokens;
        day.actions += 1;
    }

    days.into_values().collect()
}

pub async fn build_report(
    analytics: &dyn AnalyticsRepository,
    range: DateRange,
    tracked_features: &[String],
) -> Result<AnalyticsReport> {
    let rows = analytics.list(range, None).await?;
    tracing::debug!(rows = rows.len(), "Aggregating feature analytics");

    Ok(AnalyticsReport {
        start_date: range.start,
        end_date: range.end,
        overall: summarize(&rows),
        features: summarize_by_feature(&rows, tracked_features),
        users: summarize_by_user(&rows),
    })
}

pub async fn token_usage_for_user(
    analytics: &dyn AnalyticsRepository,
    user_id: Uuid,
    range: DateRange,
) -> Result<TokenUsageResponse> {
    let rows = analytics.list(range, Some(user_id)).await?;
    let days = daily_token_usage(&rows, range);

    Ok(TokenUsageResponse {
        user_id,
        total_tokens: days.iter().map(|d| d.total_tokens).sum(),
        days,
    })
}

fn empty_day(date: NaiveDate) -> DailyTokenUsage {
    DailyTokenUsage {
        date,
        total_tokens: 0,
        input_tokens: 0,
        output_tokens: 0,
        actions: 0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(feature: &str, status: AnalyticsStatus, tokens: (i64, i64), day: u32) -> FeatureAnalytics {
        NewFeatureAnalytics::new(feature, "generate", status)
            .with_tokens(tokens.0, tokens.1)
            .into_record(
                Uuid::new_v4(),
                Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
            )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    #[test]
    fn empty_input_summarizes_to_zero() {
        let summary = summarize(std::iter::empty());
        assert_eq!(summary, UsageSummary::default());
        assert_eq!(summary.success_rate, 0.0);
        assert!(!summary.average_tokens.is_nan());
    }

    #[test]
    fn summary_counts_outcomes_and_tokens() {
        let mut rows = vec![
            row("idea_generation", AnalyticsStatus::Success, (100, 50), 1),
            row("idea_generation", AnalyticsStatus::Success, (200, 100), 1),
            row("idea_generation", AnalyticsStatus::Error, (0, 0), 2),
        ];
        rows[0].duration_ms = Some(1000);
        rows[1].duration_ms = Some(2000);

        let summary = summarize(&rows);
        assert_eq!(summary.total_actions, 3);
        assert_eq!(summary.successful_actions, 2);
        assert_eq!(summary.failed_actions, 1);
        assert_eq!(summary.success_rate, 66.67);
        assert_eq!(summary.total_tokens, 450);
        assert_eq!(summary.input_tokens, 300);
        assert_eq!(summary.output_tokens, 150);
        assert_eq!(summary.average_tokens, 150.0);
        assert_eq!(summary.average_duration_ms, 1500.0);
    }

    #[test]
    fn tracked_features_without_rows_are_zero_filled() {
        let rows = vec![row("idea_validation", AnalyticsStatus::Success, (10, 10), 3)];
        let tracked = vec!["idea_generation".to_string(), "idea_validation".to_string()];

        let features = summarize_by_feature(&rows, &tracked);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].feature, "idea_validation");
        assert_eq!(features[0].summary.total_actions, 1);
        assert_eq!(features[1].feature, "idea_generation");
        assert_eq!(features[1].summary.total_actions, 0);
        assert_eq!(features[1].summary.success_rate, 0.0);
    }

    #[test]
    fn untracked_features_still_show_up() {
        let rows = vec![row("export_pdf", AnalyticsStatus::Error, (0, 0), 3)];
        let features = summarize_by_feature(&rows, &[]);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].feature, "export_pdf");
        assert_eq!(features[0].summary.failed_actions, 1);
    }

    #[test]
    fn users_are_ranked_by_tokens() {
        let light = Uuid::new_v4();
        let heavy = Uuid::new_v4();
        let rows = vec![
            row("idea_generation", AnalyticsStatus::Success, (5, 5), 1).tap_user(light),
            row("idea_generation", AnalyticsStatus::Success, (500, 0), 1).tap_user(heavy),
            row("idea_generation", AnalyticsStatus::Success, (5, 0), 2).tap_user(light),
            row("idea_generation", AnalyticsStatus::Success, (1, 1), 2),
        ];

        let users = summarize_by_user(&rows);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, heavy);
        assert_eq!(users[0].total_tokens, 500);
        assert_eq!(users[1].user_id, light);
        assert_eq!(users[1].total_actions, 2);
        assert_eq!(users[1].total_tokens, 15);
    }

    #[test]
    fn daily_usage_groups_by_date_and_fills_gaps() {
        let rows = vec![
            row("idea_generation", AnalyticsStatus::Success, (10, 5), 1),
            row("idea_validation", AnalyticsStatus::Success, (20, 0), 1),
            row("idea_generation", AnalyticsStatus::Success, (1, 1), 3),
        ];
        let range = DateRange {
            start: Some(date(1)),
            end: Some(date(4)),
        };

        let days = daily_token_usage(&rows, range);
        assert_eq!(days.len(), 4);
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[0].total_tokens, 35);
        assert_eq!(days[0].actions, 2);
        assert_eq!(days[1].total_tokens, 0);
        assert_eq!(days[2].total_tokens, 2);
        assert_eq!(days[3].date, date(4));
        assert_eq!(days[3].actions, 0);
    }

    #[test]
    fn open_range_lists_only_days_with_data() {
        let rows = vec![row("idea_generation", AnalyticsStatus::Success, (1, 0), 9)];
        let days = daily_token_usage(&rows, DateRange::default());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, date(9));
    }

    #[test]
    fn inverted_or_oversized_ranges_are_rejected() {
        let inverted = AnalyticsQuery {
            start_date: Some(date(5)),
            end_date: Some(date(1)),
        };
        assert!(matches!(validate_range(&inverted), Err(AppError::Validation(_))));

        let oversized = AnalyticsQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        };
        assert!(matches!(validate_range(&oversized), Err(AppError::Validation(_))));
    }

    #[test]
    fn token_usage_defaults_to_last_thirty_days() {
        let today = date(31);
        let range = token_usage_range(
            &AnalyticsQuery {
                start_date: None,
                end_date: None,
            },
            today,
        )
        .unwrap();
        assert_eq!(range.start, Some(date(2)));
        assert_eq!(range.end, Some(today));
    }

    trait TapUser {
        fn tap_user(self, user_id: Uuid) -> Self;
    }

    impl TapUser for FeatureAnalytics {
        fn tap_user(mut self, user_id: Uuid) -> Self {
            self.user_id = Some(user_id);
            self
        }
    }
}
