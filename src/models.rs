use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// The tracking week, keyed by the Tuesday it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySession {
    pub id: Uuid,
    pub week_start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub overall_rating: i32,
    pub wins: String,
    pub struggles: String,
    pub next_week_focus: String,
    pub priority_metrics: Vec<String>,
    pub flagged_metrics: Vec<String>,
}

/// What a family member fills in; the session and ids are assigned on submit.
#[derive(Debug, Clone, Default)]
pub struct NewCheckIn {
    pub overall_rating: i32,
    pub wins: String,
    pub struggles: String,
    pub next_week_focus: String,
    pub priority_metrics: Vec<String>,
    pub flagged_metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub id: Uuid,
    pub goal_title: String,
    pub name: String,
    pub unit: String,
    pub target_value: f64,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaceStatus {
    Ahead,
    OnTrack,
    Behind,
}

impl PaceStatus {
    pub fn label(self) -> &'static str {
        match self {
            PaceStatus::Ahead => "ahead",
            PaceStatus::OnTrack => "on-track",
            PaceStatus::Behind => "behind",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaceResult {
    pub status: PaceStatus,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct MetricPace {
    pub metric: Metric,
    pub current: Option<f64>,
    pub pace: Option<PaceResult>,
}
