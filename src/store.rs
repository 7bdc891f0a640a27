use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CheckIn, Metric, MetricSample, WeeklySession};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find(&self, week_start: NaiveDate) -> Result<Option<WeeklySession>>;

    /// Fails with `CheckinError::Conflict` when a session for `week_start` already exists.
    async fn create(&self, week_start: NaiveDate) -> Result<WeeklySession>;
}

#[async_trait]
pub trait CheckInStore: Send + Sync {
    async fn exists(&self, user_id: Uuid, session_id: Uuid) -> Result<bool>;

    /// Fails with `CheckinError::Conflict` on a second row for the same user and session.
    async fn create(&self, check_in: CheckIn) -> Result<CheckIn>;

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<CheckIn>>;
}

#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn list_metrics(&self) -> Result<Vec<Metric>>;

    /// Samples ordered by date ascending.
    async fn samples(&self, metric_id: Uuid) -> Result<Vec<MetricSample>>;
}
