use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{CheckinError, Result};
use crate::models::{CheckIn, Metric, MetricSample, WeeklySession};
use crate::store::{CheckInStore, MetricStore, SessionStore};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed store. The uniqueness constraints in the schema are what
/// turn concurrent duplicate inserts into `CheckinError::Conflict`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> WeeklySession {
    WeeklySession {
        id: row.get("id"),
        week_start_date: row.get("week_start_date"),
    }
}

fn check_in_from_row(row: &PgRow) -> CheckIn {
    CheckIn {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        overall_rating: row.get("overall_rating"),
        wins: row.get("wins"),
        struggles: row.get("struggles"),
        next_week_focus: row.get("next_week_focus"),
        priority_metrics: row.get("priority_metrics"),
        flagged_metrics: row.get("flagged_metrics"),
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find(&self, week_start: NaiveDate) -> Result<Option<WeeklySession>> {
        let row = sqlx::query(
            "SELECT id, week_start_date FROM goal_checkins.weekly_sessions \
             WHERE week_start_date = $1",
        )
        .bind(week_start)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(session_from_row))
    }

    async fn create(&self, week_start: NaiveDate) -> Result<WeeklySession> {
        let row = sqlx::query(
            r#"
            INSERT INTO goal_checkins.weekly_sessions (id, week_start_date)
            VALUES ($1, $2)
            RETURNING id, week_start_date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(week_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| CheckinError::from_store(err, "weekly session", week_start.to_string()))?;

        Ok(session_from_row(&row))
    }
}

#[async_trait]
impl CheckInStore for PgStore {
    async fn exists(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM goal_checkins.check_ins \
             WHERE user_id = $1 AND session_id = $2) AS present",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?
        .get("present");

        Ok(exists)
    }

    async fn create(&self, check_in: CheckIn) -> Result<CheckIn> {
        let row = sqlx::query(
            r#"
            INSERT INTO goal_checkins.check_ins
            (id, user_id, session_id, overall_rating, wins, struggles,
             next_week_focus, priority_metrics, flagged_metrics)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, session_id, overall_rating, wins, struggles,
                      next_week_focus, priority_metrics, flagged_metrics
            "#,
        )
        .bind(check_in.id)
        .bind(check_in.user_id)
        .bind(check_in.session_id)
        .bind(check_in.overall_rating)
        .bind(&check_in.wins)
        .bind(&check_in.struggles)
        .bind(&check_in.next_week_focus)
        .bind(&check_in.priority_metrics)
        .bind(&check_in.flagged_metrics)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            CheckinError::from_store(
                err,
                "check-in",
                format!("{}/{}", check_in.user_id, check_in.session_id),
            )
        })?;

        Ok(check_in_from_row(&row))
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<CheckIn>> {
        let rows = sqlx::query(
            "SELECT id, user_id, session_id, overall_rating, wins, struggles, \
             next_week_focus, priority_metrics, flagged_metrics \
             FROM goal_checkins.check_ins WHERE session_id = $1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(check_in_from_row).collect())
    }
}

#[async_trait]
impl MetricStore for PgStore {
    async fn list_metrics(&self) -> Result<Vec<Metric>> {
        let rows = sqlx::query(
            "SELECT m.id, g.title, m.name, m.unit, m.target_value, m.start_date, m.target_date \
             FROM goal_checkins.metrics m \
             JOIN goal_checkins.goals g ON g.id = m.goal_id \
             ORDER BY g.title, m.name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(Metric {
                id: row.get("id"),
                goal_title: row.get("title"),
                name: row.get("name"),
                unit: row.get("unit"),
                target_value: row.get("target_value"),
                start_date: row.get("start_date"),
                target_date: row.get("target_date"),
            });
        }

        Ok(metrics)
    }

    async fn samples(&self, metric_id: Uuid) -> Result<Vec<MetricSample>> {
        let rows = sqlx::query(
            "SELECT sample_date, value FROM goal_checkins.metric_samples \
             WHERE metric_id = $1 ORDER BY sample_date",
        )
        .bind(metric_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MetricSample {
                date: row.get("sample_date"),
                value: row.get("value"),
            })
            .collect())
    }
}

fn seed_date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).context("invalid date")
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let goals = vec![
        (
            Uuid::parse_str("6f1c3b1e-5d0a-4c53-9a8e-1f4f2f3b7a10")?,
            "Family fitness",
            "Sam",
        ),
        (
            Uuid::parse_str("a2e94c0b-7f6d-4d8f-8c1e-0b5d9e6a4c21")?,
            "Read together",
            "Riley",
        ),
    ];

    for (id, title, owner) in goals {
        sqlx::query(
            r#"
            INSERT INTO goal_checkins.goals (id, title, owner)
            VALUES ($1, $2, $3)
            ON CONFLICT (title) DO UPDATE SET owner = EXCLUDED.owner
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(owner)
        .execute(pool)
        .await?;
    }

    let metrics = vec![
        (
            Uuid::parse_str("c81f6a7d-2b3e-4a59-b0d4-6e2f1a9c8b32")?,
            "Family fitness",
            "miles run",
            "miles",
            120.0,
            seed_date(2026, 1, 6)?,
            seed_date(2026, 6, 30)?,
        ),
        (
            Uuid::parse_str("e4b7d2c9-8a1f-4e36-9d5b-3c7a0f2e1d43")?,
            "Read together",
            "books finished",
            "books",
            24.0,
            seed_date(2026, 1, 1)?,
            seed_date(2026, 12, 31)?,
        ),
    ];

    for (id, goal_title, name, unit, target, start, target_date) in metrics {
        sqlx::query(
            r#"
            INSERT INTO goal_checkins.metrics
            (id, goal_id, name, unit, target_value, start_date, target_date)
            SELECT $1, g.id, $3, $4, $5, $6, $7
            FROM goal_checkins.goals g WHERE g.title = $2
            ON CONFLICT (name) DO UPDATE
            SET target_value = EXCLUDED.target_value,
                start_date = EXCLUDED.start_date,
                target_date = EXCLUDED.target_date
            "#,
        )
        .bind(id)
        .bind(goal_title)
        .bind(name)
        .bind(unit)
        .bind(target)
        .bind(start)
        .bind(target_date)
        .execute(pool)
        .await?;
    }

    let samples = vec![
        ("miles run", seed_date(2026, 1, 13)?, 6.5),
        ("miles run", seed_date(2026, 1, 20)?, 14.0),
        ("miles run", seed_date(2026, 1, 27)?, 19.5),
        ("books finished", seed_date(2026, 1, 31)?, 1.0),
        ("books finished", seed_date(2026, 2, 28)?, 3.0),
    ];

    for (metric, date, value) in samples {
        upsert_sample(pool, metric, date, value).await?;
    }

    Ok(())
}

/// Returns false when no metric has that name.
async fn upsert_sample(pool: &PgPool, metric: &str, date: NaiveDate, value: f64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO goal_checkins.metric_samples (metric_id, sample_date, value)
        SELECT m.id, $2, $3 FROM goal_checkins.metrics m WHERE m.name = $1
        ON CONFLICT (metric_id, sample_date) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(metric)
    .bind(date)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn import_samples(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        metric: String,
        date: NaiveDate,
        value: f64,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if upsert_sample(pool, &row.metric, row.date, row.value).await? {
            imported += 1;
        } else {
            tracing::warn!(metric = %row.metric, date = %row.date, "unknown metric, sample skipped");
        }
    }

    tracing::info!(imported, path = %csv_path.display(), "metric samples imported");
    Ok(imported)
}
