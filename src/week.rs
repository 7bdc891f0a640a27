use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::clock::Clock;
use crate::error::{CheckinError, Result};
use crate::models::WeeklySession;
use crate::store::SessionStore;

/// The Tuesday on or before `date`. Sunday falls back five days, Monday six.
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    let days_back = (date.weekday().num_days_from_monday() + 6) % 7;
    date - Duration::days(i64::from(days_back))
}

pub fn is_check_in_day(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Tue
}

/// Returns this week's session, creating it on first access.
///
/// A conflicting insert means another request created the row first; the
/// winner's row is read back instead of failing.
pub async fn resolve_current_session<S, C>(store: &S, clock: &C) -> Result<WeeklySession>
where
    S: SessionStore + ?Sized,
    C: Clock + ?Sized,
{
    let week_start = week_start_for(clock.today());

    if let Some(session) = store.find(week_start).await? {
        return Ok(session);
    }

    match store.create(week_start).await {
        Ok(session) => {
            tracing::info!(%week_start, session_id = %session.id, "created weekly session");
            Ok(session)
        }
        Err(err) if err.is_conflict() => {
            tracing::warn!(%week_start, "weekly session created concurrently, re-reading");
            store
                .find(week_start)
                .await?
                .ok_or(CheckinError::StoreUnavailable(sqlx::Error::RowNotFound))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::memory::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tuesday_through_saturday_map_to_same_week_tuesday() {
        // 2026-01-06 is a Tuesday.
        let tuesday = date(2026, 1, 6);
        for offset in 0..5 {
            let day = tuesday + Duration::days(offset);
            assert_eq!(week_start_for(day), tuesday, "{day}");
        }
    }

    #[test]
    fn sunday_and_monday_fall_back_to_previous_tuesday() {
        assert_eq!(week_start_for(date(2026, 1, 11)), date(2026, 1, 6));
        assert_eq!(week_start_for(date(2026, 1, 12)), date(2026, 1, 6));
        assert_eq!(week_start_for(date(2026, 1, 13)), date(2026, 1, 13));
    }

    #[test]
    fn week_start_crosses_month_and_year_boundaries() {
        // Monday 2026-03-02 -> Tuesday 2026-02-24
        assert_eq!(week_start_for(date(2026, 3, 2)), date(2026, 2, 24));
        // Thursday 2026-01-01 -> Tuesday 2025-12-30
        assert_eq!(week_start_for(date(2026, 1, 1)), date(2025, 12, 30));
    }

    #[test]
    fn only_tuesday_is_check_in_day() {
        assert!(is_check_in_day(date(2026, 1, 6)));
        assert!(!is_check_in_day(date(2026, 1, 7)));
        assert!(!is_check_in_day(date(2026, 1, 12)));
    }

    #[tokio::test]
    async fn creates_session_once_and_reuses_it() {
        let store = MemoryStore::default();
        let first = resolve_current_session(&store, &FixedClock(date(2026, 1, 8))).await.unwrap();
        let second = resolve_current_session(&store, &FixedClock(date(2026, 1, 12))).await.unwrap();

        assert_eq!(first.week_start_date, date(2026, 1, 6));
        assert_eq!(first.id, second.id);
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn next_week_gets_a_new_session() {
        let store = MemoryStore::default();
        let this_week = resolve_current_session(&store, &FixedClock(date(2026, 1, 12))).await.unwrap();
        let next_week = resolve_current_session(&store, &FixedClock(date(2026, 1, 13))).await.unwrap();

        assert_ne!(this_week.id, next_week.id);
        assert_eq!(next_week.week_start_date, date(2026, 1, 13));
        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_first_calls_converge_on_one_session() {
        let store = MemoryStore::racy();
        let clock = FixedClock(date(2026, 1, 9));

        let (a, b) = tokio::join!(
            resolve_current_session(&store, &clock),
            resolve_current_session(&store, &clock)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.id, b.id);
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.conflicts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let store = MemoryStore::unavailable();
        let err = resolve_current_session(&store, &FixedClock(date(2026, 1, 9)))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckinError::StoreUnavailable(_)));
    }
}
