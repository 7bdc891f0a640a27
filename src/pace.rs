use chrono::NaiveDate;

use crate::error::{CheckinError, Result};
use crate::models::{Metric, MetricPace, MetricSample, PaceResult, PaceStatus};

/// Percentage points either side of the expected progress that still count as on track.
const ON_TRACK_BAND: f64 = 10.0;

/// Linear expected-vs-actual progress toward a dated target.
///
/// Neither the percentage nor `now` is clamped: overshoot reads above 100,
/// and a `now` before `start_date` gives a negative expectation. NaN and
/// infinite values are rejected rather than classified.
pub fn estimate_pace(
    current_value: f64,
    target_value: f64,
    start_date: NaiveDate,
    target_date: NaiveDate,
    now: NaiveDate,
) -> Result<PaceResult> {
    if target_date <= start_date {
        return Err(CheckinError::InvalidRange {
            start_date,
            target_date,
        });
    }
    if target_value == 0.0 || !target_value.is_finite() {
        return Err(CheckinError::InvalidTarget);
    }
    if !current_value.is_finite() {
        return Err(CheckinError::InvalidCurrent(current_value));
    }

    let total_span = (target_date - start_date).num_days() as f64;
    let elapsed = (now - start_date).num_days() as f64;
    let expected_pct = 100.0 * elapsed / total_span;
    let actual_pct = 100.0 * current_value / target_value;
    let delta = actual_pct - expected_pct;

    let status = if delta > ON_TRACK_BAND {
        PaceStatus::Ahead
    } else if delta < -ON_TRACK_BAND {
        PaceStatus::Behind
    } else {
        PaceStatus::OnTrack
    };

    Ok(PaceResult {
        status,
        percentage: actual_pct,
    })
}

pub fn latest_value(samples: &[MetricSample]) -> Option<f64> {
    samples
        .iter()
        .max_by_key(|sample| sample.date)
        .map(|sample| sample.value)
}

pub fn annotate_metric(metric: Metric, samples: &[MetricSample], today: NaiveDate) -> Result<MetricPace> {
    let current = latest_value(samples);
    let pace = match current {
        Some(value) => Some(estimate_pace(
            value,
            metric.target_value,
            metric.start_date,
            metric.target_date,
            today,
        )?),
        None => None,
    };

    Ok(MetricPace {
        metric,
        current,
        pace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pace(current: f64, target: f64) -> Result<PaceResult> {
        estimate_pace(current, target, date(2026, 1, 1), date(2026, 1, 11), date(2026, 1, 6))
    }

    fn reading_metric() -> Metric {
        Metric {
            id: Uuid::new_v4(),
            goal_title: "Read more".to_string(),
            name: "books read".to_string(),
            unit: "books".to_string(),
            target_value: 10.0,
            start_date: date(2026, 1, 1),
            target_date: date(2026, 1, 11),
        }
    }

    #[test]
    fn halfway_at_halftime_is_on_track() {
        let result = pace(50.0, 100.0).unwrap();
        assert_eq!(result.status, PaceStatus::OnTrack);
        assert!((result.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn classifies_ahead_and_behind() {
        let ahead = pace(90.0, 100.0).unwrap();
        assert_eq!(ahead.status, PaceStatus::Ahead);
        assert!((ahead.percentage - 90.0).abs() < 1e-9);

        let behind = pace(10.0, 100.0).unwrap();
        assert_eq!(behind.status, PaceStatus::Behind);
        assert!((behind.percentage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn band_edges_stay_on_track() {
        assert_eq!(pace(60.0, 100.0).unwrap().status, PaceStatus::OnTrack);
        assert_eq!(pace(40.0, 100.0).unwrap().status, PaceStatus::OnTrack);
    }

    #[test]
    fn zero_target_is_rejected() {
        for current in [0.0, 5.0, -3.0] {
            assert!(matches!(pace(current, 0.0), Err(CheckinError::InvalidTarget)));
        }
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        for target in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(pace(50.0, target), Err(CheckinError::InvalidTarget)));
        }
        for current in [f64::NAN, f64::INFINITY] {
            assert!(matches!(pace(current, 100.0), Err(CheckinError::InvalidCurrent(_))));
        }
    }

    #[test]
    fn pace_result_serializes_with_kebab_status() {
        let json = serde_json::to_value(pace(50.0, 100.0).unwrap()).unwrap();
        assert_eq!(json["status"], "on-track");
        assert_eq!(json["percentage"], 50.0);
    }

    #[test]
    fn empty_or_inverted_range_is_rejected() {
        let same_day = estimate_pace(1.0, 2.0, date(2026, 1, 5), date(2026, 1, 5), date(2026, 1, 5));
        assert!(matches!(same_day, Err(CheckinError::InvalidRange { .. })));

        let inverted = estimate_pace(1.0, 0.0, date(2026, 1, 5), date(2026, 1, 1), date(2026, 1, 3));
        assert!(matches!(inverted, Err(CheckinError::InvalidRange { .. })));
    }

    #[test]
    fn percentage_is_not_clamped() {
        let over = pace(150.0, 100.0).unwrap();
        assert!((over.percentage - 150.0).abs() < 1e-9);
        assert_eq!(over.status, PaceStatus::Ahead);

        let negative = pace(-20.0, 100.0).unwrap();
        assert!((negative.percentage + 20.0).abs() < 1e-9);
        assert_eq!(negative.status, PaceStatus::Behind);
    }

    #[test]
    fn before_start_date_reads_as_ahead() {
        let early = estimate_pace(0.0, 100.0, date(2026, 1, 11), date(2026, 1, 21), date(2026, 1, 6)).unwrap();
        assert_eq!(early.status, PaceStatus::Ahead);
    }

    #[test]
    fn latest_value_uses_most_recent_date() {
        let samples = vec![
            MetricSample { date: date(2026, 1, 3), value: 4.0 },
            MetricSample { date: date(2026, 1, 5), value: 6.0 },
            MetricSample { date: date(2026, 1, 4), value: 9.0 },
        ];
        assert_eq!(latest_value(&samples), Some(6.0));
        assert_eq!(latest_value(&[]), None);
    }

    #[test]
    fn annotate_uses_latest_sample() {
        let samples = vec![
            MetricSample { date: date(2026, 1, 2), value: 1.0 },
            MetricSample { date: date(2026, 1, 6), value: 9.0 },
        ];
        let annotated = annotate_metric(reading_metric(), &samples, date(2026, 1, 6)).unwrap();
        assert_eq!(annotated.current, Some(9.0));
        assert_eq!(annotated.pace.unwrap().status, PaceStatus::Ahead);
    }

    #[test]
    fn annotate_without_samples_has_no_pace() {
        let annotated = annotate_metric(reading_metric(), &[], date(2026, 1, 6)).unwrap();
        assert!(annotated.current.is_none());
        assert!(annotated.pace.is_none());
    }
}
