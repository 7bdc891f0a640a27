use std::fmt::Write;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{CheckIn, MetricPace, WeeklySession};
use crate::pace;
use crate::store::{CheckInStore, MetricStore, SessionStore};
use crate::week;

pub fn average_rating(check_ins: &[CheckIn]) -> Option<f64> {
    if check_ins.is_empty() {
        return None;
    }
    let total: i32 = check_ins.iter().map(|c| c.overall_rating).sum();
    Some(total as f64 / check_ins.len() as f64)
}

/// Annotates every metric with its pace as of `clock.today()`.
///
/// A metric with an unusable range or target keeps its current value but no pace.
pub async fn collect_paces<M, C>(store: &M, clock: &C) -> Result<Vec<MetricPace>>
where
    M: MetricStore + ?Sized,
    C: Clock + ?Sized,
{
    let today = clock.today();
    let mut paces = Vec::new();

    for metric in store.list_metrics().await? {
        let samples = store.samples(metric.id).await?;
        match pace::annotate_metric(metric.clone(), &samples, today) {
            Ok(annotated) => paces.push(annotated),
            Err(err) => {
                tracing::warn!(metric = %metric.name, error = %err, "pace unavailable");
                paces.push(MetricPace {
                    metric,
                    current: pace::latest_value(&samples),
                    pace: None,
                });
            }
        }
    }

    Ok(paces)
}

pub fn build_report(session: &WeeklySession, check_ins: &[CheckIn], paces: &[MetricPace]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Check-in Report");
    let _ = writeln!(output, "Week starting {} (session {})", session.week_start_date, session.id);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Check-ins");

    if check_ins.is_empty() {
        let _ = writeln!(output, "No check-ins submitted yet this week.");
    } else {
        if let Some(average) = average_rating(check_ins) {
            let _ = writeln!(
                output,
                "{} check-ins, average rating {:.1}",
                check_ins.len(),
                average
            );
        }
        for check_in in check_ins {
            let _ = writeln!(
                output,
                "- {} rated {}/10. Wins: {}. Struggles: {}. Next focus: {}",
                check_in.user_id,
                check_in.overall_rating,
                or_dash(&check_in.wins),
                or_dash(&check_in.struggles),
                or_dash(&check_in.next_week_focus)
            );
            if !check_in.flagged_metrics.is_empty() {
                let _ = writeln!(output, "  - flagged: {}", check_in.flagged_metrics.join(", "));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Goal Pace");

    if paces.is_empty() {
        let _ = writeln!(output, "No metrics tracked.");
    } else {
        for entry in paces {
            let metric = &entry.metric;
            match (entry.current, entry.pace) {
                (Some(current), Some(pace)) => {
                    let _ = writeln!(
                        output,
                        "- {} / {}: {} of {} {} ({:.0}%, {})",
                        metric.goal_title,
                        metric.name,
                        current,
                        metric.target_value,
                        metric.unit,
                        pace.percentage,
                        pace.status.label()
                    );
                }
                (Some(current), None) => {
                    let _ = writeln!(
                        output,
                        "- {} / {}: {} {} (pace unavailable)",
                        metric.goal_title, metric.name, current, metric.unit
                    );
                }
                (None, _) => {
                    let _ = writeln!(
                        output,
                        "- {} / {}: no samples yet",
                        metric.goal_title, metric.name
                    );
                }
            }
        }
    }

    output
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}

pub async fn weekly_report<S, C>(store: &S, clock: &C) -> Result<String>
where
    S: SessionStore + CheckInStore + MetricStore,
    C: Clock + ?Sized,
{
    let session = week::resolve_current_session(store, clock).await?;
    let check_ins = CheckInStore::list_for_session(store, session.id).await?;
    let paces = collect_paces(store, clock).await?;
    Ok(build_report(&session, &check_ins, &paces))
}
