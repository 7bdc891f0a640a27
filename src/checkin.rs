use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CheckinError, Result};
use crate::models::{CheckIn, NewCheckIn, WeeklySession};
use crate::store::{CheckInStore, SessionStore};
use crate::week;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    Created(CheckIn),
    AlreadySubmitted(WeeklySession),
}

pub fn validate(draft: &NewCheckIn) -> Result<()> {
    if !(1..=10).contains(&draft.overall_rating) {
        return Err(CheckinError::InvalidRating(draft.overall_rating));
    }
    Ok(())
}

/// Records `user_id`'s check-in for the current week, at most once per week.
pub async fn submit_check_in<S, K, C>(
    sessions: &S,
    check_ins: &K,
    clock: &C,
    user_id: Uuid,
    draft: NewCheckIn,
) -> Result<CheckInOutcome>
where
    S: SessionStore + ?Sized,
    K: CheckInStore + ?Sized,
    C: Clock + ?Sized,
{
    validate(&draft)?;
    let session = week::resolve_current_session(sessions, clock).await?;

    if check_ins.exists(user_id, session.id).await? {
        tracing::debug!(%user_id, session_id = %session.id, "check-in already submitted");
        return Ok(CheckInOutcome::AlreadySubmitted(session));
    }

    let check_in = CheckIn {
        id: Uuid::new_v4(),
        user_id,
        session_id: session.id,
        overall_rating: draft.overall_rating,
        wins: draft.wins,
        struggles: draft.struggles,
        next_week_focus: draft.next_week_focus,
        priority_metrics: draft.priority_metrics,
        flagged_metrics: draft.flagged_metrics,
    };

    match check_ins.create(check_in).await {
        Ok(created) => {
            tracing::info!(%user_id, session_id = %session.id, "check-in recorded");
            Ok(CheckInOutcome::Created(created))
        }
        Err(err) if err.is_conflict() => {
            tracing::warn!(%user_id, session_id = %session.id, "concurrent duplicate check-in dropped");
            Ok(CheckInOutcome::AlreadySubmitted(session))
        }
        Err(err) => Err(err),
    }
}
