use chrono::NaiveDate;
use storage::{
    Actor, ScoringStore,
    dto::scoring::{BulkStatusRequest, BulkStatusResponse},
    services::{approvals, members, status},
};
use tracing::{info, warn};

use crate::error::{AdminError, Result};

/// Recomputes category and cached total of every entry of a competition.
/// Returns how many entries were refreshed.
pub async fn recompute_entries(store: &dyn ScoringStore, competition_id: i32) -> Result<usize> {
    store
        .find_competition(competition_id)
        .await?
        .ok_or(AdminError::CompetitionNotFound(competition_id))?;

    let entries = store.list_competition_entries(competition_id).await?;
    let mut refreshed = 0;

    for entry in entries {
        match store.find_session(entry.session_id).await? {
            Some(session) => {
                status::refresh_competition_entry(store, &session).await?;
                refreshed += 1;
            }
            None => warn!("Entry {} points at a missing session", entry.entry_id),
        }
    }

    info!(
        "Recomputed {} entries of competition {}",
        refreshed, competition_id
    );
    Ok(refreshed)
}

/// Bulk status change acting as the given recorder.
pub async fn bulk_status(
    store: &dyn ScoringStore,
    recorder_id: i32,
    competition_id: i32,
    request: &BulkStatusRequest,
    today: NaiveDate,
) -> Result<BulkStatusResponse> {
    let actor: Actor = members::resolve_actor(store, recorder_id).await?;
    if !actor.is_recorder {
        return Err(AdminError::NotARecorder(recorder_id));
    }

    Ok(approvals::bulk_status(store, &actor, competition_id, request, today).await?)
}
