use chrono::NaiveDate;
use tracing::{debug, info};

use crate::dto::scoring::{
    AllowedActions, CreateSessionRequest, EntryView, MoveResponse, SaveEndRequest, SessionDetail,
};
use crate::error::{Result, StorageError};
use crate::models::{
    ARROWS_PER_END, DEFAULT_TOKEN, NewSession, RecordedEnd, Session, SessionStatus, x_count_of,
};
use crate::services::access::{
    ensure_can_delete, ensure_can_edit_arrows, ensure_can_transition, ensure_can_view,
    ensure_not_locked,
};
use crate::services::navigator::{NavigatorState, NavigatorStep, RoundLayout};
use crate::store::{Actor, ScoringStore};

pub async fn load_layout(store: &dyn ScoringStore, round_id: i32) -> Result<RoundLayout> {
    let ranges = store.list_round_ranges(round_id).await?;
    RoundLayout::new(round_id, ranges)
}

/// Loads a session the actor is allowed to see.
pub async fn load_session(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
) -> Result<Session> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    ensure_can_view(actor, &session)?;
    Ok(session)
}

/// Creates a Preliminary session for the actor, optionally entered in a
/// competition that has not ended yet.
pub async fn start_session(
    store: &dyn ScoringStore,
    actor: &Actor,
    request: &CreateSessionRequest,
    today: NaiveDate,
) -> Result<Session> {
    let member = store
        .find_member(actor.member_id)
        .await?
        .ok_or_else(|| StorageError::Validation(format!("unknown member {}", actor.member_id)))?;

    if store.find_round(request.round_id).await?.is_none() {
        return Err(StorageError::Validation(format!(
            "unknown round {}",
            request.round_id
        )));
    }
    load_layout(store, request.round_id).await?;

    let competition = match request.competition_id {
        Some(id) => {
            let comp = store.find_competition(id).await?.ok_or_else(|| {
                StorageError::Validation(format!("unknown competition {}", id))
            })?;
            ensure_not_locked(Some(&comp), today)?;
            Some(comp)
        }
        None => None,
    };

    let new_session = NewSession {
        member_id: member.member_id,
        round_id: request.round_id,
        division_code: request
            .division_code
            .clone()
            .unwrap_or(member.division_code),
        shoot_date: request.shoot_date.unwrap_or(today),
    };
    let session = store.create_session(&new_session).await?;

    if let Some(comp) = &competition {
        store
            .create_competition_entry(comp.competition_id, session.session_id)
            .await?;
    }

    info!(
        "Started session {} for member {} on round {}",
        session.session_id, session.member_id, session.round_id
    );

    Ok(session)
}

pub async fn session_total(store: &dyn ScoringStore, session_id: i32) -> Result<i32> {
    let ends = store.list_ends(session_id).await?;
    Ok(ends.iter().map(RecordedEnd::total).sum())
}

pub async fn session_detail(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    today: NaiveDate,
) -> Result<SessionDetail> {
    let session = load_session(store, actor, session_id).await?;
    let round = store
        .find_round(session.round_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let layout = load_layout(store, session.round_id).await?;
    let ends = store.list_ends(session_id).await?;
    let competition = store.session_competition(session_id).await?;

    Ok(SessionDetail {
        round_name: round.round_name,
        competition_id: competition.as_ref().map(|c| c.competition_id),
        total: ends.iter().map(RecordedEnd::total).sum(),
        x_count: x_count_of(ends.iter().flat_map(|e| e.arrows.iter().map(|a| &a.arrow_value))),
        ends_recorded: ends.len(),
        total_ends: layout.total_ends(),
        locked: competition.is_some_and(|c| c.is_locked_on(today)),
        session,
    })
}

/// The scoring screen for one end. Reads never fail on locked sessions; the
/// view just reports them as not editable.
pub async fn entry_view(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    state: NavigatorState,
    today: NaiveDate,
) -> Result<EntryView> {
    let session = load_session(store, actor, session_id).await?;
    let layout = load_layout(store, session.round_id).await?;
    let range = layout.current_range(state)?;
    let ends = store.list_ends(session_id).await?;
    let competition = store.session_competition(session_id).await?;

    let current = ends
        .iter()
        .find(|e| e.round_range_id == range.round_range_id && e.end_no == state.end_no);
    let arrows = current
        .map(RecordedEnd::tokens)
        .unwrap_or_else(|| vec![DEFAULT_TOKEN.to_string(); ARROWS_PER_END]);

    let editable = ensure_can_edit_arrows(actor, &session, competition.as_ref(), today).is_ok();
    let locked = ensure_not_locked(competition.as_ref(), today).is_err();
    let actions = AllowedActions {
        previous: state != layout.start(),
        next: editable || state != layout.final_position(),
        submit: !locked
            && session.status == SessionStatus::Preliminary
            && ensure_can_transition(actor, &session, SessionStatus::Final).is_ok(),
        delete: ensure_can_delete(actor, &session, competition.as_ref(), today).is_ok(),
    };

    Ok(EntryView {
        session_id,
        status: session.status,
        state,
        range_ordinal: state.range_idx + 1,
        range_count: layout.ranges().len(),
        distance_m: range.distance_m,
        face_size: range.face_size,
        end_no: state.end_no,
        ends_per_range: range.ends_per_range,
        end_total: current.map(RecordedEnd::total).unwrap_or(0),
        session_total: ends.iter().map(RecordedEnd::total).sum(),
        arrows,
        editable,
        actions,
    })
}

/// Entry view at the first end that still needs arrows.
pub async fn resume(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    today: NaiveDate,
) -> Result<EntryView> {
    let session = load_session(store, actor, session_id).await?;
    let layout = load_layout(store, session.round_id).await?;
    let ends = store.list_ends(session_id).await?;
    let state = layout.resume(&ends);
    debug!(
        "Resuming session {} at range {} end {}",
        session_id,
        state.range_idx + 1,
        state.end_no
    );
    entry_view(store, actor, session_id, state, today).await
}

/// Upserts the arrows typed for one end, slot by slot.
pub async fn save_end(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    request: &SaveEndRequest,
    today: NaiveDate,
) -> Result<()> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let competition = store.session_competition(session_id).await?;
    ensure_can_edit_arrows(actor, &session, competition.as_ref(), today)?;

    let layout = load_layout(store, session.round_id).await?;
    let range = layout.current_range(request.state())?;
    let values = request.arrow_values()?;
    if values.is_empty() {
        return Ok(());
    }

    let end_id = store
        .upsert_end(session_id, range.round_range_id, request.end_no)
        .await?;
    for (slot, value) in values.iter().enumerate() {
        store
            .upsert_arrow(end_id, slot as i16 + 1, &value.as_token())
            .await?;
    }

    debug!(
        "Saved {} arrows for session {} at {} m end {}",
        values.len(),
        session_id,
        range.distance_m,
        request.end_no
    );

    Ok(())
}

/// Saves any buffered arrows, then moves forward. A round-complete step is the
/// caller's cue to submit.
pub async fn goto_next_end(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    request: &SaveEndRequest,
    today: NaiveDate,
) -> Result<MoveResponse> {
    if !request.arrows.is_empty() {
        save_end(store, actor, session_id, request, today).await?;
    }

    let session = load_session(store, actor, session_id).await?;
    let layout = load_layout(store, session.round_id).await?;
    let step = layout.goto_next_end(request.state())?;
    if let NavigatorStep::RangeComplete {
        completed_range_idx,
        ..
    } = step
    {
        info!(
            "Session {} completed range {} of {}",
            session_id,
            completed_range_idx + 1,
            layout.ranges().len()
        );
    }

    let entry = entry_view(store, actor, session_id, step.state(), today).await?;
    Ok(MoveResponse { step, entry })
}

pub async fn goto_previous_end(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    request: &SaveEndRequest,
    today: NaiveDate,
) -> Result<MoveResponse> {
    if !request.arrows.is_empty() {
        save_end(store, actor, session_id, request, today).await?;
    }

    let session = load_session(store, actor, session_id).await?;
    let layout = load_layout(store, session.round_id).await?;
    let state = layout.goto_previous_end(request.state())?;
    let step = NavigatorStep::Moved { state };

    let entry = entry_view(store, actor, session_id, state, today).await?;
    Ok(MoveResponse { step, entry })
}

pub async fn delete_session(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    today: NaiveDate,
) -> Result<()> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let competition = store.session_competition(session_id).await?;
    ensure_can_delete(actor, &session, competition.as_ref(), today)?;

    store.delete_session(session_id).await?;
    info!("Deleted draft session {} of member {}", session_id, session.member_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::scoring::TransitionOutcome;
    use crate::memory::MemoryStore;
    use crate::services::status::submit_session;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn request(round_id: i32) -> CreateSessionRequest {
        CreateSessionRequest {
            round_id,
            division_code: None,
            shoot_date: None,
            competition_id: None,
        }
    }

    fn arrows(state: NavigatorState, values: &[&str]) -> SaveEndRequest {
        SaveEndRequest {
            range_idx: state.range_idx,
            end_no: state.end_no,
            arrows: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_two_range_all_miss_round() {
        let store = MemoryStore::new();
        let archer = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let round = store.add_round("Two Step", &[(50, 122, 1), (60, 122, 1)]);
        let today = date(5, 1);

        let session = start_session(&store, &archer, &request(round), today)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Preliminary);
        assert_eq!(session.shoot_date, today);

        let view = resume(&store, &archer, session.session_id, today).await.unwrap();
        assert_eq!(view.distance_m, 60);
        assert_eq!(view.range_ordinal, 1);

        let first = goto_next_end(
            &store,
            &archer,
            session.session_id,
            &arrows(view.state, &["M"; 6]),
            today,
        )
        .await
        .unwrap();
        assert!(matches!(first.step, NavigatorStep::RangeComplete { .. }));
        assert_eq!(first.entry.distance_m, 50);

        let second = goto_next_end(
            &store,
            &archer,
            session.session_id,
            &arrows(first.entry.state, &["M"; 6]),
            today,
        )
        .await
        .unwrap();
        assert!(second.step.is_round_complete());
        assert_eq!(second.entry.session_total, 0);
        assert_eq!(session_total(&store, session.session_id).await.unwrap(), 0);

        let submitted = submit_session(&store, &archer, session.session_id, false, today)
            .await
            .unwrap();
        assert_eq!(
            submitted,
            TransitionOutcome::Updated {
                from: SessionStatus::Preliminary,
                to: SessionStatus::Final
            }
        );
    }

    #[tokio::test]
    async fn test_saved_end_totals_and_resume() {
        let store = MemoryStore::new();
        let archer = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let round = store.add_round("Practice", &[(30, 80, 3)]);
        let today = date(5, 1);
        let session = start_session(&store, &archer, &request(round), today)
            .await
            .unwrap();

        let start = NavigatorState {
            range_idx: 0,
            end_no: 1,
        };
        save_end(
            &store,
            &archer,
            session.session_id,
            &arrows(start, &["X", "9", "9", "8", "M", "7"]),
            today,
        )
        .await
        .unwrap();

        let view = entry_view(&store, &archer, session.session_id, start, today)
            .await
            .unwrap();
        assert_eq!(view.end_total, 43);
        assert_eq!(view.arrows, vec!["X", "9", "9", "8", "M", "7"]);

        // The M keeps end 1 incomplete until it is overwritten.
        let resumed = resume(&store, &archer, session.session_id, today).await.unwrap();
        assert_eq!(resumed.end_no, 1);

        save_end(
            &store,
            &archer,
            session.session_id,
            &arrows(start, &["X", "9", "9", "8", "1", "7"]),
            today,
        )
        .await
        .unwrap();
        let resumed = resume(&store, &archer, session.session_id, today).await.unwrap();
        assert_eq!(resumed.end_no, 2);
        assert_eq!(resumed.session_total, 44);
    }

    #[tokio::test]
    async fn test_malformed_arrow_is_rejected() {
        let store = MemoryStore::new();
        let archer = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let round = store.add_round("Practice", &[(30, 80, 3)]);
        let session = start_session(&store, &archer, &request(round), date(5, 1))
            .await
            .unwrap();

        let err = save_end(
            &store,
            &archer,
            session.session_id,
            &SaveEndRequest {
                range_idx: 0,
                end_no: 1,
                arrows: vec!["12".to_string()],
            },
            date(5, 1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_locked_competition_blocks_edits_but_not_reads() {
        let store = MemoryStore::new();
        let archer = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let round = store.add_round("Practice", &[(30, 80, 3)]);
        let comp = store.add_competition("Spring Shoot", date(3, 1), date(3, 2));
        let session = start_session(
            &store,
            &archer,
            &CreateSessionRequest {
                competition_id: Some(comp),
                ..request(round)
            },
            date(3, 1),
        )
        .await
        .unwrap();

        let later = date(3, 5);
        let start = NavigatorState {
            range_idx: 0,
            end_no: 1,
        };
        let err = save_end(&store, &archer, session.session_id, &arrows(start, &["9"]), later)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));

        let view = resume(&store, &archer, session.session_id, later).await.unwrap();
        assert!(!view.editable);
        assert!(!view.actions.submit);
        assert!(!view.actions.delete);
        assert!(delete_session(&store, &archer, session.session_id, later).await.is_err());
    }

    #[tokio::test]
    async fn test_start_session_validation() {
        let store = MemoryStore::new();
        let archer = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let empty_round = store.add_round("Broken", &[]);
        let comp = store.add_competition("Closed", date(1, 1), date(1, 2));
        let round = store.add_round("Practice", &[(30, 80, 3)]);
        let today = date(5, 1);

        let err = start_session(&store, &Actor::archer(999), &request(round), today)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let err = start_session(&store, &archer, &request(4242), today)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let err = start_session(&store, &archer, &request(empty_round), today)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));

        let err = start_session(
            &store,
            &archer,
            &CreateSessionRequest {
                competition_id: Some(comp),
                ..request(round)
            },
            today,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_other_archers_cannot_read_or_delete() {
        let store = MemoryStore::new();
        let owner = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let other = Actor::archer(store.add_member("Bo", "M", "R", 1991, false));
        let round = store.add_round("Practice", &[(30, 80, 3)]);
        let today = date(5, 1);
        let session = start_session(&store, &owner, &request(round), today)
            .await
            .unwrap();

        assert!(resume(&store, &other, session.session_id, today).await.is_err());
        assert!(
            delete_session(&store, &other, session.session_id, today)
                .await
                .is_err()
        );
        delete_session(&store, &owner, session.session_id, today)
            .await
            .unwrap();
        assert!(store.status_of(session.session_id).is_none());
    }

    #[tokio::test]
    async fn test_previous_end_saves_buffered_arrows() {
        let store = MemoryStore::new();
        let archer = Actor::archer(store.add_member("Ada", "F", "R", 1990, false));
        let round = store.add_round("Practice", &[(30, 80, 3)]);
        let today = date(5, 1);
        let session = start_session(&store, &archer, &request(round), today)
            .await
            .unwrap();

        let moved = goto_previous_end(
            &store,
            &archer,
            session.session_id,
            &arrows(
                NavigatorState {
                    range_idx: 0,
                    end_no: 2,
                },
                &["10", "10"],
            ),
            today,
        )
        .await
        .unwrap();

        assert_eq!(moved.entry.end_no, 1);
        assert_eq!(moved.entry.session_total, 20);
        assert!(!moved.entry.actions.previous);
    }
}
