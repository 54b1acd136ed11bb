use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dto::scoring::{BulkFailure, BulkTransitionReport, TransitionOutcome};
use crate::error::{Result, StorageError};
use crate::models::{NewSessionAudit, Session, SessionStatus, TransitionCheck, category_for};
use crate::services::access::{ensure_can_transition, ensure_not_locked};
use crate::services::scoring::load_layout;
use crate::store::{Actor, ScoringStore};

/// Applies one status change, the single place single and bulk changes go
/// through.
///
/// Same-state and backwards requests are reported, not applied. Everything
/// else is checked against the competition lock and then the actor's role.
pub async fn apply_transition(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    to: SessionStatus,
    today: NaiveDate,
) -> Result<TransitionOutcome> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let from = session.status;

    match from.check_transition(to) {
        TransitionCheck::AlreadyAtTarget => return Ok(TransitionOutcome::AlreadyAtTarget),
        TransitionCheck::ForbiddenRevert => {
            return Ok(TransitionOutcome::BlockedRevert { from, to });
        }
        TransitionCheck::Apply => {}
    }

    let competition = store.session_competition(session_id).await?;
    ensure_not_locked(competition.as_ref(), today)?;
    ensure_can_transition(actor, &session, to)?;

    let entry = match competition {
        Some(_) => Some(entry_snapshot(store, &session).await?),
        None => None,
    };

    store.set_session_status(session_id, to).await?;
    info!(
        "Session {} moved from {} to {} by member {}",
        session_id, from, to, actor.member_id
    );

    record_audit(store, actor, session_id, from, to).await;

    if let Some(entry) = entry {
        if let Err(e) = store
            .update_competition_entry(session_id, entry.category_id, entry.total)
            .await
        {
            warn!(
                "Session {} is {} but its competition entry was not refreshed: {}",
                session_id, to, e
            );
        }
    }

    Ok(TransitionOutcome::Updated { from, to })
}

async fn record_audit(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    from: SessionStatus,
    to: SessionStatus,
) {
    let audit = NewSessionAudit {
        session_id,
        old_status: from,
        new_status: to,
        changed_by: Some(actor.member_id),
    };

    if let Err(e) = store.record_audit(&audit).await {
        if e.is_undefined_table() {
            warn!("session_audit table is missing; status change of session {} not audited", session_id);
        } else {
            warn!("Failed to audit status change of session {}: {}", session_id, e);
        }
    }
}

struct EntrySnapshot {
    category_id: Option<i32>,
    total: i32,
}

/// Category and total a competition entry should carry for `session`.
async fn entry_snapshot(store: &dyn ScoringStore, session: &Session) -> Result<EntrySnapshot> {
    let member = store
        .find_member(session.member_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let categories = store.list_categories().await?;
    let category_id = category_for(
        &categories,
        &member.gender_code,
        &session.division_code,
        member.birth_year,
    )
    .map(|c| c.category_id);

    let total = store
        .list_ends(session.session_id)
        .await?
        .iter()
        .map(|e| e.total())
        .sum();

    Ok(EntrySnapshot { category_id, total })
}

/// Caches the archer's category and the session total on its competition
/// entry.
pub async fn refresh_competition_entry(store: &dyn ScoringStore, session: &Session) -> Result<()> {
    let entry = entry_snapshot(store, session).await?;
    store
        .update_competition_entry(session.session_id, entry.category_id, entry.total)
        .await
}

/// Single-session status change. A backwards request is an error here rather
/// than a skip.
pub async fn change_status(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    to: SessionStatus,
    today: NaiveDate,
) -> Result<TransitionOutcome> {
    match apply_transition(store, actor, session_id, to, today).await? {
        TransitionOutcome::BlockedRevert { from, to } => {
            warn!(
                "Refused to move session {} from {} back to {}",
                session_id, from, to
            );
            Err(StorageError::ForbiddenTransition { from, to })
        }
        outcome => Ok(outcome),
    }
}

/// Archer-side submit: always lands on Final. A session with ends still
/// missing is only submitted when the caller explicitly allows it.
pub async fn submit_session(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_id: i32,
    allow_incomplete: bool,
    today: NaiveDate,
) -> Result<TransitionOutcome> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(StorageError::NotFound)?;

    if session.status == SessionStatus::Preliminary && !allow_incomplete {
        let layout = load_layout(store, session.round_id).await?;
        let entered_ends = store
            .list_ends(session_id)
            .await?
            .iter()
            .filter(|e| e.is_fully_entered())
            .count() as i32;

        if entered_ends < layout.total_ends() {
            return Err(StorageError::Validation(format!(
                "only {} of {} ends are entered; confirm to submit anyway",
                entered_ends,
                layout.total_ends()
            )));
        }
    }

    change_status(store, actor, session_id, SessionStatus::Final, today).await
}

/// Applies `to` to every session in turn, counting outcomes and carrying on
/// past failures.
pub async fn bulk_transition(
    store: &dyn ScoringStore,
    actor: &Actor,
    session_ids: &[i32],
    to: SessionStatus,
    today: NaiveDate,
) -> BulkTransitionReport {
    let mut report = BulkTransitionReport::new(to);

    for &session_id in session_ids {
        match apply_transition(store, actor, session_id, to, today).await {
            Ok(TransitionOutcome::Updated { .. }) => report.updated += 1,
            Ok(TransitionOutcome::AlreadyAtTarget) => report.skipped_already_at_target += 1,
            Ok(TransitionOutcome::BlockedRevert { from, .. }) => {
                warn!(
                    "Skipping session {}: cannot move from {} back to {}",
                    session_id, from, to
                );
                report.skipped_blocked_revert += 1;
            }
            Err(e) => {
                warn!("Bulk status change failed for session {}: {}", session_id, e);
                report.failed += 1;
                report.failures.push(BulkFailure {
                    session_id,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Bulk change to {}: {} updated, {} already there, {} blocked, {} failed",
        to,
        report.updated,
        report.skipped_already_at_target,
        report.skipped_blocked_revert,
        report.failed
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        archer: i32,
        recorder: i32,
        round: i32,
        comp: i32,
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let archer = store.add_member("Ada Archer", "F", "R", 1990, false);
        let recorder = store.add_member("Rex Recorder", "M", "C", 1970, true);
        let round = store.add_round("Short", &[(30, 80, 1)]);
        let comp = store.add_competition("Winter Open", date(6, 1), date(6, 30));
        store.add_category("Open", "F", "R", (1966, 2004));
        Fixture {
            store,
            archer,
            recorder,
            round,
            comp,
        }
    }

    fn full_end(store: &MemoryStore, session_id: i32, round_id: i32, value: &str) {
        let range = store.ranges_of(round_id)[0].round_range_id;
        store.record_end(session_id, range, 1, &[value; 6]);
    }

    #[tokio::test]
    async fn test_bulk_confirm_mixed_statuses() {
        let f = fixture();
        let ids: Vec<i32> = [
            SessionStatus::Preliminary,
            SessionStatus::Final,
            SessionStatus::Confirmed,
        ]
        .into_iter()
        .map(|s| f.store.insert_session(f.archer, f.round, date(6, 2), s))
        .collect();

        let report = bulk_transition(
            &f.store,
            &Actor::recorder(f.recorder),
            &ids,
            SessionStatus::Confirmed,
            date(6, 10),
        )
        .await;

        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped_already_at_target, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(f.store.audits().len(), 2);
        for id in ids {
            assert_eq!(f.store.status_of(id), Some(SessionStatus::Confirmed));
        }
    }

    #[tokio::test]
    async fn test_bulk_revert_is_skipped() {
        let f = fixture();
        let ids: Vec<i32> = [SessionStatus::Final, SessionStatus::Confirmed]
            .into_iter()
            .map(|s| f.store.insert_session(f.archer, f.round, date(6, 2), s))
            .collect();

        let report = bulk_transition(
            &f.store,
            &Actor::recorder(f.recorder),
            &ids,
            SessionStatus::Preliminary,
            date(6, 10),
        )
        .await;

        assert_eq!(report.skipped_blocked_revert, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(f.store.status_of(ids[1]), Some(SessionStatus::Confirmed));
    }

    #[tokio::test]
    async fn test_single_revert_is_an_error() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Confirmed);

        let err = change_status(
            &f.store,
            &Actor::recorder(f.recorder),
            id,
            SessionStatus::Preliminary,
            date(6, 10),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StorageError::ForbiddenTransition {
                from: SessionStatus::Confirmed,
                to: SessionStatus::Preliminary
            }
        ));
        assert!(f.store.audits().is_empty());
    }

    #[tokio::test]
    async fn test_same_state_is_idempotent() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Final);

        let outcome = change_status(
            &f.store,
            &Actor::recorder(f.recorder),
            id,
            SessionStatus::Final,
            date(6, 10),
        )
        .await
        .unwrap();

        assert_eq!(outcome, TransitionOutcome::AlreadyAtTarget);
        assert!(f.store.audits().is_empty());
    }

    #[tokio::test]
    async fn test_locked_competition_rejects_transitions() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Final);
        f.store.enter_competition(f.comp, id);

        let err = change_status(
            &f.store,
            &Actor::recorder(f.recorder),
            id,
            SessionStatus::Confirmed,
            date(7, 1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StorageError::PermissionDenied(_)));
        assert_eq!(f.store.status_of(id), Some(SessionStatus::Final));
    }

    #[tokio::test]
    async fn test_archer_cannot_confirm() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Preliminary);

        let err = change_status(
            &f.store,
            &Actor::archer(f.archer),
            id,
            SessionStatus::Confirmed,
            date(6, 10),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StorageError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_audit_failure_still_counts_as_success() {
        let f = fixture();
        f.store.drop_audit_table();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Final);

        let report = bulk_transition(
            &f.store,
            &Actor::recorder(f.recorder),
            &[id],
            SessionStatus::Confirmed,
            date(6, 10),
        )
        .await;

        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(f.store.status_of(id), Some(SessionStatus::Confirmed));
    }

    #[tokio::test]
    async fn test_bulk_continues_past_failures() {
        let f = fixture();
        let broken = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Final);
        let fine = f
            .store
            .insert_session(f.archer, f.round, date(6, 3), SessionStatus::Final);
        f.store.fail_status_writes_for(broken);

        let report = bulk_transition(
            &f.store,
            &Actor::recorder(f.recorder),
            &[broken, 9999, fine],
            SessionStatus::Confirmed,
            date(6, 10),
        )
        .await;

        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(
            report.failures.iter().map(|f| f.session_id).collect::<Vec<_>>(),
            vec![broken, 9999]
        );
        assert_eq!(report.processed(), 3);
    }

    #[tokio::test]
    async fn test_submit_requires_complete_round_unless_allowed() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Preliminary);
        let actor = Actor::archer(f.archer);

        let err = submit_session(&f.store, &actor, id, false, date(6, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let outcome = submit_session(&f.store, &actor, id, true, date(6, 2))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Updated {
                from: SessionStatus::Preliminary,
                to: SessionStatus::Final
            }
        );
    }

    #[tokio::test]
    async fn test_submit_refreshes_competition_entry() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Preliminary);
        f.store.enter_competition(f.comp, id);
        full_end(&f.store, id, f.round, "9");

        submit_session(&f.store, &Actor::archer(f.archer), id, false, date(6, 2))
            .await
            .unwrap();

        let entry = f.store.entry_for(id).unwrap();
        assert_eq!(entry.final_total, Some(54));
        assert!(entry.category_id.is_some());
        assert_eq!(f.store.status_of(id), Some(SessionStatus::Final));
    }

    #[tokio::test]
    async fn test_submit_accepts_fully_entered_round_with_misses() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Preliminary);
        let range = f.store.ranges_of(f.round)[0].round_range_id;
        f.store.record_end(id, range, 1, &["X", "9", "9", "8", "M", "7"]);

        let outcome = submit_session(&f.store, &Actor::archer(f.archer), id, false, date(6, 2))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Updated {
                from: SessionStatus::Preliminary,
                to: SessionStatus::Final
            }
        );
        assert_eq!(f.store.status_of(id), Some(SessionStatus::Final));
    }

    #[tokio::test]
    async fn test_entry_lookup_failure_aborts_before_any_write() {
        let f = fixture();
        let orphan = f
            .store
            .insert_session(9999, f.round, date(6, 2), SessionStatus::Final);
        f.store.enter_competition(f.comp, orphan);

        let report = bulk_transition(
            &f.store,
            &Actor::recorder(f.recorder),
            &[orphan],
            SessionStatus::Confirmed,
            date(6, 10),
        )
        .await;

        assert_eq!(report.updated, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(f.store.status_of(orphan), Some(SessionStatus::Final));
        assert!(f.store.audits().is_empty());
    }

    #[tokio::test]
    async fn test_entry_write_failure_still_counts_as_updated() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Final);
        f.store.enter_competition(f.comp, id);
        f.store.fail_entry_writes_for(id);

        let outcome = change_status(
            &f.store,
            &Actor::recorder(f.recorder),
            id,
            SessionStatus::Confirmed,
            date(6, 10),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Updated {
                from: SessionStatus::Final,
                to: SessionStatus::Confirmed
            }
        );
        assert_eq!(f.store.status_of(id), Some(SessionStatus::Confirmed));
        assert_eq!(f.store.audits().len(), 1);
        assert_eq!(f.store.entry_for(id).unwrap().final_total, None);
    }

    #[tokio::test]
    async fn test_revert_on_locked_session_reports_the_revert() {
        let f = fixture();
        let id = f
            .store
            .insert_session(f.archer, f.round, date(6, 2), SessionStatus::Confirmed);
        f.store.enter_competition(f.comp, id);
        let recorder = Actor::recorder(f.recorder);
        let after_close = date(7, 1);

        let err = change_status(&f.store, &recorder, id, SessionStatus::Preliminary, after_close)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::ForbiddenTransition {
                from: SessionStatus::Confirmed,
                to: SessionStatus::Preliminary
            }
        ));

        let report =
            bulk_transition(&f.store, &recorder, &[id], SessionStatus::Final, after_close).await;
        assert_eq!(report.skipped_blocked_revert, 1);
        assert_eq!(report.failed, 0);

        let same = change_status(&f.store, &recorder, id, SessionStatus::Confirmed, after_close)
            .await
            .unwrap();
        assert_eq!(same, TransitionOutcome::AlreadyAtTarget);

        assert_eq!(f.store.status_of(id), Some(SessionStatus::Confirmed));
        assert!(f.store.audits().is_empty());
    }
}
