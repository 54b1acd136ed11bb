use chrono::NaiveDate;
use tracing::info;

use crate::dto::report::{CompetitionSessionFilter, CompetitionSessionRow};
use crate::dto::scoring::{BulkStatusRequest, BulkStatusResponse};
use crate::error::{Result, StorageError};
use crate::models::ScoredSessionFilter;
use crate::services::access::ensure_recorder;
use crate::services::status::bulk_transition;
use crate::store::{Actor, ScoringStore};

/// Recorder listing of the sessions entered in a competition.
pub async fn competition_sessions(
    store: &dyn ScoringStore,
    actor: &Actor,
    competition_id: i32,
    filter: &CompetitionSessionFilter,
    today: NaiveDate,
) -> Result<Vec<CompetitionSessionRow>> {
    ensure_recorder(actor)?;

    let competition = store
        .find_competition(competition_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let locked = competition.is_locked_on(today);

    let sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            competition_id: Some(competition_id),
            round_ids: filter.round_ids.clone(),
            ..ScoredSessionFilter::default()
        })
        .await?;

    Ok(sessions
        .into_iter()
        .filter(|s| filter.matches(s.status, s.av_number.as_deref()))
        .map(|s| CompetitionSessionRow {
            total: s.total(),
            session_id: s.session_id,
            member_id: s.member_id,
            full_name: s.full_name,
            av_number: s.av_number,
            round_id: s.round_id,
            round_name: s.round_name,
            shoot_date: s.shoot_date,
            status: s.status,
            locked,
        })
        .collect())
}

/// Filters a competition's sessions and, unless previewing, moves every
/// editable match to the target status.
pub async fn bulk_status(
    store: &dyn ScoringStore,
    actor: &Actor,
    competition_id: i32,
    request: &BulkStatusRequest,
    today: NaiveDate,
) -> Result<BulkStatusResponse> {
    let mut matched =
        competition_sessions(store, actor, competition_id, &request.filter(), today).await?;
    if !request.session_ids.is_empty() {
        matched.retain(|row| request.session_ids.contains(&row.session_id));
    }

    let ids_where = |locked: bool| -> Vec<i32> {
        matched
            .iter()
            .filter(|row| row.locked == locked)
            .map(|row| row.session_id)
            .collect()
    };
    let locked = ids_where(true);
    let editable = ids_where(false);

    let report = if request.dry_run {
        None
    } else {
        info!(
            "Bulk status change to {} on competition {}: {} sessions matched, {} locked",
            request.target,
            competition_id,
            matched.len(),
            locked.len()
        );
        Some(bulk_transition(store, actor, &editable, request.target, today).await)
    };

    Ok(BulkStatusResponse {
        dry_run: request.dry_run,
        matched,
        editable,
        locked,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::SessionStatus;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn request(target: SessionStatus) -> BulkStatusRequest {
        BulkStatusRequest {
            target,
            statuses: Vec::new(),
            round_ids: Vec::new(),
            av_number: None,
            session_ids: Vec::new(),
            dry_run: false,
        }
    }

    async fn seeded() -> (MemoryStore, i32, Actor, Vec<i32>) {
        let store = MemoryStore::new();
        let recorder = Actor::recorder(store.add_member("Rex", "M", "C", 1970, true));
        let ada = store.add_member("Ada", "F", "R", 1990, false);
        let bea = store.add_member("Bea", "F", "R", 1991, false);
        store.set_av_number(ada, "VIC101").await.unwrap();
        store.set_av_number(bea, "VIC202").await.unwrap();
        let round = store.add_round("Short", &[(30, 80, 1)]);
        let comp = store.add_competition("Winter Open", date(6, 1), date(6, 30));

        let ids = [
            (ada, SessionStatus::Preliminary),
            (ada, SessionStatus::Final),
            (bea, SessionStatus::Final),
        ]
        .into_iter()
        .map(|(member, status)| {
            let id = store.insert_session(member, round, date(6, 2), status);
            store.enter_competition(comp, id);
            id
        })
        .collect();

        (store, comp, recorder, ids)
    }

    #[tokio::test]
    async fn test_dry_run_changes_nothing() {
        let (store, comp, recorder, ids) = seeded().await;
        let response = bulk_status(
            &store,
            &recorder,
            comp,
            &BulkStatusRequest {
                dry_run: true,
                ..request(SessionStatus::Confirmed)
            },
            date(6, 10),
        )
        .await
        .unwrap();

        assert_eq!(response.matched.len(), 3);
        assert_eq!(response.editable.len(), 3);
        assert!(response.report.is_none());
        assert_eq!(store.status_of(ids[1]), Some(SessionStatus::Final));
    }

    #[tokio::test]
    async fn test_filters_narrow_the_selection() {
        let (store, comp, recorder, ids) = seeded().await;
        let response = bulk_status(
            &store,
            &recorder,
            comp,
            &BulkStatusRequest {
                statuses: vec![SessionStatus::Final],
                av_number: Some("vic1".to_string()),
                ..request(SessionStatus::Confirmed)
            },
            date(6, 10),
        )
        .await
        .unwrap();

        assert_eq!(response.editable, vec![ids[1]]);
        assert_eq!(response.report.unwrap().updated, 1);
        assert_eq!(store.status_of(ids[1]), Some(SessionStatus::Confirmed));
        assert_eq!(store.status_of(ids[2]), Some(SessionStatus::Final));
    }

    #[tokio::test]
    async fn test_locked_sessions_are_not_touched() {
        let (store, comp, recorder, ids) = seeded().await;
        let response = bulk_status(
            &store,
            &recorder,
            comp,
            &request(SessionStatus::Confirmed),
            date(7, 1),
        )
        .await
        .unwrap();

        assert_eq!(response.locked.len(), 3);
        assert_eq!(response.report.unwrap().processed(), 0);
        assert_eq!(store.status_of(ids[0]), Some(SessionStatus::Preliminary));
    }

    #[tokio::test]
    async fn test_archers_cannot_list_competition_sessions() {
        let (store, comp, _, _) = seeded().await;
        let err = competition_sessions(
            &store,
            &Actor::archer(2),
            comp,
            &CompetitionSessionFilter::default(),
            date(6, 10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));
    }
}
