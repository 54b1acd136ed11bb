use chrono::NaiveDate;

use crate::error::{Result, StorageError};
use crate::models::{Competition, Session, SessionStatus};
use crate::store::Actor;

/// Rejects every write once the linked competition has ended.
pub fn ensure_not_locked(competition: Option<&Competition>, today: NaiveDate) -> Result<()> {
    match competition {
        Some(comp) if comp.is_locked_on(today) => Err(StorageError::PermissionDenied(format!(
            "'{}' ended on {}; scores are locked",
            comp.name, comp.end_date
        ))),
        _ => Ok(()),
    }
}

pub fn ensure_recorder(actor: &Actor) -> Result<()> {
    if actor.is_recorder {
        Ok(())
    } else {
        Err(StorageError::PermissionDenied(
            "recorder access required".to_string(),
        ))
    }
}

pub fn ensure_can_view(actor: &Actor, session: &Session) -> Result<()> {
    if actor.is_recorder || actor.member_id == session.member_id {
        Ok(())
    } else {
        Err(StorageError::PermissionDenied(
            "session belongs to another member".to_string(),
        ))
    }
}

/// Archers edit their own drafts; recorders edit anything until the
/// competition closes.
pub fn ensure_can_edit_arrows(
    actor: &Actor,
    session: &Session,
    competition: Option<&Competition>,
    today: NaiveDate,
) -> Result<()> {
    ensure_not_locked(competition, today)?;
    ensure_can_view(actor, session)?;

    if !actor.is_recorder && session.status != SessionStatus::Preliminary {
        return Err(StorageError::PermissionDenied(format!(
            "session is {} and can no longer be edited",
            session.status
        )));
    }

    Ok(())
}

/// Role check for a forward transition. Archers may only submit their own
/// drafts; confirming is reserved to recorders.
pub fn ensure_can_transition(actor: &Actor, session: &Session, to: SessionStatus) -> Result<()> {
    if actor.is_recorder {
        return Ok(());
    }

    ensure_can_view(actor, session)?;

    if to != SessionStatus::Final {
        return Err(StorageError::PermissionDenied(format!(
            "only a recorder can mark a session {}",
            to
        )));
    }

    Ok(())
}

pub fn ensure_can_delete(
    actor: &Actor,
    session: &Session,
    competition: Option<&Competition>,
    today: NaiveDate,
) -> Result<()> {
    ensure_not_locked(competition, today)?;
    ensure_can_view(actor, session)?;

    if session.status != SessionStatus::Preliminary {
        return Err(StorageError::PermissionDenied(format!(
            "only draft sessions can be deleted; this one is {}",
            session.status
        )));
    }

    Ok(())
}
