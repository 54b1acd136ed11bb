use rand::Rng;
use tracing::{info, warn};

use crate::error::{Result, StorageError};
use crate::models::Member;
use crate::store::{Actor, ScoringStore};

const AV_PREFIX: &str = "VIC";
const AV_ATTEMPTS: usize = 50;

fn random_av_number() -> String {
    let digits: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{}{:03}", AV_PREFIX, digits)
}

/// Draws AV numbers until one is free.
pub async fn generate_unique_av_number(store: &dyn ScoringStore) -> Result<String> {
    for _ in 0..AV_ATTEMPTS {
        let candidate = random_av_number();
        if !store.av_number_exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    Err(StorageError::ConstraintViolation(format!(
        "no free AV number after {} attempts",
        AV_ATTEMPTS
    )))
}

/// Profile shown after login. Members without an AV number get one assigned.
pub async fn login_profile(store: &dyn ScoringStore, member_id: i32) -> Result<Member> {
    let mut member = store
        .find_member(member_id)
        .await?
        .ok_or(StorageError::NotFound)?;

    if member.av_number.is_none() {
        let av_number = loop {
            let candidate = generate_unique_av_number(store).await?;
            match store.set_av_number(member_id, &candidate).await {
                Ok(()) => break candidate,
                // Taken between the check and the write.
                Err(e) if e.is_unique_violation() => {
                    warn!("AV number {} was taken concurrently, retrying", candidate);
                }
                Err(e) => return Err(e),
            }
        };
        info!("Assigned AV number {} to member {}", av_number, member_id);
        member.av_number = Some(av_number);
    }

    Ok(member)
}

/// Builds the actor for a member id, reading the recorder flag from the member
/// row.
pub async fn resolve_actor(store: &dyn ScoringStore, member_id: i32) -> Result<Actor> {
    let member = store
        .find_member(member_id)
        .await?
        .ok_or_else(|| StorageError::PermissionDenied(format!("unknown member {}", member_id)))?;

    Ok(Actor {
        member_id: member.member_id,
        is_recorder: member.is_recorder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_av_number_format() {
        for _ in 0..20 {
            let av = random_av_number();
            assert_eq!(av.len(), 6);
            assert!(av.starts_with("VIC"));
            assert!(av[3..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_login_backfills_av_number_once() {
        let store = MemoryStore::new();
        let id = store.add_member("Ada", "F", "R", 1990, false);

        let first = login_profile(&store, id).await.unwrap();
        let av = first.av_number.clone().unwrap();
        assert!(store.av_number_exists(&av).await.unwrap());

        let second = login_profile(&store, id).await.unwrap();
        assert_eq!(second.av_number, Some(av));
    }

    #[tokio::test]
    async fn test_resolve_actor_reads_recorder_flag() {
        let store = MemoryStore::new();
        let recorder = store.add_member("Rex", "M", "C", 1970, true);

        assert_eq!(
            resolve_actor(&store, recorder).await.unwrap(),
            Actor::recorder(recorder)
        );
        assert!(matches!(
            resolve_actor(&store, 404).await,
            Err(StorageError::PermissionDenied(_))
        ));
    }
}
