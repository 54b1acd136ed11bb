//! Read-only projections over Confirmed sessions.
//!
//! Every total here comes from [`score_of`](crate::models::score_of) applied to
//! the raw arrow tokens the store returns.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::dto::report::{
    CategoryResults, ChampionshipLadder, ClubRecord, CompetitionResultRow, CompetitionResults,
    CountedRound, HistoryBucket, LadderRow, PersonalBest, RoundDefinition, ScoreHistoryRow,
};
use crate::error::{Result, StorageError};
use crate::models::{ARROWS_PER_END, Category, ScoredSession, ScoredSessionFilter, category_for};
use crate::store::ScoringStore;

/// Best first: higher total, then earlier date, then lower session id.
fn best_first(a: &ScoredSession, b: &ScoredSession) -> Ordering {
    b.total()
        .cmp(&a.total())
        .then(a.shoot_date.cmp(&b.shoot_date))
        .then(a.session_id.cmp(&b.session_id))
}

fn best_of<'a, I>(sessions: I) -> Option<&'a ScoredSession>
where
    I: IntoIterator<Item = &'a ScoredSession>,
{
    sessions.into_iter().min_by(|a, b| best_first(a, b))
}

/// Standard competition ranking (1, 2, 2, 4) over keys already sorted best
/// first.
fn competition_ranks<K: PartialEq>(keys: &[K]) -> Vec<u32> {
    let mut ranks: Vec<u32> = Vec::with_capacity(keys.len());
    for (idx, key) in keys.iter().enumerate() {
        let rank = match ranks.last() {
            Some(&previous) if keys[idx - 1] == *key => previous,
            _ => idx as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

fn to_personal_best(session: &ScoredSession) -> PersonalBest {
    PersonalBest {
        round_id: session.round_id,
        round_name: session.round_name.clone(),
        session_id: session.session_id,
        score: session.total(),
        x_count: session.x_count(),
        shoot_date: session.shoot_date,
    }
}

pub async fn personal_best(
    store: &dyn ScoringStore,
    member_id: i32,
    round_id: i32,
) -> Result<Option<PersonalBest>> {
    let sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            member_id: Some(member_id),
            round_ids: vec![round_id],
            ..ScoredSessionFilter::confirmed()
        })
        .await?;

    Ok(best_of(&sessions).map(to_personal_best))
}

/// Best Confirmed score of a member on every round they have shot.
pub async fn personal_bests(store: &dyn ScoringStore, member_id: i32) -> Result<Vec<PersonalBest>> {
    let sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            member_id: Some(member_id),
            ..ScoredSessionFilter::confirmed()
        })
        .await?;

    let mut by_round: BTreeMap<i32, Vec<&ScoredSession>> = BTreeMap::new();
    for session in &sessions {
        by_round.entry(session.round_id).or_default().push(session);
    }

    let mut bests: Vec<PersonalBest> = by_round
        .into_values()
        .filter_map(|group| best_of(group).map(to_personal_best))
        .collect();
    bests.sort_by(|a, b| a.round_name.cmp(&b.round_name));
    Ok(bests)
}

fn to_club_record(category: &Category, session: &ScoredSession) -> ClubRecord {
    ClubRecord {
        round_id: session.round_id,
        round_name: session.round_name.clone(),
        category_id: category.category_id,
        category_name: category.name.clone(),
        session_id: session.session_id,
        member_id: session.member_id,
        full_name: session.full_name.clone(),
        av_number: session.av_number.clone(),
        score: session.total(),
        shoot_date: session.shoot_date,
    }
}

fn record_in<'a>(category: &Category, sessions: &'a [ScoredSession]) -> Option<&'a ScoredSession> {
    best_of(
        sessions
            .iter()
            .filter(|s| category.includes(&s.gender_code, &s.division_code, s.birth_year)),
    )
}

pub async fn club_record(
    store: &dyn ScoringStore,
    round_id: i32,
    category_id: i32,
) -> Result<Option<ClubRecord>> {
    let categories = store.list_categories().await?;
    let category = categories
        .iter()
        .find(|c| c.category_id == category_id)
        .ok_or(StorageError::NotFound)?;

    let sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            round_ids: vec![round_id],
            ..ScoredSessionFilter::confirmed()
        })
        .await?;

    Ok(record_in(category, &sessions).map(|s| to_club_record(category, s)))
}

/// Record holder of a round for every category that has a Confirmed result.
pub async fn club_records(store: &dyn ScoringStore, round_id: i32) -> Result<Vec<ClubRecord>> {
    let mut categories = store.list_categories().await?;
    categories.sort_by_key(|c| c.category_id);

    let sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            round_ids: vec![round_id],
            ..ScoredSessionFilter::confirmed()
        })
        .await?;

    Ok(categories
        .iter()
        .filter_map(|c| record_in(c, &sessions).map(|s| to_club_record(c, s)))
        .collect())
}

/// Season standings: the top `best_of` Confirmed totals of every required
/// round, summed. Archers missing a required round are listed after everyone
/// else, unranked.
pub async fn championship_ladder(
    store: &dyn ScoringStore,
    championship_id: i32,
) -> Result<ChampionshipLadder> {
    let championship = store
        .find_championship(championship_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let required = store.list_championship_rounds(championship_id).await?;

    let sessions = if required.is_empty() {
        Vec::new()
    } else {
        store
            .list_scored_sessions(&ScoredSessionFilter {
                round_ids: required.iter().map(|r| r.round_id).collect(),
                shot_from: Some(championship.season_start),
                shot_until: Some(championship.season_end),
                ..ScoredSessionFilter::confirmed()
            })
            .await?
    };

    let mut by_member: BTreeMap<i32, Vec<&ScoredSession>> = BTreeMap::new();
    for session in &sessions {
        by_member.entry(session.member_id).or_default().push(session);
    }

    let mut rows: Vec<LadderRow> = by_member
        .into_values()
        .map(|shot| {
            let counted: Vec<CountedRound> = required
                .iter()
                .map(|req| {
                    let mut scores: Vec<i32> = shot
                        .iter()
                        .filter(|s| s.round_id == req.round_id)
                        .map(|s| s.total())
                        .collect();
                    scores.sort_unstable_by(|a, b| b.cmp(a));
                    scores.truncate(req.best_of.max(0) as usize);
                    CountedRound {
                        round_id: req.round_id,
                        best_of: req.best_of,
                        scores,
                    }
                })
                .collect();

            let archer = shot[0];
            LadderRow {
                rank: None,
                member_id: archer.member_id,
                full_name: archer.full_name.clone(),
                av_number: archer.av_number.clone(),
                championship_score: counted.iter().flat_map(|c| &c.scores).sum(),
                complete: counted.iter().all(|c| !c.scores.is_empty()),
                counted,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.complete
            .cmp(&a.complete)
            .then(b.championship_score.cmp(&a.championship_score))
            .then(a.full_name.cmp(&b.full_name))
    });

    let complete = rows.iter().filter(|r| r.complete).count();
    let keys: Vec<i32> = rows[..complete]
        .iter()
        .map(|r| r.championship_score)
        .collect();
    for (row, rank) in rows.iter_mut().zip(competition_ranks(&keys)) {
        row.rank = Some(rank);
    }

    Ok(ChampionshipLadder {
        championship_id,
        name: championship.name,
        season_start: championship.season_start,
        season_end: championship.season_end,
        rows,
    })
}

/// Confirmed entries of a competition grouped by category and ranked by total,
/// then X count.
pub async fn competition_results(
    store: &dyn ScoringStore,
    competition_id: i32,
) -> Result<CompetitionResults> {
    let competition = store
        .find_competition(competition_id)
        .await?
        .ok_or(StorageError::NotFound)?;
    let entries = store.list_competition_entries(competition_id).await?;
    let categories = store.list_categories().await?;
    let sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            competition_id: Some(competition_id),
            ..ScoredSessionFilter::confirmed()
        })
        .await?;

    let cached: HashMap<i32, Option<i32>> = entries
        .iter()
        .map(|e| (e.session_id, e.category_id))
        .collect();

    let mut groups: BTreeMap<(bool, i32), Vec<&ScoredSession>> = BTreeMap::new();
    for session in &sessions {
        let category_id = cached.get(&session.session_id).copied().flatten().or_else(|| {
            category_for(
                &categories,
                &session.gender_code,
                &session.division_code,
                session.birth_year,
            )
            .map(|c| c.category_id)
        });
        // Uncategorised entries sort last.
        let key = (category_id.is_none(), category_id.unwrap_or(0));
        groups.entry(key).or_default().push(session);
    }

    let categories_out = groups
        .into_iter()
        .map(|((uncategorised, id), mut group)| {
            group.sort_by(|a, b| {
                b.total()
                    .cmp(&a.total())
                    .then(b.x_count().cmp(&a.x_count()))
                    .then(a.full_name.cmp(&b.full_name))
            });
            let keys: Vec<(i32, i32)> = group.iter().map(|s| (s.total(), s.x_count())).collect();
            let rows = group
                .iter()
                .zip(competition_ranks(&keys))
                .map(|(s, rank)| CompetitionResultRow {
                    rank,
                    session_id: s.session_id,
                    member_id: s.member_id,
                    full_name: s.full_name.clone(),
                    av_number: s.av_number.clone(),
                    round_name: s.round_name.clone(),
                    total: s.total(),
                    x_count: s.x_count(),
                })
                .collect();

            let category_id = (!uncategorised).then_some(id);
            let category_name = category_id
                .and_then(|id| categories.iter().find(|c| c.category_id == id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Uncategorised".to_string());

            CategoryResults {
                category_id,
                category_name,
                rows,
            }
        })
        .collect();

    Ok(CompetitionResults {
        competition_id,
        name: competition.name,
        categories: categories_out,
    })
}

/// Every session of a member, newest first, with its progress bucket.
pub async fn score_history(store: &dyn ScoringStore, member_id: i32) -> Result<Vec<ScoreHistoryRow>> {
    let mut sessions = store
        .list_scored_sessions(&ScoredSessionFilter {
            member_id: Some(member_id),
            ..ScoredSessionFilter::default()
        })
        .await?;
    sessions.sort_by(|a, b| {
        b.shoot_date
            .cmp(&a.shoot_date)
            .then(b.session_id.cmp(&a.session_id))
    });

    let mut expected_ends: HashMap<i32, i32> = HashMap::new();
    let mut rows = Vec::with_capacity(sessions.len());
    for session in sessions {
        let total_ends = match expected_ends.get(&session.round_id) {
            Some(&n) => n,
            None => {
                let n = store
                    .list_round_ranges(session.round_id)
                    .await?
                    .iter()
                    .map(|r| r.ends_per_range)
                    .sum();
                expected_ends.insert(session.round_id, n);
                n
            }
        };

        rows.push(ScoreHistoryRow {
            session_id: session.session_id,
            shoot_date: session.shoot_date,
            round_id: session.round_id,
            total: session.total(),
            bucket: HistoryBucket::classify(session.status, session.ends_recorded, total_ends),
            status: session.status,
            ends_recorded: session.ends_recorded,
            total_ends,
            round_name: session.round_name,
        });
    }

    Ok(rows)
}

pub async fn round_definitions(store: &dyn ScoringStore) -> Result<Vec<RoundDefinition>> {
    let rounds = store.list_rounds().await?;
    let mut definitions = Vec::with_capacity(rounds.len());

    for round in rounds {
        let ranges = store.list_round_ranges(round.round_id).await?;
        let total_ends: i32 = ranges.iter().map(|r| r.ends_per_range).sum();
        definitions.push(RoundDefinition {
            round_id: round.round_id,
            round_name: round.round_name,
            ranges,
            total_ends,
            total_arrows: total_ends * ARROWS_PER_END as i32,
        });
    }

    Ok(definitions)
}
