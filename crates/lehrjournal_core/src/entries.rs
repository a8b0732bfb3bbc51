//! crates/lehrjournal_core/src/entries.rs
//!
//! The work-log workflow: apprentices submit one entry per day, trainers
//! review entries with a note, and every listing is scoped by role.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Entry, EntryDraft, EntryStatus, Role, UserProfile};
use crate::error::{require_field, ServiceError, ServiceResult};
use crate::ports::DocumentStore;

const MAX_HOURS_PER_DAY: f64 = 24.0;

//=========================================================================================
// Access Rules
//=========================================================================================

/// Admins see everyone, trainers their own apprentices, apprentices themselves.
pub fn can_view_apprentice(viewer: &UserProfile, apprentice: &UserProfile) -> bool {
    match viewer.role {
        Role::Admin => true,
        Role::Trainer => apprentice.trainer_id == Some(viewer.uid),
        Role::Apprentice => viewer.uid == apprentice.uid,
    }
}

/// Loads an apprentice profile the viewer is allowed to see.
pub async fn visible_apprentice(
    store: &dyn DocumentStore,
    viewer: &UserProfile,
    apprentice_id: Uuid,
) -> ServiceResult<UserProfile> {
    let apprentice = store.get_profile(apprentice_id).await?;
    if apprentice.role != Role::Apprentice {
        return Err(ServiceError::NotFound(format!(
            "Apprentice {} not found",
            apprentice_id
        )));
    }
    if !can_view_apprentice(viewer, &apprentice) {
        warn!(viewer = %viewer.uid, %apprentice_id, "Rejected access to apprentice data");
        return Err(ServiceError::denied("No access to this apprentice."));
    }
    Ok(apprentice)
}

//=========================================================================================
// Validation
//=========================================================================================

fn valid_hours(hours: f64) -> bool {
    hours.is_finite() && hours >= 0.0
}

/// Checks a draft and returns its date.
pub fn validate_draft(draft: &EntryDraft) -> ServiceResult<NaiveDate> {
    let date = draft
        .date
        .ok_or_else(|| ServiceError::invalid("Missing required field: date"))?;
    require_field(&draft.category, "category")?;
    if draft.tasks.is_empty() && draft.competencies.is_empty() {
        return Err(ServiceError::invalid("An entry needs at least one task or competency."));
    }
    for (task, hours) in &draft.task_hours {
        if !draft.tasks.contains(task) {
            return Err(ServiceError::invalid(format!("Hours given for unlisted task '{}'", task)));
        }
        if !valid_hours(*hours) {
            return Err(ServiceError::invalid(format!("Invalid hours for task '{}'", task)));
        }
    }
    let total: f64 = draft.task_hours.values().sum();
    if total > MAX_HOURS_PER_DAY {
        return Err(ServiceError::invalid("More than 24 hours booked on one day."));
    }
    for detail in &draft.competencies {
        require_field(&detail.name, "competency name")?;
        if !valid_hours(detail.hours) {
            return Err(ServiceError::invalid(format!("Invalid hours for '{}'", detail.name)));
        }
        if let Some(rating) = detail.rating {
            if !(1..=6).contains(&rating) {
                return Err(ServiceError::invalid(format!(
                    "Rating for '{}' must be between 1 and 6",
                    detail.name
                )));
            }
        }
    }
    Ok(date)
}

//=========================================================================================
// Operations
//=========================================================================================

/// Stores the caller's entry for the draft's date, updating an existing one.
pub async fn submit_entry(
    store: &dyn DocumentStore,
    caller: &UserProfile,
    draft: &EntryDraft,
) -> ServiceResult<Entry> {
    if caller.role != Role::Apprentice {
        return Err(ServiceError::denied("Only apprentices submit entries."));
    }
    let date = validate_draft(draft)?;
    let entry = store.upsert_entry(caller, draft, date).await?;
    info!(apprentice = %caller.uid, %date, entry = %entry.id, "Saved entry");
    Ok(entry)
}

/// Adds, replaces or clears the trainer note of an entry.
///
/// A non-empty note marks the entry reviewed. Clearing leaves the status alone.
pub async fn set_trainer_note(
    store: &dyn DocumentStore,
    caller: &UserProfile,
    entry_id: Uuid,
    note: Option<String>,
) -> ServiceResult<Entry> {
    let entry = store.get_entry(entry_id).await?;
    let allowed = match caller.role {
        Role::Admin => true,
        Role::Trainer => entry.trainer_id == Some(caller.uid),
        Role::Apprentice => false,
    };
    if !allowed {
        return Err(ServiceError::denied("Only the apprentice's trainer may review this entry."));
    }

    let note = note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let status = note.as_ref().map(|_| EntryStatus::Reviewed);
    let updated = store.set_entry_review(entry_id, note, status).await?;
    info!(entry = %entry_id, status = updated.status.as_str(), "Updated trainer note");
    Ok(updated)
}

pub async fn delete_entry(
    store: &dyn DocumentStore,
    caller: &UserProfile,
    entry_id: Uuid,
) -> ServiceResult<()> {
    let entry = store.get_entry(entry_id).await?;
    if !(caller.is_admin() || entry.apprentice_id == caller.uid) {
        return Err(ServiceError::denied("Only the author may delete an entry."));
    }
    store.delete_entry(entry_id).await?;
    info!(entry = %entry_id, "Deleted entry");
    Ok(())
}

/// Entries visible to the caller, newest first.
pub async fn list_entries(
    store: &dyn DocumentStore,
    caller: &UserProfile,
    apprentice_id: Option<Uuid>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ServiceResult<Vec<Entry>> {
    match (caller.role, apprentice_id) {
        (Role::Apprentice, None) => Ok(store.list_entries(caller.uid, from, to).await?),
        (Role::Trainer, None) => Ok(store.list_entries_for_trainer(caller.uid, from, to).await?),
        (Role::Admin, None) => {
            let mut all = Vec::new();
            for apprentice in store.list_profiles(Some(Role::Apprentice)).await? {
                all.extend(store.list_entries(apprentice.uid, from, to).await?);
            }
            all.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(all)
        }
        (_, Some(id)) => {
            let apprentice = visible_apprentice(store, caller, id).await?;
            Ok(store.list_entries(apprentice.uid, from, to).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompetencyDetail, CompetencyStatus};
    use crate::memory::MemoryStore;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn profile(role: Role, trainer_id: Option<Uuid>) -> UserProfile {
        UserProfile {
            uid: Uuid::new_v4(),
            role,
            name: format!("{:?}", role),
            email: format!("{}@firma.ch", Uuid::new_v4()),
            company_id: None,
            company_name: None,
            trainer_id,
            created_at: Utc::now(),
        }
    }

    fn draft(day: u32, hours: f64) -> EntryDraft {
        EntryDraft {
            date: NaiveDate::from_ymd_opt(2024, 6, day),
            category: "Montage".into(),
            tasks: vec!["Möbel montieren".into()],
            task_hours: BTreeMap::from([("Möbel montieren".to_string(), hours)]),
            competencies: vec![CompetencyDetail {
                name: "Sorgfalt".into(),
                status: CompetencyStatus::Verbessert,
                note: String::new(),
                hours: 1.0,
                rating: Some(5),
            }],
        }
    }

    async fn setup() -> (MemoryStore, UserProfile, UserProfile, UserProfile) {
        let store = MemoryStore::new();
        let trainer = profile(Role::Trainer, None);
        let apprentice = profile(Role::Apprentice, Some(trainer.uid));
        let other = profile(Role::Trainer, None);
        for p in [&trainer, &apprentice, &other] {
            store.put_profile(p.clone()).await.unwrap();
        }
        (store, trainer, apprentice, other)
    }

    #[tokio::test]
    async fn second_submission_for_a_date_updates() {
        let (store, trainer, apprentice, _) = setup().await;
        let first = submit_entry(&store, &apprentice, &draft(3, 4.0)).await.unwrap();
        assert_eq!(first.status, EntryStatus::Pending);
        assert_eq!(first.trainer_id, Some(trainer.uid));

        set_trainer_note(&store, &trainer, first.id, Some("Gut gemacht".into()))
            .await
            .unwrap();
        let second = submit_entry(&store, &apprentice, &draft(3, 6.0)).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.hours_for("Möbel montieren"), 6.0);
        assert_eq!(second.status, EntryStatus::Reviewed);
        assert_eq!(second.trainer_note.as_deref(), Some("Gut gemacht"));

        let all = list_entries(&store, &apprentice, None, None, None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn invalid_drafts_are_rejected() {
        let (store, trainer, apprentice, _) = setup().await;
        let mut bad = draft(4, 2.0);
        bad.competencies[0].rating = Some(7);
        assert_eq!(
            submit_entry(&store, &apprentice, &bad).await.unwrap_err().code(),
            "invalid-argument"
        );
        let mut bad = draft(4, -1.0);
        bad.date = None;
        assert!(validate_draft(&bad).is_err());
        assert!(validate_draft(&draft(4, 25.0)).is_err());
        let mut bad = draft(4, 2.0);
        bad.task_hours.insert("Hobeln".into(), 1.0);
        assert!(validate_draft(&bad).is_err());

        let err = submit_entry(&store, &trainer, &draft(4, 2.0)).await.unwrap_err();
        assert_eq!(err.code(), "permission-denied");
    }

    #[tokio::test]
    async fn review_is_limited_to_the_assigned_trainer() {
        let (store, trainer, apprentice, other) = setup().await;
        let entry = submit_entry(&store, &apprentice, &draft(5, 3.0)).await.unwrap();

        let err = set_trainer_note(&store, &other, entry.id, Some("x".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "permission-denied");
        let err = set_trainer_note(&store, &apprentice, entry.id, Some("x".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "permission-denied");

        let reviewed = set_trainer_note(&store, &trainer, entry.id, Some("  Prima ".into()))
            .await
            .unwrap();
        assert_eq!(reviewed.status, EntryStatus::Reviewed);
        assert_eq!(reviewed.trainer_note.as_deref(), Some("Prima"));

        let cleared = set_trainer_note(&store, &trainer, entry.id, None).await.unwrap();
        assert_eq!(cleared.trainer_note, None);
        assert_eq!(cleared.status, EntryStatus::Reviewed);
    }

    #[tokio::test]
    async fn listings_are_scoped_by_role() {
        let (store, trainer, apprentice, other) = setup().await;
        submit_entry(&store, &apprentice, &draft(1, 1.0)).await.unwrap();
        submit_entry(&store, &apprentice, &draft(2, 1.0)).await.unwrap();

        let own = list_entries(&store, &trainer, None, None, None).await.unwrap();
        assert_eq!(own.len(), 2);
        assert!(own[0].date > own[1].date);
        assert!(list_entries(&store, &other, None, None, None).await.unwrap().is_empty());
        let err = list_entries(&store, &other, Some(apprentice.uid), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "permission-denied");

        let from = NaiveDate::from_ymd_opt(2024, 6, 2);
        let ranged = list_entries(&store, &trainer, Some(apprentice.uid), from, None)
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);

        let admin = profile(Role::Admin, None);
        let everything = list_entries(&store, &admin, None, None, None).await.unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let (store, trainer, apprentice, _) = setup().await;
        let entry = submit_entry(&store, &apprentice, &draft(9, 1.0)).await.unwrap();
        let err = delete_entry(&store, &trainer, entry.id).await.unwrap_err();
        assert_eq!(err.code(), "permission-denied");
        delete_entry(&store, &apprentice, entry.id).await.unwrap();
        let err = delete_entry(&store, &apprentice, entry.id).await.unwrap_err();
        assert_eq!(err.code(), "not-found");
    }
}
