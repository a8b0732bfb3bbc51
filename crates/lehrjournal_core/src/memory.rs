//! crates/lehrjournal_core/src/memory.rs
//!
//! An in-process implementation of both ports. Used by the tests and by the
//! API when no database URL is configured.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::credentials::{hash_password, verify_password};
use crate::domain::{
    Company, CompanyDraft, Entry, EntryDraft, EntryStatus, JoinCode, Role, UserProfile,
};
use crate::ports::{DocumentStore, IdentityProvider, PortError, PortResult};

struct Account {
    email: String,
    password_hash: String,
}

/// Every collection lives in its own lock; no operation holds two at once.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
    sessions: RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>,
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
    companies: RwLock<HashMap<Uuid, Company>>,
    entries: RwLock<HashMap<Uuid, Entry>>,
    codes: RwLock<HashMap<String, JoinCode>>,
    #[cfg(test)]
    pub(crate) fail_profile_writes: std::sync::atomic::AtomicBool,
    #[cfg(test)]
    pub(crate) fail_profile_deletes: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identity accounts, for assertions on side effects.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    #[cfg(test)]
    fn profile_writes_rejected(&self) -> bool {
        self.fail_profile_writes
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn profile_writes_rejected(&self) -> bool {
        false
    }

    #[cfg(test)]
    fn profile_deletes_rejected(&self) -> bool {
        self.fail_profile_deletes
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn profile_deletes_rejected(&self) -> bool {
        false
    }
}

fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

fn newest_first(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

fn by_name(mut profiles: Vec<UserProfile>) -> Vec<UserProfile> {
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    profiles
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for MemoryStore {
    async fn create_account(&self, email: &str, password: &str) -> PortResult<Uuid> {
        let email = email.trim().to_lowercase();
        let password_hash = hash_password(password).map_err(PortError::Unexpected)?;
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == email) {
            return Err(PortError::AlreadyExists(format!("Account {} exists", email)));
        }
        let uid = Uuid::new_v4();
        accounts.insert(
            uid,
            Account {
                email,
                password_hash,
            },
        );
        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Uuid> {
        let email = email.trim().to_lowercase();
        let (uid, hash) = {
            let accounts = self.accounts.read().await;
            let (uid, account) = accounts
                .iter()
                .find(|(_, a)| a.email == email)
                .ok_or_else(|| PortError::NotFound(format!("Account {} not found", email)))?;
            (*uid, account.password_hash.clone())
        };
        match verify_password(password, &hash) {
            Ok(true) => Ok(uid),
            Ok(false) => Err(PortError::InvalidCredential),
            Err(e) => Err(PortError::Unexpected(e)),
        }
    }

    async fn delete_account(&self, uid: Uuid) -> PortResult<()> {
        self.accounts
            .write()
            .await
            .remove(&uid)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", uid)))?;
        self.sessions.write().await.retain(|_, (owner, _)| *owner != uid);
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        uid: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), (uid, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.sessions.read().await.get(session_id) {
            Some((uid, expires_at)) if *expires_at > Utc::now() => Ok(*uid),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_profile(&self, uid: Uuid) -> PortResult<UserProfile> {
        self.profiles
            .read()
            .await
            .get(&uid)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", uid)))
    }

    async fn put_profile(&self, profile: UserProfile) -> PortResult<()> {
        if self.profile_writes_rejected() {
            return Err(PortError::Unexpected("profile write rejected".to_string()));
        }
        self.profiles.write().await.insert(profile.uid, profile);
        Ok(())
    }

    async fn delete_profile(&self, uid: Uuid) -> PortResult<()> {
        if self.profile_deletes_rejected() {
            return Err(PortError::Unexpected("profile delete rejected".to_string()));
        }
        self.profiles
            .write()
            .await
            .remove(&uid)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", uid)))
    }

    async fn list_profiles(&self, role: Option<Role>) -> PortResult<Vec<UserProfile>> {
        let profiles = self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| role.map_or(true, |r| p.role == r))
            .cloned()
            .collect();
        Ok(by_name(profiles))
    }

    async fn list_apprentices_of(&self, trainer_id: Uuid) -> PortResult<Vec<UserProfile>> {
        let profiles = self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| p.role == Role::Apprentice && p.trainer_id == Some(trainer_id))
            .cloned()
            .collect();
        Ok(by_name(profiles))
    }

    async fn has_admin(&self) -> PortResult<bool> {
        Ok(self.profiles.read().await.values().any(UserProfile::is_admin))
    }

    async fn create_company(&self, draft: CompanyDraft) -> PortResult<Company> {
        let company = Company {
            id: Uuid::new_v4(),
            name: draft.name,
            address: draft.address,
            contact: draft.contact,
            created_at: Utc::now(),
        };
        self.companies
            .write()
            .await
            .insert(company.id, company.clone());
        Ok(company)
    }

    async fn get_company(&self, id: Uuid) -> PortResult<Company> {
        self.companies
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Company {} not found", id)))
    }

    async fn update_company(&self, id: Uuid, draft: CompanyDraft) -> PortResult<Company> {
        let mut companies = self.companies.write().await;
        let company = companies
            .get_mut(&id)
            .ok_or_else(|| PortError::NotFound(format!("Company {} not found", id)))?;
        company.name = draft.name;
        company.address = draft.address;
        company.contact = draft.contact;
        Ok(company.clone())
    }

    async fn delete_company(&self, id: Uuid) -> PortResult<()> {
        self.companies
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Company {} not found", id)))
    }

    async fn list_companies(&self) -> PortResult<Vec<Company>> {
        let mut companies: Vec<Company> = self.companies.read().await.values().cloned().collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn get_entry(&self, id: Uuid) -> PortResult<Entry> {
        self.entries
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", id)))
    }

    async fn upsert_entry(
        &self,
        apprentice: &UserProfile,
        draft: &EntryDraft,
        date: NaiveDate,
    ) -> PortResult<Entry> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let existing = entries
            .values_mut()
            .find(|e| e.apprentice_id == apprentice.uid && e.date == date);

        let entry = match existing {
            Some(entry) => {
                entry.company_id = apprentice.company_id;
                entry.trainer_id = apprentice.trainer_id;
                entry.category = draft.category.clone();
                entry.tasks = draft.tasks.clone();
                entry.task_hours = draft.task_hours.clone();
                entry.competencies = draft.competencies.clone();
                entry.updated_at = now;
                entry.clone()
            }
            None => {
                let entry = Entry {
                    id: Uuid::new_v4(),
                    apprentice_id: apprentice.uid,
                    company_id: apprentice.company_id,
                    trainer_id: apprentice.trainer_id,
                    category: draft.category.clone(),
                    tasks: draft.tasks.clone(),
                    task_hours: draft.task_hours.clone(),
                    competencies: draft.competencies.clone(),
                    date,
                    status: EntryStatus::Pending,
                    trainer_note: None,
                    created_at: now,
                    updated_at: now,
                };
                entries.insert(entry.id, entry.clone());
                entry
            }
        };
        Ok(entry)
    }

    async fn set_entry_review(
        &self,
        id: Uuid,
        note: Option<String>,
        status: Option<EntryStatus>,
    ) -> PortResult<Entry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", id)))?;
        entry.trainer_note = note;
        if let Some(status) = status {
            entry.status = status;
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn delete_entry(&self, id: Uuid) -> PortResult<()> {
        self.entries
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", id)))
    }

    async fn list_entries(
        &self,
        apprentice_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<Entry>> {
        let entries = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.apprentice_id == apprentice_id && in_range(e.date, from, to))
            .cloned()
            .collect();
        Ok(newest_first(entries))
    }

    async fn list_entries_for_trainer(
        &self,
        trainer_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<Entry>> {
        let entries = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.trainer_id == Some(trainer_id) && in_range(e.date, from, to))
            .cloned()
            .collect();
        Ok(newest_first(entries))
    }

    async fn get_join_code(&self, code: &str) -> PortResult<JoinCode> {
        self.codes
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Code {} not found", code)))
    }

    async fn create_join_code(&self, code: JoinCode) -> PortResult<()> {
        let mut codes = self.codes.write().await;
        if codes.contains_key(&code.code) {
            return Err(PortError::AlreadyExists(format!("Code {} exists", code.code)));
        }
        codes.insert(code.code.clone(), code);
        Ok(())
    }

    async fn delete_join_code(&self, code: &str) -> PortResult<()> {
        self.codes
            .write()
            .await
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Code {} not found", code)))
    }

    async fn list_join_codes(&self) -> PortResult<Vec<JoinCode>> {
        let mut codes: Vec<JoinCode> = self.codes.read().await.values().cloned().collect();
        codes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn sign_in_distinguishes_unknown_and_wrong_password() {
        let store = MemoryStore::new();
        let uid = store.create_account("Anna@Firma.ch", "secret").await.unwrap();
        assert_eq!(store.sign_in("anna@firma.ch", "secret").await.unwrap(), uid);
        assert!(matches!(
            store.sign_in("anna@firma.ch", "wrong").await,
            Err(PortError::InvalidCredential)
        ));
        assert!(matches!(
            store.sign_in("nobody@firma.ch", "secret").await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.create_account("anna@firma.ch", "x").await,
            Err(PortError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected() {
        let store = MemoryStore::new();
        let uid = Uuid::new_v4();
        store
            .create_auth_session("live", uid, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .create_auth_session("old", uid, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(store.validate_auth_session("live").await.unwrap(), uid);
        assert!(store.validate_auth_session("old").await.is_err());
        store.delete_auth_session("live").await.unwrap();
        assert!(store.validate_auth_session("live").await.is_err());
    }
}
