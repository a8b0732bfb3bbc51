//! crates/lehrjournal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core logic talks to.
//! The identity provider and the document store are external collaborators;
//! these traits are the only way the workflows reach them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    Company, CompanyDraft, Entry, EntryDraft, EntryStatus, JoinCode, Role, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the storage backends.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid credentials")]
    InvalidCredential,
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Accounts keyed by email and password, plus the login sessions issued for them.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and returns its uid.
    /// Fails with `AlreadyExists` when the email is taken.
    async fn create_account(&self, email: &str, password: &str) -> PortResult<Uuid>;

    /// Verifies the credentials. Unknown emails yield `NotFound`, wrong
    /// passwords `InvalidCredential`.
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Uuid>;

    async fn delete_account(&self, uid: Uuid) -> PortResult<()>;

    // --- Login Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        uid: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the uid of a live session, `Unauthorized` when unknown or expired.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// The document collections `users`, `companies`, `entries` and `apprenticeCodes`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, uid: Uuid) -> PortResult<UserProfile>;

    async fn put_profile(&self, profile: UserProfile) -> PortResult<()>;

    async fn delete_profile(&self, uid: Uuid) -> PortResult<()>;

    /// All profiles, optionally restricted to one role, ordered by name.
    async fn list_profiles(&self, role: Option<Role>) -> PortResult<Vec<UserProfile>>;

    /// Apprentices whose `trainer_id` equals the given trainer, ordered by name.
    async fn list_apprentices_of(&self, trainer_id: Uuid) -> PortResult<Vec<UserProfile>>;

    /// Returns true when at least one admin profile exists.
    async fn has_admin(&self) -> PortResult<bool>;

    // --- Companies ---
    async fn create_company(&self, draft: CompanyDraft) -> PortResult<Company>;

    async fn get_company(&self, id: Uuid) -> PortResult<Company>;

    async fn update_company(&self, id: Uuid, draft: CompanyDraft) -> PortResult<Company>;

    async fn delete_company(&self, id: Uuid) -> PortResult<()>;

    async fn list_companies(&self) -> PortResult<Vec<Company>>;

    // --- Entries ---
    async fn get_entry(&self, id: Uuid) -> PortResult<Entry>;

    /// Inserts the entry for `(apprentice, date)` or updates the existing one.
    /// Returns the stored entry; an update keeps status and trainer note.
    async fn upsert_entry(
        &self,
        apprentice: &UserProfile,
        draft: &EntryDraft,
        date: NaiveDate,
    ) -> PortResult<Entry>;

    /// Replaces the trainer note and, when given, the status.
    async fn set_entry_review(
        &self,
        id: Uuid,
        note: Option<String>,
        status: Option<EntryStatus>,
    ) -> PortResult<Entry>;

    async fn delete_entry(&self, id: Uuid) -> PortResult<()>;

    /// Entries of one apprentice within the inclusive range, newest first.
    async fn list_entries(
        &self,
        apprentice_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<Entry>>;

    /// Entries recorded for the trainer's apprentices (by `trainer_id`), newest first.
    async fn list_entries_for_trainer(
        &self,
        trainer_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<Entry>>;

    // --- Join Codes ---
    async fn get_join_code(&self, code: &str) -> PortResult<JoinCode>;

    async fn create_join_code(&self, code: JoinCode) -> PortResult<()>;

    async fn delete_join_code(&self, code: &str) -> PortResult<()>;

    async fn list_join_codes(&self) -> PortResult<Vec<JoinCode>>;
}
