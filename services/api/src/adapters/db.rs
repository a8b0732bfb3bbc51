//! services/api/src/adapters/db.rs
//!
//! This module contains the PostgreSQL adapter, the concrete implementation of
//! the `IdentityProvider` and `DocumentStore` ports from the core crate. It
//! handles all interactions with the database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lehrjournal_core::credentials::{hash_password, verify_password};
use lehrjournal_core::domain::{
    Company, CompanyDraft, CompetencyDetail, Entry, EntryDraft, EntryStatus, JoinCode, Role,
    UserProfile,
};
use lehrjournal_core::ports::{DocumentStore, IdentityProvider, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both ports on one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(what: &str, id: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> PortError {
    let message = format!("{} {} not found", what, id);
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(message),
        other => unexpected(other),
    }
}

fn require_affected(rows: u64, what: &str, id: impl std::fmt::Display) -> PortResult<()> {
    if rows == 0 {
        return Err(PortError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    uid: Uuid,
    role: String,
    name: String,
    email: String,
    company_id: Option<Uuid>,
    company_name: Option<String>,
    trainer_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<UserProfile> {
        Ok(UserProfile {
            uid: self.uid,
            role: self.role.parse::<Role>().map_err(PortError::Unexpected)?,
            name: self.name,
            email: self.email,
            company_id: self.company_id,
            company_name: self.company_name,
            trainer_id: self.trainer_id,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CompanyRecord {
    id: Uuid,
    name: String,
    address: String,
    contact: String,
    created_at: DateTime<Utc>,
}
impl CompanyRecord {
    fn to_domain(self) -> Company {
        Company {
            id: self.id,
            name: self.name,
            address: self.address,
            contact: self.contact,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct EntryRecord {
    id: Uuid,
    apprentice_id: Uuid,
    company_id: Option<Uuid>,
    trainer_id: Option<Uuid>,
    category: String,
    tasks: Json<Vec<String>>,
    task_hours: Json<BTreeMap<String, f64>>,
    competencies: Json<Vec<CompetencyDetail>>,
    entry_date: NaiveDate,
    status: String,
    trainer_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl EntryRecord {
    fn to_domain(self) -> PortResult<Entry> {
        Ok(Entry {
            id: self.id,
            apprentice_id: self.apprentice_id,
            company_id: self.company_id,
            trainer_id: self.trainer_id,
            category: self.category,
            tasks: self.tasks.0,
            task_hours: self.task_hours.0,
            competencies: self.competencies.0,
            date: self.entry_date,
            status: self.status.parse::<EntryStatus>().map_err(PortError::Unexpected)?,
            trainer_note: self.trainer_note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct JoinCodeRecord {
    code: String,
    name: String,
    trainer_id: Uuid,
    company_id: Uuid,
    created_at: DateTime<Utc>,
}
impl JoinCodeRecord {
    fn to_domain(self) -> JoinCode {
        JoinCode {
            code: self.code,
            name: self.name,
            trainer_id: self.trainer_id,
            company_id: self.company_id,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "uid, role, name, email, company_id, company_name, trainer_id, created_at";
const ENTRY_COLUMNS: &str = "id, apprentice_id, company_id, trainer_id, category, tasks, \
     task_hours, competencies, entry_date, status, trainer_note, created_at, updated_at";

fn entries_to_domain(records: Vec<EntryRecord>) -> PortResult<Vec<Entry>> {
    records.into_iter().map(EntryRecord::to_domain).collect()
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for PgStore {
    async fn create_account(&self, email: &str, password: &str) -> PortResult<Uuid> {
        let email = email.trim().to_lowercase();
        let password_hash = hash_password(password).map_err(PortError::Unexpected)?;
        let uid = Uuid::new_v4();
        sqlx::query("INSERT INTO accounts (uid, email, password_hash) VALUES ($1, $2, $3)")
            .bind(uid)
            .bind(&email)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    PortError::AlreadyExists(format!("Account {} exists", email))
                }
                other => unexpected(other),
            })?;
        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Uuid> {
        let email = email.trim().to_lowercase();
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT uid, password_hash FROM accounts WHERE email = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        let (uid, hash) =
            row.ok_or_else(|| PortError::NotFound(format!("Account {} not found", email)))?;
        match verify_password(password, &hash) {
            Ok(true) => Ok(uid),
            Ok(false) => Err(PortError::InvalidCredential),
            Err(e) => Err(PortError::Unexpected(e)),
        }
    }

    async fn delete_account(&self, uid: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), "Account", uid)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        uid: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, uid, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(uid)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT uid FROM auth_sessions WHERE id = $1 AND expires_at > now()")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        row.map(|(uid,)| uid).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for PgStore {
    async fn get_profile(&self, uid: Uuid) -> PortResult<UserProfile> {
        let record: UserRecord =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE uid = $1", USER_COLUMNS))
                .bind(uid)
                .fetch_one(&self.pool)
                .await
                .map_err(not_found("User", uid))?;
        record.to_domain()
    }

    async fn put_profile(&self, profile: UserProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (uid, role, name, email, company_id, company_name, trainer_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (uid) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, \
             company_id = EXCLUDED.company_id, company_name = EXCLUDED.company_name, \
             trainer_id = EXCLUDED.trainer_id",
        )
        .bind(profile.uid)
        .bind(profile.role.as_str())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(profile.company_id)
        .bind(&profile.company_name)
        .bind(profile.trainer_id)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_profile(&self, uid: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), "User", uid)
    }

    async fn list_profiles(&self, role: Option<Role>) -> PortResult<Vec<UserProfile>> {
        let records: Vec<UserRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY name",
            USER_COLUMNS
        ))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn list_apprentices_of(&self, trainer_id: Uuid) -> PortResult<Vec<UserProfile>> {
        let records: Vec<UserRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE role = 'apprentice' AND trainer_id = $1 ORDER BY name",
            USER_COLUMNS
        ))
        .bind(trainer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn has_admin(&self) -> PortResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(exists)
    }

    async fn create_company(&self, draft: CompanyDraft) -> PortResult<Company> {
        let record: CompanyRecord = sqlx::query_as(
            "INSERT INTO companies (id, name, address, contact) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, address, contact, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(draft.name)
        .bind(draft.address)
        .bind(draft.contact)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_company(&self, id: Uuid) -> PortResult<Company> {
        let record: CompanyRecord = sqlx::query_as(
            "SELECT id, name, address, contact, created_at FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Company", id))?;
        Ok(record.to_domain())
    }

    async fn update_company(&self, id: Uuid, draft: CompanyDraft) -> PortResult<Company> {
        let record: CompanyRecord = sqlx::query_as(
            "UPDATE companies SET name = $2, address = $3, contact = $4 WHERE id = $1 \
             RETURNING id, name, address, contact, created_at",
        )
        .bind(id)
        .bind(draft.name)
        .bind(draft.address)
        .bind(draft.contact)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Company", id))?;
        Ok(record.to_domain())
    }

    async fn delete_company(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), "Company", id)
    }

    async fn list_companies(&self) -> PortResult<Vec<Company>> {
        let records: Vec<CompanyRecord> = sqlx::query_as(
            "SELECT id, name, address, contact, created_at FROM companies ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(CompanyRecord::to_domain).collect())
    }

    async fn get_entry(&self, id: Uuid) -> PortResult<Entry> {
        let record: EntryRecord =
            sqlx::query_as(&format!("SELECT {} FROM entries WHERE id = $1", ENTRY_COLUMNS))
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(not_found("Entry", id))?;
        record.to_domain()
    }

    async fn upsert_entry(
        &self,
        apprentice: &UserProfile,
        draft: &EntryDraft,
        date: NaiveDate,
    ) -> PortResult<Entry> {
        // The unique (apprentice_id, entry_date) index turns a second
        // submission for the same day into an update.
        let record: EntryRecord = sqlx::query_as(&format!(
            "INSERT INTO entries (id, apprentice_id, company_id, trainer_id, category, tasks, \
             task_hours, competencies, entry_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (apprentice_id, entry_date) DO UPDATE SET \
             company_id = EXCLUDED.company_id, trainer_id = EXCLUDED.trainer_id, \
             category = EXCLUDED.category, tasks = EXCLUDED.tasks, \
             task_hours = EXCLUDED.task_hours, competencies = EXCLUDED.competencies, \
             updated_at = now() \
             RETURNING {}",
            ENTRY_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(apprentice.uid)
        .bind(apprentice.company_id)
        .bind(apprentice.trainer_id)
        .bind(&draft.category)
        .bind(Json(&draft.tasks))
        .bind(Json(&draft.task_hours))
        .bind(Json(&draft.competencies))
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn set_entry_review(
        &self,
        id: Uuid,
        note: Option<String>,
        status: Option<EntryStatus>,
    ) -> PortResult<Entry> {
        let record: EntryRecord = sqlx::query_as(&format!(
            "UPDATE entries SET trainer_note = $2, status = COALESCE($3, status), \
             updated_at = now() WHERE id = $1 RETURNING {}",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .bind(note)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Entry", id))?;
        record.to_domain()
    }

    async fn delete_entry(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), "Entry", id)
    }

    async fn list_entries(
        &self,
        apprentice_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<Entry>> {
        let records: Vec<EntryRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM entries WHERE apprentice_id = $1 \
             AND ($2::DATE IS NULL OR entry_date >= $2) \
             AND ($3::DATE IS NULL OR entry_date <= $3) \
             ORDER BY entry_date DESC",
            ENTRY_COLUMNS
        ))
        .bind(apprentice_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        entries_to_domain(records)
    }

    async fn list_entries_for_trainer(
        &self,
        trainer_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<Entry>> {
        let records: Vec<EntryRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM entries WHERE trainer_id = $1 \
             AND ($2::DATE IS NULL OR entry_date >= $2) \
             AND ($3::DATE IS NULL OR entry_date <= $3) \
             ORDER BY entry_date DESC",
            ENTRY_COLUMNS
        ))
        .bind(trainer_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        entries_to_domain(records)
    }

    async fn get_join_code(&self, code: &str) -> PortResult<JoinCode> {
        let record: JoinCodeRecord = sqlx::query_as(
            "SELECT code, name, trainer_id, company_id, created_at FROM apprentice_codes WHERE code = $1",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Code", code))?;
        Ok(record.to_domain())
    }

    async fn create_join_code(&self, code: JoinCode) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO apprentice_codes (code, name, trainer_id, company_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&code.code)
        .bind(&code.name)
        .bind(code.trainer_id)
        .bind(code.company_id)
        .bind(code.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::AlreadyExists(format!("Code {} exists", code.code))
            }
            other => unexpected(other),
        })?;
        Ok(())
    }

    async fn delete_join_code(&self, code: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM apprentice_codes WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), "Code", code)
    }

    async fn list_join_codes(&self) -> PortResult<Vec<JoinCode>> {
        let records: Vec<JoinCodeRecord> = sqlx::query_as(
            "SELECT code, name, trainer_id, company_id, created_at FROM apprentice_codes ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(JoinCodeRecord::to_domain).collect())
    }
}
