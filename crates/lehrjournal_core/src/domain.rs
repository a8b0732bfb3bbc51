//! crates/lehrjournal_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs mirror the documents kept by the `DocumentStore` port and are
//! independent of any particular database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Companies
//=========================================================================================

/// The role of an account. Fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Trainer,
    Apprentice,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Trainer => "trainer",
            Role::Apprentice => "apprentice",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "trainer" => Ok(Role::Trainer),
            "apprentice" => Ok(Role::Apprentice),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The profile document stored next to every identity account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub company_id: Option<Uuid>,
    pub company_name: Option<String>,
    /// Only set for apprentices.
    pub trainer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact: String,
    pub created_at: DateTime<Utc>,
}

/// The editable fields of a company.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDraft {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact: String,
}

//=========================================================================================
// Work-Log Entries
//=========================================================================================

/// Review state of an entry. Moves to `Reviewed` when a trainer adds a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Reviewed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Reviewed => "reviewed",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EntryStatus::Pending),
            "reviewed" => Ok(EntryStatus::Reviewed),
            other => Err(format!("unknown entry status '{}'", other)),
        }
    }
}

/// How the apprentice worked on a competency that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetencyStatus {
    #[serde(rename = "geübt")]
    Geuebt,
    #[serde(rename = "verbessert")]
    Verbessert,
}

/// One competency worked on within an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyDetail {
    pub name: String,
    pub status: CompetencyStatus,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub hours: f64,
    /// Self-rating on the Swiss 1–6 scale.
    #[serde(default)]
    pub rating: Option<u8>,
}

/// One day's work log of an apprentice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub apprentice_id: Uuid,
    pub company_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
    pub category: String,
    pub tasks: Vec<String>,
    pub task_hours: BTreeMap<String, f64>,
    pub competencies: Vec<CompetencyDetail>,
    pub date: NaiveDate,
    pub status: EntryStatus,
    pub trainer_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Hours booked on a task, zero when the task has no hours recorded.
    pub fn hours_for(&self, task: &str) -> f64 {
        self.task_hours.get(task).copied().unwrap_or(0.0)
    }
}

/// What an apprentice submits for a date. Ownership fields come from the profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub task_hours: BTreeMap<String, f64>,
    #[serde(default)]
    pub competencies: Vec<CompetencyDetail>,
}

//=========================================================================================
// Join Codes and Provisioned Accounts
//=========================================================================================

/// A registry entry that lets an apprentice create their own account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCode {
    pub code: String,
    pub name: String,
    pub trainer_id: Uuid,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The result of a provisioning call, returned once to the admin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedAccount {
    pub uid: Uuid,
    pub email: String,
    pub password: String,
}
