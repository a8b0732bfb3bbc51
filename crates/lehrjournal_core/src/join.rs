//! crates/lehrjournal_core/src/join.rs
//!
//! Self-service login with a join code. The first use of a code creates the
//! apprentice account; later uses sign in to it.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::credentials::{canonical_join_code, generate_join_code, is_join_code, join_code_email};
use crate::domain::{JoinCode, Role, UserProfile};
use crate::error::{require_field, ServiceError, ServiceResult};
use crate::ports::{DocumentStore, IdentityProvider, PortError};
use crate::provisioning::store_profile_or_release;

#[derive(Debug, Clone)]
pub struct CodeLogin {
    pub uid: Uuid,
    pub profile: UserProfile,
    /// True when this call created the account.
    pub created: bool,
}

/// The apprentice profile a join code stands for.
async fn profile_from_code(
    store: &dyn DocumentStore,
    registry: &JoinCode,
    uid: Uuid,
    email: String,
) -> ServiceResult<UserProfile> {
    let company_name = match store.get_company(registry.company_id).await {
        Ok(company) => Some(company.name),
        Err(PortError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(UserProfile {
        uid,
        role: Role::Apprentice,
        name: registry.name.clone(),
        email,
        company_id: Some(registry.company_id),
        company_name,
        trainer_id: Some(registry.trainer_id),
        created_at: Utc::now(),
    })
}

pub async fn code_login(
    identity: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    apprentice_domain: &str,
    raw_code: &str,
) -> ServiceResult<CodeLogin> {
    let code = canonical_join_code(raw_code);
    if !is_join_code(&code) {
        return Err(ServiceError::invalid("Malformed code"));
    }
    let registry = store.get_join_code(&code).await.map_err(|e| match e {
        PortError::NotFound(_) => ServiceError::NotFound("Unknown code".to_string()),
        other => other.into(),
    })?;

    let email = join_code_email(&code, apprentice_domain);
    match identity.sign_in(&email, &code).await {
        Ok(uid) => {
            let profile = match store.get_profile(uid).await {
                Ok(profile) => profile,
                // An account left without a profile gets it back from the code.
                Err(PortError::NotFound(_)) => {
                    warn!(%uid, "Join-code account had no profile; restoring it");
                    let profile = profile_from_code(store, &registry, uid, email).await?;
                    store.put_profile(profile.clone()).await?;
                    profile
                }
                Err(e) => return Err(e.into()),
            };
            Ok(CodeLogin {
                uid,
                profile,
                created: false,
            })
        }
        Err(PortError::NotFound(_)) | Err(PortError::InvalidCredential) => {
            let uid = identity.create_account(&email, &code).await?;
            let profile = match profile_from_code(store, &registry, uid, email).await {
                Ok(profile) => profile,
                Err(e) => {
                    if let Err(cleanup) = identity.delete_account(uid).await {
                        warn!(%uid, error = %cleanup, "Could not remove account after failed company lookup");
                    }
                    return Err(e);
                }
            };
            store_profile_or_release(identity, store, profile.clone()).await?;
            info!(%uid, "Created apprentice account from join code");
            Ok(CodeLogin {
                uid,
                profile,
                created: true,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Attempts before giving up on finding an unused code.
const ISSUE_ATTEMPTS: usize = 5;

/// Registers a fresh code for an apprentice who has not signed in yet.
///
/// The trainer must be a trainer profile and the company must exist.
pub async fn issue_join_code(
    store: &dyn DocumentStore,
    name: &str,
    trainer_id: Uuid,
    company_id: Uuid,
) -> ServiceResult<JoinCode> {
    require_field(name, "name")?;
    match store.get_profile(trainer_id).await {
        Ok(trainer) if trainer.role == Role::Trainer => {}
        Ok(_) | Err(PortError::NotFound(_)) => {
            return Err(ServiceError::invalid(format!("{} is not a trainer", trainer_id)))
        }
        Err(e) => return Err(e.into()),
    }
    store.get_company(company_id).await.map_err(|e| match e {
        PortError::NotFound(_) => ServiceError::invalid(format!("Unknown company {}", company_id)),
        other => other.into(),
    })?;

    for _ in 0..ISSUE_ATTEMPTS {
        let code = JoinCode {
            code: generate_join_code(),
            name: name.trim().to_string(),
            trainer_id,
            company_id,
            created_at: Utc::now(),
        };
        match store.create_join_code(code.clone()).await {
            Ok(()) => {
                info!(code = %code.code, %trainer_id, "Issued join code");
                return Ok(code);
            }
            Err(PortError::AlreadyExists(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ServiceError::Internal("Could not find an unused code".to_string()))
}
