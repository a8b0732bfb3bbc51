//! crates/lehrjournal_core/src/provisioning.rs
//!
//! Admin-only account provisioning: create trainers, create apprentices,
//! delete users. Each operation creates or removes an identity account and
//! the profile document that belongs to it.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::credentials::{derive_apprentice_email, generate_password, normalize_for_email};
use crate::domain::{ProvisionedAccount, Role, UserProfile};
use crate::error::{require_field, ServiceError, ServiceResult};
use crate::ports::{DocumentStore, IdentityProvider, PortError};

/// Input of `create_trainer`. Blank strings count as missing.
#[derive(Debug, Clone, Default)]
pub struct NewTrainer {
    pub email: String,
    pub name: String,
    pub company_id: Option<Uuid>,
}

/// Input of `create_apprentice`.
#[derive(Debug, Clone, Default)]
pub struct NewApprentice {
    pub name: String,
    pub company_id: Option<Uuid>,
    pub company_name: String,
    pub trainer_id: Option<Uuid>,
}

/// Writes the profile of a freshly created account. When the write fails the
/// account is deleted again so no orphan is left behind.
pub(crate) async fn store_profile_or_release(
    identity: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    profile: UserProfile,
) -> ServiceResult<()> {
    let uid = profile.uid;
    if let Err(e) = store.put_profile(profile).await {
        if let Err(cleanup) = identity.delete_account(uid).await {
            warn!(%uid, error = %cleanup, "Could not remove account after failed profile write");
        }
        return Err(ServiceError::Internal(format!("Failed to store profile: {}", e)));
    }
    Ok(())
}

pub struct Provisioner<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn DocumentStore,
    apprentice_domain: &'a str,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        identity: &'a dyn IdentityProvider,
        store: &'a dyn DocumentStore,
        apprentice_domain: &'a str,
    ) -> Self {
        Self {
            identity,
            store,
            apprentice_domain,
        }
    }

    /// Loads the caller's profile and checks that it is an admin.
    pub async fn require_admin(&self, caller: Option<Uuid>) -> ServiceResult<UserProfile> {
        let uid = caller.ok_or_else(|| {
            ServiceError::Unauthenticated("The function must be called while authenticated.".into())
        })?;
        let profile = self.store.get_profile(uid).await.map_err(|e| match e {
            PortError::NotFound(_) => ServiceError::denied("Caller has no profile."),
            other => other.into(),
        })?;
        if !profile.is_admin() {
            warn!(caller = %uid, role = %profile.role, "Rejected provisioning call from non-admin");
            return Err(ServiceError::denied("Only admins may manage accounts."));
        }
        Ok(profile)
    }

    pub async fn create_trainer(
        &self,
        caller: Option<Uuid>,
        input: NewTrainer,
    ) -> ServiceResult<ProvisionedAccount> {
        self.require_admin(caller).await?;
        require_field(&input.email, "email")?;
        require_field(&input.name, "name")?;
        let company_id = input
            .company_id
            .ok_or_else(|| ServiceError::invalid("Missing required field: company"))?;
        let company = self.store.get_company(company_id).await.map_err(|e| match e {
            PortError::NotFound(_) => ServiceError::invalid(format!("Unknown company {}", company_id)),
            other => other.into(),
        })?;

        let email = input.email.trim().to_lowercase();
        let name = input.name.trim().to_string();
        self.provision(email, generate_password(), |uid, email| UserProfile {
            uid,
            role: Role::Trainer,
            name,
            email,
            company_id: Some(company.id),
            company_name: Some(company.name),
            trainer_id: None,
            created_at: Utc::now(),
        })
        .await
    }

    pub async fn create_apprentice(
        &self,
        caller: Option<Uuid>,
        input: NewApprentice,
    ) -> ServiceResult<ProvisionedAccount> {
        self.require_admin(caller).await?;
        require_field(&input.name, "name")?;
        require_field(&input.company_name, "companyName")?;
        if normalize_for_email(&input.name).is_empty() {
            return Err(ServiceError::invalid(
                "The name has no letters or digits usable in an email address",
            ));
        }
        let company_id = input
            .company_id
            .ok_or_else(|| ServiceError::invalid("Missing required field: company"))?;
        let trainer_id = input
            .trainer_id
            .ok_or_else(|| ServiceError::invalid("Missing required field: trainerId"))?;

        match self.store.get_profile(trainer_id).await {
            Ok(trainer) if trainer.role == Role::Trainer => {}
            Ok(_) | Err(PortError::NotFound(_)) => {
                return Err(ServiceError::invalid(format!("{} is not a trainer", trainer_id)))
            }
            Err(e) => return Err(e.into()),
        }
        self.store.get_company(company_id).await.map_err(|e| match e {
            PortError::NotFound(_) => ServiceError::invalid(format!("Unknown company {}", company_id)),
            other => other.into(),
        })?;

        let email = derive_apprentice_email(&input.name, &input.company_name, self.apprentice_domain);
        let name = input.name.trim().to_string();
        let company_name = input.company_name.trim().to_string();
        self.provision(email, generate_password(), |uid, email| UserProfile {
            uid,
            role: Role::Apprentice,
            name,
            email,
            company_id: Some(company_id),
            company_name: Some(company_name),
            trainer_id: Some(trainer_id),
            created_at: Utc::now(),
        })
        .await
    }

    /// Creates the account, then the profile.
    async fn provision(
        &self,
        email: String,
        password: String,
        profile: impl FnOnce(Uuid, String) -> UserProfile,
    ) -> ServiceResult<ProvisionedAccount> {
        let uid = self.identity.create_account(&email, &password).await?;

        let profile = profile(uid, email.clone());
        let role = profile.role;
        store_profile_or_release(self.identity, self.store, profile).await?;

        info!(%uid, %role, "Provisioned account");
        Ok(ProvisionedAccount {
            uid,
            email,
            password,
        })
    }

    /// Creates the first admin account unless an admin profile exists already.
    /// Returns the new admin's id when one was created.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> ServiceResult<Option<Uuid>> {
        if self.store.has_admin().await? {
            return Ok(None);
        }
        require_field(email, "email")?;
        require_field(password, "password")?;
        let email = email.trim().to_lowercase();
        let account = self
            .provision(email, password.to_string(), |uid, email| UserProfile {
                uid,
                role: Role::Admin,
                name: "Administrator".to_string(),
                email,
                company_id: None,
                company_name: None,
                trainer_id: None,
                created_at: Utc::now(),
            })
            .await?;
        Ok(Some(account.uid))
    }

    /// Deletes the identity account and the profile.
    pub async fn delete_user(&self, caller: Option<Uuid>, uid: Option<Uuid>) -> ServiceResult<()> {
        let admin = self.require_admin(caller).await?;
        let uid = uid.ok_or_else(|| ServiceError::invalid("Missing required field: uid"))?;
        if uid == admin.uid {
            return Err(ServiceError::invalid("Admins cannot delete their own account."));
        }

        let account = self.identity.delete_account(uid).await;
        let profile = self.store.delete_profile(uid).await;
        match (account, profile) {
            (Ok(()), Ok(())) => {
                info!(%uid, "Deleted user");
                Ok(())
            }
            (Err(PortError::NotFound(_)), Err(PortError::NotFound(_))) => {
                Err(ServiceError::NotFound(format!("User {} not found", uid)))
            }
            (account, profile) => {
                warn!(%uid, ?account, ?profile, "User deletion only partially succeeded");
                Err(ServiceError::Internal("Failed to delete user".to_string()))
            }
        }
    }
}
