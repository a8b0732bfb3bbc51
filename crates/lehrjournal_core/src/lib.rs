pub mod catalog;
pub mod credentials;
pub mod domain;
pub mod entries;
pub mod error;
pub mod join;
pub mod memory;
pub mod ports;
pub mod provisioning;
pub mod report;
pub mod stats;

pub use domain::{
    Company, CompanyDraft, CompetencyDetail, CompetencyStatus, Entry, EntryDraft, EntryStatus,
    JoinCode, ProvisionedAccount, Role, UserProfile,
};
pub use error::{ServiceError, ServiceResult};
pub use memory::MemoryStore;
pub use ports::{DocumentStore, IdentityProvider, PortError, PortResult};
