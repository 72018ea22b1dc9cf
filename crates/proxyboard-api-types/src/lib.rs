//! Request and response shapes for the reverse-proxy manager control-plane API.
//!
//! Every entity is server-owned: ids and timestamps are assigned by the
//! backend, so they are optional on input and skipped when absent.

mod access;
mod audit;
mod certificates;
mod hosts;
mod kinds;
mod record;
mod session;
mod settings;
pub mod timestamp;
mod transfer;
mod users;

pub use access::{AccessList, AccessListClient, AccessListItem, ClientDirective};
pub use audit::AuditLogEntry;
pub use certificates::{Certificate, CertificateProvider};
pub use hosts::{DeadHost, HostMeta, ProxyHost, RedirectionHost, Stream};
pub use kinds::{ParseKindError, ResourceKind};
pub use record::{RecordError, ResourceRecord};
pub use session::{LoginRequest, PasswordChangeRequest, TokenResponse};
pub use settings::Setting;
pub use transfer::{EnvelopeKind, TransferEnvelope};
pub use users::{OwnerSummary, User, UserPermissions};

/// Entities carrying an owning user.
///
/// Rows without an owner report `None`; callers decide how to treat them.
pub trait Owned {
    fn owner_user_id(&self) -> Option<i64>;
}

impl<T: Owned + ?Sized> Owned for &T {
    fn owner_user_id(&self) -> Option<i64> {
        (**self).owner_user_id()
    }
}

pub(crate) fn default_true() -> bool {
    true
}
