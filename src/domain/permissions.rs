//! Role and permission model for the signed-in user.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use proxyboard_api_types::{ResourceKind, User, UserPermissions};
use serde::{Deserialize, Serialize};

const ADMIN_ROLE: &str = "admin";

/// Capability tier per resource, ordered from least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Hidden,
    View,
    Manage,
}

impl PermissionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::View => "view",
            Self::Manage => "manage",
        }
    }
}

impl Display for PermissionLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hidden" => Ok(Self::Hidden),
            "view" => Ok(Self::View),
            "manage" => Ok(Self::Manage),
            _ => Err(()),
        }
    }
}

/// Row-level ownership scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    All,
    User,
}

impl VisibilityScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::User => "user",
        }
    }
}

impl Display for VisibilityScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "user" => Ok(Self::User),
            _ => Err(()),
        }
    }
}

/// Normalized permission map. Every resource has a definite level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub visibility: VisibilityScope,
    pub proxy_hosts: PermissionLevel,
    pub redirection_hosts: PermissionLevel,
    pub dead_hosts: PermissionLevel,
    pub streams: PermissionLevel,
    pub access_lists: PermissionLevel,
    pub certificates: PermissionLevel,
}

impl Permissions {
    /// Nothing visible, own rows only.
    pub const NONE: Permissions = Permissions {
        visibility: VisibilityScope::User,
        proxy_hosts: PermissionLevel::Hidden,
        redirection_hosts: PermissionLevel::Hidden,
        dead_hosts: PermissionLevel::Hidden,
        streams: PermissionLevel::Hidden,
        access_lists: PermissionLevel::Hidden,
        certificates: PermissionLevel::Hidden,
    };

    pub const FULL: Permissions = Permissions {
        visibility: VisibilityScope::All,
        proxy_hosts: PermissionLevel::Manage,
        redirection_hosts: PermissionLevel::Manage,
        dead_hosts: PermissionLevel::Manage,
        streams: PermissionLevel::Manage,
        access_lists: PermissionLevel::Manage,
        certificates: PermissionLevel::Manage,
    };

    /// The only place raw permission maps are interpreted.
    ///
    /// Absent maps, absent entries and unrecognized values all fail closed:
    /// levels become `hidden` and visibility becomes `user`.
    pub fn normalize(raw: Option<&UserPermissions>) -> Self {
        let Some(raw) = raw else {
            return Self::NONE;
        };
        let level = |kind: ResourceKind| {
            raw.get(kind.permission_key())
                .and_then(|value| value.trim().parse::<PermissionLevel>().ok())
                .unwrap_or(PermissionLevel::Hidden)
        };

        Self {
            visibility: raw
                .visibility
                .as_deref()
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(VisibilityScope::User),
            proxy_hosts: level(ResourceKind::ProxyHosts),
            redirection_hosts: level(ResourceKind::RedirectionHosts),
            dead_hosts: level(ResourceKind::DeadHosts),
            streams: level(ResourceKind::Streams),
            access_lists: level(ResourceKind::AccessLists),
            certificates: level(ResourceKind::Certificates),
        }
    }

    pub fn level(&self, kind: ResourceKind) -> PermissionLevel {
        match kind {
            ResourceKind::ProxyHosts => self.proxy_hosts,
            ResourceKind::RedirectionHosts => self.redirection_hosts,
            ResourceKind::DeadHosts => self.dead_hosts,
            ResourceKind::Streams => self.streams,
            ResourceKind::AccessLists => self.access_lists,
            ResourceKind::Certificates => self.certificates,
            ResourceKind::Users => PermissionLevel::Hidden,
        }
    }

    /// Raw form accepted by `PUT /users/:id/permissions`.
    pub fn to_raw(&self) -> UserPermissions {
        let mut raw = UserPermissions {
            visibility: Some(self.visibility.as_str().to_string()),
            ..UserPermissions::default()
        };
        for kind in ResourceKind::CORE {
            raw.set(kind.permission_key(), self.level(kind).as_str());
        }
        raw
    }
}

/// Access decisions for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    user_id: Option<i64>,
    admin: bool,
    permissions: Permissions,
}

impl AccessPolicy {
    pub fn for_user(user: Option<&User>) -> Self {
        match user {
            Some(user) => {
                let admin = user.has_role(ADMIN_ROLE);
                Self {
                    user_id: Some(user.id),
                    admin,
                    permissions: if admin {
                        Permissions::FULL
                    } else {
                        Permissions::normalize(user.permissions.as_ref())
                    },
                }
            }
            None => Self::anonymous(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            admin: false,
            permissions: Permissions::NONE,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn visibility(&self) -> VisibilityScope {
        if self.admin {
            VisibilityScope::All
        } else {
            self.permissions.visibility
        }
    }

    pub fn level(&self, kind: ResourceKind) -> PermissionLevel {
        if self.admin {
            return PermissionLevel::Manage;
        }
        self.permissions.level(kind)
    }

    pub fn can_view(&self, kind: ResourceKind) -> bool {
        self.level(kind) >= PermissionLevel::View
    }

    pub fn can_manage(&self, kind: ResourceKind) -> bool {
        self.level(kind) == PermissionLevel::Manage
    }

    /// Resources the user may at least view, users last.
    pub fn visible_resources(&self) -> Vec<ResourceKind> {
        ResourceKind::CORE
            .into_iter()
            .chain([ResourceKind::Users])
            .filter(|kind| self.can_view(*kind))
            .collect()
    }

    /// Core resources the user may create and edit.
    pub fn manageable_resources(&self) -> Vec<ResourceKind> {
        ResourceKind::CORE
            .into_iter()
            .filter(|kind| self.can_manage(*kind))
            .collect()
    }
}
