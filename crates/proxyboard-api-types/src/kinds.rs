use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resource families exposed by the control-plane API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ProxyHosts,
    RedirectionHosts,
    DeadHosts,
    Streams,
    AccessLists,
    Certificates,
    Users,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKindError(pub String);

impl Display for ParseKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown resource kind `{}`", self.0)
    }
}

impl std::error::Error for ParseKindError {}

impl ResourceKind {
    /// The six resources that carry per-user permission levels.
    pub const CORE: [ResourceKind; 6] = [
        Self::ProxyHosts,
        Self::RedirectionHosts,
        Self::DeadHosts,
        Self::Streams,
        Self::AccessLists,
        Self::Certificates,
    ];

    /// Returns the slug used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProxyHosts => "proxy-hosts",
            Self::RedirectionHosts => "redirection-hosts",
            Self::DeadHosts => "dead-hosts",
            Self::Streams => "streams",
            Self::AccessLists => "access-lists",
            Self::Certificates => "certificates",
            Self::Users => "users",
        }
    }

    /// Path below the API base.
    pub fn path(self) -> &'static str {
        match self {
            Self::ProxyHosts => "nginx/proxy-hosts",
            Self::RedirectionHosts => "nginx/redirection-hosts",
            Self::DeadHosts => "nginx/dead-hosts",
            Self::Streams => "nginx/streams",
            Self::AccessLists => "nginx/access-lists",
            Self::Certificates => "nginx/certificates",
            Self::Users => "users",
        }
    }

    /// Key used in the user permission map and in bundle exports.
    pub fn permission_key(self) -> &'static str {
        match self {
            Self::ProxyHosts => "proxy_hosts",
            Self::RedirectionHosts => "redirection_hosts",
            Self::DeadHosts => "dead_hosts",
            Self::Streams => "streams",
            Self::AccessLists => "access_lists",
            Self::Certificates => "certificates",
            Self::Users => "users",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::ProxyHosts => "proxy host",
            Self::RedirectionHosts => "redirection host",
            Self::DeadHosts => "404 host",
            Self::Streams => "stream",
            Self::AccessLists => "access list",
            Self::Certificates => "certificate",
            Self::Users => "user",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::ProxyHosts => "Proxy Hosts",
            Self::RedirectionHosts => "Redirection Hosts",
            Self::DeadHosts => "404 Hosts",
            Self::Streams => "Streams",
            Self::AccessLists => "Access Lists",
            Self::Certificates => "SSL Certificates",
            Self::Users => "Users",
        }
    }

    /// Relations requested with `?expand=` when listing.
    pub fn default_expand(self) -> &'static [&'static str] {
        match self {
            Self::ProxyHosts => &["owner", "access_list", "certificate"],
            Self::RedirectionHosts | Self::DeadHosts => &["owner", "certificate"],
            Self::Streams | Self::Certificates => &["owner"],
            Self::AccessLists => &["owner", "items", "clients"],
            Self::Users => &["permissions"],
        }
    }

    /// Whether the resource has `/enable` and `/disable` endpoints.
    pub fn supports_toggle(self) -> bool {
        matches!(
            self,
            Self::ProxyHosts | Self::RedirectionHosts | Self::DeadHosts | Self::Streams
        )
    }

    pub fn is_host(self) -> bool {
        matches!(
            self,
            Self::ProxyHosts | Self::RedirectionHosts | Self::DeadHosts
        )
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proxy-hosts" | "proxy_hosts" => Ok(Self::ProxyHosts),
            "redirection-hosts" | "redirection_hosts" => Ok(Self::RedirectionHosts),
            "dead-hosts" | "dead_hosts" => Ok(Self::DeadHosts),
            "streams" => Ok(Self::Streams),
            "access-lists" | "access_lists" => Ok(Self::AccessLists),
            "certificates" => Ok(Self::Certificates),
            "users" => Ok(Self::Users),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_parse_back() {
        for kind in ResourceKind::CORE {
            assert_eq!(kind.as_str().parse::<ResourceKind>(), Ok(kind));
            assert_eq!(kind.permission_key().parse::<ResourceKind>(), Ok(kind));
        }
        assert!("hosts".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn only_hosts_and_streams_toggle() {
        assert!(ResourceKind::Streams.supports_toggle());
        assert!(!ResourceKind::AccessLists.supports_toggle());
        assert!(!ResourceKind::Certificates.supports_toggle());
    }
}
