use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::ResourceKind;

/// `type` field of an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    ProxyHost,
    RedirectionHost,
    DeadHost,
    Stream,
    Certificate,
    AccessList,
    Bundle,
}

impl EnvelopeKind {
    pub fn for_resource(kind: ResourceKind) -> Option<Self> {
        match kind {
            ResourceKind::ProxyHosts => Some(Self::ProxyHost),
            ResourceKind::RedirectionHosts => Some(Self::RedirectionHost),
            ResourceKind::DeadHosts => Some(Self::DeadHost),
            ResourceKind::Streams => Some(Self::Stream),
            ResourceKind::Certificates => Some(Self::Certificate),
            ResourceKind::AccessLists => Some(Self::AccessList),
            ResourceKind::Users => None,
        }
    }

    /// `None` for bundles, which span every core resource.
    pub fn resource(self) -> Option<ResourceKind> {
        match self {
            Self::ProxyHost => Some(ResourceKind::ProxyHosts),
            Self::RedirectionHost => Some(ResourceKind::RedirectionHosts),
            Self::DeadHost => Some(ResourceKind::DeadHosts),
            Self::Stream => Some(ResourceKind::Streams),
            Self::Certificate => Some(ResourceKind::Certificates),
            Self::AccessList => Some(ResourceKind::AccessLists),
            Self::Bundle => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProxyHost => "proxy_host",
            Self::RedirectionHost => "redirection_host",
            Self::DeadHost => "dead_host",
            Self::Stream => "stream",
            Self::Certificate => "certificate",
            Self::AccessList => "access_list",
            Self::Bundle => "bundle",
        }
    }
}

impl Display for EnvelopeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import/export file: `{type, exported_at, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
    pub data: Value,
}
