use std::fmt::{Display, Formatter};

use serde::Serialize;
use serde_json::Value;

use crate::{
    AccessList, Certificate, DeadHost, Owned, ProxyHost, RedirectionHost, ResourceKind, Stream,
};

/// Server-assigned or denormalized keys that never travel in a create/update body.
const READ_ONLY_KEYS: &[&str] = &[
    "id",
    "created_on",
    "modified_on",
    "owner_user_id",
    "owner",
    "certificate",
    "access_list",
    "is_deleted",
    "proxy_host_count",
    "expires_on",
];

const READ_ONLY_META_KEYS: &[&str] = &["nginx_online", "nginx_err"];

#[derive(Debug)]
pub enum RecordError {
    /// Users are not part of the core resource union.
    UnsupportedKind(ResourceKind),
    Decode(serde_json::Error),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedKind(kind) => write!(f, "`{kind}` is not a core resource"),
            Self::Decode(err) => write!(f, "failed to decode record: {err}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::UnsupportedKind(_) => None,
        }
    }
}

/// Any of the six core entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceRecord {
    ProxyHost(ProxyHost),
    RedirectionHost(RedirectionHost),
    DeadHost(DeadHost),
    Stream(Stream),
    AccessList(AccessList),
    Certificate(Certificate),
}

impl ResourceRecord {
    /// Decodes a JSON entity of the given kind.
    pub fn from_value(kind: ResourceKind, value: Value) -> Result<Self, RecordError> {
        let record = match kind {
            ResourceKind::ProxyHosts => {
                Self::ProxyHost(serde_json::from_value(value).map_err(RecordError::Decode)?)
            }
            ResourceKind::RedirectionHosts => {
                Self::RedirectionHost(serde_json::from_value(value).map_err(RecordError::Decode)?)
            }
            ResourceKind::DeadHosts => {
                Self::DeadHost(serde_json::from_value(value).map_err(RecordError::Decode)?)
            }
            ResourceKind::Streams => {
                Self::Stream(serde_json::from_value(value).map_err(RecordError::Decode)?)
            }
            ResourceKind::AccessLists => {
                Self::AccessList(serde_json::from_value(value).map_err(RecordError::Decode)?)
            }
            ResourceKind::Certificates => {
                Self::Certificate(serde_json::from_value(value).map_err(RecordError::Decode)?)
            }
            ResourceKind::Users => return Err(RecordError::UnsupportedKind(kind)),
        };
        Ok(record)
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::ProxyHost(_) => ResourceKind::ProxyHosts,
            Self::RedirectionHost(_) => ResourceKind::RedirectionHosts,
            Self::DeadHost(_) => ResourceKind::DeadHosts,
            Self::Stream(_) => ResourceKind::Streams,
            Self::AccessList(_) => ResourceKind::AccessLists,
            Self::Certificate(_) => ResourceKind::Certificates,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::ProxyHost(r) => r.id,
            Self::RedirectionHost(r) => r.id,
            Self::DeadHost(r) => r.id,
            Self::Stream(r) => r.id,
            Self::AccessList(r) => r.id,
            Self::Certificate(r) => r.id,
        }
    }

    /// Domain names for hosts and certificates; empty otherwise.
    pub fn domain_names(&self) -> &[String] {
        match self {
            Self::ProxyHost(r) => &r.domain_names,
            Self::RedirectionHost(r) => &r.domain_names,
            Self::DeadHost(r) => &r.domain_names,
            Self::Certificate(r) => &r.domain_names,
            Self::Stream(_) | Self::AccessList(_) => &[],
        }
    }

    /// Short human label used in listings and import previews.
    pub fn label(&self) -> String {
        match self {
            Self::ProxyHost(_) | Self::RedirectionHost(_) | Self::DeadHost(_) => {
                self.domain_names().join(", ")
            }
            Self::Stream(r) => format!("port {}", r.incoming_port),
            Self::AccessList(r) => r.name.clone(),
            Self::Certificate(r) => r.display_name(),
        }
    }

    /// `None` for resources without an enable toggle.
    pub fn enabled(&self) -> Option<bool> {
        match self {
            Self::ProxyHost(r) => Some(r.enabled),
            Self::RedirectionHost(r) => Some(r.enabled),
            Self::DeadHost(r) => Some(r.enabled),
            Self::Stream(r) => Some(r.enabled),
            Self::AccessList(_) | Self::Certificate(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::ProxyHost(r) => serde_json::to_value(r),
            Self::RedirectionHost(r) => serde_json::to_value(r),
            Self::DeadHost(r) => serde_json::to_value(r),
            Self::Stream(r) => serde_json::to_value(r),
            Self::AccessList(r) => serde_json::to_value(r),
            Self::Certificate(r) => serde_json::to_value(r),
        };
        // Plain structs with string keys always serialize.
        value.unwrap_or(Value::Null)
    }

    /// JSON body of user-editable fields, suitable for create and update calls.
    pub fn editable_fields(&self) -> Value {
        let mut value = self.to_value();
        if let Value::Object(map) = &mut value {
            for key in READ_ONLY_KEYS {
                map.remove(*key);
            }
            if let Some(Value::Object(meta)) = map.get_mut("meta") {
                for key in READ_ONLY_META_KEYS {
                    meta.remove(*key);
                }
            }
        }
        value
    }
}

impl Owned for ResourceRecord {
    fn owner_user_id(&self) -> Option<i64> {
        match self {
            Self::ProxyHost(r) => r.owner_user_id(),
            Self::RedirectionHost(r) => r.owner_user_id(),
            Self::DeadHost(r) => r.owner_user_id(),
            Self::Stream(r) => r.owner_user_id(),
            Self::AccessList(r) => r.owner_user_id(),
            Self::Certificate(r) => r.owner_user_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editable_fields_drop_server_state() {
        let record = ResourceRecord::from_value(
            ResourceKind::ProxyHosts,
            serde_json::json!({
                "id": 9,
                "created_on": "2024-01-01T00:00:00Z",
                "owner_user_id": 1,
                "owner": {"id": 1, "email": "a@b.c", "name": "A", "nickname": "a"},
                "domain_names": ["a.example.com"],
                "forward_host": "10.0.0.5",
                "forward_port": 8080,
                "meta": {"nginx_online": true, "letsencrypt_agree": false}
            }),
        )
        .expect("record");

        let body = record.editable_fields();
        let map = body.as_object().expect("object");
        assert!(!map.contains_key("id"));
        assert!(!map.contains_key("created_on"));
        assert!(!map.contains_key("owner"));
        assert!(!map.contains_key("owner_user_id"));
        assert_eq!(map["domain_names"], serde_json::json!(["a.example.com"]));
        assert_eq!(map["meta"], serde_json::json!({"letsencrypt_agree": false}));
    }

    #[test]
    fn users_are_not_records() {
        let err = ResourceRecord::from_value(ResourceKind::Users, serde_json::json!({}))
            .expect_err("users rejected");
        assert!(matches!(err, RecordError::UnsupportedKind(ResourceKind::Users)));
    }
}
