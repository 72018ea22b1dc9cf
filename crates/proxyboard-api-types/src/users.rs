use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Denormalized owner attached to listed entities via `expand=owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nickname: String,
}

/// Raw permission map as sent by the backend.
///
/// Values are kept as strings; the domain layer normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_hosts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirection_hosts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_hosts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_lists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificates: Option<String>,
}

impl UserPermissions {
    /// Looks up a level by its permission key (`proxy_hosts`, ...).
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "visibility" => &self.visibility,
            "proxy_hosts" => &self.proxy_hosts,
            "redirection_hosts" => &self.redirection_hosts,
            "dead_hosts" => &self.dead_hosts,
            "streams" => &self.streams,
            "access_lists" => &self.access_lists,
            "certificates" => &self.certificates,
            _ => return None,
        };
        value.as_deref()
    }

    /// Sets a level by key; returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            "visibility" => &mut self.visibility,
            "proxy_hosts" => &mut self.proxy_hosts,
            "redirection_hosts" => &mut self.redirection_hosts,
            "dead_hosts" => &mut self.dead_hosts,
            "streams" => &mut self.streams,
            "access_lists" => &mut self.access_lists,
            "certificates" => &mut self.certificates,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_on: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_on: Option<OffsetDateTime>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_permissions",
        skip_serializing_if = "Option::is_none"
    )]
    pub permissions: Option<UserPermissions>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Parses the permissions object entry by entry.
///
/// An entry that is not a string is dropped on its own so the remaining
/// levels survive; a value that is not an object reads as absent.
fn lenient_permissions<'de, D>(deserializer: D) -> Result<Option<UserPermissions>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Object(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut perms = UserPermissions::default();
    for (key, value) in entries {
        if let Value::String(level) = value {
            perms.set(&key, level);
        }
    }
    Ok(Some(perms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_permission_entry_is_dropped_alone() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 4,
            "email": "ops@example.com",
            "roles": [],
            "permissions": {"visibility": "all", "proxy_hosts": "manage", "streams": 7}
        }))
        .expect("user");
        let perms = user.permissions.expect("permissions kept");
        assert_eq!(perms.get("visibility"), Some("all"));
        assert_eq!(perms.get("proxy_hosts"), Some("manage"));
        assert_eq!(perms.get("streams"), None);
    }

    #[test]
    fn non_object_permissions_read_as_absent() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 4,
            "email": "ops@example.com",
            "permissions": "manage"
        }))
        .expect("user");
        assert!(user.permissions.is_none());
    }

    #[test]
    fn permission_keys_round_trip_through_accessors() {
        let mut perms = UserPermissions::default();
        assert!(perms.set("streams", "view"));
        assert!(!perms.set("unknown", "view"));
        assert_eq!(perms.get("streams"), Some("view"));
        assert_eq!(perms.get("certificates"), None);
    }
}
