use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Owned, OwnerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientDirective {
    Allow,
    Deny,
}

impl Display for ClientDirective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        })
    }
}

/// Basic-auth credential. The backend never returns stored passwords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessListItem {
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Address rule; evaluated by the backend in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessListClient {
    pub address: String,
    pub directive: ClientDirective,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessList {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSummary>,
    pub name: String,
    #[serde(default)]
    pub satisfy_any: bool,
    #[serde(default)]
    pub pass_auth: bool,
    #[serde(default)]
    pub items: Vec<AccessListItem>,
    #[serde(default)]
    pub clients: Vec<AccessListClient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_host_count: Option<u32>,
}

impl Owned for AccessList {
    fn owner_user_id(&self) -> Option<i64> {
        self.owner_user_id
    }
}
