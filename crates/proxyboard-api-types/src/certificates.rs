use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{Owned, OwnerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateProvider {
    Letsencrypt,
    Other,
}

impl CertificateProvider {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Letsencrypt => "Let's Encrypt",
            Self::Other => "Custom",
        }
    }
}

impl Display for CertificateProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Letsencrypt => "letsencrypt",
            Self::Other => "other",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
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
    pub provider: CertificateProvider,
    #[serde(default)]
    pub nice_name: String,
    #[serde(default)]
    pub domain_names: Vec<String>,
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_on: Option<OffsetDateTime>,
    /// Provider-specific settings (DNS challenge credentials, agreement flags).
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Certificate {
    /// Nice name when set, otherwise the joined domain list.
    pub fn display_name(&self) -> String {
        if self.nice_name.trim().is_empty() {
            self.domain_names.join(", ")
        } else {
            self.nice_name.clone()
        }
    }
}

impl Owned for Certificate {
    fn owner_user_id(&self) -> Option<i64> {
        self.owner_user_id
    }
}
