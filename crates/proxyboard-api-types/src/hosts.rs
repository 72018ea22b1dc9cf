use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{AccessList, Certificate, Owned, OwnerSummary, default_true};

/// Backend-reported state attached to hosts. Read-only from the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nginx_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nginx_err: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HostMeta {
    /// `false` only when nginx explicitly reported the host offline.
    pub fn is_online(&self) -> bool {
        self.nginx_online.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyHost {
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
    pub domain_names: Vec<String>,
    pub forward_host: String,
    pub forward_port: u32,
    #[serde(default = "default_scheme")]
    pub forward_scheme: String,
    #[serde(default)]
    pub certificate_id: i64,
    #[serde(default)]
    pub ssl_forced: bool,
    #[serde(default)]
    pub hsts_enabled: bool,
    #[serde(default)]
    pub hsts_subdomains: bool,
    #[serde(default)]
    pub http2_support: bool,
    #[serde(default)]
    pub caching_enabled: bool,
    #[serde(default)]
    pub block_exploits: bool,
    #[serde(default)]
    pub allow_websocket_upgrade: bool,
    #[serde(default)]
    pub access_list_id: i64,
    #[serde(default)]
    pub advanced_config: String,
    #[serde(default)]
    pub locations: Vec<Value>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub meta: HostMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Box<AccessList>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Box<Certificate>>,
}

impl ProxyHost {
    /// A blank host with the form defaults (no certificate, public access).
    pub fn new(domain_names: Vec<String>, forward_host: String, forward_port: u32) -> Self {
        Self {
            id: 0,
            created_on: None,
            modified_on: None,
            owner_user_id: None,
            owner: None,
            domain_names,
            forward_host,
            forward_port,
            forward_scheme: default_scheme(),
            certificate_id: 0,
            ssl_forced: false,
            hsts_enabled: false,
            hsts_subdomains: false,
            http2_support: false,
            caching_enabled: false,
            block_exploits: false,
            allow_websocket_upgrade: false,
            access_list_id: 0,
            advanced_config: String::new(),
            locations: Vec::new(),
            enabled: true,
            meta: HostMeta::default(),
            access_list: None,
            certificate: None,
        }
    }

    /// `scheme://host:port` of the upstream.
    pub fn forward_target(&self) -> String {
        format!(
            "{}://{}:{}",
            self.forward_scheme, self.forward_host, self.forward_port
        )
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_redirect_scheme() -> String {
    "auto".to_string()
}

fn default_http_code() -> u32 {
    301
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectionHost {
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
    pub domain_names: Vec<String>,
    pub forward_domain_name: String,
    #[serde(default = "default_redirect_scheme")]
    pub forward_scheme: String,
    #[serde(default = "default_http_code")]
    pub forward_http_code: u32,
    #[serde(default)]
    pub preserve_path: bool,
    #[serde(default)]
    pub block_exploits: bool,
    #[serde(default)]
    pub certificate_id: i64,
    #[serde(default)]
    pub ssl_forced: bool,
    #[serde(default)]
    pub hsts_enabled: bool,
    #[serde(default)]
    pub hsts_subdomains: bool,
    #[serde(default)]
    pub http2_support: bool,
    #[serde(default)]
    pub advanced_config: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub meta: HostMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Box<Certificate>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadHost {
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
    pub domain_names: Vec<String>,
    #[serde(default)]
    pub certificate_id: i64,
    #[serde(default)]
    pub ssl_forced: bool,
    #[serde(default)]
    pub hsts_enabled: bool,
    #[serde(default)]
    pub hsts_subdomains: bool,
    #[serde(default)]
    pub http2_support: bool,
    #[serde(default)]
    pub advanced_config: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub meta: HostMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Box<Certificate>>,
}

/// TCP/UDP port forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
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
    pub incoming_port: u32,
    pub forwarding_host: String,
    pub forwarding_port: u32,
    #[serde(default = "default_true")]
    pub tcp_forwarding: bool,
    #[serde(default)]
    pub udp_forwarding: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub meta: HostMeta,
}

macro_rules! impl_owned {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Owned for $ty {
                fn owner_user_id(&self) -> Option<i64> {
                    self.owner_user_id
                }
            }
        )+
    };
}

impl_owned!(ProxyHost, RedirectionHost, DeadHost, Stream);
