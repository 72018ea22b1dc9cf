//! Pre-submit form checks. Nothing here touches the network.

use std::fmt::{Display, Formatter};

use proxyboard_api_types::{
    AccessList, DeadHost, ProxyHost, RedirectionHost, ResourceRecord, Stream,
};
use serde::Serialize;

const MIN_PORT: u32 = 1;
const MAX_PORT: u32 = 65_535;
const REDIRECT_CODES: &[u32] = &[300, 301, 302, 307, 308];
const FORWARD_SCHEMES: &[&str] = &["http", "https"];
const REDIRECT_SCHEMES: &[&str] = &["auto", "http", "https"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Per-field errors plus one aggregate banner via `Display`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let count = self.errors.len();
        write!(
            f,
            "{count} field{} need attention: ",
            if count == 1 { "" } else { "s" }
        )?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

fn check_domains(errors: &mut FieldErrors, domains: &[String]) {
    if domains.iter().all(|d| d.trim().is_empty()) {
        errors.push("domain_names", "at least one domain name is required");
        return;
    }
    for domain in domains {
        let domain = domain.trim();
        if domain.is_empty() {
            continue;
        }
        if domain.contains(char::is_whitespace) || domain.contains('/') {
            errors.push("domain_names", format!("`{domain}` is not a valid domain name"));
        }
    }
}

fn check_port(errors: &mut FieldErrors, field: &'static str, port: u32) {
    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        errors.push(field, format!("port must be between {MIN_PORT} and {MAX_PORT}"));
    }
}

fn check_ssl(
    errors: &mut FieldErrors,
    certificate_id: i64,
    ssl_forced: bool,
    http2_support: bool,
    hsts_enabled: bool,
    hsts_subdomains: bool,
) {
    if certificate_id > 0 {
        if hsts_subdomains && !hsts_enabled {
            errors.push("hsts_subdomains", "HSTS subdomains requires HSTS");
        }
        return;
    }
    if ssl_forced {
        errors.push("ssl_forced", "forcing SSL requires a certificate");
    }
    if http2_support {
        errors.push("http2_support", "HTTP/2 requires a certificate");
    }
    if hsts_enabled || hsts_subdomains {
        errors.push("hsts_enabled", "HSTS requires a certificate");
    }
}

pub fn validate_proxy_host(host: &ProxyHost) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_domains(&mut errors, &host.domain_names);
    if host.forward_host.trim().is_empty() {
        errors.push("forward_host", "forward hostname or IP is required");
    }
    check_port(&mut errors, "forward_port", host.forward_port);
    if !FORWARD_SCHEMES.contains(&host.forward_scheme.as_str()) {
        errors.push("forward_scheme", "scheme must be http or https");
    }
    check_ssl(
        &mut errors,
        host.certificate_id,
        host.ssl_forced,
        host.http2_support,
        host.hsts_enabled,
        host.hsts_subdomains,
    );
    errors.into_result()
}

pub fn validate_redirection_host(host: &RedirectionHost) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_domains(&mut errors, &host.domain_names);
    if host.forward_domain_name.trim().is_empty() {
        errors.push("forward_domain_name", "forward domain is required");
    }
    if !REDIRECT_SCHEMES.contains(&host.forward_scheme.as_str()) {
        errors.push("forward_scheme", "scheme must be auto, http or https");
    }
    if !REDIRECT_CODES.contains(&host.forward_http_code) {
        errors.push(
            "forward_http_code",
            "HTTP code must be one of 300, 301, 302, 307, 308",
        );
    }
    check_ssl(
        &mut errors,
        host.certificate_id,
        host.ssl_forced,
        host.http2_support,
        host.hsts_enabled,
        host.hsts_subdomains,
    );
    errors.into_result()
}

pub fn validate_dead_host(host: &DeadHost) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_domains(&mut errors, &host.domain_names);
    check_ssl(
        &mut errors,
        host.certificate_id,
        host.ssl_forced,
        host.http2_support,
        host.hsts_enabled,
        host.hsts_subdomains,
    );
    errors.into_result()
}

pub fn validate_stream(stream: &Stream) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_port(&mut errors, "incoming_port", stream.incoming_port);
    check_port(&mut errors, "forwarding_port", stream.forwarding_port);
    if stream.forwarding_host.trim().is_empty() {
        errors.push("forwarding_host", "forward host is required");
    }
    if !stream.tcp_forwarding && !stream.udp_forwarding {
        errors.push("tcp_forwarding", "enable TCP, UDP or both");
    }
    errors.into_result()
}

pub fn validate_access_list(list: &AccessList) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if list.name.trim().is_empty() {
        errors.push("name", "name is required");
    }
    if list.items.iter().any(|item| item.username.trim().is_empty()) {
        errors.push("items", "every credential needs a username");
    }
    if list.clients.iter().any(|client| client.address.trim().is_empty()) {
        errors.push("clients", "every rule needs an address");
    }
    errors.into_result()
}

/// Dispatches to the per-kind validator. Certificates are checked by the backend.
pub fn validate_record(record: &ResourceRecord) -> Result<(), FieldErrors> {
    match record {
        ResourceRecord::ProxyHost(host) => validate_proxy_host(host),
        ResourceRecord::RedirectionHost(host) => validate_redirection_host(host),
        ResourceRecord::DeadHost(host) => validate_dead_host(host),
        ResourceRecord::Stream(stream) => validate_stream(stream),
        ResourceRecord::AccessList(list) => validate_access_list(list),
        ResourceRecord::Certificate(certificate) => {
            let mut errors = FieldErrors::default();
            if certificate.domain_names.is_empty() && certificate.nice_name.trim().is_empty() {
                errors.push("domain_names", "a certificate needs domains or a name");
            }
            errors.into_result()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(port: u32) -> ProxyHost {
        ProxyHost::new(
            vec!["a.example.com".into()],
            "10.0.0.5".into(),
            port,
        )
    }

    #[test]
    fn plain_http_host_is_valid() {
        let host = host(8080);
        assert!(validate_proxy_host(&host).is_ok());
        assert_eq!(host.certificate_id, 0);
        assert!(!host.ssl_forced);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let errors = validate_proxy_host(&host(99_999)).expect_err("port rejected");
        assert_eq!(errors.len(), 1);
        assert!(errors.for_field("forward_port").is_some());
        assert!(validate_proxy_host(&host(0)).is_err());
        assert!(validate_proxy_host(&host(65_535)).is_ok());
    }

    #[test]
    fn ssl_options_require_certificate() {
        let mut host = host(443);
        host.ssl_forced = true;
        host.http2_support = true;
        let errors = validate_proxy_host(&host).expect_err("ssl rejected");
        assert!(errors.for_field("ssl_forced").is_some());
        assert!(errors.for_field("http2_support").is_some());

        host.certificate_id = 4;
        assert!(validate_proxy_host(&host).is_ok());
    }

    #[test]
    fn aggregate_message_lists_every_field() {
        let mut host = host(0);
        host.domain_names.clear();
        let errors = validate_proxy_host(&host).expect_err("invalid");
        let banner = errors.to_string();
        assert!(banner.starts_with("2 fields need attention"));
        assert!(banner.contains("domain_names"));
        assert!(banner.contains("forward_port"));
    }

    #[test]
    fn stream_needs_a_protocol() {
        let stream = Stream {
            id: 0,
            created_on: None,
            modified_on: None,
            owner_user_id: None,
            owner: None,
            incoming_port: 2222,
            forwarding_host: "git".into(),
            forwarding_port: 22,
            tcp_forwarding: false,
            udp_forwarding: false,
            enabled: true,
            meta: Default::default(),
        };
        let errors = validate_stream(&stream).expect_err("no protocol");
        assert!(errors.for_field("tcp_forwarding").is_some());
    }
}
