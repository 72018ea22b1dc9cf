//! Table definitions for each resource screen.

use proxyboard_api_types::{OwnerSummary, ResourceKind, ResourceRecord, User};
use time::OffsetDateTime;

use super::columns::{CellValue, Column, ColumnPriority};
use super::engine::TableEngine;
use super::query::{ActiveFilters, FilterDef, FilterOption};
use crate::domain::access::AccessSummary;
use crate::domain::certificates::expiry_status;

/// Column every resource table sorts by when none is requested.
pub const DEFAULT_SORT: &str = "created";

fn created_on(record: &ResourceRecord) -> Option<OffsetDateTime> {
    match record {
        ResourceRecord::ProxyHost(r) => r.created_on,
        ResourceRecord::RedirectionHost(r) => r.created_on,
        ResourceRecord::DeadHost(r) => r.created_on,
        ResourceRecord::Stream(r) => r.created_on,
        ResourceRecord::AccessList(r) => r.created_on,
        ResourceRecord::Certificate(r) => r.created_on,
    }
}

fn owner(record: &ResourceRecord) -> Option<&OwnerSummary> {
    match record {
        ResourceRecord::ProxyHost(r) => r.owner.as_ref(),
        ResourceRecord::RedirectionHost(r) => r.owner.as_ref(),
        ResourceRecord::DeadHost(r) => r.owner.as_ref(),
        ResourceRecord::Stream(r) => r.owner.as_ref(),
        ResourceRecord::AccessList(r) => r.owner.as_ref(),
        ResourceRecord::Certificate(r) => r.owner.as_ref(),
    }
}

fn certificate_id(record: &ResourceRecord) -> i64 {
    match record {
        ResourceRecord::ProxyHost(r) => r.certificate_id,
        ResourceRecord::RedirectionHost(r) => r.certificate_id,
        ResourceRecord::DeadHost(r) => r.certificate_id,
        _ => 0,
    }
}

/// `false` only when nginx reported the host offline.
fn is_online(record: &ResourceRecord) -> bool {
    match record {
        ResourceRecord::ProxyHost(r) => r.meta.is_online(),
        ResourceRecord::RedirectionHost(r) => r.meta.is_online(),
        ResourceRecord::DeadHost(r) => r.meta.is_online(),
        ResourceRecord::Stream(r) => r.meta.is_online(),
        ResourceRecord::AccessList(_) | ResourceRecord::Certificate(_) => true,
    }
}

/// Short status word: disabled, offline or online.
pub(crate) fn status_label(record: &ResourceRecord) -> &'static str {
    match record.enabled() {
        Some(false) => "disabled",
        _ if !is_online(record) => "offline",
        _ => "online",
    }
}

fn destination(record: &ResourceRecord) -> String {
    match record {
        ResourceRecord::ProxyHost(r) => r.forward_target(),
        ResourceRecord::RedirectionHost(r) => format!(
            "{} {}://{}",
            r.forward_http_code, r.forward_scheme, r.forward_domain_name
        ),
        ResourceRecord::DeadHost(_) => "404".to_string(),
        ResourceRecord::Stream(r) => format!("{}:{}", r.forwarding_host, r.forwarding_port),
        ResourceRecord::AccessList(r) => AccessSummary::of(r).describe(),
        ResourceRecord::Certificate(r) => r.provider.display_name().to_string(),
    }
}

fn status_filter() -> FilterDef {
    FilterDef::select(
        "status",
        "Status",
        vec![
            FilterOption::new("online", "Online"),
            FilterOption::new("offline", "Offline"),
            FilterOption::new("disabled", "Disabled"),
        ],
    )
}

fn ssl_filter() -> FilterDef {
    FilterDef::select(
        "ssl",
        "SSL",
        vec![
            FilterOption::new("ssl", "With certificate"),
            FilterOption::new("plain", "Without certificate"),
        ],
    )
}

fn matches_filters(record: &ResourceRecord, active: &ActiveFilters) -> bool {
    let status = active.get("status");
    if status != super::query::FILTER_ALL && status != status_label(record) {
        return false;
    }
    match active.get("ssl") {
        "ssl" => certificate_id(record) > 0,
        "plain" => certificate_id(record) == 0,
        _ => true,
    }
}

/// Table over one core resource. Certificates are grouped by provider;
/// `now` fixes the reference point for expiry columns.
pub fn resource_table(kind: ResourceKind, now: OffsetDateTime) -> TableEngine<ResourceRecord> {
    let mut columns = vec![
        Column::new("id", "ID", |r: &ResourceRecord| CellValue::Int(r.id()))
            .priority(ColumnPriority::P3)
            .hidden_in_card(),
        Column::new("source", "Source", |r: &ResourceRecord| {
            CellValue::text(r.label())
        }),
        Column::new("destination", "Destination", |r: &ResourceRecord| {
            CellValue::text(destination(r))
        }),
    ];

    if kind.is_host() {
        columns.push(
            Column::new("ssl", "SSL", |r: &ResourceRecord| {
                CellValue::text(if certificate_id(r) > 0 { "Custom" } else { "HTTP only" })
            })
            .priority(ColumnPriority::P2),
        );
    }
    if kind.supports_toggle() {
        columns.push(Column::new("status", "Status", |r: &ResourceRecord| {
            CellValue::text(status_label(r))
        }));
    }
    if kind == ResourceKind::Certificates {
        columns.push(Column::new("expires", "Expires", move |r: &ResourceRecord| {
            match r {
                ResourceRecord::Certificate(cert) => match expiry_status(cert, now) {
                    Some((days, band)) => CellValue::text(format!("{days}d ({band})")),
                    None => CellValue::Empty,
                },
                _ => CellValue::Empty,
            }
        }));
    }

    columns.push(
        Column::new("owner", "Owner", |r: &ResourceRecord| {
            CellValue::text(owner(r).map(|o| o.name.clone()).unwrap_or_default())
        })
        .priority(ColumnPriority::P2),
    );
    columns.push(
        Column::new("created", "Created", |r: &ResourceRecord| {
            CellValue::from(created_on(r))
        })
        .priority(ColumnPriority::P3)
        .hidden_in_card(),
    );

    let engine = TableEngine::new(columns)
        .search_by(|r: &ResourceRecord| r.label())
        .search_by(destination)
        .search_by(|r: &ResourceRecord| {
            owner(r)
                .map(|o| format!("{} {}", o.name, o.email))
                .unwrap_or_default()
        });

    let mut filters = Vec::new();
    if kind.supports_toggle() {
        filters.push(status_filter());
    }
    if kind.is_host() {
        filters.push(ssl_filter());
    }
    let engine = engine.filters(filters, matches_filters);

    if kind == ResourceKind::Certificates {
        engine.group_by(|r: &ResourceRecord| match r {
            ResourceRecord::Certificate(cert) => cert.provider.display_name().to_string(),
            _ => String::new(),
        })
    } else {
        engine
    }
}

pub fn user_table() -> TableEngine<User> {
    TableEngine::new(vec![
        Column::new("id", "ID", |u: &User| CellValue::Int(u.id))
            .priority(ColumnPriority::P3)
            .hidden_in_card(),
        Column::new("name", "Name", |u: &User| CellValue::text(u.name.clone())),
        Column::new("email", "Email", |u: &User| CellValue::text(u.email.clone())),
        Column::new("roles", "Roles", |u: &User| CellValue::text(u.roles.join(", ")))
            .priority(ColumnPriority::P2),
        Column::new("status", "Status", |u: &User| {
            CellValue::text(if u.is_disabled { "disabled" } else { "active" })
        }),
        Column::new("created", "Created", |u: &User| CellValue::from(u.created_on))
            .priority(ColumnPriority::P3)
            .hidden_in_card(),
    ])
    .search_by(|u: &User| u.name.clone())
    .search_by(|u: &User| u.email.clone())
    .search_by(|u: &User| u.nickname.clone())
}
