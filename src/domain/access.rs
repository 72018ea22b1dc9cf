//! Access-list presentation rules.
//!
//! Rule evaluation itself belongs to the backend; the client only describes
//! it and keeps client rules in the order they were entered.

use proxyboard_api_types::{AccessList, AccessListClient, ClientDirective};

/// Human description of the satisfy mode.
pub fn satisfy_description(satisfy_any: bool) -> &'static str {
    if satisfy_any {
        "Access granted if ANY rule matches"
    } else {
        "Access granted if ALL rules match"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessSummary {
    pub users: usize,
    pub allow_rules: usize,
    pub deny_rules: usize,
}

impl AccessSummary {
    pub fn of(list: &AccessList) -> Self {
        let allow_rules = list
            .clients
            .iter()
            .filter(|c| c.directive == ClientDirective::Allow)
            .count();
        Self {
            users: list.items.len(),
            allow_rules,
            deny_rules: list.clients.len() - allow_rules,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} user{}, {} rule{}",
            self.users,
            if self.users == 1 { "" } else { "s" },
            self.allow_rules + self.deny_rules,
            if self.allow_rules + self.deny_rules == 1 { "" } else { "s" },
        )
    }
}

/// Replaces a client rule in place. Positions of the others do not move.
pub fn replace_client(
    clients: &mut [AccessListClient],
    index: usize,
    client: AccessListClient,
) -> bool {
    match clients.get_mut(index) {
        Some(slot) => {
            *slot = client;
            true
        }
        None => false,
    }
}

/// Renders clients in evaluation order, `allow 10.0.0.0/8`.
pub fn describe_clients(clients: &[AccessListClient]) -> Vec<String> {
    clients
        .iter()
        .map(|c| format!("{} {}", c.directive, c.address))
        .collect()
}
