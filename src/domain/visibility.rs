//! Row-level ownership filtering.

use proxyboard_api_types::Owned;
use serde::Serialize;

use crate::domain::permissions::{AccessPolicy, VisibilityScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibilityReport {
    pub visible_count: usize,
    pub total_count: usize,
    pub is_filtered: bool,
}

impl VisibilityReport {
    /// Banner line shown above filtered listings.
    pub fn banner(&self) -> Option<String> {
        self.is_filtered.then(|| {
            format!(
                "Showing {} of {} items (only items you own are visible)",
                self.visible_count, self.total_count
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
    scope: VisibilityScope,
    user_id: Option<i64>,
}

impl VisibilityFilter {
    pub fn new(policy: &AccessPolicy) -> Self {
        Self {
            scope: policy.visibility(),
            user_id: policy.user_id(),
        }
    }

    pub fn scope(&self) -> VisibilityScope {
        self.scope
    }

    /// Ownership check. Rows without an owner are never owned.
    pub fn owns<T: Owned + ?Sized>(&self, item: &T) -> bool {
        match (self.user_id, item.owner_user_id()) {
            (Some(me), Some(owner)) => me == owner,
            _ => false,
        }
    }

    pub fn is_visible<T: Owned + ?Sized>(&self, item: &T) -> bool {
        self.scope == VisibilityScope::All || self.owns(item)
    }

    /// Keeps the visible subset, preserving order.
    pub fn filter<T: Owned>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.scope == VisibilityScope::All {
            return items;
        }
        items.retain(|item| self.owns(item));
        items
    }

    pub fn report<T: Owned>(&self, items: &[T]) -> VisibilityReport {
        let visible_count = items.iter().filter(|item| self.is_visible(*item)).count();
        VisibilityReport {
            visible_count,
            total_count: items.len(),
            is_filtered: self.scope == VisibilityScope::User,
        }
    }
}
