use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A single rendered cell. Ordering is total so any column can be sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Int(i64),
    Time(OffsetDateTime),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Time(_) => 3,
            Self::Text(_) => 4,
        }
    }
}

impl From<Option<OffsetDateTime>> for CellValue {
    fn from(value: Option<OffsetDateTime>) -> Self {
        value.map_or(Self::Empty, Self::Time)
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            // Case-insensitive first, raw bytes break ties.
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(true) => f.write_str("yes"),
            Self::Bool(false) => f.write_str("no"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Time(value) => match value.format(&Rfc3339) {
                Ok(formatted) => f.write_str(&formatted),
                Err(_) => write!(f, "{value}"),
            },
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Responsive priority: P1 always shown, P2 and P3 only on wider layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnPriority {
    P1,
    P2,
    P3,
}

pub(crate) type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

pub struct Column<T> {
    pub id: &'static str,
    pub label: &'static str,
    pub priority: ColumnPriority,
    pub show_in_card: bool,
    pub sortable: bool,
    accessor: Accessor<T>,
}

impl<T> Column<T> {
    pub fn new(
        id: &'static str,
        label: &'static str,
        accessor: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            label,
            priority: ColumnPriority::P1,
            show_in_card: true,
            sortable: true,
            accessor: Arc::new(accessor),
        }
    }

    pub fn priority(mut self, priority: ColumnPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn hidden_in_card(mut self) -> Self {
        self.show_in_card = false;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: self.label,
            priority: self.priority,
            show_in_card: self.show_in_card,
            sortable: self.sortable,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("sortable", &self.sortable)
            .finish_non_exhaustive()
    }
}
