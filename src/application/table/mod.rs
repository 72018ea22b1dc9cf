//! Generic client-side table: search, filter, sort, group, paginate, select.

mod bulk;
mod columns;
mod engine;
mod layout;
mod query;
mod resources;
mod state;

pub use bulk::{
    BulkAction, BulkError, BulkOperation, BulkOutcome, BulkReport, Confirm, DisabledWhen, Selection,
    run_bulk,
};
pub use columns::{CellValue, Column, ColumnPriority};
pub use engine::{GroupSummary, TableEngine, TableView, ViewRow};
pub use layout::{Breakpoints, Layout, layout_for_width};
pub use query::{
    ActiveFilters, FILTER_ALL, FilterDef, FilterKind, FilterOption, SortDirection, SortSpec,
    TableQuery,
};
pub use resources::{DEFAULT_SORT, resource_table, user_table};
pub(crate) use resources::status_label;
pub use state::{LoadTicket, TableLoader, TableState};
