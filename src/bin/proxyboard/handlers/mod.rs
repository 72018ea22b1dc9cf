#![deny(clippy::all, clippy::pedantic)]

pub mod access_lists;
pub mod audit;
pub mod bulk;
pub mod certificates;
pub mod dashboard;
pub mod resources;
pub mod search;
pub mod session;
pub mod settings;
pub mod transfer;
pub mod users;

use std::collections::BTreeSet;

use proxyboard::application::table::{DEFAULT_SORT, SortSpec, TableEngine, TableQuery};

use crate::args::ListArgs;
use crate::client::CliError;
use crate::io::parse_filter;

/// Turns listing flags into a query, rejecting unknown filters and sort columns.
pub(crate) fn build_query<T>(
    engine: &TableEngine<T>,
    args: &ListArgs,
    rows_per_page: usize,
) -> Result<TableQuery, CliError> {
    let mut query = TableQuery::new(rows_per_page);
    if let Some(search) = args.search.as_deref() {
        query.set_search(search);
    }

    for raw in &args.filters {
        let (id, value) = parse_filter(raw)?;
        let def = engine
            .filter_defs()
            .iter()
            .find(|def| def.id == id)
            .ok_or_else(|| CliError::InvalidInput(format!("unknown filter `{id}`")))?;
        if !def.accepts(value) {
            let options: Vec<&str> = def.options.iter().map(|o| o.value.as_str()).collect();
            return Err(CliError::InvalidInput(format!(
                "filter `{id}` accepts {}",
                options.join("|")
            )));
        }
        query.set_filter(def.id, value);
    }

    let sort = match args.sort.as_deref() {
        Some(raw) => raw.parse::<SortSpec>().map_err(CliError::InvalidInput)?,
        None => SortSpec::asc(DEFAULT_SORT),
    };
    match engine.column(&sort.column) {
        Some(column) if column.sortable => query.set_sort(Some(sort)),
        _ if args.sort.is_none() => {}
        _ => {
            return Err(CliError::InvalidInput(format!(
                "cannot sort by `{}`",
                sort.column
            )));
        }
    }

    if args.page == 0 {
        return Err(CliError::InvalidInput("pages start at 1".into()));
    }
    query.set_page(args.page - 1);
    Ok(query)
}

pub(crate) fn collapsed_groups(args: &ListArgs) -> BTreeSet<String> {
    args.collapsed.iter().cloned().collect()
}
