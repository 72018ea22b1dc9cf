use std::collections::BTreeSet;
use std::sync::Arc;

use super::columns::Column;
use super::query::{ActiveFilters, FilterDef, SortDirection, TableQuery};

type SearchText<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
type FilterFn<T> = Arc<dyn Fn(&T, &ActiveFilters) -> bool + Send + Sync>;
type GroupKey<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Configuration of one resource table: columns, search fields, filters and
/// optional grouping. [`TableEngine::compute`] is pure.
pub struct TableEngine<T> {
    columns: Vec<Column<T>>,
    search: Vec<SearchText<T>>,
    filters: Vec<FilterDef>,
    filter_fn: Option<FilterFn<T>>,
    group_by: Option<GroupKey<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub collapsed: bool,
}

#[derive(Debug)]
pub struct ViewRow<'a, T> {
    /// Index into [`TableView::groups`] when the table is grouped.
    pub group: Option<usize>,
    pub item: &'a T,
}

#[derive(Debug)]
pub struct TableView<'a, T> {
    pub rows: Vec<ViewRow<'a, T>>,
    pub groups: Vec<GroupSummary>,
    /// Rows passing search and filters.
    pub matched: usize,
    /// Matched rows outside collapsed groups; the set pages are cut from.
    pub visible: usize,
    pub page: usize,
    pub page_count: usize,
    pub rows_per_page: usize,
}

impl<T> TableView<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// "1-25 of 40" style range, one-based; `None` for an empty page.
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.rows.is_empty() {
            return None;
        }
        let start = self.page * self.rows_per_page + 1;
        Some((start, start + self.rows.len() - 1))
    }
}

impl<T> TableEngine<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            search: Vec::new(),
            filters: Vec::new(),
            filter_fn: None,
            group_by: None,
        }
    }

    pub fn search_by(mut self, field: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.search.push(Arc::new(field));
        self
    }

    pub fn filters(
        mut self,
        filters: Vec<FilterDef>,
        predicate: impl Fn(&T, &ActiveFilters) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filters = filters;
        self.filter_fn = Some(Arc::new(predicate));
        self
    }

    pub fn group_by(mut self, key: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.group_by = Some(Arc::new(key));
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn filter_defs(&self) -> &[FilterDef] {
        &self.filters
    }

    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some()
    }

    fn matches_search(&self, row: &T, needle: &str) -> bool {
        if needle.is_empty() || self.search.is_empty() {
            return true;
        }
        self.search
            .iter()
            .any(|field| field(row).to_lowercase().contains(needle))
    }

    fn matches_filters(&self, row: &T, active: &ActiveFilters) -> bool {
        self.filter_fn
            .as_ref()
            .is_none_or(|predicate| predicate(row, active))
    }

    /// Search, filter, sort, group, then cut the requested page.
    ///
    /// Sorting is stable and a descending sort reverses the comparator, so
    /// equal keys keep their input order in both directions.
    pub fn compute<'a>(
        &self,
        data: &'a [T],
        query: &TableQuery,
        collapsed: &BTreeSet<String>,
    ) -> TableView<'a, T> {
        let needle = query.search().trim().to_lowercase();
        let mut rows: Vec<&'a T> = data
            .iter()
            .filter(|row| self.matches_search(row, &needle))
            .filter(|row| self.matches_filters(row, query.filters()))
            .collect();
        let matched = rows.len();

        if let Some(sort) = query.sort() {
            if let Some(column) = self.column(&sort.column).filter(|c| c.sortable) {
                let direction = sort.direction;
                rows.sort_by(|a, b| {
                    let ordering = column.value(a).cmp(&column.value(b));
                    match direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                });
            }
        }

        let (ordered, groups) = match &self.group_by {
            Some(key_fn) => group_rows(rows, key_fn, collapsed),
            None => (
                rows.into_iter()
                    .map(|item| ViewRow { group: None, item })
                    .collect(),
                Vec::new(),
            ),
        };

        let visible = ordered.len();
        let rows_per_page = query.rows_per_page().max(1);
        let page_count = visible.div_ceil(rows_per_page).max(1);
        let page_rows = ordered
            .into_iter()
            .skip(query.page().saturating_mul(rows_per_page))
            .take(rows_per_page)
            .collect();

        TableView {
            rows: page_rows,
            groups,
            matched,
            visible,
            page: query.page(),
            page_count,
            rows_per_page,
        }
    }
}

type Grouped<'a, T> = (Vec<ViewRow<'a, T>>, Vec<GroupSummary>);

/// Groups keep the first-seen order of their keys; rows of collapsed groups are dropped.
fn group_rows<'a, T>(
    rows: Vec<&'a T>,
    key_fn: &GroupKey<T>,
    collapsed: &BTreeSet<String>,
) -> Grouped<'a, T> {
    let mut buckets: Vec<(String, Vec<&'a T>)> = Vec::new();
    for row in rows {
        let key = key_fn(row);
        match buckets.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(row),
            None => buckets.push((key, vec![row])),
        }
    }

    let mut ordered = Vec::new();
    let mut groups = Vec::with_capacity(buckets.len());
    for (index, (key, members)) in buckets.into_iter().enumerate() {
        let is_collapsed = collapsed.contains(&key);
        groups.push(GroupSummary {
            key,
            count: members.len(),
            collapsed: is_collapsed,
        });
        if !is_collapsed {
            ordered.extend(members.into_iter().map(|item| ViewRow {
                group: Some(index),
                item,
            }));
        }
    }
    (ordered, groups)
}
