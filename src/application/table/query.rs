use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Filter value meaning "no constraint".
pub const FILTER_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// `column` or `column:asc|desc`.
impl FromStr for SortSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match value.split_once(':') {
            Some((column, direction)) => (column, direction.parse()?),
            None => (value, SortDirection::Asc),
        };
        let column = column.trim();
        if column.is_empty() {
            return Err("sort column must not be empty".to_string());
        }
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDef {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FilterKind,
    pub options: Vec<FilterOption>,
    pub default: String,
}

impl FilterDef {
    /// Select filter whose first option is "All".
    pub fn select(id: &'static str, label: &'static str, options: Vec<FilterOption>) -> Self {
        let mut all = vec![FilterOption::new(FILTER_ALL, "All")];
        all.extend(options);
        Self {
            id,
            label,
            kind: FilterKind::Select,
            options: all,
            default: FILTER_ALL.to_string(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }
}

/// Current value per filter id; missing ids read as [`FILTER_ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters {
    values: BTreeMap<String, String>,
}

impl ActiveFilters {
    pub fn get(&self, id: &str) -> &str {
        self.values.get(id).map_or(FILTER_ALL, String::as_str)
    }

    /// `true` when the filter constrains nothing.
    pub fn is_all(&self, id: &str) -> bool {
        self.get(id) == FILTER_ALL
    }

    fn set(&mut self, id: &str, value: &str) {
        if value == FILTER_ALL {
            self.values.remove(id);
        } else {
            self.values.insert(id.to_string(), value.to_string());
        }
    }
}

/// Search, filter, sort and page state of one table.
///
/// Every change other than the page number itself returns to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    search: String,
    filters: ActiveFilters,
    sort: Option<SortSpec>,
    page: usize,
    rows_per_page: usize,
}

impl TableQuery {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            search: String::new(),
            filters: ActiveFilters::default(),
            sort: None,
            page: 0,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &ActiveFilters {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 0;
    }

    pub fn set_filter(&mut self, id: &str, value: &str) {
        self.filters.set(id, value);
        self.page = 0;
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
        self.page = 0;
    }

    /// Clicking a header: same column flips direction, a new column starts ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        let next = match &self.sort {
            Some(current) if current.column == column => SortSpec {
                column: column.to_string(),
                direction: match current.direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => SortSpec::asc(column),
        };
        self.set_sort(Some(next));
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        self.rows_per_page = rows_per_page.max(1);
        self.page = 0;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }
}

impl Default for TableQuery {
    fn default() -> Self {
        Self::new(25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_reset_page() {
        let mut query = TableQuery::new(10);
        query.set_page(3);
        query.set_search("web");
        assert_eq!(query.page(), 0);

        query.set_page(2);
        query.set_filter("status", "online");
        assert_eq!(query.page(), 0);
        assert_eq!(query.filters().get("status"), "online");

        query.set_page(2);
        query.toggle_sort("domain");
        assert_eq!(query.page(), 0);

        query.set_page(4);
        query.set_rows_per_page(0);
        assert_eq!(query.page(), 0);
        assert_eq!(query.rows_per_page(), 1);
    }

    #[test]
    fn toggle_sort_flips_direction() {
        let mut query = TableQuery::default();
        query.toggle_sort("domain");
        assert_eq!(query.sort(), Some(&SortSpec::asc("domain")));
        query.toggle_sort("domain");
        assert_eq!(query.sort(), Some(&SortSpec::desc("domain")));
        query.toggle_sort("created");
        assert_eq!(query.sort(), Some(&SortSpec::asc("created")));
    }

    #[test]
    fn all_clears_filter() {
        let mut query = TableQuery::default();
        query.set_filter("status", "offline");
        query.set_filter("status", FILTER_ALL);
        assert!(query.filters().is_all("status"));
    }

    #[test]
    fn sort_spec_parses() {
        assert_eq!("domain".parse::<SortSpec>(), Ok(SortSpec::asc("domain")));
        assert_eq!(
            "created:desc".parse::<SortSpec>(),
            Ok(SortSpec::desc("created"))
        );
        assert!("created:sideways".parse::<SortSpec>().is_err());
        assert!(":asc".parse::<SortSpec>().is_err());
    }
}
