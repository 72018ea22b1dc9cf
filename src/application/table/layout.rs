use serde::Deserialize;

use super::columns::{Column, ColumnPriority};

/// Viewport widths, in terminal columns, at which the layout changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Breakpoints {
    pub cards_below: u16,
    pub p2_from: u16,
    pub p3_from: u16,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            cards_below: 80,
            p2_from: 110,
            p3_from: 140,
        }
    }
}

impl Breakpoints {
    pub fn is_ordered(&self) -> bool {
        self.cards_below <= self.p2_from && self.p2_from <= self.p3_from
    }
}

#[derive(Debug)]
pub enum Layout<'a, T> {
    /// One card per row showing the columns marked `show_in_card`.
    Cards(Vec<&'a Column<T>>),
    Table(Vec<&'a Column<T>>),
}

impl<'a, T> Layout<'a, T> {
    pub fn columns(&self) -> &[&'a Column<T>] {
        match self {
            Self::Cards(columns) | Self::Table(columns) => columns,
        }
    }

    pub fn is_cards(&self) -> bool {
        matches!(self, Self::Cards(_))
    }
}

pub fn layout_for_width<T>(
    columns: &[Column<T>],
    breakpoints: Breakpoints,
    width: u16,
) -> Layout<'_, T> {
    if width < breakpoints.cards_below {
        return Layout::Cards(columns.iter().filter(|c| c.show_in_card).collect());
    }
    let shown = columns
        .iter()
        .filter(|column| match column.priority {
            ColumnPriority::P1 => true,
            ColumnPriority::P2 => width >= breakpoints.p2_from,
            ColumnPriority::P3 => width >= breakpoints.p3_from,
        })
        .collect();
    Layout::Table(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::table::columns::CellValue;

    fn columns() -> Vec<Column<i64>> {
        vec![
            Column::new("id", "ID", |v: &i64| CellValue::Int(*v)).hidden_in_card(),
            Column::new("name", "Name", |v: &i64| CellValue::text(v.to_string())),
            Column::new("owner", "Owner", |_: &i64| CellValue::Empty)
                .priority(ColumnPriority::P2),
            Column::new("created", "Created", |_: &i64| CellValue::Empty)
                .priority(ColumnPriority::P3),
        ]
    }

    fn ids<T>(layout: &Layout<'_, T>) -> Vec<&'static str> {
        layout.columns().iter().map(|c| c.id).collect()
    }

    #[test]
    fn narrow_width_uses_cards() {
        let columns = columns();
        let layout = layout_for_width(&columns, Breakpoints::default(), 60);
        assert!(layout.is_cards());
        assert_eq!(ids(&layout), vec!["name", "owner", "created"]);
    }

    #[test]
    fn priorities_appear_with_width() {
        let columns = columns();
        let bp = Breakpoints::default();
        assert_eq!(ids(&layout_for_width(&columns, bp, 100)), vec!["id", "name"]);
        assert_eq!(
            ids(&layout_for_width(&columns, bp, 120)),
            vec!["id", "name", "owner"]
        );
        assert_eq!(
            ids(&layout_for_width(&columns, bp, 200)),
            vec!["id", "name", "owner", "created"]
        );
    }
}
