use crate::models::{FormatPreference, MediaItem, Orientation};

/// One packed row. Every item in a row shares the row's orientation class.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_class: Orientation,
    pub items: Vec<MediaItem>,
}

impl Row {
    pub fn new(row_class: Orientation, items: Vec<MediaItem>) -> Self {
        Self { row_class, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_pano(&self) -> bool {
        self.row_class == Orientation::Pano
    }
}

/// Ordered rows for one layout pass. Rebuilt on every trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPlan {
    pub rows: Vec<Row>,
}

impl RowPlan {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    /// Items in display order.
    pub fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.rows.iter().flat_map(|row| row.items.iter())
    }

    pub fn display_rows(&self, preference: &FormatPreference) -> Vec<DisplayRow> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| DisplayRow::from_row(row_index, row, preference))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub id: String,
    pub src: Option<String>,
    pub thumbnail: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
}

/// A row as handed to a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub row_index: usize,
    pub row_class: Orientation,
    pub items: Vec<DisplayItem>,
}

impl DisplayRow {
    pub fn from_row(row_index: usize, row: &Row, preference: &FormatPreference) -> Self {
        Self {
            row_index,
            row_class: row.row_class,
            items: row
                .items
                .iter()
                .map(|item| DisplayItem {
                    id: item.id.clone(),
                    src: item.best_source(preference).map(str::to_string),
                    thumbnail: item.thumbnail.clone(),
                    alt: item.alt.clone(),
                    title: item.title.clone(),
                })
                .collect(),
        }
    }
}
