use crate::cell::Cell;
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a row inside one [`SheetModel`](crate::SheetModel).
///
/// Ids are handed out by the sheet that owns the row and are never reused by
/// it. They are not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) u64);

impl RowId {
    /// Raw id value
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the update side has to do with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    /// Unmodified since it was loaded.
    Original,
    /// At least one cell was edited.
    ToChange,
    /// Created locally, not sent yet.
    ToAppend,
    /// Marked for removal.
    ToDelete,
}

impl RowStatus {
    /// Status after one of the row's cells is edited.
    #[must_use]
    pub fn after_edit(self) -> RowStatus {
        match self {
            RowStatus::Original => RowStatus::ToChange,
            other => other,
        }
    }

    /// Status after the row is deleted. `None` means the row is dropped
    /// outright because it never reached the remote sheet.
    #[must_use]
    pub fn after_delete(self) -> Option<RowStatus> {
        match self {
            RowStatus::ToAppend => None,
            _ => Some(RowStatus::ToDelete),
        }
    }

    /// Whether the row carries work not yet sent remotely
    #[must_use]
    pub fn is_pending(self) -> bool {
        !matches!(self, RowStatus::Original)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RowStatus::Original => "Original",
            RowStatus::ToChange => "ToChange",
            RowStatus::ToAppend => "ToAppend",
            RowStatus::ToDelete => "ToDelete",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data row of a sheet.
#[derive(Debug, Clone)]
pub struct Row {
    id: RowId,
    number: u32,
    status: RowStatus,
    cells: Vec<Cell>,
    key: Option<usize>,
}

impl Row {
    /// Build a row of exactly `width` cells, padding with empty strings and
    /// dropping values past the width.
    pub(crate) fn build<I>(
        id: RowId,
        number: u32,
        status: RowStatus,
        data: I,
        width: usize,
        head: &[String],
        key: Option<usize>,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut values = data.into_iter().take(width).map(Into::<String>::into);
        let cells = (0..width)
            .map(|col| {
                let value = values.next().unwrap_or_default();
                Cell::new(value, head.get(col).cloned(), id)
            })
            .collect();

        Row {
            id,
            number,
            status,
            cells,
            key: key.filter(|&k| k < width),
        }
    }

    pub(crate) fn restored(
        id: RowId,
        number: u32,
        status: RowStatus,
        mut cells: Vec<Cell>,
        key: Option<usize>,
    ) -> Self {
        for cell in &mut cells {
            cell.set_owner(id);
        }
        Row {
            id,
            number,
            status,
            cells,
            key,
        }
    }

    #[must_use]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Position in the remote sheet (1-based, head row included).
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn status(&self) -> RowStatus {
        self.status
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at a column index (0-based)
    #[must_use]
    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    /// First cell whose column title matches
    #[must_use]
    pub fn cell_by_title(&self, title: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.title() == Some(title))
    }

    /// The key cell, in head-and-key sheets
    #[must_use]
    pub fn key(&self) -> Option<&Cell> {
        self.key.and_then(|k| self.cells.get(k))
    }

    #[must_use]
    pub fn key_index(&self) -> Option<usize> {
        self.key
    }

    /// Cell values in column order
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.value().to_string()).collect()
    }

    /// Set the value of a cell and return the row status that results.
    pub fn set_value<S: Into<String>>(&mut self, col: usize, value: S) -> Result<RowStatus> {
        let count = self.cells.len();
        let cell = self
            .cells
            .get_mut(col)
            .ok_or(SheetError::ColumnIndexOutOfBounds { index: col, count })?;
        cell.set_value(value.into());
        self.status = self.status.after_edit();
        Ok(self.status)
    }

    /// Set the value of the first cell under the given column title.
    pub fn set_value_by_title<S: Into<String>>(
        &mut self,
        title: &str,
        value: S,
    ) -> Result<RowStatus> {
        let col = self
            .cells
            .iter()
            .position(|c| c.title() == Some(title))
            .ok_or_else(|| SheetError::ColumnNotFound {
                name: title.to_string(),
            })?;
        self.set_value(col, value)
    }

    pub(crate) fn set_status(&mut self, status: RowStatus) {
        self.status = status;
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    /// Overwrite cells from a snapshot row. Cells edited locally keep their
    /// value unless `keep_edits` is false.
    pub(crate) fn refresh_from(&mut self, remote: &Row, keep_edits: bool) {
        for (col, cell) in self.cells.iter_mut().enumerate() {
            if keep_edits && cell.is_edited() {
                continue;
            }
            cell.refresh(remote.cell(col).map_or("", Cell::value));
        }
    }

    /// Whether every locally edited cell already holds the snapshot value.
    pub(crate) fn edits_applied(&self, remote: &Row) -> bool {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_edited())
            .all(|(col, cell)| remote.cell(col).map_or("", Cell::value) == cell.value())
    }

    pub(crate) fn same_values(&self, remote: &Row) -> bool {
        self.cells.len() == remote.cells.len()
            && self
                .cells
                .iter()
                .zip(&remote.cells)
                .all(|(a, b)| a.value() == b.value())
    }

    /// Grow the row to `width` cells, titling new cells from `head`.
    pub(crate) fn widen(&mut self, width: usize, head: &[String]) {
        while self.cells.len() < width {
            let col = self.cells.len();
            self.cells
                .push(Cell::new(String::new(), head.get(col).cloned(), self.id));
        }
    }
}

// Row ids are instance-local and take no part in equality.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.status == other.status
            && self.key == other.key
            && self.cells == other.cells
    }
}

impl Eq for Row {}
