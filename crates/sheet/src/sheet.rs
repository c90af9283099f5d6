use crate::error::{Result, SheetError};
use crate::row::{Row, RowId, RowStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Largest row number a snapshot may hold; a remote sheet never has more
/// rows than this.
pub(crate) const MAX_ROW_NUMBER: u32 = 10_000_000;

/// How the first row and key column of a sheet are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SheetMode {
    /// No head, every row is data.
    #[default]
    Simple,
    /// The first row names the columns.
    Head,
    /// The first row names the columns and one of them is the key.
    HeadAndKey,
}

impl SheetMode {
    #[must_use]
    pub fn has_head(self) -> bool {
        !matches!(self, SheetMode::Simple)
    }
}

/// Where a sheet lives remotely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetIdentity {
    pub title: String,
    pub spreadsheet_id: String,
    pub gid: Option<u32>,
    pub spreadsheet_title: String,
}

impl SheetIdentity {
    #[must_use]
    pub fn new(spreadsheet_id: &str, title: &str) -> Self {
        SheetIdentity {
            title: title.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            gid: None,
            spreadsheet_title: String::new(),
        }
    }

    #[must_use]
    pub fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    #[must_use]
    pub fn with_spreadsheet_title(mut self, spreadsheet_title: &str) -> Self {
        self.spreadsheet_title = spreadsheet_title.to_string();
        self
    }
}

/// In-memory copy of one remote sheet that records every local change.
///
/// Rows carry a [`RowStatus`] telling the update side what to do with them.
/// Nothing is sent anywhere implicitly; a refreshed copy is folded back in
/// with [`SheetModel::merge`].
#[derive(Debug, Clone)]
pub struct SheetModel {
    pub(crate) identity: SheetIdentity,
    pub(crate) key_name: Option<String>,
    pub(crate) mode: SheetMode,
    pub(crate) head: Vec<String>,
    pub(crate) column_count: usize,
    pub(crate) rows: Vec<Row>,
    next_id: u64,
}

impl SheetModel {
    pub(crate) fn from_parts(
        identity: SheetIdentity,
        mode: SheetMode,
        key_name: Option<String>,
        head: Vec<String>,
        column_count: usize,
    ) -> Self {
        SheetModel {
            identity,
            key_name,
            mode,
            head,
            column_count,
            rows: Vec::new(),
            next_id: 0,
        }
    }

    /// Build a sheet from raw table data, the way a freshly fetched sheet is
    /// filled. Every row is `Original`.
    ///
    /// With a head, the first row becomes the head and fixes the width.
    /// Without one, the widest row does.
    pub fn load<T: Into<String>>(
        identity: SheetIdentity,
        mode: SheetMode,
        key_name: Option<&str>,
        data: Vec<Vec<T>>,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(SheetError::EmptySheet {
                sheet: identity.title,
            });
        }

        let mut data = data.into_iter();
        let (head, column_count, rest): (Vec<String>, usize, Vec<Vec<String>>) =
            if mode.has_head() {
                let head: Vec<String> = data
                    .next()
                    .map(to_strings)
                    .unwrap_or_default();
                let width = head.len();
                (head, width, data.map(to_strings).collect())
            } else {
                let rows: Vec<Vec<String>> = data.map(to_strings).collect();
                let width = rows.iter().map(Vec::len).max().unwrap_or(0);
                (Vec::new(), width, rows)
            };

        let key_name = match mode {
            SheetMode::HeadAndKey => {
                let key = key_name.unwrap_or_default();
                if !head.iter().any(|h| h == key) {
                    return Err(SheetError::MissingKeyColumn {
                        key: key.to_string(),
                        sheet: identity.title,
                    });
                }
                Some(key.to_string())
            }
            _ => None,
        };

        let mut sheet = SheetModel::from_parts(identity, mode, key_name, head, column_count);
        let first = sheet.first_row_number();
        for (offset, values) in rest.into_iter().enumerate() {
            let number = first + offset as u32;
            sheet.push_row(number, RowStatus::Original, values);
        }
        Ok(sheet)
    }

    /// Sheet without a head. See [`SheetModel::load`].
    pub fn simple<T: Into<String>>(identity: SheetIdentity, data: Vec<Vec<T>>) -> Result<Self> {
        Self::load(identity, SheetMode::Simple, None, data)
    }

    /// Sheet whose first row is the head. See [`SheetModel::load`].
    pub fn with_head<T: Into<String>>(identity: SheetIdentity, data: Vec<Vec<T>>) -> Result<Self> {
        Self::load(identity, SheetMode::Head, None, data)
    }

    /// Sheet with a head and a key column. See [`SheetModel::load`].
    pub fn with_head_and_key<T: Into<String>>(
        identity: SheetIdentity,
        key_name: &str,
        data: Vec<Vec<T>>,
    ) -> Result<Self> {
        Self::load(identity, SheetMode::HeadAndKey, Some(key_name), data)
    }

    /// A sheet with no data rows, as returned when a sheet is created.
    ///
    /// In `Simple` mode only the length of `head` is kept, as the column
    /// count.
    pub fn empty(
        identity: SheetIdentity,
        mode: SheetMode,
        head: Vec<String>,
        key_name: Option<&str>,
    ) -> Result<Self> {
        let column_count = head.len();
        match mode {
            SheetMode::Simple => Ok(Self::from_parts(
                identity,
                mode,
                None,
                Vec::new(),
                column_count,
            )),
            SheetMode::Head => Ok(Self::from_parts(identity, mode, None, head, column_count)),
            SheetMode::HeadAndKey => {
                let key = key_name.unwrap_or_default();
                if !head.iter().any(|h| h == key) {
                    return Err(SheetError::MissingKeyColumn {
                        key: key.to_string(),
                        sheet: identity.title,
                    });
                }
                Ok(Self::from_parts(
                    identity,
                    mode,
                    Some(key.to_string()),
                    head,
                    column_count,
                ))
            }
        }
    }

    // ===== Identity =====

    #[must_use]
    pub fn identity(&self) -> &SheetIdentity {
        &self.identity
    }

    /// Sheet name
    #[must_use]
    pub fn title(&self) -> &str {
        &self.identity.title
    }

    #[must_use]
    pub fn spreadsheet_id(&self) -> &str {
        &self.identity.spreadsheet_id
    }

    /// Remote sheet id (`gid` in the sheet uri)
    #[must_use]
    pub fn gid(&self) -> Option<u32> {
        self.identity.gid
    }

    #[must_use]
    pub fn spreadsheet_title(&self) -> &str {
        &self.identity.spreadsheet_title
    }

    #[must_use]
    pub fn key_name(&self) -> Option<&str> {
        self.key_name.as_deref()
    }

    #[must_use]
    pub fn mode(&self) -> SheetMode {
        self.mode
    }

    /// Column titles; empty for `Simple` sheets
    #[must_use]
    pub fn head(&self) -> &[String] {
        &self.head
    }

    /// Width of every row
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    // ===== Rows =====

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> std::slice::IterMut<'_, Row> {
        self.rows.iter_mut()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows. The head is not counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    #[must_use]
    pub fn row_by_number(&self, number: u32) -> Option<&Row> {
        self.rows.iter().find(|r| r.number() == number)
    }

    /// First row whose key cell holds `key`. Key values are not required to
    /// be unique.
    #[must_use]
    pub fn row_by_key(&self, key: &str) -> Option<&Row> {
        self.rows
            .iter()
            .find(|r| r.key().is_some_and(|cell| cell.value() == key))
    }

    /// First row matching the predicate
    pub fn find_row<P>(&self, mut predicate: P) -> Option<&Row>
    where
        P: FnMut(&Row) -> bool,
    {
        self.rows.iter().find(|r| predicate(r))
    }

    pub fn rows_with_status(&self, status: RowStatus) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(move |r| r.status() == status)
    }

    /// Set one cell of a row and return the row status that results.
    pub fn set_value<S: Into<String>>(
        &mut self,
        id: RowId,
        col: usize,
        value: S,
    ) -> Result<RowStatus> {
        self.row_mut(id)
            .ok_or(SheetError::RowNotFound { id: id.get() })?
            .set_value(col, value)
    }

    /// Append a row to be added remotely.
    ///
    /// The row gets the next free number and exactly `column_count` cells:
    /// missing values are empty, extra values are dropped.
    pub fn add_row<I>(&mut self, data: I) -> RowId
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let data: Vec<String> = data.into_iter().map(Into::into).collect();
        if data.len() > self.column_count {
            tracing::debug!(
                sheet = %self.identity.title,
                dropped = data.len() - self.column_count,
                "row data wider than sheet, extra values dropped"
            );
        }
        let number = self.next_row_number();
        self.push_row(number, RowStatus::ToAppend, data)
    }

    /// Append an empty row to be added remotely.
    pub fn add_empty_row(&mut self) -> RowId {
        self.add_row(Vec::<String>::new())
    }

    /// Delete a row.
    ///
    /// A row that was never sent (`ToAppend`) is removed at once; any other
    /// row is marked `ToDelete` and stays until a later merge drops it.
    pub fn delete_row(&mut self, id: RowId) -> Result<()> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or(SheetError::RowNotFound { id: id.get() })?;

        match self.rows[index].status().after_delete() {
            Some(status) => self.rows[index].set_status(status),
            None => {
                self.rows.remove(index);
            }
        }
        Ok(())
    }

    /// Mark every row for deletion, dropping rows that were never sent.
    pub fn clean(&mut self) {
        self.rows.retain(|r| r.status() != RowStatus::ToAppend);
        for row in &mut self.rows {
            row.set_status(RowStatus::ToDelete);
        }
    }

    // ===== Validation =====

    /// Check that every required header is present in the head.
    ///
    /// Always succeeds for `Simple` sheets.
    pub fn check_head<I, S>(&self, required: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.mode == SheetMode::Simple {
            return Ok(());
        }

        let present: HashSet<&str> = self.head.iter().map(String::as_str).collect();
        let mut missing: Vec<String> = Vec::new();
        for header in required {
            let header = header.as_ref();
            if !present.contains(header) && !missing.iter().any(|m| m == header) {
                missing.push(header.to_string());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SheetError::MissingRequiredHeaders {
                missing,
                sheet: self.identity.title.clone(),
                spreadsheet: self.identity.spreadsheet_title.clone(),
            })
        }
    }

    /// Fail if the sheet has no data rows.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SheetError::EmptySheet {
                sheet: self.identity.title.clone(),
            });
        }
        Ok(())
    }

    // ===== Internals =====

    /// Number of the first data row; the head occupies row 1.
    pub(crate) fn first_row_number(&self) -> u32 {
        if self.mode.has_head() {
            2
        } else {
            1
        }
    }

    pub(crate) fn next_row_number(&self) -> u32 {
        self.max_row_number()
            .map_or_else(|| self.first_row_number(), |n| n.saturating_add(1))
    }

    pub(crate) fn max_row_number(&self) -> Option<u32> {
        self.rows.iter().map(Row::number).max()
    }

    pub(crate) fn key_index(&self) -> Option<usize> {
        if self.mode != SheetMode::HeadAndKey {
            return None;
        }
        let key = self.key_name.as_deref()?;
        self.head.iter().position(|h| h == key)
    }

    pub(crate) fn alloc_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn push_row<I>(&mut self, number: u32, status: RowStatus, data: I) -> RowId
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let id = self.alloc_id();
        let key = self.key_index();
        let row = Row::build(id, number, status, data, self.column_count, &self.head, key);
        self.rows.push(row);
        id
    }
}

fn to_strings<T: Into<String>>(row: Vec<T>) -> Vec<String> {
    row.into_iter().map(Into::into).collect()
}

// The id counter is instance-local and takes no part in equality.
impl PartialEq for SheetModel {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.key_name == other.key_name
            && self.mode == other.mode
            && self.head == other.head
            && self.column_count == other.column_count
            && self.rows == other.rows
    }
}

impl Eq for SheetModel {}
