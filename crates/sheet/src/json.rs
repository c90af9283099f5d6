//! JSON snapshot format for [`SheetModel`]
//!
//! A snapshot holds the sheet identity, mode, head and every row with its
//! number, status and cells:
//!
//! ```json
//! {
//!   "title": "People", "spreadsheetId": "1abc", "gid": 0,
//!   "spreadsheetTitle": "Staff", "keyName": "Id", "mode": "HeadAndKey",
//!   "head": ["Id", "Name"], "columnCount": 2,
//!   "rows": [
//!     {"number": 2, "status": "ToChange", "key": 0,
//!      "cells": [{"value": "1", "title": "Id"},
//!                {"value": "Ann", "title": "Name", "edited": true}]}
//!   ]
//! }
//! ```

use crate::cell::Cell;
use crate::error::{Result, SheetError};
use crate::row::{Row, RowStatus};
use crate::sheet::{SheetIdentity, SheetMode, SheetModel, MAX_ROW_NUMBER};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Layout of the JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatting {
    #[default]
    Compact,
    Indented,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetDocument {
    title: String,
    spreadsheet_id: String,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    spreadsheet_title: String,
    #[serde(default)]
    key_name: Option<String>,
    mode: SheetMode,
    #[serde(default)]
    head: Vec<String>,
    column_count: usize,
    rows: Vec<RowDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RowDocument {
    number: u32,
    status: RowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<usize>,
    cells: Vec<CellDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CellDocument {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    edited: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl SheetModel {
    /// Load a sheet snapshot from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Load a sheet snapshot from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_json_reader(content.as_bytes())
    }

    /// Load a sheet snapshot from a reader
    ///
    /// The document is checked for consistency (row widths, titles, key
    /// column) before any model is built.
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let document: SheetDocument = serde_json::from_reader(reader)
            .map_err(|e| SheetError::SerializationFormat(format!("Invalid JSON: {e}")))?;
        document.into_model()
    }

    /// Save the sheet snapshot to a JSON file
    pub fn save_as_json<P: AsRef<Path>>(&self, path: P, formatting: Formatting) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer, formatting)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the sheet snapshot to a writer
    pub fn write_json<W: Write>(&self, writer: W, formatting: Formatting) -> Result<()> {
        let document = SheetDocument::from_model(self);
        match formatting {
            Formatting::Compact => serde_json::to_writer(writer, &document),
            Formatting::Indented => serde_json::to_writer_pretty(writer, &document),
        }
        .map_err(|e| SheetError::SerializationFormat(format!("JSON write error: {e}")))
    }

    /// Convert the sheet snapshot to a JSON string
    pub fn to_json_string(&self, formatting: Formatting) -> Result<String> {
        let document = SheetDocument::from_model(self);
        match formatting {
            Formatting::Compact => serde_json::to_string(&document),
            Formatting::Indented => serde_json::to_string_pretty(&document),
        }
        .map_err(|e| SheetError::SerializationFormat(format!("JSON write error: {e}")))
    }
}

/// Serialize a sheet to JSON text.
pub fn serialize_sheet(sheet: &SheetModel, formatting: Formatting) -> Result<String> {
    sheet.to_json_string(formatting)
}

/// Rebuild a sheet from JSON text produced by [`serialize_sheet`].
pub fn deserialize_sheet(text: &str) -> Result<SheetModel> {
    SheetModel::from_json_str(text)
}

impl SheetDocument {
    fn from_model(sheet: &SheetModel) -> Self {
        SheetDocument {
            title: sheet.identity.title.clone(),
            spreadsheet_id: sheet.identity.spreadsheet_id.clone(),
            gid: sheet.identity.gid,
            spreadsheet_title: sheet.identity.spreadsheet_title.clone(),
            key_name: sheet.key_name.clone(),
            mode: sheet.mode,
            head: sheet.head.clone(),
            column_count: sheet.column_count,
            rows: sheet.rows.iter().map(RowDocument::from_row).collect(),
        }
    }

    fn into_model(self) -> Result<SheetModel> {
        self.validate()?;

        let identity = SheetIdentity {
            title: self.title,
            spreadsheet_id: self.spreadsheet_id,
            gid: self.gid,
            spreadsheet_title: self.spreadsheet_title,
        };
        let mut sheet = SheetModel::from_parts(
            identity,
            self.mode,
            self.key_name,
            self.head,
            self.column_count,
        );
        for row in self.rows {
            let id = sheet.alloc_id();
            let cells = row
                .cells
                .into_iter()
                .map(|c| Cell::restored(c.value, c.title, id, c.edited))
                .collect();
            sheet
                .rows
                .push(Row::restored(id, row.number, row.status, cells, row.key));
        }
        Ok(sheet)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SheetError::SerializationFormat(msg));

        if self.mode.has_head() {
            if self.head.len() != self.column_count {
                return invalid(format!(
                    "head has {} columns, columnCount is {}",
                    self.head.len(),
                    self.column_count
                ));
            }
        } else if !self.head.is_empty() {
            return invalid("a Simple sheet has no head".to_string());
        }

        let key_index = match (self.mode, self.key_name.as_deref()) {
            (SheetMode::HeadAndKey, Some(key)) => match self.head.iter().position(|h| h == key) {
                Some(index) => Some(index),
                None => return invalid(format!("key column '{key}' is not in the head")),
            },
            (SheetMode::HeadAndKey, None) => {
                return invalid("a HeadAndKey sheet needs a keyName".to_string())
            }
            (_, Some(_)) => return invalid("keyName is only valid in HeadAndKey mode".to_string()),
            (_, None) => None,
        };

        for row in &self.rows {
            if row.number == 0 {
                return invalid("row numbers start at 1".to_string());
            }
            if row.number > MAX_ROW_NUMBER {
                return invalid(format!(
                    "row number {} is above the limit of {MAX_ROW_NUMBER}",
                    row.number
                ));
            }
            if row.cells.len() != self.column_count {
                return invalid(format!(
                    "row {} has {} cells, columnCount is {}",
                    row.number,
                    row.cells.len(),
                    self.column_count
                ));
            }
            if row.key != key_index {
                return invalid(format!("row {} has a wrong key column", row.number));
            }
            for (col, cell) in row.cells.iter().enumerate() {
                if cell.title.as_ref() != self.head.get(col) {
                    return invalid(format!(
                        "row {} column {} is titled {:?}",
                        row.number,
                        col + 1,
                        cell.title
                    ));
                }
            }
        }
        Ok(())
    }
}

impl RowDocument {
    fn from_row(row: &Row) -> Self {
        RowDocument {
            number: row.number(),
            status: row.status(),
            key: row.key_index(),
            cells: row
                .cells()
                .iter()
                .map(|c| CellDocument {
                    value: c.value().to_string(),
                    title: c.title().map(str::to_string),
                    edited: c.is_edited(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mixed_sheet() -> SheetModel {
        let mut sheet = SheetModel::with_head_and_key(
            SheetIdentity::new("1abc", "People")
                .with_gid(0)
                .with_spreadsheet_title("Staff"),
            "Id",
            vec![
                vec!["Id", "Name"],
                vec!["1", "Ann"],
                vec!["2", "Bob"],
                vec!["3", "Cid"],
            ],
        )
        .unwrap();
        let second = sheet.rows()[1].id();
        let third = sheet.rows()[2].id();
        sheet.set_value(second, 1, "Bobby").unwrap();
        sheet.delete_row(third).unwrap();
        sheet.add_row(vec!["4", "Dee"]);
        sheet
    }

    #[test]
    fn test_json_roundtrip() {
        let sheet = mixed_sheet();
        let json = sheet.to_json_string(Formatting::Compact).unwrap();
        let restored = SheetModel::from_json_str(&json).unwrap();

        assert_eq!(restored, sheet);
        assert_eq!(restored.to_json_string(Formatting::Compact).unwrap(), json);
        assert_eq!(restored.rows()[1].status(), RowStatus::ToChange);
        assert!(restored.rows()[1].cell(1).unwrap().is_edited());
        assert_eq!(restored.row_by_key("4").map(Row::status), Some(RowStatus::ToAppend));
    }

    #[test]
    fn test_indented_output() {
        let sheet = mixed_sheet();
        let json = serialize_sheet(&sheet, Formatting::Indented).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"spreadsheetId\": \"1abc\""));
        assert_eq!(deserialize_sheet(&json).unwrap(), sheet);
    }

    #[test]
    fn test_restored_rows_track_edits() {
        let json = mixed_sheet().to_json_string(Formatting::Compact).unwrap();
        let mut restored = SheetModel::from_json_str(&json).unwrap();
        let first = restored.rows()[0].id();
        assert_eq!(restored.rows()[0].status(), RowStatus::Original);
        assert_eq!(restored.set_value(first, 1, "Anne").unwrap(), RowStatus::ToChange);
        assert_eq!(restored.rows()[0].cell(0).unwrap().owner(), first);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SheetModel::from_json_str("{\"title\": "),
            Err(SheetError::SerializationFormat(_))
        ));
        assert!(matches!(
            SheetModel::from_json_str("[]"),
            Err(SheetError::SerializationFormat(_))
        ));
    }

    #[test]
    fn test_inconsistent_document_rejected() {
        let json = r#"{
            "title": "T", "spreadsheetId": "s", "gid": null, "spreadsheetTitle": "",
            "keyName": null, "mode": "Head", "head": ["A", "B"], "columnCount": 2,
            "rows": [{"number": 2, "status": "Original",
                      "cells": [{"value": "1", "title": "A"}]}]
        }"#;
        assert!(matches!(
            SheetModel::from_json_str(json),
            Err(SheetError::SerializationFormat(msg)) if msg.contains("1 cells")
        ));

        let bad_key = r#"{
            "title": "T", "spreadsheetId": "s", "mode": "HeadAndKey",
            "keyName": "Id", "head": ["A"], "columnCount": 1, "rows": []
        }"#;
        assert!(matches!(
            SheetModel::from_json_str(bad_key),
            Err(SheetError::SerializationFormat(_))
        ));

        let bad_status = r#"{
            "title": "T", "spreadsheetId": "s", "mode": "Simple", "columnCount": 1,
            "rows": [{"number": 1, "status": "Gone", "cells": [{"value": "x"}]}]
        }"#;
        assert!(SheetModel::from_json_str(bad_status).is_err());
    }

    #[test]
    fn test_row_number_limit() {
        let snapshot = |number: u32| {
            format!(
                r#"{{"title": "T", "spreadsheetId": "s", "mode": "Simple", "columnCount": 1,
                    "rows": [{{"number": {number}, "status": "Original",
                               "cells": [{{"value": "x"}}]}}]}}"#
            )
        };

        assert!(matches!(
            SheetModel::from_json_str(&snapshot(u32::MAX)),
            Err(SheetError::SerializationFormat(msg)) if msg.contains("limit")
        ));

        let mut sheet = SheetModel::from_json_str(&snapshot(MAX_ROW_NUMBER)).unwrap();
        let id = sheet.add_row(vec!["y"]);
        assert_eq!(sheet.row(id).unwrap().number(), MAX_ROW_NUMBER + 1);
    }

    #[test]
    fn test_json_file_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        let sheet = mixed_sheet();

        sheet.save_as_json(&path, Formatting::Indented).unwrap();
        let loaded = SheetModel::from_json(&path).unwrap();

        assert_eq!(loaded, sheet);
    }
}
