//! Change-tracking model of a remote spreadsheet sheet
//!
//! A [`SheetModel`] is loaded from the rows of a remote sheet, optionally
//! treating the first row as a head and one column as a key. Every local
//! edit, insertion and deletion is recorded as a [`RowStatus`] on the row it
//! touches, so the pending work can be sent back as a [`ChangeSet`] and a
//! fresh snapshot can later be folded in with [`SheetModel::merge`].
//!
//! # Examples
//!
//! ## Tracking edits
//!
//! ```
//! use sheetlink_sheet::{RowStatus, SheetIdentity, SheetModel};
//!
//! let mut sheet = SheetModel::with_head_and_key(
//!     SheetIdentity::new("1abc", "People"),
//!     "Id",
//!     vec![
//!         vec!["Id", "Name"],
//!         vec!["1", "Ann"],
//!         vec!["2", "Bob"],
//!     ],
//! )
//! .unwrap();
//!
//! let bob = sheet.row_by_key("2").unwrap().id();
//! assert_eq!(sheet.set_value(bob, 1, "Bobby").unwrap(), RowStatus::ToChange);
//!
//! let dee = sheet.add_row(vec!["3", "Dee"]);
//! assert_eq!(sheet.row(dee).unwrap().number(), 4);
//! ```
//!
//! ## Merging a fresh snapshot
//!
//! ```
//! use sheetlink_sheet::{RowStatus, SheetIdentity, SheetModel};
//!
//! let identity = SheetIdentity::new("1abc", "Log").with_gid(0);
//! let mut local = SheetModel::simple(identity.clone(), vec![vec!["a"], vec!["b"]]).unwrap();
//! let first = local.rows()[0].id();
//! local.set_value(first, 0, "A").unwrap();
//!
//! let remote = SheetModel::simple(identity, vec![vec!["a"], vec!["b2"], vec!["c"]]).unwrap();
//! local.merge(&remote).unwrap();
//!
//! assert_eq!(local.rows()[0].values(), vec!["A"]);
//! assert_eq!(local.rows()[0].status(), RowStatus::ToChange);
//! assert_eq!(local.rows()[1].values(), vec!["b2"]);
//! assert_eq!(local.row_count(), 3);
//! ```
//!
//! ## Snapshots
//!
//! ```no_run
//! use sheetlink_sheet::{Formatting, SheetModel};
//!
//! let sheet = SheetModel::from_json("people.json").unwrap();
//! sheet.save_as_json("people-copy.json", Formatting::Indented).unwrap();
//! ```

mod backend;
mod cell;
mod changeset;
mod error;
mod json;
mod locator;
mod merge;
mod row;
mod sheet;

pub use backend::{CreateRequest, FetchRequest, MemoryBackend, SheetBackend};
pub use cell::Cell;
pub use changeset::{ChangeSet, RangeUpdate, RowSpan};
pub use error::{Result, SheetError};
pub use json::{deserialize_sheet, serialize_sheet, Formatting};
pub use locator::{SheetLocator, SheetUri};
pub use row::{Row, RowId, RowStatus};
pub use sheet::{SheetIdentity, SheetMode, SheetModel};
