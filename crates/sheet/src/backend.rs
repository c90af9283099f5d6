//! Fetch, create and update contracts for a remote spreadsheet service.
//!
//! [`MemoryBackend`] keeps spreadsheets in memory and applies updates the
//! way a remote service would, which makes it usable for tests and offline
//! tooling.

use crate::changeset::ChangeSet;
use crate::error::{Result, SheetError};
use crate::locator::SheetLocator;
use crate::sheet::{SheetIdentity, SheetMode, SheetModel};
use indexmap::IndexMap;

/// What to fetch and how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub locator: SheetLocator,
    pub mode: SheetMode,
    pub key_name: Option<String>,
    /// Checked with [`SheetModel::check_head`] after loading
    pub required_headers: Vec<String>,
}

impl FetchRequest {
    #[must_use]
    pub fn simple(locator: SheetLocator) -> Self {
        FetchRequest {
            locator,
            mode: SheetMode::Simple,
            key_name: None,
            required_headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_head(locator: SheetLocator) -> Self {
        FetchRequest {
            mode: SheetMode::Head,
            ..Self::simple(locator)
        }
    }

    #[must_use]
    pub fn with_head_and_key(locator: SheetLocator, key_name: &str) -> Self {
        FetchRequest {
            mode: SheetMode::HeadAndKey,
            key_name: Some(key_name.to_string()),
            ..Self::simple(locator)
        }
    }

    #[must_use]
    pub fn require_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_headers
            .extend(headers.into_iter().map(Into::into));
        self
    }
}

/// A new sheet to add to an existing spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub spreadsheet_id: String,
    pub title: String,
    pub mode: SheetMode,
    /// Written as the first row unless the mode is `Simple`
    pub head: Vec<String>,
    pub key_name: Option<String>,
}

impl CreateRequest {
    #[must_use]
    pub fn new(spreadsheet_id: &str, title: &str, mode: SheetMode, head: Vec<String>) -> Self {
        CreateRequest {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: title.to_string(),
            mode,
            head,
            key_name: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_name: &str) -> Self {
        self.key_name = Some(key_name.to_string());
        self
    }
}

/// A remote spreadsheet service.
pub trait SheetBackend {
    /// Fetch a sheet. Every row of the result is `Original`.
    fn fetch(&self, request: &FetchRequest) -> Result<SheetModel>;

    /// Create a sheet and return it with no data rows.
    fn create(&mut self, request: &CreateRequest) -> Result<SheetModel>;

    /// Send the pending rows of `sheet` to the service. The model itself is
    /// left as is; merge a fresh fetch to see its rows become `Original`.
    fn update(&mut self, sheet: &SheetModel) -> Result<()>;
}

#[derive(Debug, Clone)]
struct StoredSheet {
    gid: u32,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
struct StoredSpreadsheet {
    id: String,
    title: String,
    sheets: IndexMap<String, StoredSheet>,
    next_gid: u32,
}

/// Spreadsheets held in memory, keyed by spreadsheet id.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    spreadsheets: IndexMap<String, StoredSpreadsheet>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty spreadsheet, replacing any with the same id.
    pub fn add_spreadsheet(&mut self, spreadsheet_id: &str, title: &str) {
        self.spreadsheets.insert(
            spreadsheet_id.to_string(),
            StoredSpreadsheet {
                id: spreadsheet_id.to_string(),
                title: title.to_string(),
                sheets: IndexMap::new(),
                next_gid: 0,
            },
        );
    }

    /// Store raw rows as a sheet and return its gid.
    pub fn put_sheet<T: Into<String>>(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        values: Vec<Vec<T>>,
    ) -> Result<u32> {
        let spreadsheet = self.spreadsheet_mut(spreadsheet_id)?;
        let values: Vec<Vec<String>> = values
            .into_iter()
            .map(|row| row.into_iter().map(Into::<String>::into).collect())
            .collect();
        let gid = match spreadsheet.sheets.get(title) {
            Some(existing) => existing.gid,
            None => {
                let gid = spreadsheet.next_gid;
                spreadsheet.next_gid += 1;
                gid
            }
        };
        spreadsheet
            .sheets
            .insert(title.to_string(), StoredSheet { gid, values });
        Ok(gid)
    }

    /// Raw rows of a stored sheet, head included.
    #[must_use]
    pub fn values(&self, spreadsheet_id: &str, title: &str) -> Option<&[Vec<String>]> {
        self.spreadsheets
            .get(spreadsheet_id)?
            .sheets
            .get(title)
            .map(|s| s.values.as_slice())
    }

    fn spreadsheet(&self, spreadsheet_id: &str) -> Result<&StoredSpreadsheet> {
        self.spreadsheets
            .get(spreadsheet_id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound {
                id: spreadsheet_id.to_string(),
            })
    }

    fn spreadsheet_mut(&mut self, spreadsheet_id: &str) -> Result<&mut StoredSpreadsheet> {
        self.spreadsheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound {
                id: spreadsheet_id.to_string(),
            })
    }

    /// Find the stored sheet a locator points at, with its title.
    fn locate(&self, locator: &SheetLocator) -> Result<(&StoredSpreadsheet, &str, &StoredSheet)> {
        match locator.resolve()? {
            SheetLocator::ByGid {
                spreadsheet_id,
                gid,
            } => {
                let spreadsheet = self.spreadsheet(&spreadsheet_id)?;
                spreadsheet
                    .sheets
                    .iter()
                    .find(|(_, sheet)| sheet.gid == gid)
                    .map(|(title, sheet)| (spreadsheet, title.as_str(), sheet))
                    .ok_or_else(|| SheetError::SheetNotFound {
                        name: format!("gid {gid}"),
                    })
            }
            SheetLocator::ByTitle {
                spreadsheet_id,
                title,
            } => {
                let spreadsheet = self.spreadsheet(&spreadsheet_id)?;
                spreadsheet
                    .sheets
                    .get_key_value(title.as_str())
                    .map(|(title, sheet)| (spreadsheet, title.as_str(), sheet))
                    .ok_or(SheetError::SheetNotFound { name: title })
            }
            SheetLocator::ByUri(uri) => Err(SheetError::InvalidSheetUri(uri)),
        }
    }
}

impl SheetBackend for MemoryBackend {
    fn fetch(&self, request: &FetchRequest) -> Result<SheetModel> {
        let (spreadsheet, title, stored) = self.locate(&request.locator)?;
        let identity = SheetIdentity::new(&spreadsheet.id, title)
            .with_gid(stored.gid)
            .with_spreadsheet_title(&spreadsheet.title);

        let sheet = SheetModel::load(
            identity,
            request.mode,
            request.key_name.as_deref(),
            stored.values.clone(),
        )?;
        sheet.check_head(&request.required_headers)?;

        tracing::debug!(
            sheet = %title,
            gid = stored.gid,
            rows = sheet.row_count(),
            "fetched sheet"
        );
        Ok(sheet)
    }

    fn create(&mut self, request: &CreateRequest) -> Result<SheetModel> {
        let spreadsheet = self.spreadsheet_mut(&request.spreadsheet_id)?;
        if spreadsheet.sheets.contains_key(&request.title) {
            return Err(SheetError::SheetAlreadyExists {
                name: request.title.clone(),
            });
        }

        let identity = SheetIdentity::new(&request.spreadsheet_id, &request.title)
            .with_gid(spreadsheet.next_gid)
            .with_spreadsheet_title(&spreadsheet.title);
        let sheet = SheetModel::empty(
            identity,
            request.mode,
            request.head.clone(),
            request.key_name.as_deref(),
        )?;
        sheet.check_head(&request.head)?;

        let values = if request.mode.has_head() {
            vec![request.head.clone()]
        } else {
            Vec::new()
        };
        let gid = spreadsheet.next_gid;
        spreadsheet.next_gid += 1;
        spreadsheet
            .sheets
            .insert(request.title.clone(), StoredSheet { gid, values });

        tracing::debug!(sheet = %request.title, gid, "created sheet");
        Ok(sheet)
    }

    fn update(&mut self, sheet: &SheetModel) -> Result<()> {
        let changes = ChangeSet::from_sheet(sheet);
        if changes.is_empty() {
            tracing::debug!(sheet = %sheet.title(), "nothing to update");
            return Ok(());
        }

        let spreadsheet = self.spreadsheet_mut(sheet.spreadsheet_id())?;
        let stored = match sheet.gid() {
            Some(gid) => spreadsheet.sheets.values_mut().find(|s| s.gid == gid),
            None => spreadsheet.sheets.get_mut(sheet.title()),
        }
        .ok_or_else(|| SheetError::SheetNotFound {
            name: sheet.title().to_string(),
        })?;

        stored.values.extend(changes.appends.iter().cloned());

        for update in &changes.updates {
            for (offset, values) in update.values.iter().enumerate() {
                let index = (update.start_row - 1) as usize + offset;
                if stored.values.len() <= index {
                    stored.values.resize(index + 1, Vec::new());
                }
                stored.values[index] = values.clone();
            }
        }

        for span in &changes.deletions {
            let end = (span.end as usize).min(stored.values.len());
            let start = (span.start as usize).min(end);
            stored.values.drain(start..end);
        }

        tracing::debug!(
            sheet = %sheet.title(),
            appended = changes.appends.len(),
            updated_ranges = changes.updates.len(),
            deleted_ranges = changes.deletions.len(),
            "applied update"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowStatus;

    const ID: &str = "1abc";

    fn backend() -> MemoryBackend {
        let mut backend = MemoryBackend::new();
        backend.add_spreadsheet(ID, "Staff");
        backend
            .put_sheet(
                ID,
                "People",
                vec![
                    vec!["Id", "Name"],
                    vec!["1", "Ann"],
                    vec!["2", "Bob"],
                    vec!["3", "Cid"],
                ],
            )
            .unwrap();
        backend
    }

    #[test]
    fn test_fetch_by_title_and_gid() {
        let backend = backend();
        let by_title = backend
            .fetch(&FetchRequest::with_head(SheetLocator::title(ID, "People")))
            .unwrap();
        let by_gid = backend
            .fetch(&FetchRequest::with_head(SheetLocator::gid(ID, 0)))
            .unwrap();

        assert_eq!(by_title, by_gid);
        assert_eq!(by_title.spreadsheet_title(), "Staff");
        assert_eq!(by_title.gid(), Some(0));
        assert_eq!(by_title.row_count(), 3);
    }

    #[test]
    fn test_fetch_by_uri() {
        let backend = backend();
        let uri = format!("https://docs.google.com/spreadsheets/d/{ID}/edit#gid=0");
        let sheet = backend
            .fetch(&FetchRequest::with_head_and_key(SheetLocator::uri(&uri), "Id"))
            .unwrap();
        assert_eq!(sheet.row_by_key("2").map(|r| r.number()), Some(3));
    }

    #[test]
    fn test_fetch_errors() {
        let mut backend = backend();
        backend
            .put_sheet(ID, "Empty", Vec::<Vec<String>>::new())
            .unwrap();

        assert!(matches!(
            backend.fetch(&FetchRequest::simple(SheetLocator::title("nope", "People"))),
            Err(SheetError::SpreadsheetNotFound { .. })
        ));
        assert!(matches!(
            backend.fetch(&FetchRequest::simple(SheetLocator::gid(ID, 42))),
            Err(SheetError::SheetNotFound { .. })
        ));
        assert!(matches!(
            backend.fetch(&FetchRequest::simple(SheetLocator::title(ID, "Empty"))),
            Err(SheetError::EmptySheet { .. })
        ));
        assert!(matches!(
            backend.fetch(&FetchRequest::with_head_and_key(
                SheetLocator::title(ID, "People"),
                "Email"
            )),
            Err(SheetError::MissingKeyColumn { .. })
        ));
        let err = backend
            .fetch(
                &FetchRequest::with_head(SheetLocator::title(ID, "People"))
                    .require_headers(["Name", "Email", "Phone"]),
            )
            .unwrap_err();
        assert!(matches!(
            &err,
            SheetError::MissingRequiredHeaders { missing, .. } if missing == &["Email", "Phone"]
        ));
        assert!(matches!(
            backend.fetch(&FetchRequest::simple(SheetLocator::uri("asdf"))),
            Err(SheetError::InvalidSheetUri(_))
        ));
    }

    #[test]
    fn test_create() {
        let mut backend = backend();
        let head = vec!["Id".to_string(), "Title".to_string()];
        let request = CreateRequest::new(ID, "Books", SheetMode::HeadAndKey, head.clone())
            .with_key("Id");

        let sheet = backend.create(&request).unwrap();

        assert!(sheet.is_empty());
        assert_eq!(sheet.head(), head.as_slice());
        assert_eq!(sheet.gid(), Some(1));
        assert_eq!(backend.values(ID, "Books"), Some(&[head][..]));
        assert!(matches!(
            backend.create(&request),
            Err(SheetError::SheetAlreadyExists { .. })
        ));
        assert!(matches!(
            backend.create(&CreateRequest::new("nope", "X", SheetMode::Simple, Vec::new())),
            Err(SheetError::SpreadsheetNotFound { .. })
        ));
    }

    #[test]
    fn test_update_applies_pending_rows() {
        let mut backend = backend();
        let mut sheet = backend
            .fetch(&FetchRequest::with_head(SheetLocator::title(ID, "People")))
            .unwrap();
        let first = sheet.rows()[0].id();
        let second = sheet.rows()[1].id();
        sheet.set_value(first, 1, "Anna").unwrap();
        sheet.delete_row(second).unwrap();
        sheet.add_row(vec!["4", "Dee"]);

        backend.update(&sheet).unwrap();

        let expected: Vec<Vec<String>> = [["Id", "Name"], ["1", "Anna"], ["3", "Cid"], ["4", "Dee"]]
            .iter()
            .map(|r| r.iter().map(|v| (*v).to_string()).collect())
            .collect();
        assert_eq!(backend.values(ID, "People"), Some(expected.as_slice()));
        // the model is not touched by an update
        assert_eq!(sheet.row(first).unwrap().status(), RowStatus::ToChange);
    }

    #[test]
    fn test_update_unknown_sheet() {
        let mut backend = backend();
        let mut sheet =
            SheetModel::simple(SheetIdentity::new(ID, "Ghost"), vec![vec!["a"]]).unwrap();
        sheet.add_row(vec!["b"]);
        assert!(matches!(
            backend.update(&sheet),
            Err(SheetError::SheetNotFound { .. })
        ));
    }
}
