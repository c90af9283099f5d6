//! Addressing a remote sheet: by uri, by gid or by title.

use crate::error::{Result, SheetError};
use regex::Regex;
use std::fmt;

const DOCS_DOMAIN: &str = "docs.google.com";
const SPREADSHEETS_SEGMENT: &str = "spreadsheets";

fn spreadsheet_id_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)d/(.+?)/edit").expect("valid regex"))
}

fn gid_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"gid=(\d+)").expect("valid regex"))
}

/// A parsed sheet uri such as
/// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=<gid>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetUri {
    spreadsheet_id: String,
    gid: u32,
}

impl SheetUri {
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.trim().is_empty() {
            return Err(SheetError::InvalidSheetUri("uri is empty".to_string()));
        }
        if !uri.contains(DOCS_DOMAIN) {
            return Err(SheetError::InvalidSheetUri(format!(
                "'{uri}' is not a {DOCS_DOMAIN} uri"
            )));
        }
        if !uri.contains(SPREADSHEETS_SEGMENT) {
            return Err(SheetError::InvalidSheetUri(format!(
                "there is no '{SPREADSHEETS_SEGMENT}' in '{uri}'"
            )));
        }

        let spreadsheet_id = spreadsheet_id_regex()
            .captures(uri)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                SheetError::InvalidSheetUri(format!("spreadsheet id is missing in '{uri}'"))
            })?;

        let gid = gid_regex()
            .captures(uri)
            .and_then(|c| c.get(1))
            .ok_or_else(|| SheetError::InvalidSheetUri(format!("sheet gid is missing in '{uri}'")))?
            .as_str()
            .parse::<u32>()
            .map_err(|e| SheetError::InvalidSheetUri(format!("sheet gid in '{uri}': {e}")))?;

        Ok(SheetUri {
            spreadsheet_id,
            gid,
        })
    }

    #[must_use]
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    #[must_use]
    pub fn gid(&self) -> u32 {
        self.gid
    }
}

impl fmt::Display for SheetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "https://{DOCS_DOMAIN}/{SPREADSHEETS_SEGMENT}/d/{}/edit#gid={}",
            self.spreadsheet_id, self.gid
        )
    }
}

/// Which sheet to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetLocator {
    ByUri(String),
    ByGid { spreadsheet_id: String, gid: u32 },
    ByTitle { spreadsheet_id: String, title: String },
}

impl SheetLocator {
    #[must_use]
    pub fn uri(uri: &str) -> Self {
        SheetLocator::ByUri(uri.to_string())
    }

    #[must_use]
    pub fn gid(spreadsheet_id: &str, gid: u32) -> Self {
        SheetLocator::ByGid {
            spreadsheet_id: spreadsheet_id.to_string(),
            gid,
        }
    }

    #[must_use]
    pub fn title(spreadsheet_id: &str, title: &str) -> Self {
        SheetLocator::ByTitle {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: title.to_string(),
        }
    }

    /// Parse a `ByUri` locator into `ByGid`; other variants are returned as is.
    pub fn resolve(&self) -> Result<SheetLocator> {
        match self {
            SheetLocator::ByUri(uri) => {
                let parsed = SheetUri::parse(uri)?;
                Ok(SheetLocator::ByGid {
                    spreadsheet_id: parsed.spreadsheet_id,
                    gid: parsed.gid,
                })
            }
            other => Ok(other.clone()),
        }
    }
}
