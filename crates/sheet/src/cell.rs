use crate::row::RowId;
use std::fmt;

/// One cell of a row.
///
/// The column title is fixed when the owning row is built. The value can only
/// be changed through [`Row`](crate::Row), which keeps the row status in step.
#[derive(Debug, Clone)]
pub struct Cell {
    value: String,
    title: Option<String>,
    owner: RowId,
    edited: bool,
}

impl Cell {
    pub(crate) fn new(value: String, title: Option<String>, owner: RowId) -> Self {
        Cell {
            value,
            title,
            owner,
            edited: false,
        }
    }

    pub(crate) fn restored(
        value: String,
        title: Option<String>,
        owner: RowId,
        edited: bool,
    ) -> Self {
        Cell {
            value,
            title,
            owner,
            edited,
        }
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Title of the column this cell belongs to
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Identifier of the row holding this cell
    #[must_use]
    pub fn owner(&self) -> RowId {
        self.owner
    }

    /// Whether the value was set locally since the row was loaded or refreshed
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub(crate) fn set_value(&mut self, value: String) {
        self.value = value;
        self.edited = true;
    }

    /// Take a value from a fresh snapshot. Clears the edited flag.
    pub(crate) fn refresh(&mut self, value: &str) {
        if self.value != value {
            self.value = value.to_string();
        }
        self.edited = false;
    }

    pub(crate) fn set_owner(&mut self, owner: RowId) {
        self.owner = owner;
    }
}

// Owner ids are local to one model instance and take no part in equality.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.title == other.title && self.edited == other.edited
    }
}

impl Eq for Cell {}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_marks_edited() {
        let mut cell = Cell::new("a".to_string(), Some("Name".to_string()), RowId(0));
        assert!(!cell.is_edited());

        cell.set_value(String::new());
        assert_eq!(cell.value(), "");
        assert!(cell.is_edited());
        assert_eq!(cell.title(), Some("Name"));
    }

    #[test]
    fn test_refresh_clears_edited() {
        let mut cell = Cell::new("a".to_string(), None, RowId(3));
        cell.set_value("b".to_string());
        cell.refresh("c");
        assert_eq!(cell.value(), "c");
        assert!(!cell.is_edited());
        assert_eq!(cell.owner(), RowId(3));
    }

    #[test]
    fn test_equality_ignores_owner() {
        let a = Cell::new("x".to_string(), None, RowId(1));
        let b = Cell::new("x".to_string(), None, RowId(7));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "x");
    }
}
