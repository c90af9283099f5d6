//! Pending row statuses turned into the batches an update sends remotely.

use crate::row::{Row, RowStatus};
use crate::sheet::SheetModel;

/// Values to write over a run of consecutive rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeUpdate {
    /// A1 start of the run, e.g. `People!A4`
    pub range: String,
    /// Number of the first row in the run
    pub start_row: u32,
    pub values: Vec<Vec<String>>,
}

/// A run of consecutive rows to delete, as zero-based `[start, end)` indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: u32,
    pub end: u32,
}

impl RowSpan {
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Everything an update has to send for one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    /// Values of `ToAppend` rows, in row order
    pub appends: Vec<Vec<String>>,
    /// `ToChange` rows grouped into consecutive runs
    pub updates: Vec<RangeUpdate>,
    /// `ToDelete` rows grouped into consecutive runs, bottom of the sheet first
    pub deletions: Vec<RowSpan>,
}

impl ChangeSet {
    #[must_use]
    pub fn from_sheet(sheet: &SheetModel) -> Self {
        let appends = sheet
            .rows_with_status(RowStatus::ToAppend)
            .map(Row::values)
            .collect();

        ChangeSet {
            appends,
            updates: group_updates(sheet),
            deletions: group_deletions(sheet),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.appends.is_empty() && self.updates.is_empty() && self.deletions.is_empty()
    }

    /// Number of rows touched by the change set
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.appends.len()
            + self.updates.iter().map(|u| u.values.len()).sum::<usize>()
            + self.deletions.iter().map(|d| d.len() as usize).sum::<usize>()
    }
}

fn sorted_by_number<'a>(sheet: &'a SheetModel, status: RowStatus) -> Vec<&'a Row> {
    let mut rows: Vec<&Row> = sheet.rows_with_status(status).collect();
    rows.sort_by_key(|r| r.number());
    rows
}

fn group_updates(sheet: &SheetModel) -> Vec<RangeUpdate> {
    let mut updates: Vec<RangeUpdate> = Vec::new();
    let mut previous: Option<u32> = None;

    for row in sorted_by_number(sheet, RowStatus::ToChange) {
        let number = row.number();
        let extends_run = previous.is_some_and(|p| number == p + 1);
        previous = Some(number);
        if let (true, Some(run)) = (extends_run, updates.last_mut()) {
            run.values.push(row.values());
            continue;
        }
        updates.push(RangeUpdate {
            range: format!("{}!A{}", sheet.title(), number),
            start_row: number,
            values: vec![row.values()],
        });
    }
    updates
}

fn group_deletions(sheet: &SheetModel) -> Vec<RowSpan> {
    let mut spans: Vec<RowSpan> = Vec::new();

    for row in sorted_by_number(sheet, RowStatus::ToDelete).into_iter().rev() {
        let index = row.number() - 1;
        if let Some(span) = spans.last_mut() {
            if span.start == index + 1 {
                span.start = index;
                continue;
            }
            // duplicate number already covered
            if span.start <= index && index < span.end {
                continue;
            }
        }
        spans.push(RowSpan {
            start: index,
            end: index + 1,
        });
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::SheetIdentity;

    fn sheet() -> SheetModel {
        let mut data = vec![vec!["Id".to_string(), "Name".to_string()]];
        for i in 1..=8 {
            data.push(vec![i.to_string(), format!("name {i}")]);
        }
        SheetModel::with_head(SheetIdentity::new("s", "People"), data).unwrap()
    }

    #[test]
    fn test_empty_change_set() {
        let changes = ChangeSet::from_sheet(&sheet());
        assert!(changes.is_empty());
        assert_eq!(changes.row_count(), 0);
    }

    #[test]
    fn test_updates_grouped_by_consecutive_numbers() {
        let mut sheet = sheet();
        // rows 2, 3 and 6
        for index in [0usize, 1, 4] {
            let id = sheet.rows()[index].id();
            sheet.set_value(id, 1, "edited").unwrap();
        }

        let changes = ChangeSet::from_sheet(&sheet);

        assert_eq!(changes.updates.len(), 2);
        assert_eq!(changes.updates[0].range, "People!A2");
        assert_eq!(changes.updates[0].values.len(), 2);
        assert_eq!(changes.updates[1].range, "People!A6");
        assert_eq!(changes.updates[1].start_row, 6);
        assert_eq!(changes.updates[1].values, vec![vec!["5", "edited"]]);
    }

    #[test]
    fn test_deletions_grouped_bottom_up() {
        let mut sheet = sheet();
        // rows 3, 4, 5 and 8
        for index in [1usize, 2, 3, 6] {
            let id = sheet.rows()[index].id();
            sheet.delete_row(id).unwrap();
        }

        let changes = ChangeSet::from_sheet(&sheet);

        assert_eq!(
            changes.deletions,
            vec![RowSpan { start: 7, end: 8 }, RowSpan { start: 2, end: 5 }]
        );
        assert_eq!(changes.row_count(), 4);
    }

    #[test]
    fn test_appends_in_row_order() {
        let mut sheet = sheet();
        sheet.add_row(vec!["9", "nine"]);
        sheet.add_row(vec!["10"]);

        let changes = ChangeSet::from_sheet(&sheet);

        assert_eq!(
            changes.appends,
            vec![vec!["9".to_string(), "nine".to_string()], vec!["10".to_string(), String::new()]]
        );
        assert!(changes.updates.is_empty());
    }
}
