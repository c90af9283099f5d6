//! Reconciling a locally edited sheet with a fresh snapshot of the same sheet.

use crate::cell::Cell;
use crate::error::{Result, SheetError};
use crate::row::{Row, RowStatus};
use crate::sheet::{SheetMode, SheetModel};
use indexmap::IndexMap;
use std::collections::HashSet;

impl SheetModel {
    /// Whether `other` describes the same remote sheet. Rows are not compared.
    #[must_use]
    pub fn is_same_sheet(&self, other: &SheetModel) -> bool {
        self.identity_mismatch(other).is_none()
    }

    /// First identity field that differs between the two sheets.
    fn identity_mismatch(&self, other: &SheetModel) -> Option<&'static str> {
        if self.identity.spreadsheet_id != other.identity.spreadsheet_id {
            return Some("spreadsheet id");
        }
        match (self.identity.gid, other.identity.gid) {
            (Some(a), Some(b)) if a != b => return Some("gid"),
            (Some(_), Some(_)) => {}
            _ if self.identity.title != other.identity.title => return Some("title"),
            _ => {}
        }
        if self.mode != other.mode {
            return Some("mode");
        }
        if self.key_name != other.key_name {
            return Some("key name");
        }
        if self.head != other.head {
            return Some("head");
        }
        None
    }

    /// Fold a freshly fetched snapshot of this sheet into it.
    ///
    /// In `HeadAndKey` sheets rows are paired by key value first; every other
    /// row is paired by number. Unedited rows take the snapshot values,
    /// edited cells keep their local value, and rows waiting to be appended
    /// or deleted are left alone. Snapshot rows with no local counterpart are
    /// added as `Original`; unedited local rows missing from the snapshot are
    /// dropped, as are pending deletions the snapshot no longer has.
    ///
    /// A pending change or append that the snapshot already holds (edited
    /// cells equal, or the whole row equal for appends) becomes `Original`.
    /// A pending deletion only pairs by number with an identical row; any
    /// other row at that number means the deletion was applied and later
    /// rows moved up.
    ///
    /// Fails without touching `self` if `other` is a different sheet.
    pub fn merge(&mut self, other: &SheetModel) -> Result<()> {
        if let Some(field) = self.identity_mismatch(other) {
            return Err(SheetError::IncompatibleMerge { field });
        }

        if other.column_count > self.column_count {
            self.column_count = other.column_count;
            for row in &mut self.rows {
                row.widen(other.column_count, &self.head);
            }
        }

        let pairs = self.pair_rows(other);
        let matched: HashSet<usize> = pairs.iter().flatten().copied().collect();

        let before = self.rows.len();
        let mut landed = 0usize;
        let mut pairs = pairs.into_iter();
        self.rows.retain_mut(|row| {
            let Some(snapshot) = pairs.next().flatten().map(|j| &other.rows[j]) else {
                // Unsent rows and edits to rows gone remotely are kept.
                return matches!(row.status(), RowStatus::ToAppend | RowStatus::ToChange);
            };
            row.set_number(snapshot.number());
            match row.status() {
                RowStatus::Original => row.refresh_from(snapshot, false),
                RowStatus::ToChange if row.edits_applied(snapshot) => {
                    row.refresh_from(snapshot, false);
                    row.set_status(RowStatus::Original);
                    landed += 1;
                }
                RowStatus::ToChange => row.refresh_from(snapshot, true),
                RowStatus::ToAppend => {
                    row.refresh_from(snapshot, false);
                    row.set_status(RowStatus::Original);
                    landed += 1;
                }
                RowStatus::ToDelete => {}
            }
            true
        });
        let dropped = before - self.rows.len();

        let mut seen: HashSet<u32> = HashSet::with_capacity(other.rows.len());
        let mut added = 0usize;
        for (index, snapshot) in other.rows.iter().enumerate() {
            // first row wins on duplicate numbers
            if !seen.insert(snapshot.number()) || matched.contains(&index) {
                continue;
            }
            self.push_row(snapshot.number(), RowStatus::Original, snapshot.values());
            added += 1;
        }

        self.rows.sort_by_key(|r| {
            let pending_append = r.status() == RowStatus::ToAppend;
            (pending_append, if pending_append { 0 } else { r.number() })
        });
        let renumbered = self.renumber_colliding_appends();

        tracing::debug!(
            sheet = %self.identity.title,
            matched = matched.len(),
            added,
            dropped,
            landed,
            renumbered,
            "merged snapshot"
        );
        Ok(())
    }

    /// For each local row, the index of the snapshot row it pairs with.
    fn pair_rows(&self, other: &SheetModel) -> Vec<Option<usize>> {
        let mut by_number: IndexMap<u32, usize> = IndexMap::with_capacity(other.rows.len());
        let mut by_key: IndexMap<&str, usize> = IndexMap::new();
        let keyed = self.mode == SheetMode::HeadAndKey;
        for (index, row) in other.rows.iter().enumerate() {
            by_number.entry(row.number()).or_insert(index);
            if let Some(key) = row.key().map(Cell::value).filter(|k| keyed && !k.is_empty()) {
                by_key.entry(key).or_insert(index);
            }
        }

        let mut pairs: Vec<Option<usize>> = vec![None; self.rows.len()];
        let mut taken: HashSet<usize> = HashSet::with_capacity(other.rows.len());

        if keyed {
            for (pair, row) in pairs.iter_mut().zip(&self.rows) {
                let Some(&index) = row
                    .key()
                    .map(Cell::value)
                    .filter(|k| !k.is_empty())
                    .and_then(|k| by_key.get(k))
                else {
                    continue;
                };
                if taken.contains(&index) || !pairs_with(row, &other.rows[index], true) {
                    continue;
                }
                taken.insert(index);
                *pair = Some(index);
            }
        }

        for (pair, row) in pairs.iter_mut().zip(&self.rows) {
            if pair.is_some() {
                continue;
            }
            let Some(&index) = by_number.get(&row.number()) else {
                continue;
            };
            if taken.contains(&index) || !pairs_with(row, &other.rows[index], false) {
                continue;
            }
            taken.insert(index);
            *pair = Some(index);
        }
        pairs
    }

    /// Move rows waiting to be appended off numbers now held by other rows.
    fn renumber_colliding_appends(&mut self) -> usize {
        let mut taken: HashSet<u32> = self
            .rows
            .iter()
            .filter(|r| r.status() != RowStatus::ToAppend)
            .map(Row::number)
            .collect();
        let mut next = self.max_row_number().map_or(1, |n| n.saturating_add(1));
        let mut renumbered = 0;

        for row in &mut self.rows {
            if row.status() != RowStatus::ToAppend {
                continue;
            }
            if taken.contains(&row.number()) {
                row.set_number(next);
                next = next.saturating_add(1);
                renumbered += 1;
            }
            taken.insert(row.number());
        }
        renumbered
    }
}

/// Whether a local row may take a snapshot row as its counterpart.
///
/// Appends pair only with an identical row. A pending deletion paired by
/// number needs an identical row too; paired by key it is the same record.
fn pairs_with(local: &Row, remote: &Row, by_key: bool) -> bool {
    match local.status() {
        RowStatus::ToAppend => local.same_values(remote),
        RowStatus::ToDelete => by_key || local.same_values(remote),
        RowStatus::Original | RowStatus::ToChange => true,
    }
}
