// src/scanner.rs
//
// Single-pass consumption of a task's preloaded work records into cells.
// Records are preloaded once per task and walked with a cursor while the
// caller visits columns in ascending chronological order, so each record is
// looked at exactly once across the whole report. No O(columns x records)
// re-filtering, and no mutation of the underlying record snapshot.

use chrono::NaiveDate;

use crate::model::{UserId, WorkRecord};
use crate::period::DateRange;
use crate::report::Cell;

/// Forward-only cursor over a date-ascending record slice.
#[derive(Debug)]
pub struct RecordCursor<'a> {
    records: &'a [WorkRecord],
    pos: usize,
}

impl<'a> RecordCursor<'a> {
    /// `records` must be sorted by date ascending.
    pub fn new(records: &'a [WorkRecord]) -> Self {
        debug_assert!(
            records.windows(2).all(|pair| pair[0].date <= pair[1].date),
            "record cursor requires date-ascending input"
        );
        Self { records, pos: 0 }
    }

    /// All unconsumed records dated on or before `last`, advancing the
    /// cursor past them. Because columns are visited in ascending order and
    /// tile the report range, each record is returned by exactly one call.
    pub fn take_through(&mut self, last: NaiveDate) -> &'a [WorkRecord] {
        let start = self.pos;
        while self.pos < self.records.len() && self.records[self.pos].date <= last {
            self.pos += 1;
        }
        &self.records[start..self.pos]
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.records.len() - self.pos
    }
}

/// Fill one cell from the two record cursors for a task.
///
/// Hours land in the cell's committed / not-committed pools; records whose
/// user appears in `user_ids` also land in that user's breakdown slot.
pub fn scan_cell(
    column: DateRange,
    committed: &mut RecordCursor<'_>,
    not_committed: &mut RecordCursor<'_>,
    user_ids: &[UserId],
) -> Cell {
    let mut cell = Cell::new(user_ids.len());
    for record in committed.take_through(column.last) {
        let user_index = user_ids.iter().position(|u| *u == record.user_id);
        cell.add_record(record, user_index);
    }
    for record in not_committed.take_through(column.last) {
        let user_index = user_ids.iter().position(|u| *u == record.user_id);
        cell.add_record(record, user_index);
    }
    cell
}
