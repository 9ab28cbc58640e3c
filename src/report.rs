// src/report.rs
//
// The aggregation hierarchy: cell -> row -> column/section -> grand total,
// with a parallel per-user breakdown at every level, and the Report
// aggregate root handed to presentation layers once compiled.

use chrono::Weekday;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::accumulator::HoursAccumulator;
use crate::model::{CustomerId, ProjectId, TaskId, UserId, WorkRecord};
use crate::period::{self, DateRange, Frequency};

/// Hours for one task within one report column, with an ordered per-user
/// breakdown aligned to the report's user list.
#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub hours: HoursAccumulator,
    pub user_data: Vec<HoursAccumulator>,
}

impl Cell {
    pub fn new(user_count: usize) -> Self {
        Self {
            hours: HoursAccumulator::new(),
            user_data: vec![HoursAccumulator::new(); user_count],
        }
    }

    /// Attribute one record to this cell, and to the user breakdown slot when
    /// the record's user appears in the report's user list.
    pub fn add_record(&mut self, record: &WorkRecord, user_index: Option<usize>) {
        self.hours.add(record.worked_hours, record.committed);
        if let Some(index) = user_index {
            if let Some(slot) = self.user_data.get_mut(index) {
                slot.add(record.worked_hours, record.committed);
            }
        }
    }

    pub fn total(&self) -> Decimal {
        self.hours.total()
    }
}

/// One task's row across the full report range. Cells are index-aligned with
/// the report's column list, user totals with its user list.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub task_id: TaskId,
    pub hours: HoursAccumulator,
    pub cells: Vec<Cell>,
    pub user_totals: Vec<HoursAccumulator>,
    /// Index of the section this row belongs to, assigned during the final
    /// section pass.
    pub section: usize,
    /// Colon-delimited task-title prefix ("Group: task" -> "Group"), for
    /// visual sub-grouping independent of the section index.
    pub group: Option<String>,
    /// True when this row opens a new section or a new group.
    pub starts_group: bool,
}

impl Row {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            hours: HoursAccumulator::new(),
            cells: Vec::new(),
            user_totals: Vec::new(),
            section: 0,
            group: None,
            starts_group: false,
        }
    }

    /// Append a scanned cell, folding it into the row total.
    pub fn push_cell(&mut self, cell: Cell) {
        self.hours.merge(&cell.hours);
        self.cells.push(cell);
    }

    /// Drop the cell at `index`, removing its hours from the row total.
    /// Used by zero-column exclusion; indices must be deleted descending.
    pub fn remove_cell(&mut self, index: usize) {
        let cell = self.cells.remove(index);
        self.hours.unmerge(&cell.hours);
    }
}

/// A contiguous run of rows sharing one (customer, project) pair, with its
/// own per-column and per-user sub-totals.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub index: usize,
    pub customer_id: CustomerId,
    pub project_id: ProjectId,
    pub hours: HoursAccumulator,
    /// Cell sums over member rows, index-aligned with the column list.
    pub cells: Vec<HoursAccumulator>,
    /// Per-user sums over member rows, index-aligned with the user list.
    pub user_totals: Vec<HoursAccumulator>,
}

impl Section {
    pub fn new(
        index: usize,
        customer_id: CustomerId,
        project_id: ProjectId,
        column_count: usize,
        user_count: usize,
    ) -> Self {
        Self {
            index,
            customer_id,
            project_id,
            hours: HoursAccumulator::new(),
            cells: vec![HoursAccumulator::new(); column_count],
            user_totals: vec![HoursAccumulator::new(); user_count],
        }
    }

    /// Fold a member row's cells, user totals and row total into this
    /// section's parallel accumulators.
    pub fn absorb_row(&mut self, row: &Row) {
        for (slot, cell) in self.cells.iter_mut().zip(row.cells.iter()) {
            slot.merge(&cell.hours);
        }
        for (slot, user_total) in self.user_totals.iter_mut().zip(row.user_totals.iter()) {
            slot.merge(user_total);
        }
        self.hours.merge(&row.hours);
    }
}

/// The compiled report. Built by a single `compile` pass and read-only
/// afterwards; every list is index-aligned as described on its field.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub frequency: Frequency,
    pub week_start: Weekday,
    /// The rationalized overall range (post daily clamp).
    pub range: DateRange,
    /// Filtered, sorted tasks; index-aligned with `rows`.
    pub task_ids: Vec<TaskId>,
    /// Users retained for the per-user breakdown; empty when no user
    /// restriction was requested.
    pub users: Vec<UserId>,
    /// Column sub-ranges in chronological order.
    pub column_ranges: Vec<DateRange>,
    pub rows: Vec<Row>,
    /// Per-column sums over all rows; index-aligned with `column_ranges`.
    pub column_totals: Vec<HoursAccumulator>,
    /// Per-user sums over all rows; index-aligned with `users`.
    pub user_column_totals: Vec<HoursAccumulator>,
    pub sections: Vec<Section>,
    /// Sum of nominal durations over the remaining tasks.
    pub total_duration: Decimal,
    pub grand_totals: HoursAccumulator,
    /// Duration left after committed hours on estimated tasks; `None` until
    /// at least one task with positive nominal duration contributes.
    pub total_actual_remaining: Option<Decimal>,
    /// As above but subtracting all hours, committed or not.
    pub total_potential_remaining: Option<Decimal>,
}

impl Report {
    /// An empty terminal report: the valid result of filtering away every
    /// task. No rows, columns or totals exist.
    pub fn empty(frequency: Frequency, week_start: Weekday, range: DateRange) -> Self {
        Self {
            frequency,
            week_start,
            range,
            task_ids: Vec::new(),
            users: Vec::new(),
            column_ranges: Vec::new(),
            rows: Vec::new(),
            column_totals: Vec::new(),
            user_column_totals: Vec::new(),
            sections: Vec::new(),
            total_duration: Decimal::ZERO,
            grand_totals: HoursAccumulator::new(),
            total_actual_remaining: None,
            total_potential_remaining: None,
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_ranges.len()
    }

    /// Heading label for the column at `index`.
    pub fn column_heading(&self, index: usize) -> Option<String> {
        self.column_ranges
            .get(index)
            .map(|range| period::column_heading(self.frequency, *range))
    }

    /// Whether the column at `index` spans less than a full period.
    pub fn is_partial_column(&self, index: usize) -> Option<bool> {
        self.column_ranges
            .get(index)
            .map(|range| period::is_partial_column(*range, self.frequency, self.week_start))
    }
}
