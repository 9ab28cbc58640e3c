// src/compiler.rs
//
// Report compilation: rationalize the requested date range, filter and sort
// the task set, partition the range into columns, scan work records into
// cells, then compute totals and apply zero-row/zero-column exclusion. The
// phases run strictly in sequence and a report is compiled exactly once.

use chrono::{Local, NaiveDate, Weekday};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::accumulator::{HoursAccumulator, ZeroCheck};
use crate::errors::ReportError;
use crate::model::{EntityCatalog, TaskId, UserId, Viewer, WorkRecordSource};
use crate::period::{self, DateRange, Frequency, MAX_DAILY_SPAN_DAYS};
use crate::report::{Report, Row};
use crate::scanner::{scan_cell, RecordCursor};
use crate::sections::SectionBoundaryDetector;
use crate::settings::EngineSettings;

/// The three mutually exclusive ways a caller can state the report range.
/// All carry raw user input; anything unparseable falls back to the computed
/// default range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RangeInput {
    /// No explicit range: derive from the record store's date bounds.
    #[default]
    Derived,
    /// Absolute dates, "YYYY-MM-DD" each.
    Dates { first: String, last: String },
    /// ISO week numbers, "YYYY-WW" each.
    Weeks { first: String, last: String },
    /// Calendar months, "YYYY-MM" each.
    Months { first: String, last: String },
}

/// Billability filter over the task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskScope {
    #[default]
    All,
    Billable,
    NotBillable,
}

/// Whitelisted entity fields a caller may sort by. Anything outside the
/// whitelist is replaced by `Title`, guarding against injection of arbitrary
/// sortable expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Title,
    Code,
    CreatedAt,
}

impl SortField {
    pub fn parse_or_default(raw: &str) -> Self {
        match raw {
            "title" => SortField::Title,
            "code" => SortField::Code,
            "created_at" => SortField::CreatedAt,
            other => {
                warn!(
                    "{}",
                    ReportError::invalid("sort_field", format!("unknown field {other:?}"))
                );
                SortField::Title
            }
        }
    }
}

/// Explicit, enumerated report configuration. Every knob is a named field
/// validated at construction; nothing is assigned reflectively.
#[derive(Debug, Clone)]
pub struct ReportCriteria {
    pub range: RangeInput,
    pub frequency: Frequency,
    /// Explicit task selection; empty means "the viewer's active permitted
    /// tasks".
    pub task_ids: Vec<TaskId>,
    /// User-id restriction for records and the per-user breakdown; empty
    /// means no restriction and no breakdown.
    pub user_ids: Vec<UserId>,
    pub scope: TaskScope,
    pub group_by_billable: bool,
    pub group_by_active: bool,
    pub customer_sort: SortField,
    pub project_sort: SortField,
    pub task_sort: SortField,
    pub include_totals: bool,
    pub include_committed: bool,
    pub include_not_committed: bool,
    pub exclude_zero_rows: bool,
    pub exclude_zero_columns: bool,
}

impl Default for ReportCriteria {
    fn default() -> Self {
        Self {
            range: RangeInput::Derived,
            frequency: Frequency::TotalsOnly,
            task_ids: Vec::new(),
            user_ids: Vec::new(),
            scope: TaskScope::All,
            group_by_billable: false,
            group_by_active: false,
            customer_sort: SortField::Title,
            project_sort: SortField::Title,
            task_sort: SortField::Title,
            include_totals: true,
            include_committed: false,
            include_not_committed: false,
            exclude_zero_rows: false,
            exclude_zero_columns: false,
        }
    }
}

/// Which accumulator value drives zero checks, per the include flags:
/// totals (or both pools) requested means the combined total, otherwise
/// whichever single pool was asked for.
fn zero_check(criteria: &ReportCriteria) -> ZeroCheck {
    if criteria.include_totals || (criteria.include_committed && criteria.include_not_committed) {
        ZeroCheck::Total
    } else if criteria.include_committed {
        ZeroCheck::Committed
    } else if criteria.include_not_committed {
        ZeroCheck::NotCommitted
    } else {
        ZeroCheck::Total
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TaskSortKey {
    billable_group: u8,
    active_group: u8,
    customer: String,
    project: String,
    task: String,
}

fn sort_value(field: SortField, title: &str, code: &str, created_at: NaiveDate) -> String {
    match field {
        SortField::Title => title.to_string(),
        SortField::Code => code.to_string(),
        // ISO format so lexicographic order is chronological order.
        SortField::CreatedAt => created_at.format("%Y-%m-%d").to_string(),
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ReportError::invalid(field, format!("{raw:?}: {e}")))
}

fn parse_year_part(field: &str, raw: &str) -> Result<(i32, u32), ReportError> {
    let (year_raw, part_raw) = raw
        .split_once('-')
        .ok_or_else(|| ReportError::invalid(field, format!("{raw:?}: expected YYYY-NN")))?;
    let year: i32 = year_raw
        .parse()
        .map_err(|_| ReportError::invalid(field, format!("{raw:?}: bad year")))?;
    let part: u32 = part_raw
        .parse()
        .map_err(|_| ReportError::invalid(field, format!("{raw:?}: bad period number")))?;
    Ok((year, part))
}

fn week_range(field: &str, raw: &str) -> Result<DateRange, ReportError> {
    let (year, week) = parse_year_part(field, raw)?;
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| ReportError::invalid(field, format!("{raw:?}: no such ISO week")))?;
    let sunday = monday
        .checked_add_days(chrono::Days::new(6))
        .ok_or_else(|| ReportError::invalid(field, format!("{raw:?}: week end overflows")))?;
    Ok(DateRange::new(monday, sunday))
}

fn month_range(field: &str, raw: &str) -> Result<DateRange, ReportError> {
    let (year, month) = parse_year_part(field, raw)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ReportError::invalid(field, format!("{raw:?}: no such month")))?;
    let last = period::last_day_of_month(year, month)
        .ok_or_else(|| ReportError::invalid(field, format!("{raw:?}: month end overflows")))?;
    Ok(DateRange::new(first, last))
}

/// Compiles reports against one entity catalog and one record source.
/// Stateless between calls; each `compile` builds its own report and its own
/// preloaded record copies, so separate compilations can run concurrently.
pub struct ReportCompiler<'a, S: WorkRecordSource> {
    catalog: &'a EntityCatalog,
    source: &'a S,
    settings: EngineSettings,
}

impl<'a, S: WorkRecordSource> ReportCompiler<'a, S> {
    pub fn new(catalog: &'a EntityCatalog, source: &'a S, settings: EngineSettings) -> Self {
        Self {
            catalog,
            source,
            settings,
        }
    }

    /// Compile one report. Bad input never surfaces here (defaults are
    /// substituted and logged); only internal-consistency violations return
    /// an error.
    pub fn compile(
        &self,
        criteria: &ReportCriteria,
        viewer: &Viewer,
    ) -> Result<Report, ReportError> {
        let week_start = self.settings.week_start;

        // Phase 1: rationalize the date range.
        let mut range = self.rationalize_range(criteria);
        if criteria.frequency == Frequency::Daily && range.day_count() > MAX_DAILY_SPAN_DAYS {
            debug!(
                "Daily report span {} days exceeds cap, clamping to last {}",
                range.day_count(),
                MAX_DAILY_SPAN_DAYS
            );
            range = range.clamp_to_last_days(MAX_DAILY_SPAN_DAYS);
        }

        // Phase 2: apply task and user filters.
        let user_ids = self.narrowed_user_ids(criteria, viewer);
        let task_ids = self.filtered_tasks(criteria, viewer);

        // Phase 3: sort and group.
        let mut task_ids = self.sorted_tasks(task_ids, criteria)?;

        // Phase 4: empty task set is a valid terminal state, not an error.
        if task_ids.is_empty() {
            debug!("No tasks left after filtering; producing empty report");
            return Ok(Report::empty(criteria.frequency, week_start, range));
        }

        // Phase 5: one row per task, in sorted order.
        let mut rows: Vec<Row> = task_ids.iter().cloned().map(Row::new).collect();

        // Phase 6: preload records once per task, then scan them into cells
        // column by column. Cursors guarantee each record lands in exactly
        // one cell.
        let preloaded: Vec<(Vec<_>, Vec<_>)> = task_ids
            .iter()
            .map(|task_id| {
                let mut committed = self.source.committed_records(task_id, range, &user_ids);
                let mut not_committed =
                    self.source.not_committed_records(task_id, range, &user_ids);
                // Retrieval order is date descending; the cursor walks
                // ascending to match ascending column traversal.
                committed.reverse();
                not_committed.reverse();
                (committed, not_committed)
            })
            .collect();
        let mut cursors: Vec<_> = preloaded
            .iter()
            .map(|(c, n)| (RecordCursor::new(c), RecordCursor::new(n)))
            .collect();

        let mut column_ranges: Vec<DateRange> = Vec::new();
        let mut column_totals: Vec<HoursAccumulator> = Vec::new();
        for column in period::columns(range, criteria.frequency, week_start) {
            let mut total = HoursAccumulator::new();
            for (row, (committed, not_committed)) in rows.iter_mut().zip(cursors.iter_mut()) {
                let cell = scan_cell(column, committed, not_committed, &user_ids);
                total.merge(&cell.hours);
                row.push_cell(cell);
            }
            column_ranges.push(column);
            column_totals.push(total);
        }
        debug_assert!(
            cursors
                .iter()
                .all(|(c, n)| c.remaining() == 0 && n.remaining() == 0),
            "columns must drain every preloaded record"
        );
        drop(cursors);

        // Phase 7: totals, exclusion, sections.
        self.calculate(
            criteria,
            week_start,
            range,
            &mut task_ids,
            user_ids,
            &mut rows,
            column_ranges,
            column_totals,
        )
    }

    fn rationalize_range(&self, criteria: &ReportCriteria) -> DateRange {
        let parsed = match &criteria.range {
            RangeInput::Derived => return self.default_range(),
            RangeInput::Dates { first, last } => parse_date("range.first", first)
                .and_then(|f| parse_date("range.last", last).map(|l| (f, l))),
            RangeInput::Weeks { first, last } => week_range("range.first", first)
                .and_then(|f| week_range("range.last", last).map(|l| (f.first, l.last))),
            RangeInput::Months { first, last } => month_range("range.first", first)
                .and_then(|f| month_range("range.last", last).map(|l| (f.first, l.last))),
        };
        let checked = parsed.and_then(|(first, last)| {
            if first <= last {
                Ok(DateRange::new(first, last))
            } else {
                Err(ReportError::invalid(
                    "range",
                    format!("first {first} after last {last}"),
                ))
            }
        });
        match checked {
            Ok(range) => range,
            Err(e) => {
                warn!("{e}");
                self.default_range()
            }
        }
    }

    /// Earliest through latest record date, or Jan-1 of the configured
    /// minimum year through today when no records exist.
    fn default_range(&self) -> DateRange {
        if let Some((earliest, latest)) = self.source.date_bounds() {
            return DateRange::new(earliest, latest);
        }
        let today = Local::now().date_naive();
        let floor = NaiveDate::from_ymd_opt(self.settings.default_start_year, 1, 1)
            .unwrap_or(today)
            .min(today);
        DateRange::new(floor, today)
    }

    /// A restricted viewer only ever sees their own hours, whatever user set
    /// was requested.
    fn narrowed_user_ids(&self, criteria: &ReportCriteria, viewer: &Viewer) -> Vec<UserId> {
        if viewer.restricted {
            if !criteria.user_ids.is_empty()
                && (criteria.user_ids.len() > 1 || !criteria.user_ids.contains(&viewer.user_id))
            {
                warn!(
                    "Restricted viewer {} requested other users; narrowing to self",
                    viewer.user_id
                );
            }
            vec![viewer.user_id.clone()]
        } else {
            criteria.user_ids.clone()
        }
    }

    fn filtered_tasks(&self, criteria: &ReportCriteria, viewer: &Viewer) -> Vec<TaskId> {
        let defaulted = criteria.task_ids.is_empty();
        let candidates: Vec<TaskId> = if defaulted {
            viewer.permitted_task_ids.clone()
        } else {
            criteria.task_ids.clone()
        };

        let mut task_ids: Vec<TaskId> = Vec::with_capacity(candidates.len());
        for id in candidates {
            let Some(task) = self.catalog.task(&id) else {
                warn!("{}", ReportError::invalid("task_ids", format!("unknown task {id:?}")));
                continue;
            };
            // The defaulted set only carries the viewer's *active* tasks.
            if defaulted && !task.active {
                continue;
            }
            let keep = match criteria.scope {
                TaskScope::All => true,
                TaskScope::Billable => task.billable,
                TaskScope::NotBillable => !task.billable,
            };
            if keep {
                task_ids.push(id);
            }
        }
        task_ids
    }

    /// Stable sort on (billable group, active group, customer, project,
    /// task) where the entity fields come from the whitelisted sort fields.
    fn sorted_tasks(
        &self,
        task_ids: Vec<TaskId>,
        criteria: &ReportCriteria,
    ) -> Result<Vec<TaskId>, ReportError> {
        let mut keyed: Vec<(TaskSortKey, TaskId)> = Vec::with_capacity(task_ids.len());
        for id in task_ids {
            let task = self.catalog.task(&id).ok_or_else(|| {
                ReportError::internal(format!("filtered task {id} vanished from catalog"))
            })?;
            let project = self.catalog.project_of(task)?;
            let customer = self.catalog.customer_of(task)?;
            let key = TaskSortKey {
                billable_group: match (criteria.group_by_billable, task.billable) {
                    (false, _) => 0,
                    (true, true) => 0,
                    (true, false) => 1,
                },
                active_group: match (criteria.group_by_active, task.active) {
                    (false, _) => 0,
                    (true, true) => 0,
                    (true, false) => 1,
                },
                customer: sort_value(
                    criteria.customer_sort,
                    &customer.title,
                    &customer.code,
                    customer.created_at,
                ),
                project: sort_value(
                    criteria.project_sort,
                    &project.title,
                    &project.code,
                    project.created_at,
                ),
                task: sort_value(criteria.task_sort, &task.title, &task.code, task.created_at),
            };
            keyed.push((key, id));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }

    #[allow(clippy::too_many_arguments)]
    fn calculate(
        &self,
        criteria: &ReportCriteria,
        week_start: Weekday,
        range: DateRange,
        task_ids: &mut Vec<TaskId>,
        mut users: Vec<UserId>,
        rows: &mut Vec<Row>,
        mut column_ranges: Vec<DateRange>,
        mut column_totals: Vec<HoursAccumulator>,
    ) -> Result<Report, ReportError> {
        let check = zero_check(criteria);

        // Zero-row exclusion drops the row and its task; descending index
        // order keeps the earlier indices valid. The dropped row's cells
        // must also leave the column totals, which were accumulated over all
        // rows during the scan: under a single-pool selector the row can
        // still carry hours in the other pool.
        if criteria.exclude_zero_rows {
            for index in (0..rows.len()).rev() {
                if rows[index].hours.value_for(check).is_zero() {
                    debug!("Excluding zero row for task {}", rows[index].task_id);
                    let row = rows.remove(index);
                    task_ids.remove(index);
                    for (total, cell) in column_totals.iter_mut().zip(row.cells.iter()) {
                        total.unmerge(&cell.hours);
                    }
                }
            }
        }

        // Zero-column exclusion drops the cell at that index from every
        // remaining row, adjusting each row total, then the range and total.
        if criteria.exclude_zero_columns {
            for index in (0..column_totals.len()).rev() {
                if column_totals[index].value_for(check).is_zero() {
                    debug!("Excluding zero column {:?}", column_ranges[index]);
                    for row in rows.iter_mut() {
                        row.remove_cell(index);
                    }
                    column_ranges.remove(index);
                    column_totals.remove(index);
                }
            }
        }

        // Grand totals over what remains.
        let mut total_duration = Decimal::ZERO;
        for id in task_ids.iter() {
            let task = self.catalog.task(id).ok_or_else(|| {
                ReportError::internal(format!("remaining task {id} vanished from catalog"))
            })?;
            total_duration += task.duration;
        }
        let mut grand_totals = HoursAccumulator::new();
        for row in rows.iter() {
            grand_totals.merge(&row.hours);
        }

        // Remaining hours: only tasks with a positive nominal duration
        // participate. Both fields stay None until the first such task.
        let mut total_actual_remaining: Option<Decimal> = None;
        let mut total_potential_remaining: Option<Decimal> = None;
        for (id, row) in task_ids.iter().zip(rows.iter()) {
            let task = self.catalog.task(id).ok_or_else(|| {
                ReportError::internal(format!("remaining task {id} vanished from catalog"))
            })?;
            if task.duration > Decimal::ZERO {
                let actual = total_actual_remaining.get_or_insert(total_duration);
                let potential = total_potential_remaining.get_or_insert(total_duration);
                *actual -= row.hours.committed;
                *potential -= row.hours.total();
            }
        }

        // Per-user row totals, then per-user column totals over all rows.
        for row in rows.iter_mut() {
            row.user_totals = (0..users.len())
                .map(|user_index| {
                    let mut total = HoursAccumulator::new();
                    for cell in &row.cells {
                        total.merge(&cell.user_data[user_index]);
                    }
                    total
                })
                .collect();
        }
        let mut user_column_totals = vec![HoursAccumulator::new(); users.len()];
        for row in rows.iter() {
            for (total, user_total) in user_column_totals.iter_mut().zip(row.user_totals.iter()) {
                total.merge(user_total);
            }
        }

        // Zero-column exclusion extends to the user dimension: drop users
        // who contributed nothing under the selected accumulator.
        if criteria.exclude_zero_columns {
            for index in (0..users.len()).rev() {
                if user_column_totals[index].value_for(check).is_zero() {
                    debug!("Excluding zero user column for {}", users[index]);
                    users.remove(index);
                    user_column_totals.remove(index);
                    for row in rows.iter_mut() {
                        row.user_totals.remove(index);
                        for cell in row.cells.iter_mut() {
                            cell.user_data.remove(index);
                        }
                    }
                }
            }
        }

        // Sections are computed last, over the final row/column/user state.
        let mut detector = SectionBoundaryDetector::new(self.catalog);
        let sections = detector.assign(rows, column_ranges.len(), users.len())?;

        Ok(Report {
            frequency: criteria.frequency,
            week_start,
            range,
            task_ids: task_ids.clone(),
            users,
            column_ranges,
            rows: std::mem::take(rows),
            column_totals,
            user_column_totals,
            sections,
            total_duration,
            grand_totals,
            total_actual_remaining,
            total_potential_remaining,
        })
    }
}
