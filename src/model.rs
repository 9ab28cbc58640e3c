// src/model.rs
//
// The engine's view of the surrounding timesheet system: entities it reads
// (customers, projects, tasks, users, work records), the catalog used to walk
// task -> project -> customer links, the viewer capability object, and the
// record-retrieval trait the persistence layer implements.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::ReportError;
use crate::period::DateRange;

pub type CustomerId = String;
pub type ProjectId = String;
pub type TaskId = String;
pub type UserId = String;

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub title: String,
    pub code: String,
    pub created_at: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub customer_id: CustomerId,
    pub title: String,
    pub code: String,
    pub created_at: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub code: String,
    pub created_at: NaiveDate,
    pub active: bool,
    pub billable: bool,
    /// Nominal task duration in decimal hours; zero means "no estimate" and
    /// excludes the task from remaining-hours computation.
    pub duration: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub restricted: bool,
}

/// One logged span of work, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkRecord {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub worked_hours: Decimal,
    pub committed: bool,
}

/// Lookup tables for the entity graph. The engine receives pre-validated
/// entities; a dangling project or customer link therefore reports as an
/// internal-consistency error rather than bad input.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    customers: HashMap<CustomerId, Customer>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&mut self, customer: Customer) {
        self.customers.insert(customer.id.clone(), customer);
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.insert(project.id.clone(), project);
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn project_of(&self, task: &Task) -> Result<&Project, ReportError> {
        self.projects.get(&task.project_id).ok_or_else(|| {
            ReportError::internal(format!(
                "task {} references unknown project {}",
                task.id, task.project_id
            ))
        })
    }

    pub fn customer_of(&self, task: &Task) -> Result<&Customer, ReportError> {
        let project = self.project_of(task)?;
        self.customers.get(&project.customer_id).ok_or_else(|| {
            ReportError::internal(format!(
                "project {} references unknown customer {}",
                project.id, project.customer_id
            ))
        })
    }
}

/// Capability object describing who the report is compiled for. Replaces any
/// ambient "current user" state: the compiler only ever sees this explicit
/// value.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: UserId,
    /// A restricted viewer may only see their own hours; the compiler narrows
    /// any requested user-id list down to the viewer themselves.
    pub restricted: bool,
    /// Tasks this viewer is permitted to report on; used only when the
    /// caller supplies no explicit task set.
    pub permitted_task_ids: Vec<TaskId>,
}

/// Work-record retrieval, implemented by the persistence layer.
///
/// Both record queries must return results sorted by date descending and
/// already filtered to the given task, range, and (if non-empty) user-id
/// set. An empty `user_ids` slice means no user restriction.
pub trait WorkRecordSource {
    fn committed_records(
        &self,
        task_id: &str,
        range: DateRange,
        user_ids: &[UserId],
    ) -> Vec<WorkRecord>;

    fn not_committed_records(
        &self,
        task_id: &str,
        range: DateRange,
        user_ids: &[UserId],
    ) -> Vec<WorkRecord>;

    /// Earliest and latest record date over the whole store, if any records
    /// exist. Drives the default report range when no dates are supplied.
    fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)>;
}

/// In-memory record source. Lets the engine run without a database; the test
/// suites and small deployments use it directly.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<WorkRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: WorkRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matching(
        &self,
        task_id: &str,
        range: DateRange,
        user_ids: &[UserId],
        committed: bool,
    ) -> Vec<WorkRecord> {
        let mut found: Vec<WorkRecord> = self
            .records
            .iter()
            .filter(|r| {
                r.task_id == task_id
                    && r.committed == committed
                    && range.contains(r.date)
                    && (user_ids.is_empty() || user_ids.contains(&r.user_id))
            })
            .cloned()
            .collect();
        // Date descending, as the retrieval contract requires.
        found.sort_by(|a, b| b.date.cmp(&a.date));
        found
    }
}

impl WorkRecordSource for MemoryRecordStore {
    fn committed_records(
        &self,
        task_id: &str,
        range: DateRange,
        user_ids: &[UserId],
    ) -> Vec<WorkRecord> {
        self.matching(task_id, range, user_ids, true)
    }

    fn not_committed_records(
        &self,
        task_id: &str,
        range: DateRange,
        user_ids: &[UserId],
    ) -> Vec<WorkRecord> {
        self.matching(task_id, range, user_ids, false)
    }

    fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let earliest = self.records.iter().map(|r| r.date).min()?;
        let latest = self.records.iter().map(|r| r.date).max()?;
        Some((earliest, latest))
    }
}
