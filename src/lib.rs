//! Timesheet report aggregation engine.
//!
//! Given a date range, a set of tasks and an optional per-user breakdown,
//! the engine partitions worked hours into a 2D grid of tasks x time
//! periods, computes row, column, section and grand totals across seven time
//! granularities, and applies zero-row/zero-column exclusion with consistent
//! re-aggregation. Persistence, authentication and the web layer live
//! elsewhere; this crate only consumes pre-sorted work-record streams and
//! produces a read-only [`report::Report`] aggregate for presentation.

pub mod accumulator;
pub mod compiler;
pub mod errors;
pub mod model;
pub mod period;
pub mod report;
pub mod scanner;
pub mod sections;
pub mod settings;

#[cfg(test)]
mod period_tests;

pub use accumulator::{HoursAccumulator, ZeroCheck};
pub use compiler::{RangeInput, ReportCompiler, ReportCriteria, SortField, TaskScope};
pub use errors::ReportError;
pub use model::{
    Customer, EntityCatalog, MemoryRecordStore, Project, Task, User, Viewer, WorkRecord,
    WorkRecordSource,
};
pub use period::{DateRange, Frequency};
pub use report::{Cell, Report, Row, Section};
pub use settings::EngineSettings;
