// src/sections.rs
//
// Groups the final, filtered rows into sections wherever consecutive rows
// cross a (customer, project) boundary, summing cells and per-user totals
// into per-section accumulators. A standalone stateful object owned and
// driven by the compiler; it shares no state with the report it fills in.

use tracing::debug;

use crate::errors::ReportError;
use crate::model::{CustomerId, EntityCatalog, ProjectId};
use crate::report::{Row, Section};

/// Stateful single-pass detector for section and group boundaries.
pub struct SectionBoundaryDetector<'a> {
    catalog: &'a EntityCatalog,
    last_identity: Option<(CustomerId, ProjectId)>,
    last_group: Option<String>,
}

/// Colon-delimited task-title prefix: "Group: task name" yields "Group",
/// a title without a colon yields no group.
fn group_label(title: &str) -> Option<String> {
    title
        .split_once(':')
        .map(|(prefix, _)| prefix.trim().to_string())
}

impl<'a> SectionBoundaryDetector<'a> {
    pub fn new(catalog: &'a EntityCatalog) -> Self {
        Self {
            catalog,
            last_identity: None,
            last_group: None,
        }
    }

    /// Walk `rows` in final order, opening a new section at every
    /// customer/project change and folding each row into the current one.
    /// Section indices are assigned monotonically from 0. Also stamps each
    /// row with its group label and whether it opens a new visual group.
    pub fn assign(
        &mut self,
        rows: &mut [Row],
        column_count: usize,
        user_count: usize,
    ) -> Result<Vec<Section>, ReportError> {
        let mut sections: Vec<Section> = Vec::new();

        for row in rows.iter_mut() {
            let task = self.catalog.task(&row.task_id).ok_or_else(|| {
                ReportError::internal(format!("row references unknown task {}", row.task_id))
            })?;
            let customer = self.catalog.customer_of(task)?;
            let project = self.catalog.project_of(task)?;
            let identity = (customer.id.clone(), project.id.clone());

            let section_changed = self.last_identity.as_ref() != Some(&identity);
            if section_changed {
                debug!(
                    "Opening section {} for customer {} / project {}",
                    sections.len(),
                    identity.0,
                    identity.1
                );
                sections.push(Section::new(
                    sections.len(),
                    identity.0.clone(),
                    identity.1.clone(),
                    column_count,
                    user_count,
                ));
                self.last_identity = Some(identity);
            }

            let group = group_label(&task.title);
            row.starts_group = section_changed || group != self.last_group;
            self.last_group = group.clone();
            row.group = group;

            // The first row always opens a section, so this can only trip on
            // an engine bug.
            let current = sections.last_mut().ok_or_else(|| {
                ReportError::internal(format!(
                    "no current section while absorbing row for task {}",
                    row.task_id
                ))
            })?;
            row.section = current.index;
            current.absorb_row(row);
        }

        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_label_strips_prefix_before_colon() {
        assert_eq!(group_label("Design: wireframes"), Some("Design".to_string()));
        assert_eq!(group_label("No group here"), None);
        assert_eq!(group_label(" Spaced : title"), Some("Spaced".to_string()));
    }
}
