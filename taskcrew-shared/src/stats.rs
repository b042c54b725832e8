/// Dashboard aggregation over a task slice
///
/// Pure functions: the caller fetches the visible, non-trashed tasks
/// (ordered newest first) and this module reduces them to the counts the
/// dashboard renders. No database access happens here, which keeps the
/// grouping rules unit-testable.
///
/// Chart ordering is insertion order of first occurrence within the slice,
/// not a fixed vocabulary order. A stage or priority no task carries does
/// not appear at all.

use serde::{Deserialize, Serialize};

use crate::models::task::Task;

/// One chart bucket: a display label and its count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSlice {
    pub name: String,
    pub total: u64,
}

/// Aggregated dashboard counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Number of tasks in the slice
    pub total_tasks: u64,

    /// Frequency per stage, keyed by display label
    pub tasks: Vec<ChartSlice>,

    /// Frequency per priority, keyed by display label
    pub graph_data: Vec<ChartSlice>,
}

/// Reduces a task slice to stage and priority frequency tables
///
/// The sum of the stage totals always equals `total_tasks`; the same holds
/// for priorities.
pub fn summarize(tasks: &[Task]) -> TaskSummary {
    let mut stage_counts: Vec<ChartSlice> = Vec::new();
    let mut priority_counts: Vec<ChartSlice> = Vec::new();

    for task in tasks {
        bump(&mut stage_counts, task.stage.label());
        bump(&mut priority_counts, task.priority.label());
    }

    TaskSummary {
        total_tasks: tasks.len() as u64,
        tasks: stage_counts,
        graph_data: priority_counts,
    }
}

fn bump(counts: &mut Vec<ChartSlice>, label: &str) {
    match counts.iter_mut().find(|slice| slice.name == label) {
        Some(slice) => slice.total += 1,
        None => counts.push(ChartSlice {
            name: label.to_string(),
            total: 1,
        }),
    }
}
