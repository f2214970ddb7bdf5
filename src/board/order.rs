//! Ordered-list model of the board: one list of task ids per stage column.
//!
//! Hovering a dragged card mutates this model; committing a drop diffs it
//! against the placements last loaded from the store.

use std::collections::HashMap;
use crate::board::layout::InsertionPoint;
use crate::models::{Placement, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub stage_id: i64,
    pub task_ids: Vec<i64>,
}

/// A task whose placement differs from the last loaded one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementChange {
    pub task_id: i64,
    pub from: Placement,
    pub to: Placement,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardOrder {
    columns: Vec<Column>,
}

impl BoardOrder {
    pub fn new(columns: Vec<Column>) -> Self {
        BoardOrder { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, stage_id: i64) -> Option<&[i64]> {
        self.columns
            .iter()
            .find(|c| c.stage_id == stage_id)
            .map(|c| c.task_ids.as_slice())
    }

    pub fn has_stage(&self, stage_id: i64) -> bool {
        self.columns.iter().any(|c| c.stage_id == stage_id)
    }

    /// Current (stage id, index) of a task
    pub fn locate(&self, task_id: i64) -> Option<Placement> {
        self.columns.iter().find_map(|column| {
            column
                .task_ids
                .iter()
                .position(|&id| id == task_id)
                .map(|index| Placement {
                    stage_id: column.stage_id,
                    position: index as i64,
                })
        })
    }

    /// Splice `task_id` into `stage_id` at `point`.
    ///
    /// A `Before` reference that is not in the target column is treated as
    /// [`InsertionPoint::End`]. Unknown tasks or stages leave the order untouched.
    /// Returns true when the order changed.
    pub fn move_task(&mut self, task_id: i64, stage_id: i64, point: InsertionPoint) -> bool {
        if !self.has_stage(stage_id) {
            return false;
        }
        let Some(origin) = self.locate(task_id) else {
            return false;
        };

        let before = self.clone();

        if let Some(column) = self.columns.iter_mut().find(|c| c.stage_id == origin.stage_id) {
            column.task_ids.remove(origin.position as usize);
        }

        if let Some(column) = self.columns.iter_mut().find(|c| c.stage_id == stage_id) {
            let index = match point {
                InsertionPoint::Before(reference) => column
                    .task_ids
                    .iter()
                    .position(|&id| id == reference)
                    .unwrap_or(column.task_ids.len()),
                InsertionPoint::End => column.task_ids.len(),
            };
            column.task_ids.insert(index, task_id);
        }

        *self != before
    }

    /// Placement changes between this order and the tasks' last known placements.
    ///
    /// Only tasks whose stage or position differ are returned, walking columns
    /// left to right and cards top to bottom. Ids missing from `known` are skipped.
    pub fn diff(&self, known: &HashMap<i64, Task>) -> Vec<PlacementChange> {
        let mut changes = Vec::new();

        for column in &self.columns {
            for (index, task_id) in column.task_ids.iter().enumerate() {
                let Some(task) = known.get(task_id) else {
                    continue;
                };
                let to = Placement {
                    stage_id: column.stage_id,
                    position: index as i64,
                };
                let from = task.placement();
                if from != to {
                    changes.push(PlacementChange {
                        task_id: *task_id,
                        from,
                        to,
                    });
                }
            }
        }

        changes
    }
}
