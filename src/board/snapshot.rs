use std::collections::HashMap;
use crate::board::order::{BoardOrder, Column};
use crate::models::{Stage, StageOption, Task};

/// In-memory view of one project's board as last loaded from the store.
///
/// Rebuilt wholesale after every write; never patched in place.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    stages: Vec<Stage>,
    tasks: HashMap<i64, Task>,
    order: BoardOrder,
}

impl BoardSnapshot {
    /// Build a snapshot from stages and tasks as fetched.
    ///
    /// Stages are ordered by position. Each stage column lists its tasks by
    /// ascending position; tasks pointing at a stage that was not loaded are dropped.
    pub fn build(mut stages: Vec<Stage>, mut tasks: Vec<Task>) -> Self {
        stages.sort_by_key(|s| (s.position, s.id));
        tasks.sort_by_key(|t| (t.position, t.id));

        let mut columns: Vec<Column> = stages
            .iter()
            .map(|s| Column {
                stage_id: s.id,
                task_ids: Vec::new(),
            })
            .collect();

        let mut known = HashMap::with_capacity(tasks.len());
        for task in tasks {
            match columns.iter_mut().find(|c| c.stage_id == task.stage_id) {
                Some(column) => {
                    column.task_ids.push(task.id);
                    known.insert(task.id, task);
                }
                None => {
                    log::warn!("skipping task {}: stage {} is not on the board", task.id, task.stage_id);
                }
            }
        }

        BoardSnapshot {
            stages,
            tasks: known,
            order: BoardOrder::new(columns),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, stage_id: i64) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    pub fn task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    /// Tasks keyed by id with their loaded placements
    pub fn tasks(&self) -> &HashMap<i64, Task> {
        &self.tasks
    }

    /// Loaded order, one column per stage
    pub fn order(&self) -> &BoardOrder {
        &self.order
    }

    /// Options for stage select lists, in column order
    pub fn stage_options(&self) -> Vec<StageOption> {
        self.stages.iter().map(StageOption::from).collect()
    }

    /// True when every stage's positions form 0..N-1 in display order
    pub fn is_dense(&self) -> bool {
        self.order.columns().iter().all(|column| {
            column
                .task_ids
                .iter()
                .enumerate()
                .all(|(index, id)| self.tasks.get(id).map(|t| t.position) == Some(index as i64))
        })
    }
}
