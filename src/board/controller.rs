use std::time::Duration;
use futures::future::join_all;
use crate::board::drag::{ClickOutcome, DragPhase, DragState};
use crate::board::layout::{insertion_point, CardBounds};
use crate::board::order::{BoardOrder, PlacementChange};
use crate::board::render::{board_view, render_board, BoardView};
use crate::board::snapshot::BoardSnapshot;
use crate::config::DEFAULT_PERSIST_TIMEOUT;
use crate::models::{normalize_title, NewTask, StageOption, Task, TaskUpdate};
use crate::store::{BoardStore, StoreError};

/// Errors raised by board operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Failed to load board for project {project_id}: {source}")]
    Load {
        project_id: i64,
        #[source]
        source: StoreError,
    },

    /// The drop finished but the board could not be reloaded afterwards
    #[error("{outcome}; {source}")]
    DropReload {
        outcome: DropOutcome,
        #[source]
        source: Box<BoardError>,
    },

    #[error("Board is unavailable after a failed reload: {0}")]
    Halted(String),

    #[error("Board is saving a reorder, try again once it finishes")]
    Busy,

    #[error("Task {0} is not on this board")]
    UnknownTask(i64),

    #[error("Stage {0} is not on this board")]
    UnknownStage(i64),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a drop did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag was active, or the board is halted
    Ignored,
    /// The order did not change; nothing was written
    Unchanged,
    /// Every changed placement was written
    Persisted { writes: usize },
    /// At least one write failed or the batch timed out. Writes that did
    /// succeed are not rolled back; the board was reloaded from the store.
    Failed {
        writes: usize,
        failed: usize,
        message: String,
    },
}

impl std::fmt::Display for DropOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropOutcome::Ignored => write!(f, "Drop ignored"),
            DropOutcome::Unchanged => write!(f, "Task order unchanged"),
            DropOutcome::Persisted { writes } => write!(f, "Saved {} placement(s)", writes),
            DropOutcome::Failed { message, .. } => write!(f, "{}", message),
        }
    }
}

/// Per-view board controller.
///
/// Owns the project's snapshot, the working order that drag hovers mutate, and
/// the drag state. One controller per board view; discard it on navigation.
pub struct BoardController<S: BoardStore> {
    store: S,
    project_id: i64,
    snapshot: BoardSnapshot,
    order: BoardOrder,
    drag: DragState,
    persist_timeout: Duration,
    halted: Option<String>,
}

impl<S: BoardStore> BoardController<S> {
    /// Load a project's board
    pub async fn load(store: S, project_id: i64) -> Result<Self, BoardError> {
        let mut controller = BoardController {
            store,
            project_id,
            snapshot: BoardSnapshot::default(),
            order: BoardOrder::default(),
            drag: DragState::default(),
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            halted: None,
        };
        controller.reload().await?;
        Ok(controller)
    }

    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    /// Board as last loaded from the store
    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    /// Displayed order, including any pending drag reorder
    pub fn order(&self) -> &BoardOrder {
        &self.order
    }

    pub fn phase(&self) -> DragPhase {
        self.drag.phase()
    }

    /// Error message of the reload that halted the board, if any
    pub fn halted(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub fn stage_options(&self) -> Vec<StageOption> {
        self.snapshot.stage_options()
    }

    pub fn render(&self, width: usize) -> String {
        render_board(&self.snapshot, &self.order, self.drag.highlighted(), width)
    }

    pub fn view(&self) -> BoardView<'_> {
        board_view(self.project_id, &self.snapshot, &self.order)
    }

    /// Re-fetch stages and tasks and rebuild the board.
    /// A failure halts the board until a reload succeeds.
    pub async fn reload(&mut self) -> Result<(), BoardError> {
        let fetched = async {
            let stages = self.store.fetch_stages(self.project_id).await?;
            let tasks = self.store.fetch_tasks(self.project_id).await?;
            Ok::<_, StoreError>((stages, tasks))
        }
        .await;

        match fetched {
            Ok((stages, tasks)) => {
                self.snapshot = BoardSnapshot::build(stages, tasks);
                self.order = self.snapshot.order().clone();
                self.halted = None;
                log::debug!(
                    "loaded board for project {}: {} stage(s), {} task(s)",
                    self.project_id,
                    self.snapshot.stages().len(),
                    self.snapshot.tasks().len()
                );
                Ok(())
            }
            Err(source) => {
                log::error!("failed to load board for project {}: {}", self.project_id, source);
                self.halted = Some(source.to_string());
                Err(BoardError::Load {
                    project_id: self.project_id,
                    source,
                })
            }
        }
    }

    /// Start dragging a card. Returns false when the drag is not accepted.
    pub fn drag_start(&mut self, task_id: i64) -> bool {
        if self.halted.is_some() || self.snapshot.task(task_id).is_none() {
            return false;
        }
        let started = self.drag.begin(task_id);
        if started {
            log::debug!("drag start: task {}", task_id);
        }
        started
    }

    /// Pointer hovering over a stage column with the given cards.
    ///
    /// Moves the dragged card to the computed insertion point in the working
    /// order. Only cards currently in the hovered column take part. Returns true
    /// when the order changed.
    pub fn drag_over(&mut self, stage_id: i64, pointer_y: f64, cards: &[CardBounds]) -> bool {
        let Some(task_id) = self.drag.dragged() else {
            return false;
        };
        let Some(column) = self.order.column(stage_id) else {
            return false;
        };

        let eligible: Vec<CardBounds> = cards
            .iter()
            .filter(|card| card.task_id != task_id && column.contains(&card.task_id))
            .copied()
            .collect();

        let point = insertion_point(pointer_y, &eligible, task_id);
        self.order.move_task(task_id, stage_id, point)
    }

    /// Drag ended without a drop on a stage column: restore the loaded order.
    pub fn drag_cancel(&mut self) -> bool {
        if self.drag.dragged().is_none() {
            return false;
        }
        self.order = self.snapshot.order().clone();
        self.drag.finish();
        log::debug!("drag cancelled, order restored");
        true
    }

    /// Drop the dragged card on a stage column and persist the new order.
    ///
    /// Writes only tasks whose (stage, position) changed, all at once, bounded
    /// by the persist timeout. The board is reloaded afterwards whether or not
    /// the writes succeeded. A failed reload halts the board and is returned as
    /// [`BoardError::DropReload`], which still carries the drop's outcome.
    pub async fn drop_on(&mut self, stage_id: i64) -> Result<DropOutcome, BoardError> {
        if self.halted.is_some() || self.drag.dragged().is_none() {
            return Ok(DropOutcome::Ignored);
        }
        if !self.order.has_stage(stage_id) {
            self.drag_cancel();
            return Ok(DropOutcome::Ignored);
        }
        let Some(task_id) = self.drag.begin_persist() else {
            return Ok(DropOutcome::Ignored);
        };

        let changes = self.order.diff(self.snapshot.tasks());
        log::info!(
            "drop: task {} on stage {}, {} placement change(s)",
            task_id,
            stage_id,
            changes.len()
        );

        let outcome = if changes.is_empty() {
            DropOutcome::Unchanged
        } else {
            self.persist(&changes).await
        };

        let reloaded = self.reload().await;
        self.drag.finish();
        if let Err(err) = reloaded {
            log::error!("drop on stage {} ended with \"{}\" but the board could not be reloaded", stage_id, outcome);
            return Err(BoardError::DropReload {
                outcome,
                source: Box::new(err),
            });
        }

        Ok(outcome)
    }

    async fn persist(&self, changes: &[PlacementChange]) -> DropOutcome {
        let writes = changes.iter().map(|change| {
            self.store
                .update_task_placement(self.project_id, change.task_id, change.to)
        });

        match tokio::time::timeout(self.persist_timeout, join_all(writes)).await {
            Ok(results) => {
                let errors: Vec<String> = results
                    .into_iter()
                    .zip(changes)
                    .filter_map(|(result, change)| {
                        result.err().map(|e| format!("task {}: {}", change.task_id, e))
                    })
                    .collect();

                if errors.is_empty() {
                    DropOutcome::Persisted { writes: changes.len() }
                } else {
                    log::warn!("{} of {} placement write(s) failed", errors.len(), changes.len());
                    DropOutcome::Failed {
                        writes: changes.len(),
                        failed: errors.len(),
                        message: format!("Failed to save task order: {}", errors.join("; ")),
                    }
                }
            }
            Err(_) => {
                log::warn!(
                    "placement writes timed out after {:?}",
                    self.persist_timeout
                );
                DropOutcome::Failed {
                    writes: changes.len(),
                    failed: changes.len(),
                    message: format!(
                        "Failed to save task order: timed out after {} ms",
                        self.persist_timeout.as_millis()
                    ),
                }
            }
        }
    }

    /// Click on a card. Clicks that belong to a drag gesture are swallowed.
    pub fn click(&mut self, task_id: i64) -> Option<ClickOutcome> {
        match self.drag.click(task_id) {
            ClickOutcome::OpenEditor(id) if self.snapshot.task(id).is_none() => None,
            outcome => Some(outcome),
        }
    }

    /// Next event-loop turn after a drag ended
    pub fn settle(&mut self) {
        self.drag.settle();
    }

    fn ensure_writable(&self) -> Result<(), BoardError> {
        if let Some(message) = &self.halted {
            return Err(BoardError::Halted(message.clone()));
        }
        if self.drag.is_persisting() {
            return Err(BoardError::Busy);
        }
        Ok(())
    }

    /// Create a task at the end of a stage, then reload
    pub async fn create_task(
        &mut self,
        stage_id: i64,
        title: &str,
        description: Option<&str>,
        done: bool,
    ) -> Result<Task, BoardError> {
        self.ensure_writable()?;
        if self.snapshot.stage(stage_id).is_none() {
            return Err(BoardError::UnknownStage(stage_id));
        }
        let new_task = NewTask::new(self.project_id, stage_id, title, description, done)
            .map_err(BoardError::Invalid)?;

        let task = self.store.create_task(new_task).await?;
        self.reload().await?;
        Ok(task)
    }

    /// Apply an editor update, then reload
    pub async fn update_task(&mut self, task_id: i64, mut update: TaskUpdate) -> Result<Task, BoardError> {
        self.ensure_writable()?;
        if self.snapshot.task(task_id).is_none() {
            return Err(BoardError::UnknownTask(task_id));
        }
        if let Some(title) = &update.title {
            update.title = Some(normalize_title(title).map_err(BoardError::Invalid)?);
        }
        if let Some(stage_id) = update.stage_id {
            if self.snapshot.stage(stage_id).is_none() {
                return Err(BoardError::UnknownStage(stage_id));
            }
        }

        let task = self.store.update_task(self.project_id, task_id, update).await?;
        self.reload().await?;
        Ok(task)
    }

    /// Delete a task and its attachments, then reload
    pub async fn delete_task(&mut self, task_id: i64) -> Result<(), BoardError> {
        self.ensure_writable()?;
        if self.snapshot.task(task_id).is_none() {
            return Err(BoardError::UnknownTask(task_id));
        }
        self.store.delete_task(self.project_id, task_id).await?;
        self.reload().await?;
        Ok(())
    }
}
