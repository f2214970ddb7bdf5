//! Drag gesture state.
//!
//! ```text
//! Idle -> Dragging -> Persisting -> Settling -> Idle
//!              \------(cancel)-----^
//! ```
//!
//! `Settling` swallows the click a browser synthesizes after a drag gesture.
//! It ends either on that click or on [`DragState::settle`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging { task_id: i64 },
    Persisting { task_id: i64 },
    Settling,
}

/// Result of clicking a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    OpenEditor(i64),
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct DragState {
    phase: DragPhase,
}

impl Default for DragState {
    fn default() -> Self {
        DragState { phase: DragPhase::Idle }
    }
}

impl DragState {
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_persisting(&self) -> bool {
        matches!(self.phase, DragPhase::Persisting { .. })
    }

    /// Task currently being dragged (not yet dropped)
    pub fn dragged(&self) -> Option<i64> {
        match self.phase {
            DragPhase::Dragging { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// Task whose card is shown in the dragging style
    pub fn highlighted(&self) -> Option<i64> {
        match self.phase {
            DragPhase::Dragging { task_id } | DragPhase::Persisting { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// Start dragging. Ignored while another drag is active or persisting.
    pub fn begin(&mut self, task_id: i64) -> bool {
        match self.phase {
            DragPhase::Idle | DragPhase::Settling => {
                self.phase = DragPhase::Dragging { task_id };
                true
            }
            DragPhase::Dragging { .. } | DragPhase::Persisting { .. } => false,
        }
    }

    /// Commit the active drag; returns the dragged task
    pub fn begin_persist(&mut self) -> Option<i64> {
        let task_id = self.dragged()?;
        self.phase = DragPhase::Persisting { task_id };
        Some(task_id)
    }

    /// End the gesture, whatever its outcome
    pub fn finish(&mut self) {
        if matches!(self.phase, DragPhase::Dragging { .. } | DragPhase::Persisting { .. }) {
            self.phase = DragPhase::Settling;
        }
    }

    /// Leave `Settling` on the next turn of the event loop
    pub fn settle(&mut self) {
        if self.phase == DragPhase::Settling {
            self.phase = DragPhase::Idle;
        }
    }

    pub fn click(&mut self, task_id: i64) -> ClickOutcome {
        match self.phase {
            DragPhase::Idle => ClickOutcome::OpenEditor(task_id),
            DragPhase::Settling => {
                self.phase = DragPhase::Idle;
                ClickOutcome::Suppressed
            }
            DragPhase::Dragging { .. } | DragPhase::Persisting { .. } => ClickOutcome::Suppressed,
        }
    }
}
