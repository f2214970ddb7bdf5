//! Board reordering engine.
//!
//! A [`BoardController`] owns one project's board for the lifetime of a view:
//! it loads the [`BoardSnapshot`] from a [`crate::store::BoardStore`], keeps the
//! displayed [`BoardOrder`] that drag hovers rearrange, and on drop writes back
//! only the placements that changed before reloading the authoritative state.

pub mod controller;
pub mod drag;
pub mod layout;
pub mod order;
pub mod render;
pub mod snapshot;

pub use controller::{BoardController, BoardError, DropOutcome};
pub use drag::{ClickOutcome, DragPhase, DragState};
pub use layout::{insertion_point, pointer_for_index, stacked_bounds, CardBounds, InsertionPoint};
pub use order::{BoardOrder, Column, PlacementChange};
pub use snapshot::BoardSnapshot;
