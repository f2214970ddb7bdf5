//! Insertion point calculation for a card being dragged over a stage column.

/// Vertical extent of a rendered card in a stage column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBounds {
    pub task_id: i64,
    pub top: f64,
    pub height: f64,
}

impl CardBounds {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Where the dragged card goes within the hovered column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Directly before the card with this task id
    Before(i64),
    /// After every card (ahead of any trailing "add task" control)
    End,
}

/// Pick the insertion point for a pointer at `pointer_y`.
///
/// The dragged card goes before the first card whose midpoint the pointer has
/// not yet passed: among cards with a midpoint below the pointer, the one whose
/// offset `pointer_y - midpoint` is closest to zero. The dragged card itself is
/// never a candidate. With no such card the result is [`InsertionPoint::End`].
pub fn insertion_point(pointer_y: f64, cards: &[CardBounds], dragged: i64) -> InsertionPoint {
    let mut best: Option<(f64, i64)> = None;

    for card in cards.iter().filter(|c| c.task_id != dragged) {
        let offset = pointer_y - card.midpoint();
        if offset < 0.0 && best.map_or(true, |(best_offset, _)| offset > best_offset) {
            best = Some((offset, card.task_id));
        }
    }

    match best {
        Some((_, task_id)) => InsertionPoint::Before(task_id),
        None => InsertionPoint::End,
    }
}

/// Lay cards out top to bottom with a uniform height, as a column without
/// real geometry would render them.
pub fn stacked_bounds(task_ids: &[i64], card_height: f64) -> Vec<CardBounds> {
    task_ids
        .iter()
        .enumerate()
        .map(|(index, &task_id)| CardBounds {
            task_id,
            top: index as f64 * card_height,
            height: card_height,
        })
        .collect()
}

/// Pointer coordinate that lands a card at `index` in a uniformly stacked column
pub fn pointer_for_index(index: usize, card_height: f64) -> f64 {
    index as f64 * card_height + card_height / 4.0
}
