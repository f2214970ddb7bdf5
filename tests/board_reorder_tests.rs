// Tests for drag-and-drop reordering through the board controller

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use taskboard::board::render::EMPTY_BOARD_MESSAGE;
use taskboard::board::{
    pointer_for_index, stacked_bounds, BoardController, BoardError, CardBounds, ClickOutcome,
    DragPhase, DropOutcome,
};
use taskboard::db::DbConnection;
use taskboard::models::{NewTask, Placement, Stage, Task, TaskUpdate};
use taskboard::repo::{ProjectRepo, StageRepo, TaskRepo};
use taskboard::store::{BoardStore, SqliteStore, StoreError};

const CARD: f64 = 40.0;

/// Board fixture: "Not Started" holds A, B, C; "In Progress" holds D; "Done" is empty
struct Fixture {
    store: SqliteStore,
    project_id: i64,
    todo: i64,
    doing: i64,
    done: i64,
    a: i64,
    b: i64,
    c: i64,
    d: i64,
}

fn fixture() -> Fixture {
    let conn = DbConnection::connect_in_memory().unwrap();
    let project = ProjectRepo::create_with_default_stages(&conn, "Website Redesign", None).unwrap();
    let stages: Vec<Stage> = StageRepo::list_for_project(&conn, project.id).unwrap();
    let (todo, doing, done) = (stages[0].id, stages[1].id, stages[2].id);

    let add = |stage_id: i64, title: &str| {
        TaskRepo::create(&conn, &NewTask::new(project.id, stage_id, title, None, false).unwrap())
            .unwrap()
            .id
    };
    let a = add(todo, "A");
    let b = add(todo, "B");
    let c = add(todo, "C");
    let d = add(doing, "D");

    Fixture {
        store: SqliteStore::new(conn),
        project_id: project.id,
        todo,
        doing,
        done,
        a,
        b,
        c,
        d,
    }
}

fn column_cards<S: BoardStore>(board: &BoardController<S>, stage_id: i64) -> Vec<CardBounds> {
    stacked_bounds(board.order().column(stage_id).unwrap(), CARD)
}

async fn stored_placements(store: &SqliteStore, project_id: i64) -> Vec<(i64, Placement)> {
    let mut tasks: Vec<Task> = store.fetch_tasks(project_id).await.unwrap();
    tasks.sort_by_key(|t| t.id);
    tasks.into_iter().map(|t| (t.id, t.placement())).collect()
}

fn at(stage_id: i64, position: i64) -> Placement {
    Placement { stage_id, position }
}

/// Store wrapper that injects placement failures, slow writes and fetch failures
struct FaultyStore {
    inner: SqliteStore,
    fail_placement_for: Option<i64>,
    placement_delay: Option<Duration>,
    fail_fetch: AtomicBool,
}

impl FaultyStore {
    fn new(inner: SqliteStore) -> Self {
        FaultyStore {
            inner,
            fail_placement_for: None,
            placement_delay: None,
            fail_fetch: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BoardStore for FaultyStore {
    async fn fetch_stages(&self, project_id: i64) -> Result<Vec<Stage>, StoreError> {
        self.inner.fetch_stages(project_id).await
    }

    async fn fetch_tasks(&self, project_id: i64) -> Result<Vec<Task>, StoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.fetch_tasks(project_id).await
    }

    async fn update_task_placement(
        &self,
        project_id: i64,
        task_id: i64,
        placement: Placement,
    ) -> Result<(), StoreError> {
        if let Some(delay) = self.placement_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_placement_for == Some(task_id) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        self.inner.update_task_placement(project_id, task_id, placement).await
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, StoreError> {
        self.inner.create_task(new_task).await
    }

    async fn update_task(
        &self,
        project_id: i64,
        task_id: i64,
        update: TaskUpdate,
    ) -> Result<Task, StoreError> {
        self.inner.update_task(project_id, task_id, update).await
    }

    async fn delete_task(&self, project_id: i64, task_id: i64) -> Result<(), StoreError> {
        self.inner.delete_task(project_id, task_id).await
    }
}

#[tokio::test]
async fn test_reorder_within_stage() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.c));
    let cards = column_cards(&board, f.todo);
    assert!(board.drag_over(f.todo, pointer_for_index(0, CARD), &cards));
    assert_eq!(board.order().column(f.todo).unwrap(), &[f.c, f.a, f.b]);

    let outcome = board.drop_on(f.todo).await.unwrap();
    assert_eq!(outcome, DropOutcome::Persisted { writes: 3 });

    let placements = stored_placements(&f.store, f.project_id).await;
    assert_eq!(
        placements,
        vec![(f.a, at(f.todo, 1)), (f.b, at(f.todo, 2)), (f.c, at(f.todo, 0)), (f.d, at(f.doing, 0))]
    );
    assert!(board.snapshot().is_dense());
    assert_eq!(board.order(), board.snapshot().order());
}

#[tokio::test]
async fn test_move_to_empty_stage_renumbers_source() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    assert!(board.drag_over(f.done, 10.0, &[]));
    let outcome = board.drop_on(f.done).await.unwrap();
    assert_eq!(outcome, DropOutcome::Persisted { writes: 3 });

    let placements = stored_placements(&f.store, f.project_id).await;
    assert_eq!(
        placements,
        vec![(f.a, at(f.done, 0)), (f.b, at(f.todo, 0)), (f.c, at(f.todo, 1)), (f.d, at(f.doing, 0))]
    );
}

#[tokio::test]
async fn test_move_into_middle_of_other_stage() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.b));
    let cards = column_cards(&board, f.doing);
    board.drag_over(f.doing, pointer_for_index(0, CARD), &cards);
    let outcome = board.drop_on(f.doing).await.unwrap();

    // B lands above D; C shifts up, D shifts down, A stays
    assert_eq!(outcome, DropOutcome::Persisted { writes: 3 });
    let placements = stored_placements(&f.store, f.project_id).await;
    assert_eq!(
        placements,
        vec![(f.a, at(f.todo, 0)), (f.b, at(f.doing, 0)), (f.c, at(f.todo, 1)), (f.d, at(f.doing, 1))]
    );
}

#[tokio::test]
async fn test_drop_in_place_writes_nothing() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();
    let before = stored_placements(&f.store, f.project_id).await;

    assert!(board.drag_start(f.b));
    let cards = column_cards(&board, f.todo);
    assert!(!board.drag_over(f.todo, pointer_for_index(1, CARD) + 20.0, &cards));

    let outcome = board.drop_on(f.todo).await.unwrap();
    assert_eq!(outcome, DropOutcome::Unchanged);
    assert_eq!(stored_placements(&f.store, f.project_id).await, before);
    assert_eq!(board.phase(), DragPhase::Settling);
}

#[tokio::test]
async fn test_adjacent_swap_writes_only_two_tasks() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.c));
    let cards = column_cards(&board, f.todo);
    // Just above B's midpoint
    board.drag_over(f.todo, 45.0, &cards);
    assert_eq!(board.order().column(f.todo).unwrap(), &[f.a, f.c, f.b]);

    let outcome = board.drop_on(f.todo).await.unwrap();
    assert_eq!(outcome, DropOutcome::Persisted { writes: 2 });
}

#[tokio::test]
async fn test_hover_ignores_stale_card_bounds() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    // A card that is not in the hovered column is not a candidate
    let cards = vec![
        CardBounds { task_id: 999, top: 0.0, height: CARD },
        CardBounds { task_id: f.d, top: 40.0, height: CARD },
    ];
    board.drag_over(f.doing, 5.0, &cards);
    assert_eq!(board.order().column(f.doing).unwrap(), &[f.a, f.d]);

    // Unknown stage leaves the order alone
    assert!(!board.drag_over(999, 5.0, &[]));
}

#[tokio::test]
async fn test_cancel_restores_loaded_order() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();
    let before = stored_placements(&f.store, f.project_id).await;

    assert!(board.drag_start(f.a));
    assert!(board.drag_over(f.done, 0.0, &[]));
    assert_ne!(board.order(), board.snapshot().order());

    assert!(board.drag_cancel());
    assert_eq!(board.order(), board.snapshot().order());
    assert_eq!(board.phase(), DragPhase::Settling);
    assert_eq!(stored_placements(&f.store, f.project_id).await, before);
}

#[tokio::test]
async fn test_drop_on_unknown_stage_is_ignored() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    board.drag_over(f.done, 0.0, &[]);
    let outcome = board.drop_on(999).await.unwrap();
    assert_eq!(outcome, DropOutcome::Ignored);
    assert_eq!(board.order(), board.snapshot().order());

    // No drag in progress
    assert_eq!(board.drop_on(f.todo).await.unwrap(), DropOutcome::Ignored);
}

#[tokio::test]
async fn test_drag_start_rules() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(!board.drag_start(999));
    assert!(board.drag_start(f.a));
    assert!(!board.drag_start(f.b));
    assert_eq!(board.phase(), DragPhase::Dragging { task_id: f.a });
}

#[tokio::test]
async fn test_click_after_drag_is_suppressed() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert_eq!(board.click(f.a), Some(ClickOutcome::OpenEditor(f.a)));

    board.drag_start(f.a);
    board.drag_over(f.done, 0.0, &[]);
    board.drop_on(f.done).await.unwrap();

    assert_eq!(board.click(f.a), Some(ClickOutcome::Suppressed));
    assert_eq!(board.click(f.a), Some(ClickOutcome::OpenEditor(f.a)));

    board.drag_start(f.b);
    board.drag_cancel();
    board.settle();
    assert_eq!(board.phase(), DragPhase::Idle);
    assert_eq!(board.click(f.b), Some(ClickOutcome::OpenEditor(f.b)));
    assert_eq!(board.click(999), None);
}

#[tokio::test]
async fn test_partial_write_failure_reloads_actual_state() {
    let f = fixture();
    let mut faulty = FaultyStore::new(f.store.clone());
    faulty.fail_placement_for = Some(f.a);
    let mut board = BoardController::load(faulty, f.project_id).await.unwrap();

    assert!(board.drag_start(f.c));
    let cards = column_cards(&board, f.todo);
    board.drag_over(f.todo, pointer_for_index(0, CARD), &cards);

    match board.drop_on(f.todo).await.unwrap() {
        DropOutcome::Failed { writes, failed, message } => {
            assert_eq!(writes, 3);
            assert_eq!(failed, 1);
            assert!(message.contains("write rejected"), "message: {}", message);
        }
        other => panic!("expected a failed drop, got {:?}", other),
    }

    // The successful writes stick; the board shows what the store holds
    let snapshot = board.snapshot();
    assert_eq!(snapshot.task(f.c).unwrap().placement(), at(f.todo, 0));
    assert_eq!(snapshot.task(f.b).unwrap().placement(), at(f.todo, 2));
    assert_eq!(snapshot.task(f.a).unwrap().placement(), at(f.todo, 0));
    assert!(!snapshot.is_dense());
    assert!(board.halted().is_none());

    board.settle();
    assert!(board.drag_start(f.b));
}

#[tokio::test]
async fn test_write_timeout_reports_failure() {
    let f = fixture();
    let before = stored_placements(&f.store, f.project_id).await;
    let mut slow = FaultyStore::new(f.store.clone());
    slow.placement_delay = Some(Duration::from_secs(5));
    let mut board = BoardController::load(slow, f.project_id)
        .await
        .unwrap()
        .with_persist_timeout(Duration::from_millis(50));

    assert!(board.drag_start(f.a));
    board.drag_over(f.done, 0.0, &[]);

    match board.drop_on(f.done).await.unwrap() {
        DropOutcome::Failed { failed, message, .. } => {
            assert_eq!(failed, 3);
            assert!(message.contains("timed out"), "message: {}", message);
        }
        other => panic!("expected a timed out drop, got {:?}", other),
    }

    assert_eq!(stored_placements(&f.store, f.project_id).await, before);
    assert_eq!(board.order(), board.snapshot().order());
    assert_eq!(board.phase(), DragPhase::Settling);
}

#[tokio::test]
async fn test_reload_failure_halts_board() {
    let f = fixture();
    let store = std::sync::Arc::new(FaultyStore::new(f.store.clone()));
    let mut board = BoardController::load(store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    board.drag_over(f.done, 0.0, &[]);
    store.fail_fetch.store(true, Ordering::SeqCst);

    let err = board.drop_on(f.done).await.unwrap_err();
    match &err {
        BoardError::DropReload { outcome, source } => {
            assert_eq!(*outcome, DropOutcome::Persisted { writes: 3 });
            assert!(matches!(**source, BoardError::Load { .. }));
        }
        other => panic!("expected a reload failure after the drop, got {:?}", other),
    }
    assert!(board.halted().unwrap().contains("connection reset"));

    // Writes went through before the reload failed
    let placements = stored_placements(&f.store, f.project_id).await;
    assert!(placements.contains(&(f.a, at(f.done, 0))));

    board.settle();
    assert!(!board.drag_start(f.b));
    let err = board.create_task(f.todo, "E", None, false).await.unwrap_err();
    assert!(matches!(err, BoardError::Halted(_)));

    store.fail_fetch.store(false, Ordering::SeqCst);
    board.reload().await.unwrap();
    assert!(board.halted().is_none());
    assert!(board.drag_start(f.b));
}

#[tokio::test]
async fn test_reload_failure_keeps_write_failure_message() {
    let f = fixture();
    let mut faulty = FaultyStore::new(f.store.clone());
    faulty.fail_placement_for = Some(f.c);
    let store = std::sync::Arc::new(faulty);
    let mut board = BoardController::load(store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    board.drag_over(f.done, 0.0, &[]);
    store.fail_fetch.store(true, Ordering::SeqCst);

    let err = board.drop_on(f.done).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Failed to save task order"), "message: {}", message);
    assert!(message.contains("write rejected"), "message: {}", message);
    match err {
        BoardError::DropReload { outcome: DropOutcome::Failed { writes, failed, .. }, .. } => {
            assert_eq!((writes, failed), (3, 1));
        }
        other => panic!("expected a failed drop inside the reload error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_after_partial_failure_does_not_share_position() {
    let f = fixture();
    let mut faulty = FaultyStore::new(f.store.clone());
    faulty.fail_placement_for = Some(f.c);
    let mut board = BoardController::load(faulty, f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    board.drag_over(f.done, 0.0, &[]);
    assert!(matches!(board.drop_on(f.done).await.unwrap(), DropOutcome::Failed { failed: 1, .. }));
    board.settle();

    // C's write failed, so To Do holds B at 0 and C at 2
    let e = board.create_task(f.todo, "E", None, false).await.unwrap();
    assert_eq!(e.placement(), at(f.todo, 3));

    let todo: Vec<i64> = board
        .snapshot()
        .order()
        .column(f.todo)
        .unwrap()
        .iter()
        .map(|id| board.snapshot().task(*id).unwrap().position)
        .collect();
    assert_eq!(todo, vec![0, 2, 3]);
}

/// Deterministic index picker for long drag sequences
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as usize
    }
}

#[tokio::test]
async fn test_drag_sequence_keeps_positions_dense() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();
    board.create_task(f.todo, "E", None, false).await.unwrap();
    board.create_task(f.todo, "F", None, false).await.unwrap();

    let mut rng = Lcg(7);
    for round in 0..40 {
        let column = board.order().column(f.todo).unwrap().to_vec();
        assert_eq!(column.len(), 5);
        let dragged = column[rng.next(column.len())];
        let slot = rng.next(column.len() + 1);

        assert!(board.drag_start(dragged), "round {}", round);
        let cards = column_cards(&board, f.todo);
        board.drag_over(f.todo, pointer_for_index(slot, CARD), &cards);
        let shown = board.order().column(f.todo).unwrap().to_vec();

        board.drop_on(f.todo).await.unwrap();
        board.settle();

        assert_eq!(board.snapshot().order().column(f.todo).unwrap(), shown.as_slice(), "round {}", round);
        assert!(board.snapshot().is_dense(), "round {}", round);
    }
}

#[tokio::test]
async fn test_hover_across_stages_uses_last_hovered_column() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    assert!(board.drag_start(f.a));
    assert!(board.drag_over(f.done, 0.0, &[]));
    assert_eq!(board.order().column(f.done).unwrap(), &[f.a]);

    let cards = column_cards(&board, f.doing);
    assert!(board.drag_over(f.doing, pointer_for_index(0, CARD), &cards));
    assert!(board.order().column(f.done).unwrap().is_empty());
    assert_eq!(board.order().column(f.doing).unwrap(), &[f.a, f.d]);

    let outcome = board.drop_on(f.doing).await.unwrap();
    assert_eq!(outcome, DropOutcome::Persisted { writes: 4 });

    let placements = stored_placements(&f.store, f.project_id).await;
    assert_eq!(
        placements,
        vec![(f.a, at(f.doing, 0)), (f.b, at(f.todo, 0)), (f.c, at(f.todo, 1)), (f.d, at(f.doing, 1))]
    );
    assert!(board.snapshot().is_dense());
}

#[tokio::test]
async fn test_editor_create_update_delete() {
    let f = fixture();
    let mut board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();

    let created = board.create_task(f.done, "  Ship it  ", Some("   "), true).await.unwrap();
    assert_eq!(created.title, "Ship it");
    assert_eq!(created.description, None);
    assert_eq!(created.placement(), at(f.done, 0));
    assert!(board.snapshot().task(created.id).is_some());

    let err = board.create_task(f.todo, "   ", None, false).await.unwrap_err();
    assert!(matches!(err, BoardError::Invalid(_)));
    let err = board.create_task(999, "X", None, false).await.unwrap_err();
    assert!(matches!(err, BoardError::UnknownStage(999)));

    // Changing stage appends to the target and closes the gap behind
    let update = TaskUpdate { stage_id: Some(f.doing), ..Default::default() };
    let moved = board.update_task(f.a, update).await.unwrap();
    assert_eq!(moved.placement(), at(f.doing, 1));
    assert_eq!(board.snapshot().task(f.b).unwrap().placement(), at(f.todo, 0));
    assert!(board.snapshot().is_dense());

    board.delete_task(f.b).await.unwrap();
    assert!(board.snapshot().task(f.b).is_none());
    assert_eq!(board.snapshot().task(f.c).unwrap().placement(), at(f.todo, 0));

    let err = board.delete_task(f.b).await.unwrap_err();
    assert!(matches!(err, BoardError::UnknownTask(_)));
}

#[tokio::test]
async fn test_stage_options_and_empty_board() {
    let f = fixture();
    let board = BoardController::load(f.store.clone(), f.project_id).await.unwrap();
    let names: Vec<String> = board.stage_options().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["Not Started", "In Progress", "Done"]);

    let empty_project = {
        let conn = f.store.connection().unwrap();
        ProjectRepo::create(&conn, "Empty", None).unwrap().id
    };
    let empty = BoardController::load(f.store.clone(), empty_project).await.unwrap();
    assert!(empty.render(80).contains(EMPTY_BOARD_MESSAGE));
    assert!(empty.stage_options().is_empty());
}
