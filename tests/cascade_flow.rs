// Integration tests (native) for full turns: swap, cascade, scoring, game end.
// Every test drives `Game::tick` with a virtual clock and records shell calls.

use gem_cascade::config::CascadePacing;
use gem_cascade::{
    Coord, Game, GameConfig, IgnoreReason, RecordingShell, ShellEvent, SwapOutcome, TurnPhase,
};

// No runs anywhere. Swapping (4,2) with (5,2) lines up three 5s on row 5.
const ROWS: [[u8; 6]; 6] = [
    [0, 1, 2, 3, 4, 0],
    [2, 3, 4, 0, 1, 2],
    [4, 0, 1, 2, 3, 4],
    [1, 2, 3, 4, 0, 1],
    [3, 4, 5, 1, 2, 3],
    [5, 5, 2, 3, 4, 0],
];

fn layout() -> Vec<Vec<Option<u8>>> {
    ROWS.iter().map(|r| r.iter().copied().map(Some).collect()).collect()
}

fn game_with(config: GameConfig) -> Game<RecordingShell> {
    Game::from_layout(config, RecordingShell::new(), &layout()).unwrap()
}

fn game() -> Game<RecordingShell> {
    game_with(GameConfig {
        seed: Some(42),
        ..GameConfig::default()
    })
}

/// Tick at 60 Hz until the turn and every animation are done. Returns the final time.
fn settle(g: &mut Game<RecordingShell>, mut now: f64) -> f64 {
    let limit = now + 60_000.0;
    while (g.is_animating() || !g.context().animator.is_idle()) && now < limit {
        now += 16.0;
        g.tick(now);
    }
    assert!(now < limit, "turn did not settle");
    now
}

fn assert_consistent(g: &Game<RecordingShell>) {
    let ctx = g.context();
    assert_eq!(g.board().gems().count(), 36);
    assert_eq!(g.scene().len(), 36);
    for gem in g.board().gems() {
        let e = g.scene().get(gem.entity).expect("gem entity is live");
        assert_eq!(e.grid, gem.coord());
        assert_eq!(e.hit_volume.grid, gem.coord());
        assert_eq!(e.transform.position, ctx.layout.cell_center(gem.coord()));
        assert_eq!(e.visual.opacity, 1.0);
    }
}

#[test]
fn committed_swap_scores_and_spends_a_move() {
    let mut g = game();
    g.tick(0.0);
    let out = g.submit_swap_attempt(Coord::new(4, 2), Coord::new(5, 2), 0.0);
    assert_eq!(out, SwapOutcome::Committed);
    assert_eq!(g.moves_remaining(), 9);
    assert!(g.is_animating());

    g.tick(150.0);
    assert_eq!(g.score(), 0);
    g.tick(300.0);
    assert_eq!(g.score(), 30);
    assert_eq!(g.shell().last_score_and_moves(), Some((30, 9)));

    settle(&mut g, 300.0);
    assert_eq!(g.phase(), TurnPhase::Idle);
    assert!(g.board().scan_matches().is_empty());
    assert_eq!(g.score() % 10, 0);
    assert_consistent(&g);
}

#[test]
fn non_matching_swap_reverts_for_free() {
    let mut g = game();
    let before = g.board().kinds_snapshot();
    g.tick(0.0);
    let out = g.submit_swap_attempt(Coord::new(0, 0), Coord::new(0, 1), 0.0);
    assert_eq!(out, SwapOutcome::Reverted);
    assert_eq!(g.moves_remaining(), 10);
    assert_eq!(g.board().kinds_snapshot(), before);

    g.tick(200.0);
    assert!(g.is_animating());
    g.tick(400.0);
    assert!(!g.is_animating());
    assert_eq!(g.score(), 0);
    assert_consistent(&g);
}

#[test]
fn invalid_requests_are_ignored() {
    let mut g = game();
    let far = g.submit_swap_attempt(Coord::new(0, 0), Coord::new(2, 0), 0.0);
    assert_eq!(far, SwapOutcome::Ignored(IgnoreReason::NotAdjacent));
    let diagonal = g.submit_swap_attempt(Coord::new(0, 0), Coord::new(1, 1), 0.0);
    assert_eq!(diagonal, SwapOutcome::Ignored(IgnoreReason::NotAdjacent));
    assert_eq!(g.moves_remaining(), 10);
    assert!(!g.is_animating());
}

#[test]
fn second_swap_during_cascade_is_ignored() {
    let mut g = game();
    g.tick(0.0);
    g.submit_swap_attempt(Coord::new(4, 2), Coord::new(5, 2), 0.0);
    let mut now = 0.0;
    while now < 900.0 {
        now += 16.0;
        g.tick(now);
        let out = g.submit_swap_attempt(Coord::new(0, 0), Coord::new(0, 1), now);
        assert_eq!(out, SwapOutcome::Ignored(IgnoreReason::Busy));
    }
    assert_eq!(g.moves_remaining(), 9);
}

#[test]
fn last_move_ends_game_after_cascade() {
    let mut g = game_with(GameConfig {
        seed: Some(42),
        starting_moves: 1,
        ..GameConfig::default()
    });
    g.tick(0.0);
    assert_eq!(
        g.submit_swap_attempt(Coord::new(4, 2), Coord::new(5, 2), 0.0),
        SwapOutcome::Committed
    );
    assert!(g.game_ended());
    assert_eq!(g.shell().game_ended_count(), 0);

    let now = settle(&mut g, 0.0);
    assert_eq!(g.shell().game_ended_count(), 1);
    assert!(
        g.shell()
            .events
            .contains(&ShellEvent::GameEnded { final_score: g.score() })
    );

    let out = g.submit_swap_attempt(Coord::new(0, 0), Coord::new(0, 1), now);
    assert_eq!(out, SwapOutcome::Ignored(IgnoreReason::GameEnded));
    for i in 1..20 {
        g.tick(now + i as f64 * 16.0);
    }
    assert_eq!(g.shell().game_ended_count(), 1);
}

#[test]
fn swipe_gesture_submits_swap() {
    let mut g = game();
    g.on_resize(1280.0, 720.0);
    g.tick(0.0);
    let c = g.context().layout.cell_center(Coord::new(4, 2));
    let (x, y) = g.viewport().world_to_screen(c);

    assert!(matches!(
        g.pointer_down(x, y),
        gem_cascade::input::PointerDown::Selected(_)
    ));
    assert!(!g.tutorial_visible());
    g.pointer_move(x + 2.0, y + 15.0);
    assert_eq!(g.pointer_up(x + 3.0, y + 40.0, 10.0), Some(SwapOutcome::Committed));
    assert_eq!(g.selection(), None);
    assert_eq!(g.moves_remaining(), 9);
}

#[test]
fn animation_driven_pacing_reaches_same_end_state() {
    let mut g = game_with(GameConfig {
        seed: Some(42),
        pacing: CascadePacing::AnimationDriven,
        ..GameConfig::default()
    });
    g.tick(0.0);
    g.submit_swap_attempt(Coord::new(4, 2), Coord::new(5, 2), 0.0);
    g.tick(300.0);
    assert_eq!(g.score(), 30);
    settle(&mut g, 300.0);
    assert_eq!(g.phase(), TurnPhase::Idle);
    assert!(g.board().scan_matches().is_empty());
    assert_consistent(&g);
}

#[test]
fn reset_mid_cascade_starts_clean() {
    let mut g = game_with(GameConfig {
        seed: Some(42),
        reset_moves: Some(30),
        ..GameConfig::default()
    });
    g.tick(0.0);
    g.submit_swap_attempt(Coord::new(4, 2), Coord::new(5, 2), 0.0);
    g.tick(300.0);
    g.tick(700.0);
    assert!(g.is_animating());

    g.reset_session();
    assert_eq!(g.phase(), TurnPhase::Idle);
    assert_eq!(g.score(), 0);
    assert_eq!(g.moves_remaining(), 30);
    assert!(g.context().animator.is_idle());
    assert!(g.board().scan_matches().is_empty());
    assert!(g.shell().events.contains(&ShellEvent::SessionReset));
    assert_consistent(&g);
}
