//! The game facade: owns the context, the resolver, the pointer tracker and
//! the shell, and exposes the inbound calls a host makes (frame ticks,
//! pointer events, resize, reset).

use log::info;

use crate::board::{Board, Coord};
use crate::cascade::{Resolver, SwapOutcome, TurnPhase};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::input::{PointerDown, PointerTracker};
use crate::scene::Scene;
use crate::session::GameContext;
use crate::shell::Shell;
use crate::tween::Completion;
use crate::viewport::{Viewport, fit_canvas};

/// Canvas size assumed until the host reports a real one.
const INITIAL_CANVAS_PX: f64 = 360.0;

const SWAY_SPEED: f64 = 2.0;
const SWAY_PHASE_STEP: f64 = 0.4;
const SWAY_AMPLITUDE: f64 = 0.12;
const SWAY_MIN_SCALE: f32 = 0.99;

pub struct Game<S: Shell> {
    ctx: GameContext,
    resolver: Resolver,
    pointer: PointerTracker,
    viewport: Viewport,
    shell: S,
    tutorial_visible: bool,
    tutorial_deadline: Option<f64>,
}

impl<S: Shell> Game<S> {
    pub fn new(config: GameConfig, shell: S) -> Result<Self, GameError> {
        Ok(Self::boot(GameContext::new(config)?, shell))
    }

    /// Start on a fixed board. Used by tests and scripted demos.
    pub fn from_layout(config: GameConfig, shell: S, rows: &[Vec<Option<u8>>]) -> Result<Self, GameError> {
        Ok(Self::boot(GameContext::with_layout(config, rows)?, shell))
    }

    fn boot(ctx: GameContext, mut shell: S) -> Self {
        let viewport = Viewport::new(INITIAL_CANVAS_PX, ctx.config.view_extent());
        shell.show_tutorial();
        shell.update_score_and_moves(ctx.session.score, ctx.session.moves_remaining);
        info!(
            "session started: {}x{} board, {} kinds, {} moves",
            ctx.config.grid_size, ctx.config.grid_size, ctx.config.gem_kinds, ctx.session.moves_remaining
        );
        Self {
            ctx,
            resolver: Resolver::new(),
            pointer: PointerTracker::new(),
            viewport,
            shell,
            tutorial_visible: true,
            tutorial_deadline: None,
        }
    }

    // --- Frame loop ----------------------------------------------------------

    /// Advance animations and the cascade to `now` (ms) and present a frame.
    pub fn tick(&mut self, now: f64) {
        self.update_tutorial(now);

        for completion in self.ctx.animator.tick(now, &mut self.ctx.scene) {
            if let Completion::Disappeared(id) = completion {
                self.ctx.scene.despawn(id);
            }
            self.resolver
                .on_completion(&mut self.ctx, &mut self.shell, completion, now);
        }
        self.resolver.advance(&mut self.ctx, &mut self.shell, now);

        if self.ctx.config.idle_sway {
            self.sway(now);
        }
        self.shell.present(&self.ctx.scene, &self.ctx.layout);
    }

    fn update_tutorial(&mut self, now: f64) {
        if !self.tutorial_visible {
            return;
        }
        let deadline = *self
            .tutorial_deadline
            .get_or_insert(now + self.ctx.config.tutorial_ms);
        if now >= deadline {
            self.hide_tutorial();
        }
    }

    fn hide_tutorial(&mut self) {
        if self.tutorial_visible {
            self.tutorial_visible = false;
            self.shell.hide_tutorial();
        }
    }

    /// Gentle z-rotation on resting gems, phase-shifted along the diagonals.
    fn sway(&mut self, now: f64) {
        let t = now / 1000.0 * SWAY_SPEED;
        let ctx = &mut self.ctx;
        for gem in ctx.board.gems() {
            if ctx.session.selection == Some(gem.coord()) || ctx.animator.is_animating(gem.entity) {
                continue;
            }
            let Some(e) = ctx.scene.get_mut(gem.entity) else { continue };
            if e.transform.scale.x < SWAY_MIN_SCALE {
                continue;
            }
            let phase = (gem.row + gem.col) as f64 * SWAY_PHASE_STEP;
            e.transform.rotation.z = ((t + phase).sin() * SWAY_AMPLITUDE) as f32;
        }
    }

    // --- Inbound calls -------------------------------------------------------

    pub fn submit_swap_attempt(&mut self, a: Coord, b: Coord, now: f64) -> SwapOutcome {
        self.resolver
            .submit_swap(&mut self.ctx, &mut self.shell, a, b, now)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> PointerDown {
        let busy = self.resolver.is_busy();
        let down = self
            .pointer
            .pointer_down(&mut self.ctx, &self.viewport, busy, x, y);
        if down != PointerDown::Ignored {
            self.hide_tutorial();
        }
        down
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.pointer.pointer_move(&self.ctx.config.input, x, y);
    }

    /// Release the pointer; a swipe is submitted as a swap attempt.
    pub fn pointer_up(&mut self, x: f64, y: f64, now: f64) -> Option<SwapOutcome> {
        let intent = self.pointer.pointer_up(&mut self.ctx, x, y)?;
        Some(self.submit_swap_attempt(intent.from, intent.to, now))
    }

    /// Deal a fresh board with the reset move budget. Any running cascade or
    /// animation is dropped.
    pub fn reset_session(&mut self) {
        let moves = self.ctx.config.reset_move_budget();
        self.ctx.rebuild(moves);
        self.resolver.reset();
        self.pointer.cancel();
        self.shell.on_session_reset();
        self.shell
            .update_score_and_moves(self.ctx.session.score, self.ctx.session.moves_remaining);
        info!("session reset with {} moves", moves);
    }

    /// Refit the canvas to a `width` x `height` window. Returns the canvas edge in px.
    pub fn on_resize(&mut self, width: f64, height: f64) -> f64 {
        let px = fit_canvas(width, height);
        self.viewport = Viewport::new(px, self.ctx.config.view_extent());
        self.shell.resize(&self.viewport);
        px
    }

    // --- Queries -------------------------------------------------------------

    pub fn score(&self) -> u32 {
        self.ctx.session.score
    }

    pub fn moves_remaining(&self) -> u32 {
        self.ctx.session.moves_remaining
    }

    pub fn game_ended(&self) -> bool {
        self.ctx.session.game_ended
    }

    /// True while any part of a turn (feedback, swap or cascade) is running.
    pub fn is_animating(&self) -> bool {
        self.resolver.is_busy()
    }

    pub fn phase(&self) -> TurnPhase {
        self.resolver.phase()
    }

    pub fn selection(&self) -> Option<Coord> {
        self.ctx.session.selection
    }

    pub fn tutorial_visible(&self) -> bool {
        self.tutorial_visible
    }

    pub fn board(&self) -> &Board {
        &self.ctx.board
    }

    pub fn scene(&self) -> &Scene {
        &self.ctx.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{RecordingShell, ShellEvent};

    fn game() -> Game<RecordingShell> {
        let config = GameConfig {
            seed: Some(2),
            ..GameConfig::default()
        };
        Game::new(config, RecordingShell::new()).unwrap()
    }

    #[test]
    fn test_boot_shows_tutorial_and_hud() {
        let g = game();
        assert_eq!(
            g.shell().events,
            vec![
                ShellEvent::TutorialShown,
                ShellEvent::ScoreAndMoves { score: 0, moves: 10 }
            ]
        );
        assert!(g.tutorial_visible());
    }

    #[test]
    fn test_tutorial_hides_after_timeout() {
        let mut g = game();
        g.tick(1000.0);
        g.tick(5999.0);
        assert!(g.tutorial_visible());
        g.tick(6000.0);
        assert!(!g.tutorial_visible());
        g.tick(9000.0);
        let hidden = g
            .shell()
            .events
            .iter()
            .filter(|e| **e == ShellEvent::TutorialHidden)
            .count();
        assert_eq!(hidden, 1);
        assert_eq!(g.shell().frames, 4);
    }

    #[test]
    fn test_first_touch_hides_tutorial() {
        let mut g = game();
        g.on_resize(300.0, 800.0);
        g.pointer_down(130.0, 130.0);
        assert!(!g.tutorial_visible());
    }

    #[test]
    fn test_idle_sway_rotates_resting_gems() {
        let mut g = game();
        g.tick(400.0);
        let gem = *g.board().get(Coord::new(1, 2)).unwrap();
        let z = g.scene().get(gem.entity).unwrap().transform.rotation.z;
        let expected = ((0.4f64 * 2.0 + 3.0 * 0.4).sin() * 0.12) as f32;
        assert!((z - expected).abs() < 1e-5);
    }

    #[test]
    fn test_resize_refits_viewport() {
        let mut g = game();
        assert_eq!(g.on_resize(1280.0, 720.0), 300.0);
        assert_eq!(g.viewport().canvas_px, 300.0);
        assert_eq!(
            g.shell().events.last(),
            Some(&ShellEvent::Resized { canvas_px: 300.0 })
        );
    }

    #[test]
    fn test_larger_board_fits_canvas() {
        let mut g = Game::new(
            GameConfig {
                seed: Some(4),
                grid_size: 8,
                ..GameConfig::default()
            },
            RecordingShell::new(),
        )
        .unwrap();
        let px = g.on_resize(400.0, 800.0);
        assert_eq!(px, 360.0);

        let layout = g.context().layout;
        for coord in [Coord::new(0, 0), Coord::new(0, 7), Coord::new(7, 0), Coord::new(7, 7)] {
            let (x, y) = g.viewport().world_to_screen(layout.cell_center(coord));
            assert!((0.0..px).contains(&x) && (0.0..px).contains(&y), "{:?} at ({}, {})", coord, x, y);
            assert_eq!(g.pointer_down(x, y), PointerDown::Selected(coord));
        }
    }

    #[test]
    fn test_zero_move_budget_is_rejected() {
        let config = GameConfig {
            starting_moves: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            Game::new(config, RecordingShell::new()),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset_restores_budget() {
        let mut g = Game::new(
            GameConfig {
                seed: Some(2),
                reset_moves: Some(30),
                ..GameConfig::default()
            },
            RecordingShell::new(),
        )
        .unwrap();
        g.reset_session();
        assert_eq!(g.moves_remaining(), 30);
        assert_eq!(g.score(), 0);
        assert_eq!(g.phase(), TurnPhase::Idle);
        assert_eq!(
            g.shell().last_score_and_moves(),
            Some((0, 30))
        );
    }
}
