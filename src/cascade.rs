//! Turn state machine: swap validation, commit or revert, and the
//! remove / gravity / refill cascade that follows a committed swap.
//!
//! The resolver never blocks. Each step schedules animations, records a
//! deadline and returns; [`Resolver::advance`] is polled every frame and moves
//! on once the deadline (or, with animation-driven pacing, the animator) says
//! the step is done.

use glam::Vec3;
use log::{debug, info, warn};

use crate::board::Coord;
use crate::config::CascadePacing;
use crate::session::GameContext;
use crate::shell::Shell;
use crate::tween::Completion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveStep {
    Removing,
    Falling,
    Refilling,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Invalid-move feedback is playing.
    Reverting,
    /// Swap animation is playing; a cascade follows.
    Committed,
    Resolving(ResolveStep),
}

impl TurnPhase {
    pub fn is_busy(self) -> bool {
        self != TurnPhase::Idle
    }

    fn can_become(self, next: TurnPhase) -> bool {
        use ResolveStep::*;
        use TurnPhase::*;
        matches!(
            (self, next),
            (Idle, Reverting)
                | (Idle, Committed)
                | (Reverting, Idle)
                | (Committed, Resolving(Removing))
                | (Committed, Idle)
                | (Resolving(Removing), Resolving(Falling))
                | (Resolving(Falling), Resolving(Refilling))
                | (Resolving(Refilling), Resolving(Removing))
                | (Resolving(Refilling), Idle)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    Busy,
    GameEnded,
    OutOfBounds,
    EmptyCell,
    NotAdjacent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    Committed,
    Reverted,
    Ignored(IgnoreReason),
}

#[derive(Debug, Default)]
pub struct Resolver {
    phase: TurnPhase,
    ready_at: f64,
    passes: u32,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Passes run since the last committed swap.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Back to Idle without running any transition checks.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn transition(&mut self, next: TurnPhase) {
        if !self.phase.can_become(next) {
            debug_assert!(false, "illegal turn transition {:?} -> {:?}", self.phase, next);
            log::error!("illegal turn transition {:?} -> {:?}", self.phase, next);
        }
        self.phase = next;
    }

    fn guard(&self, ctx: &GameContext, a: Coord, b: Coord) -> Option<IgnoreReason> {
        if self.is_busy() {
            return Some(IgnoreReason::Busy);
        }
        if !ctx.session.can_play() {
            return Some(IgnoreReason::GameEnded);
        }
        if !ctx.board.contains(a) || !ctx.board.contains(b) {
            return Some(IgnoreReason::OutOfBounds);
        }
        if !ctx.board.is_occupied(a) || !ctx.board.is_occupied(b) {
            return Some(IgnoreReason::EmptyCell);
        }
        if !a.is_adjacent(b) {
            return Some(IgnoreReason::NotAdjacent);
        }
        None
    }

    /// Try to swap `a` and `b`. A swap that makes no match is shown as an
    /// invalid move and costs nothing.
    pub fn submit_swap(
        &mut self,
        ctx: &mut GameContext,
        shell: &mut dyn Shell,
        a: Coord,
        b: Coord,
        now: f64,
    ) -> SwapOutcome {
        if let Some(reason) = self.guard(ctx, a, b) {
            debug!("swap {:?} <-> {:?} ignored: {:?}", a, b, reason);
            return SwapOutcome::Ignored(reason);
        }
        let (Some(ga), Some(gb)) = (ctx.board.get(a).copied(), ctx.board.get(b).copied()) else {
            return SwapOutcome::Ignored(IgnoreReason::EmptyCell);
        };

        ctx.swap_cells(a, b);
        let matched = !ctx.board.find_matches(a).is_empty() || !ctx.board.find_matches(b).is_empty();

        if !matched {
            ctx.animator.invalid_move(&mut ctx.scene, ga.entity, gb.entity, now);
            ctx.swap_cells(a, b);
            self.transition(TurnPhase::Reverting);
            debug!("swap {:?} <-> {:?} reverted", a, b);
            return SwapOutcome::Reverted;
        }

        // Capture start positions before the deselect snaps the gem to its new cell.
        ctx.animator.swap(&mut ctx.scene, ga.entity, gb.entity, now);
        ctx.deselect();
        ctx.session.spend_move();
        shell.update_score_and_moves(ctx.session.score, ctx.session.moves_remaining);
        self.passes = 0;
        self.transition(TurnPhase::Committed);
        debug!(
            "swap {:?} <-> {:?} committed, {} moves left",
            a, b, ctx.session.moves_remaining
        );
        SwapOutcome::Committed
    }

    /// React to a finished animation.
    pub fn on_completion(&mut self, ctx: &mut GameContext, shell: &mut dyn Shell, completion: Completion, now: f64) {
        match completion {
            Completion::SwapFinished { .. } if self.phase == TurnPhase::Committed => {
                self.begin_pass(ctx, shell, now);
            }
            Completion::InvalidMoveFinished { .. } if self.phase == TurnPhase::Reverting => {
                self.transition(TurnPhase::Idle);
            }
            _ => {}
        }
    }

    fn ready(&self, ctx: &GameContext, now: f64) -> bool {
        match ctx.config.pacing {
            CascadePacing::FixedDelays => now >= self.ready_at,
            CascadePacing::AnimationDriven => ctx.animator.is_idle(),
        }
    }

    /// Poll the cascade; moves to the next step when the current one is done.
    pub fn advance(&mut self, ctx: &mut GameContext, shell: &mut dyn Shell, now: f64) {
        let TurnPhase::Resolving(step) = self.phase else {
            return;
        };
        if !self.ready(ctx, now) {
            return;
        }
        match step {
            ResolveStep::Removing => self.drop_gems(ctx, now),
            ResolveStep::Falling => self.refill(ctx, now),
            ResolveStep::Refilling => {
                ctx.deselect();
                settle_all(ctx);
                self.begin_pass(ctx, shell, now);
            }
        }
    }

    fn begin_pass(&mut self, ctx: &mut GameContext, shell: &mut dyn Shell, now: f64) {
        let matched = ctx.board.scan_matches();
        if matched.is_empty() {
            self.finish(ctx, shell);
            return;
        }
        self.passes += 1;
        if self.passes > ctx.config.max_cascade_passes {
            warn!(
                "cascade stopped after {} passes with {} gems still matched",
                ctx.config.max_cascade_passes,
                matched.len()
            );
            self.finish(ctx, shell);
            return;
        }

        let timings = &ctx.config.cascade;
        let gained = timings.score_per_gem.saturating_mul(matched.len() as u32);
        ctx.session.score = ctx.session.score.saturating_add(gained);
        shell.update_score_and_moves(ctx.session.score, ctx.session.moves_remaining);

        let stagger = timings.disappear_stagger_ms;
        let wait = timings.remove_wait_ms;
        for (i, coord) in matched.iter().enumerate() {
            if ctx.is_selected(*coord) {
                ctx.session.selection = None;
            }
            let Some(gem) = ctx.board.take(*coord) else { continue };
            if let Some(e) = ctx.scene.get_mut(gem.entity) {
                e.transform.scale = Vec3::ONE;
            }
            ctx.animator.disappear(&mut ctx.scene, gem.entity, i as f64 * stagger, now);
        }
        debug!("pass {}: removed {} gems", self.passes, matched.len());
        self.ready_at = now + wait;
        self.transition(TurnPhase::Resolving(ResolveStep::Removing));
    }

    fn drop_gems(&mut self, ctx: &mut GameContext, now: f64) {
        let stagger = ctx.config.cascade.fall_stagger_ms;
        let falls = ctx.board.apply_gravity(&mut ctx.scene);
        for fall in &falls {
            let Some(start_y) = ctx.scene.get(fall.entity).map(|e| e.transform.position.y) else {
                continue;
            };
            let end_y = ctx.layout.row_y(fall.to.row);
            let delay = fall.from_row as f64 * stagger;
            ctx.animator.fall(&mut ctx.scene, fall.entity, start_y, end_y, delay, now);
        }
        self.ready_at = now + ctx.config.cascade.gravity_wait_ms;
        self.transition(TurnPhase::Resolving(ResolveStep::Falling));
    }

    fn refill(&mut self, ctx: &mut GameContext, now: f64) {
        let stagger = ctx.config.cascade.spawn_stagger_ms;
        let spawns = ctx
            .board
            .refill(&mut ctx.rng, ctx.config.gem_kinds, &mut ctx.scene, &ctx.layout);
        for spawn in &spawns {
            let end_y = ctx.layout.row_y(spawn.coord.row);
            let delay = spawn.empty_index as f64 * stagger;
            ctx.animator
                .appear(&mut ctx.scene, spawn.entity, spawn.start_y, end_y, delay, now);
        }
        self.ready_at = now + ctx.config.cascade.refill_wait_ms;
        self.transition(TurnPhase::Resolving(ResolveStep::Refilling));
    }

    fn finish(&mut self, ctx: &mut GameContext, shell: &mut dyn Shell) {
        self.transition(TurnPhase::Idle);
        self.passes = 0;
        let session = &mut ctx.session;
        if session.game_ended && !session.end_notified {
            session.end_notified = true;
            info!("game over, final score {}", session.score);
            shell.notify_game_ended(session.score);
        }
    }
}

/// Canonical pose for every gem still on the board.
fn settle_all(ctx: &mut GameContext) {
    for gem in ctx.board.gems() {
        if let Some(e) = ctx.scene.get_mut(gem.entity) {
            e.reset_canonical(&ctx.layout);
        }
    }
}
