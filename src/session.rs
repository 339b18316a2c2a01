//! Session state and the shared game context every subsystem operates on.

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::board::{Board, Coord};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::scene::{GridLayout, Scene};
use crate::tween::Animator;

/// Score, move budget and selection for one play-through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub score: u32,
    pub moves_remaining: u32,
    /// Latched when the last move is spent; never cleared except by a reset.
    pub game_ended: bool,
    pub(crate) end_notified: bool,
    pub selection: Option<Coord>,
}

impl Session {
    pub fn new(moves: u32) -> Self {
        Self {
            moves_remaining: moves,
            ..Self::default()
        }
    }

    /// Spend one move; latches `game_ended` when the budget hits zero.
    pub fn spend_move(&mut self) {
        self.moves_remaining = self.moves_remaining.saturating_sub(1);
        if self.moves_remaining == 0 {
            self.game_ended = true;
        }
    }

    pub fn can_play(&self) -> bool {
        !self.game_ended && self.moves_remaining > 0
    }
}

/// Everything the resolver, the input tracker and the game loop share.
pub struct GameContext {
    pub config: GameConfig,
    pub layout: GridLayout,
    pub board: Board,
    pub scene: Scene,
    pub animator: Animator,
    pub session: Session,
    pub rng: StdRng,
}

impl GameContext {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(entropy_seed));
        let layout = GridLayout::new(config.grid_size);
        let mut scene = Scene::new();
        let board = Board::generate(config.grid_size, config.gem_kinds, &mut rng, &mut scene, &layout);
        Ok(Self::assemble(config, layout, board, scene, rng))
    }

    /// Start from a fixed board instead of a generated one.
    pub fn with_layout(config: GameConfig, rows: &[Vec<Option<u8>>]) -> Result<Self, GameError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(entropy_seed));
        let layout = GridLayout::new(config.grid_size);
        let mut scene = Scene::new();
        let board = Board::from_layout(rows, &mut scene, &layout)?;
        Ok(Self::assemble(config, layout, board, scene, rng))
    }

    fn assemble(config: GameConfig, layout: GridLayout, board: Board, scene: Scene, rng: StdRng) -> Self {
        let session = Session::new(config.starting_moves);
        let animator = Animator::new(config.animation.clone());
        Self {
            config,
            layout,
            board,
            scene,
            animator,
            session,
            rng,
        }
    }

    /// Drop every gem and animation and deal a fresh board with `moves`.
    pub fn rebuild(&mut self, moves: u32) {
        self.animator.clear();
        self.board.clear(&mut self.scene);
        self.scene.clear();
        self.board = Board::generate(
            self.config.grid_size,
            self.config.gem_kinds,
            &mut self.rng,
            &mut self.scene,
            &self.layout,
        );
        self.session = Session::new(moves);
    }

    pub fn is_selected(&self, coord: Coord) -> bool {
        self.session.selection == Some(coord)
    }

    /// Select the gem at `coord`, releasing any previous selection.
    pub fn select(&mut self, coord: Coord) {
        if self.session.selection.is_some_and(|c| c != coord) {
            self.deselect();
        }
        let Some(gem) = self.board.get(coord) else { return };
        if let Some(e) = self.scene.get_mut(gem.entity) {
            e.transform.scale = Vec3::splat(self.config.selected_scale);
        }
        self.session.selection = Some(coord);
    }

    /// Clear the selection and put its gem back in canonical pose.
    pub fn deselect(&mut self) {
        let Some(coord) = self.session.selection.take() else { return };
        let Some(gem) = self.board.get(coord) else { return };
        if let Some(e) = self.scene.get_mut(gem.entity) {
            e.reset_canonical(&self.layout);
        }
    }

    /// Swap two cells. The selection follows the gem it was on.
    pub fn swap_cells(&mut self, a: Coord, b: Coord) -> bool {
        if !self.board.swap(a, b, &mut self.scene) {
            return false;
        }
        self.session.selection = match self.session.selection {
            Some(s) if s == a => Some(b),
            Some(s) if s == b => Some(a),
            other => other,
        };
        true
    }
}

fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(e) => {
            log::warn!("no entropy source ({}), using a fixed seed", e);
            0x9e37_79b9_7f4a_7c15
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> GameContext {
        let config = GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        };
        GameContext::new(config).unwrap()
    }

    #[test]
    fn test_spend_move_latches_end() {
        let mut s = Session::new(2);
        s.spend_move();
        assert!(s.can_play());
        s.spend_move();
        assert!(s.game_ended);
        assert!(!s.can_play());
        s.spend_move();
        assert_eq!(s.moves_remaining, 0);
    }

    #[test]
    fn test_seeded_contexts_deal_the_same_board() {
        assert_eq!(ctx().board.kinds_snapshot(), ctx().board.kinds_snapshot());
    }

    #[test]
    fn test_select_scales_and_deselect_restores() {
        let mut ctx = ctx();
        let c = Coord::new(1, 1);
        let entity = ctx.board.get(c).unwrap().entity;
        ctx.select(c);
        assert_eq!(ctx.scene.get(entity).unwrap().transform.scale, Vec3::splat(1.1));

        let other = Coord::new(4, 4);
        ctx.select(other);
        assert_eq!(ctx.scene.get(entity).unwrap().transform.scale, Vec3::ONE);
        assert!(ctx.is_selected(other));

        ctx.deselect();
        assert_eq!(ctx.session.selection, None);
    }

    #[test]
    fn test_selection_follows_swapped_gem() {
        let mut ctx = ctx();
        let a = Coord::new(2, 2);
        let b = Coord::new(2, 3);
        ctx.select(a);
        assert!(ctx.swap_cells(a, b));
        assert_eq!(ctx.session.selection, Some(b));
    }

    #[test]
    fn test_rebuild_resets_session() {
        let mut ctx = ctx();
        ctx.session.score = 120;
        ctx.session.spend_move();
        ctx.rebuild(30);
        assert_eq!(ctx.session, Session::new(30));
        assert_eq!(ctx.scene.len(), 36);
        assert!(ctx.board.scan_matches().is_empty());
    }
}
