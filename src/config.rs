//! Game configuration.
//!
//! Everything tunable about a session lives here: grid shape, move budget,
//! animation durations, cascade pacing and pointer thresholds. The browser
//! shell may pass a JSON object to `start_game`; omitted fields keep their
//! defaults.

use serde::{Deserialize, Serialize};

use crate::easing::BounceVariant;
use crate::error::GameError;

/// World units shown per board cell when `view_extent` is not set.
const VIEW_MARGIN_PER_CELL: f32 = 1.155;

/// How the cascade resolver advances between remove, gravity and refill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePacing {
    /// Fixed waits between steps (300 / 500 / 500 ms by default).
    #[default]
    FixedDelays,
    /// Advance as soon as every running animation has finished.
    AnimationDriven,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationTimings {
    pub swap_ms: f64,
    pub invalid_move_ms: f64,
    pub disappear_ms: f64,
    pub fall_ms: f64,
    pub appear_pop_ms: f64,
    pub appear_fall_ms: f64,
    pub bounce: BounceVariant,
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            swap_ms: 300.0,
            invalid_move_ms: 400.0,
            disappear_ms: 400.0,
            fall_ms: 500.0,
            appear_pop_ms: 300.0,
            appear_fall_ms: 600.0,
            bounce: BounceVariant::Strict,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CascadeTimings {
    /// Wait after starting the disappear animations before gravity.
    pub remove_wait_ms: f64,
    /// Wait after starting the falls before refill.
    pub gravity_wait_ms: f64,
    /// Wait after starting the refill before cleanup and re-scan.
    pub refill_wait_ms: f64,
    pub disappear_stagger_ms: f64,
    pub fall_stagger_ms: f64,
    pub spawn_stagger_ms: f64,
    pub score_per_gem: u32,
}

impl Default for CascadeTimings {
    fn default() -> Self {
        Self {
            remove_wait_ms: 300.0,
            gravity_wait_ms: 500.0,
            refill_wait_ms: 500.0,
            disappear_stagger_ms: 50.0,
            fall_stagger_ms: 60.0,
            spawn_stagger_ms: 150.0,
            score_per_gem: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputThresholds {
    /// Pointer travel (px) after which a press counts as a drag.
    pub drag_start_px: f64,
    /// Pointer travel (px) required on release to attempt a swap.
    pub swipe_px: f64,
    /// How far (world units) a gem may be from its cell and still be pickable.
    pub settle_tolerance: f32,
    /// Gems scaled at or below this are mid-animation and not pickable.
    pub min_hit_scale: f32,
}

impl Default for InputThresholds {
    fn default() -> Self {
        Self {
            drag_start_px: 10.0,
            swipe_px: 20.0,
            settle_tolerance: 0.1,
            min_hit_scale: 0.9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_size: usize,
    pub gem_kinds: u8,
    pub starting_moves: u32,
    /// Move budget after `reset_session`; falls back to `starting_moves`.
    pub reset_moves: Option<u32>,
    /// Fixed RNG seed for reproducible boards. Random when absent.
    pub seed: Option<u64>,
    pub max_cascade_passes: u32,
    pub pacing: CascadePacing,
    pub idle_sway: bool,
    pub selected_scale: f32,
    pub tutorial_ms: f64,
    /// World units visible across the square canvas. Derived from
    /// `grid_size` when absent.
    pub view_extent: Option<f32>,
    pub cta_url: String,
    /// One texture URL (or data URI) per gem kind. Empty means procedural gems.
    pub gem_textures: Vec<String>,
    pub debug_logging: bool,
    pub animation: AnimationTimings,
    pub cascade: CascadeTimings,
    pub input: InputThresholds,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 6,
            gem_kinds: 6,
            starting_moves: 10,
            reset_moves: None,
            seed: None,
            max_cascade_passes: 64,
            pacing: CascadePacing::FixedDelays,
            idle_sway: true,
            selected_scale: 1.1,
            tutorial_ms: 5000.0,
            view_extent: None,
            cta_url: "https://example-game-store-link.com".to_string(),
            gem_textures: Vec::new(),
            debug_logging: false,
            animation: AnimationTimings::default(),
            cascade: CascadeTimings::default(),
            input: InputThresholds::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn reset_move_budget(&self) -> u32 {
        self.reset_moves.unwrap_or(self.starting_moves)
    }

    /// World units across the canvas, scaled with the board when unset.
    pub fn view_extent(&self) -> f32 {
        self.view_extent
            .unwrap_or(self.grid_size as f32 * VIEW_MARGIN_PER_CELL)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |msg: String| Err(GameError::InvalidConfig(msg));
        if !(3..=32).contains(&self.grid_size) {
            return invalid(format!("grid_size {} outside 3..=32", self.grid_size));
        }
        // Generation needs a third kind to always break a pending run.
        if self.gem_kinds < 3 {
            return invalid(format!("gem_kinds {} below 3", self.gem_kinds));
        }
        if !self.gem_textures.is_empty() && self.gem_textures.len() < self.gem_kinds as usize {
            return invalid(format!(
                "{} gem textures for {} gem kinds",
                self.gem_textures.len(),
                self.gem_kinds
            ));
        }
        // A session has to start with a move to spend, or it could never end.
        if self.starting_moves == 0 || self.reset_moves == Some(0) {
            return invalid("move budgets must be at least 1".into());
        }
        if self.max_cascade_passes == 0 {
            return invalid("max_cascade_passes must be at least 1".into());
        }
        let a = &self.animation;
        let durations = [
            ("swap_ms", a.swap_ms),
            ("invalid_move_ms", a.invalid_move_ms),
            ("disappear_ms", a.disappear_ms),
            ("fall_ms", a.fall_ms),
            ("appear_pop_ms", a.appear_pop_ms),
            ("appear_fall_ms", a.appear_fall_ms),
        ];
        for (name, ms) in durations {
            if !(ms > 0.0) {
                return invalid(format!("{} must be positive, got {}", name, ms));
            }
        }
        let c = &self.cascade;
        let waits = [
            c.remove_wait_ms,
            c.gravity_wait_ms,
            c.refill_wait_ms,
            c.disappear_stagger_ms,
            c.fall_stagger_ms,
            c.spawn_stagger_ms,
        ];
        if waits.iter().any(|w| !(*w >= 0.0)) {
            return invalid("cascade waits must be non-negative".into());
        }
        if !(self.input.drag_start_px >= 0.0 && self.input.swipe_px >= 0.0) {
            return invalid("input thresholds must be non-negative".into());
        }
        if !(self.view_extent() > 0.0 && self.selected_scale > 0.0) {
            return invalid("view_extent and selected_scale must be positive".into());
        }
        Ok(())
    }
}
