//! Gem Cascade core crate.
//!
//! A 6x6 match-3 board built for playable ads. Gameplay (board rules, the
//! cascade resolver, pointer input and tweening) is renderer-agnostic and
//! runs on a virtual clock, so everything below `web` is testable natively.
//! The `web` module hosts it in a browser canvas and is what `start_game()`
//! launches.

use wasm_bindgen::prelude::*;

pub mod board;
pub mod cascade;
pub mod config;
pub mod easing;
pub mod error;
pub mod game;
pub mod input;
pub mod scene;
pub mod session;
pub mod shell;
pub mod tween;
pub mod viewport;
pub mod web;

pub use board::{Board, Coord, GemKind};
pub use cascade::{IgnoreReason, SwapOutcome, TurnPhase};
pub use config::GameConfig;
pub use error::GameError;
pub use game::Game;
pub use shell::{NullShell, RecordingShell, Shell, ShellEvent};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Boot the game into `#game-canvas`. `config_json` may override any field of
/// [`GameConfig`]. Resolves once the board is on screen.
#[wasm_bindgen]
pub fn start_game(config_json: Option<String>) -> Result<js_sys::Promise, JsValue> {
    Ok(web::start(config_json)?)
}

/// Deal a fresh board with the reset move budget.
#[wasm_bindgen]
pub fn reset_game() {
    web::reset();
}
