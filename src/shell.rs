//! Outbound interface from the game to whatever hosts it.
//!
//! The browser build implements [`Shell`] on top of a canvas and a few DOM
//! nodes (see `web::shell`). Tests use [`RecordingShell`] to assert on what
//! the game reported and when.

use crate::scene::{GridLayout, Scene};
use crate::viewport::Viewport;

pub trait Shell {
    /// Draw the current scene. Called once per frame.
    fn present(&mut self, scene: &Scene, layout: &GridLayout);

    fn update_score_and_moves(&mut self, score: u32, moves_remaining: u32);

    /// Called exactly once per session, after the last cascade settles.
    fn notify_game_ended(&mut self, final_score: u32);

    fn show_tutorial(&mut self) {}

    fn hide_tutorial(&mut self) {}

    fn resize(&mut self, _viewport: &Viewport) {}

    fn on_session_reset(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullShell;

impl Shell for NullShell {
    fn present(&mut self, _scene: &Scene, _layout: &GridLayout) {}
    fn update_score_and_moves(&mut self, _score: u32, _moves_remaining: u32) {}
    fn notify_game_ended(&mut self, _final_score: u32) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShellEvent {
    ScoreAndMoves { score: u32, moves: u32 },
    GameEnded { final_score: u32 },
    TutorialShown,
    TutorialHidden,
    Resized { canvas_px: f64 },
    SessionReset,
}

/// Keeps every call in order; frames are only counted.
#[derive(Debug, Default)]
pub struct RecordingShell {
    pub events: Vec<ShellEvent>,
    pub frames: usize,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game_ended_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ShellEvent::GameEnded { .. }))
            .count()
    }

    /// Most recent `(score, moves)` pushed to the UI.
    pub fn last_score_and_moves(&self) -> Option<(u32, u32)> {
        self.events.iter().rev().find_map(|e| match e {
            ShellEvent::ScoreAndMoves { score, moves } => Some((*score, *moves)),
            _ => None,
        })
    }
}

impl Shell for RecordingShell {
    fn present(&mut self, _scene: &Scene, _layout: &GridLayout) {
        self.frames += 1;
    }

    fn update_score_and_moves(&mut self, score: u32, moves_remaining: u32) {
        self.events.push(ShellEvent::ScoreAndMoves {
            score,
            moves: moves_remaining,
        });
    }

    fn notify_game_ended(&mut self, final_score: u32) {
        self.events.push(ShellEvent::GameEnded { final_score });
    }

    fn show_tutorial(&mut self) {
        self.events.push(ShellEvent::TutorialShown);
    }

    fn hide_tutorial(&mut self) {
        self.events.push(ShellEvent::TutorialHidden);
    }

    fn resize(&mut self, viewport: &Viewport) {
        self.events.push(ShellEvent::Resized {
            canvas_px: viewport.canvas_px,
        });
    }

    fn on_session_reset(&mut self) {
        self.events.push(ShellEvent::SessionReset);
    }
}
