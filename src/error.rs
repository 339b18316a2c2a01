use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors surfaced while configuring or booting a game session.
///
/// Gameplay never produces these: rejected swaps and busy input are ordinary
/// outcomes, not errors.
#[derive(Error, Debug)]
pub enum GameError {
    /// Config JSON could not be parsed.
    #[error("config parse failed: {0}")]
    Config(#[from] serde_json::Error),

    /// Config parsed but holds values the game cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A scripted board layout does not match the configured grid size.
    #[error("invalid board layout: {0}")]
    InvalidLayout(String),

    /// A gem texture failed to load; the board cannot render without it.
    #[error("gem texture {index} failed to load from {uri}")]
    AssetLoad { index: usize, uri: String },

    /// `start_game` was called while a game is already running or booting.
    #[error("game already started")]
    AlreadyStarted,

    /// Required DOM or canvas API was unavailable.
    #[error("dom error: {0}")]
    Dom(String),
}

impl GameError {
    pub(crate) fn dom(value: JsValue) -> Self {
        Self::Dom(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
