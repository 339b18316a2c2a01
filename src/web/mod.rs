//! Browser host: canvas discovery, event wiring and the animation-frame loop.
//!
//! The running game lives in a thread-local slot; every DOM callback borrows
//! it for the duration of one event.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{error, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, HtmlCanvasElement,
    HtmlImageElement, MouseEvent, Touch, TouchEvent, Window, window,
};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::Game;
use crate::viewport::Viewport;

mod assets;
mod mraid;
mod shell;

pub use mraid::AdBridge;
pub use shell::BrowserShell;

const CANVAS_ID: &str = "game-canvas";
const CTA_IDS: [&str; 2] = ["install-btn", "play-full-game"];

thread_local! {
    static GAME: RefCell<Option<Game<BrowserShell>>> = const { RefCell::new(None) };
    /// Set from the first accepted `start` until its boot fails.
    static STARTED: Cell<bool> = const { Cell::new(false) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn with_game<R>(f: impl FnOnce(&mut Game<BrowserShell>) -> R) -> Option<R> {
    GAME.with(|cell| {
        let mut slot = cell.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

fn now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn window_size(win: &Window) -> (f64, f64) {
    let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (w, h)
}

/// Parse the config, load textures and start the game. The returned promise
/// settles once the board is live, or rejects if a texture fails to load.
/// Only one game runs per page; a second call fails with
/// [`GameError::AlreadyStarted`].
pub fn start(config_json: Option<String>) -> Result<js_sys::Promise, GameError> {
    let config = match config_json {
        Some(json) => GameConfig::from_json(&json)?,
        None => GameConfig::default(),
    };
    if STARTED.with(|s| s.replace(true)) {
        return Err(GameError::AlreadyStarted);
    }
    if config.debug_logging {
        log::set_max_level(log::LevelFilter::Debug);
    }
    launch(config).inspect_err(|_| release_start())
}

/// Let a later `start` try again after a failed boot.
fn release_start() {
    STARTED.with(|s| s.set(false));
}

fn launch(config: GameConfig) -> Result<js_sys::Promise, GameError> {
    let win = window().ok_or_else(|| GameError::Dom("no window".into()))?;
    let doc = win
        .document()
        .ok_or_else(|| GameError::Dom("no document".into()))?;
    let canvas = find_or_create_canvas(&doc)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(GameError::dom)?
        .ok_or_else(|| GameError::Dom("2d context unavailable".into()))?
        .dyn_into()
        .map_err(|_| GameError::Dom("2d context has an unexpected type".into()))?;

    let bridge = Rc::new(AdBridge::detect(&win));
    install_cta(&doc, &win, bridge, config.cta_url.clone())?;

    let mut pending = Some((config, win, doc, canvas, ctx));
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let Some((config, win, doc, canvas, ctx)) = pending.take() else {
            return;
        };
        let uris = config.gem_textures.clone();
        let reject_sync = reject.clone();
        let loaded = assets::load_textures(&uris, move |result| {
            let booted = result.and_then(|textures| boot(config, &win, doc, canvas, ctx, textures));
            match booted {
                Ok(()) => {
                    let _ = resolve.call0(&JsValue::NULL);
                }
                Err(e) => {
                    error!("start failed: {}", e);
                    release_start();
                    let _ = reject.call1(&JsValue::NULL, &JsValue::from(e));
                }
            }
        });
        if let Err(e) = loaded {
            error!("texture loading could not start: {}", e);
            release_start();
            let _ = reject_sync.call1(&JsValue::NULL, &JsValue::from(e));
        }
    });
    Ok(promise)
}

pub fn reset() {
    if with_game(|g| g.reset_session()).is_none() {
        log::warn!("reset requested before the game started");
    }
}

fn find_or_create_canvas(doc: &Document) -> Result<HtmlCanvasElement, GameError> {
    if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        return el.dyn_into().map_err(|_| GameError::Dom(format!("#{} is not a canvas", CANVAS_ID)));
    }
    let canvas: HtmlCanvasElement = doc
        .create_element("canvas")
        .map_err(GameError::dom)?
        .dyn_into()
        .map_err(|_| GameError::Dom("created element is not a canvas".into()))?;
    canvas.set_id(CANVAS_ID);
    let body = doc
        .body()
        .ok_or_else(|| GameError::Dom("no body".into()))?;
    body.append_child(&canvas).map_err(GameError::dom)?;
    Ok(canvas)
}

fn boot(
    config: GameConfig,
    win: &Window,
    doc: Document,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    textures: Vec<HtmlImageElement>,
) -> Result<(), GameError> {
    let viewport = Viewport::new(canvas.width().max(1) as f64, config.view_extent());
    let shell = BrowserShell::new(doc, canvas.clone(), ctx, textures, viewport);
    let mut game = Game::new(config, shell)?;
    let (w, h) = window_size(win);
    game.on_resize(w, h);
    GAME.with(|cell| cell.replace(Some(game)));

    install_mouse_listeners(&canvas)?;
    install_touch_listeners(&canvas)?;
    install_resize_listener(win)?;
    start_loop();
    info!("game started");
    Ok(())
}

// --- Listeners ---------------------------------------------------------------

fn install_cta(doc: &Document, win: &Window, bridge: Rc<AdBridge>, url: String) -> Result<(), GameError> {
    for id in CTA_IDS {
        let Some(button) = doc.get_element_by_id(id) else {
            continue;
        };
        let bridge = bridge.clone();
        let win = win.clone();
        let url = url.clone();
        let closure = Closure::wrap(Box::new(move |_evt: MouseEvent| {
            bridge.open(&win, &url);
        }) as Box<dyn FnMut(_)>);
        button
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(GameError::dom)?;
        closure.forget();
    }
    Ok(())
}

fn install_mouse_listeners(canvas: &HtmlCanvasElement) -> Result<(), GameError> {
    let down = Closure::wrap(Box::new(move |evt: MouseEvent| {
        let (x, y) = (evt.offset_x() as f64, evt.offset_y() as f64);
        with_game(|g| g.pointer_down(x, y));
    }) as Box<dyn FnMut(_)>);
    let moved = Closure::wrap(Box::new(move |evt: MouseEvent| {
        let (x, y) = (evt.offset_x() as f64, evt.offset_y() as f64);
        with_game(|g| g.pointer_move(x, y));
    }) as Box<dyn FnMut(_)>);
    let up = Closure::wrap(Box::new(move |evt: MouseEvent| {
        let (x, y) = (evt.offset_x() as f64, evt.offset_y() as f64);
        let t = now();
        with_game(|g| g.pointer_up(x, y, t));
    }) as Box<dyn FnMut(_)>);

    for (name, closure) in [("mousedown", down), ("mousemove", moved), ("mouseup", up)] {
        canvas
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(GameError::dom)?;
        closure.forget();
    }
    Ok(())
}

/// Canvas-local position of a touch point.
fn touch_point(canvas: &HtmlCanvasElement, touch: &Touch) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (
        touch.client_x() as f64 - rect.left(),
        touch.client_y() as f64 - rect.top(),
    )
}

/// The single active touch, or `None` for multi-touch gestures.
fn single_touch(evt: &TouchEvent, changed: bool) -> Option<Touch> {
    let list = if changed { evt.changed_touches() } else { evt.touches() };
    if list.length() == 1 { list.get(0) } else { None }
}

fn install_touch_listeners(canvas: &HtmlCanvasElement) -> Result<(), GameError> {
    let options = AddEventListenerOptions::new();
    options.set_passive(false);

    let handlers: [(&str, bool, fn(&mut Game<BrowserShell>, f64, f64)); 3] = [
        ("touchstart", false, |g, x, y| {
            g.pointer_down(x, y);
        }),
        ("touchmove", false, |g, x, y| g.pointer_move(x, y)),
        ("touchend", true, |g, x, y| {
            g.pointer_up(x, y, now());
        }),
    ];

    for (name, changed, handler) in handlers {
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |evt: TouchEvent| {
            evt.prevent_default();
            evt.stop_propagation();
            let Some(touch) = single_touch(&evt, changed) else {
                return;
            };
            let (x, y) = touch_point(&target, &touch);
            with_game(|g| handler(g, x, y));
        }) as Box<dyn FnMut(_)>);
        canvas
            .add_event_listener_with_callback_and_add_event_listener_options(
                name,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(GameError::dom)?;
        closure.forget();
    }
    Ok(())
}

fn install_resize_listener(win: &Window) -> Result<(), GameError> {
    let target = win.clone();
    let closure = Closure::wrap(Box::new(move || {
        let (w, h) = window_size(&target);
        with_game(|g| g.on_resize(w, h));
    }) as Box<dyn FnMut()>);
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        .map_err(GameError::dom)?;
    closure.forget();
    Ok(())
}

// --- Frame loop --------------------------------------------------------------

fn request_frame(cb: &FrameCallback) {
    let Some(w) = window() else { return };
    if let Some(closure) = cb.borrow().as_ref() {
        let _ = w.request_animation_frame(closure.as_ref().unchecked_ref());
    }
}

fn start_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        with_game(|game| game.tick(ts));
        request_frame(&f);
    }) as Box<dyn FnMut(f64)>));
    request_frame(&g);
}
