//! Gem texture loading.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::error::GameError;

type Done = Box<dyn FnOnce(Result<Vec<HtmlImageElement>, GameError>)>;

struct Pending {
    images: Vec<HtmlImageElement>,
    remaining: usize,
    on_done: Option<Done>,
}

impl Pending {
    /// Hand the result over once; later calls are no-ops.
    fn finish(state: &Rc<RefCell<Pending>>, result: Result<(), GameError>) {
        let (callback, images) = {
            let mut s = state.borrow_mut();
            (s.on_done.take(), s.images.clone())
        };
        if let Some(cb) = callback {
            cb(result.map(|_| images));
        }
    }
}

/// Start loading one image per URI and call `on_done` when all have loaded
/// or the first one fails. With no URIs `on_done` runs immediately.
pub fn load_textures<F>(uris: &[String], on_done: F) -> Result<(), GameError>
where
    F: FnOnce(Result<Vec<HtmlImageElement>, GameError>) + 'static,
{
    if uris.is_empty() {
        on_done(Ok(Vec::new()));
        return Ok(());
    }

    let images = uris
        .iter()
        .map(|_| HtmlImageElement::new().map_err(GameError::dom))
        .collect::<Result<Vec<_>, _>>()?;
    let state = Rc::new(RefCell::new(Pending {
        images: images.clone(),
        remaining: uris.len(),
        on_done: Some(Box::new(on_done)),
    }));

    for (index, (img, uri)) in images.iter().zip(uris).enumerate() {
        let loaded = {
            let state = state.clone();
            Closure::wrap(Box::new(move || {
                let left = {
                    let mut s = state.borrow_mut();
                    s.remaining = s.remaining.saturating_sub(1);
                    s.remaining
                };
                debug!("texture {} loaded, {} left", index, left);
                if left == 0 {
                    Pending::finish(&state, Ok(()));
                }
            }) as Box<dyn FnMut()>)
        };
        let failed = {
            let state = state.clone();
            let uri = uri.clone();
            Closure::wrap(Box::new(move || {
                error!("failed to load gem texture {} from {}", index, uri);
                Pending::finish(
                    &state,
                    Err(GameError::AssetLoad {
                        index,
                        uri: uri.clone(),
                    }),
                );
            }) as Box<dyn FnMut()>)
        };
        img.set_onload(Some(loaded.as_ref().unchecked_ref()));
        img.set_onerror(Some(failed.as_ref().unchecked_ref()));
        loaded.forget();
        failed.forget();
        img.set_src(uri);
    }
    Ok(())
}
