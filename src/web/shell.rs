//! Canvas renderer and DOM HUD.

use std::f64::consts::TAU;

use glam::Vec3;
use log::info;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement};

use crate::scene::{GemEntity, GridLayout, NEUTRAL_TINT, Scene};
use crate::shell::Shell;
use crate::viewport::Viewport;

const BACKGROUND: &str = "#2c3e50";
const CELL_LINE: &str = "rgba(255,255,255,0.06)";
/// Gem diameter as a fraction of a cell.
const GEM_FILL: f64 = 0.8;

/// Fallback colors when no textures are configured, indexed by gem kind.
const PALETTE: [&str; 8] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f1c40f", "#9b59b6", "#e67e22", "#1abc9c", "#ecf0f1",
];

const SCORE_ID: &str = "score";
const MOVES_ID: &str = "moves";
const TUTORIAL_ID: &str = "tutorial-overlay";
const GAME_OVER_ID: &str = "game-over-modal";
const FINAL_SCORE_ID: &str = "final-score";

pub struct BrowserShell {
    document: Document,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    textures: Vec<HtmlImageElement>,
    viewport: Viewport,
}

impl BrowserShell {
    pub fn new(
        document: Document,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        textures: Vec<HtmlImageElement>,
        viewport: Viewport,
    ) -> Self {
        Self {
            document,
            canvas,
            ctx,
            textures,
            viewport,
        }
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(&self, id: &str, add: &str, remove: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            let list = el.class_list();
            let _ = list.remove_1(remove);
            let _ = list.add_1(add);
        }
    }

    fn draw_grid(&self, layout: &GridLayout) {
        let cell = self.viewport.px_per_unit() as f64;
        let half = layout.size as f32 / 2.0;
        let (left, top) = self.viewport.world_to_screen(Vec3::new(-half, half, 0.0));
        let span = layout.size as f64 * cell;
        self.ctx.set_stroke_style_str(CELL_LINE);
        self.ctx.set_line_width(1.0);
        self.ctx.begin_path();
        for i in 0..=layout.size {
            let d = i as f64 * cell;
            self.ctx.move_to(left + d, top);
            self.ctx.line_to(left + d, top + span);
            self.ctx.move_to(left, top + d);
            self.ctx.line_to(left + span, top + d);
        }
        self.ctx.stroke();
    }

    fn draw_gem(&self, e: &GemEntity) -> Result<(), JsValue> {
        let t = &e.transform;
        let (x, y) = self.viewport.world_to_screen(t.position);
        let size = self.viewport.px_per_unit() as f64 * GEM_FILL;

        self.ctx.save();
        self.ctx.translate(x, y)?;
        // Canvas y points down, so a positive world z-rotation turns the other way.
        self.ctx.rotate(-(t.rotation.z as f64))?;
        // Spin about x/y is faked by foreshortening.
        let sx = t.scale.x as f64 * (t.rotation.y as f64).cos();
        let sy = t.scale.y as f64 * (t.rotation.x as f64).cos();
        self.ctx.scale(sx, sy)?;
        self.ctx.set_global_alpha(e.visual.opacity.clamp(0.0, 1.0) as f64);

        let kind = e.visual.kind.0 as usize;
        match self.textures.get(kind).filter(|img| img.complete()) {
            Some(img) => {
                self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    img,
                    -size / 2.0,
                    -size / 2.0,
                    size,
                    size,
                )?;
            }
            None => {
                self.ctx.set_fill_style_str(PALETTE[kind % PALETTE.len()]);
                self.ctx.begin_path();
                self.ctx.arc(0.0, 0.0, size / 2.0, 0.0, TAU)?;
                self.ctx.fill();
                self.ctx.set_fill_style_str("rgba(255,255,255,0.35)");
                self.ctx.begin_path();
                self.ctx.arc(-size * 0.15, -size * 0.15, size * 0.12, 0.0, TAU)?;
                self.ctx.fill();
            }
        }

        if e.visual.tint != NEUTRAL_TINT {
            self.ctx.set_stroke_style_str(&format!("#{:06x}", e.visual.tint));
            self.ctx.set_line_width(3.0);
            self.ctx.begin_path();
            self.ctx.arc(0.0, 0.0, size / 2.0 + 2.0, 0.0, TAU)?;
            self.ctx.stroke();
        }
        self.ctx.restore();
        Ok(())
    }
}

impl Shell for BrowserShell {
    fn present(&mut self, scene: &Scene, layout: &GridLayout) {
        let px = self.viewport.canvas_px;
        self.ctx.set_global_alpha(1.0);
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, px, px);
        self.draw_grid(layout);

        for (_, e) in scene.iter() {
            if e.visual.opacity <= 0.0 || e.transform.scale.x <= 0.0 {
                continue;
            }
            if let Err(err) = self.draw_gem(e) {
                self.ctx.restore();
                log::debug!("gem draw failed: {:?}", err);
            }
        }
    }

    fn update_score_and_moves(&mut self, score: u32, moves_remaining: u32) {
        self.set_text(SCORE_ID, &score.to_string());
        self.set_text(MOVES_ID, &moves_remaining.to_string());
    }

    fn notify_game_ended(&mut self, final_score: u32) {
        self.set_text(FINAL_SCORE_ID, &final_score.to_string());
        if let Some(modal) = self.document.get_element_by_id(GAME_OVER_ID) {
            let _ = modal.class_list().remove_1("hidden");
        }
        info!("game completed, score {}", final_score);
    }

    fn show_tutorial(&mut self) {
        self.set_class(TUTORIAL_ID, "tutorial-active", "hidden");
    }

    fn hide_tutorial(&mut self) {
        self.set_class(TUTORIAL_ID, "hidden", "tutorial-active");
    }

    fn resize(&mut self, viewport: &Viewport) {
        self.viewport = *viewport;
        let px = viewport.canvas_px.round() as u32;
        self.canvas.set_width(px);
        self.canvas.set_height(px);
    }

    fn on_session_reset(&mut self) {
        if let Some(modal) = self.document.get_element_by_id(GAME_OVER_ID) {
            let _ = modal.class_list().add_1("hidden");
        }
    }
}
