//! Pointer handling: pick a gem on press, turn a swipe into a swap request.
//!
//! Mouse and touch events are both fed through the same three calls with
//! canvas-local pixel coordinates. The tracker never swaps anything itself;
//! [`PointerTracker::pointer_up`] returns a [`SwipeIntent`] and the game
//! submits it to the resolver.

use glam::Vec2;

use crate::board::Coord;
use crate::config::InputThresholds;
use crate::session::GameContext;
use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerDown {
    /// Busy, out of moves or game over.
    Ignored,
    Selected(Coord),
    Missed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwipeIntent {
    pub from: Coord,
    pub to: Coord,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    origin: Coord,
    start: (f64, f64),
    last: (f64, f64),
    dragging: bool,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    drag: Option<Drag>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|d| d.dragging)
    }

    pub fn pointer_down(
        &mut self,
        ctx: &mut GameContext,
        viewport: &Viewport,
        busy: bool,
        x: f64,
        y: f64,
    ) -> PointerDown {
        if busy || !ctx.session.can_play() {
            return PointerDown::Ignored;
        }
        match hit_test(ctx, viewport, x, y) {
            Some(coord) => {
                ctx.select(coord);
                self.drag = Some(Drag {
                    origin: coord,
                    start: (x, y),
                    last: (x, y),
                    dragging: false,
                });
                PointerDown::Selected(coord)
            }
            None => {
                ctx.deselect();
                self.drag = None;
                PointerDown::Missed
            }
        }
    }

    pub fn pointer_move(&mut self, thresholds: &InputThresholds, x: f64, y: f64) {
        let Some(drag) = self.drag.as_mut() else { return };
        drag.last = (x, y);
        if distance(drag.start, drag.last) > thresholds.drag_start_px {
            drag.dragging = true;
        }
    }

    /// Finish the gesture at `(x, y)`. A long enough swipe yields the swap to
    /// attempt; a short tap keeps the current selection.
    pub fn pointer_up(&mut self, ctx: &mut GameContext, x: f64, y: f64) -> Option<SwipeIntent> {
        let drag = self.drag.take()?;
        let thresholds = &ctx.config.input;
        let (dx, dy) = (x - drag.start.0, y - drag.start.1);
        let travelled = distance(drag.start, (x, y));
        let dragged = drag.dragging || travelled > thresholds.drag_start_px;

        let intent = if travelled > thresholds.swipe_px {
            let from = ctx.session.selection.unwrap_or(drag.origin);
            swipe_target(ctx, from, dx, dy).map(|to| SwipeIntent { from, to })
        } else {
            None
        };
        if dragged {
            ctx.deselect();
        }
        intent
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Neighbour of `from` in the dominant swipe direction. Screen y grows
/// downward, as do rows. Ties go vertical.
fn swipe_target(ctx: &GameContext, from: Coord, dx: f64, dy: f64) -> Option<Coord> {
    let (dr, dc): (isize, isize) = if dx.abs() > dy.abs() {
        (0, if dx > 0.0 { 1 } else { -1 })
    } else {
        (if dy > 0.0 { 1 } else { -1 }, 0)
    };
    let max = ctx.board.size().checked_sub(1)? as isize;
    let row = (from.row as isize + dr).clamp(0, max) as usize;
    let col = (from.col as isize + dc).clamp(0, max) as usize;
    let to = Coord::new(row, col);
    (to != from && ctx.board.is_occupied(to)).then_some(to)
}

/// Grid cell of the settled gem under canvas pixel `(x, y)`, if any.
///
/// Gems mid-animation (away from their cell or shrunk) are not pickable. When
/// several volumes contain the point the nearest center wins.
pub fn hit_test(ctx: &GameContext, viewport: &Viewport, x: f64, y: f64) -> Option<Coord> {
    let point = viewport.screen_to_world(x, y);
    let t = &ctx.config.input;
    ctx.scene
        .iter()
        .filter(|(_, e)| e.is_settled(&ctx.layout, t.settle_tolerance, t.min_hit_scale))
        .filter(|(_, e)| e.hit_volume.contains(e.transform.position, point))
        .filter(|(id, e)| ctx.board.get(e.hit_volume.grid).is_some_and(|g| g.entity == *id))
        .min_by(|(_, a), (_, b)| {
            let da = Vec2::new(a.transform.position.x, a.transform.position.y).distance_squared(point);
            let db = Vec2::new(b.transform.position.x, b.transform.position.y).distance_squared(point);
            da.total_cmp(&db)
        })
        .map(|(_, e)| e.hit_volume.grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use glam::Vec3;

    fn ctx() -> GameContext {
        GameContext::new(GameConfig {
            seed: Some(21),
            ..GameConfig::default()
        })
        .unwrap()
    }

    // 50 px per cell, cell (r, c) centered at (25 + 50c, 25 + 50r).
    fn viewport() -> Viewport {
        Viewport::new(300.0, 6.0)
    }

    fn center(row: usize, col: usize) -> (f64, f64) {
        (25.0 + 50.0 * col as f64, 25.0 + 50.0 * row as f64)
    }

    #[test]
    fn test_tap_selects_and_keeps_selection() {
        let mut ctx = ctx();
        let mut p = PointerTracker::new();
        let (x, y) = center(2, 3);
        assert_eq!(
            p.pointer_down(&mut ctx, &viewport(), false, x, y),
            PointerDown::Selected(Coord::new(2, 3))
        );
        p.pointer_move(&ctx.config.input, x + 3.0, y);
        assert!(p.pointer_up(&mut ctx, x + 3.0, y).is_none());
        assert_eq!(ctx.session.selection, Some(Coord::new(2, 3)));
        assert!(!p.is_tracking());
    }

    #[test]
    fn test_swipe_right_requests_swap_and_deselects() {
        let mut ctx = ctx();
        let mut p = PointerTracker::new();
        let (x, y) = center(2, 2);
        p.pointer_down(&mut ctx, &viewport(), false, x, y);
        p.pointer_move(&ctx.config.input, x + 15.0, y + 2.0);
        assert!(p.is_dragging());
        let intent = p.pointer_up(&mut ctx, x + 40.0, y + 5.0);
        assert_eq!(
            intent,
            Some(SwipeIntent {
                from: Coord::new(2, 2),
                to: Coord::new(2, 3)
            })
        );
        assert_eq!(ctx.session.selection, None);
    }

    #[test]
    fn test_swipe_down_is_next_row_and_ties_go_vertical() {
        let mut ctx = ctx();
        let mut p = PointerTracker::new();
        let (x, y) = center(1, 1);
        p.pointer_down(&mut ctx, &viewport(), false, x, y);
        let intent = p.pointer_up(&mut ctx, x + 30.0, y + 30.0).unwrap();
        assert_eq!(intent.to, Coord::new(2, 1));
    }

    #[test]
    fn test_swipe_off_the_edge_is_dropped() {
        let mut ctx = ctx();
        let mut p = PointerTracker::new();
        let (x, y) = center(3, 0);
        p.pointer_down(&mut ctx, &viewport(), false, x, y);
        assert!(p.pointer_up(&mut ctx, x - 60.0, y).is_none());
    }

    #[test]
    fn test_down_ignored_while_busy_or_out_of_moves() {
        let mut ctx = ctx();
        let mut p = PointerTracker::new();
        let (x, y) = center(0, 0);
        assert_eq!(p.pointer_down(&mut ctx, &viewport(), true, x, y), PointerDown::Ignored);
        ctx.session.moves_remaining = 0;
        assert_eq!(p.pointer_down(&mut ctx, &viewport(), false, x, y), PointerDown::Ignored);
        assert!(p.pointer_up(&mut ctx, x + 50.0, y).is_none());
    }

    #[test]
    fn test_miss_clears_selection() {
        let mut ctx = ctx();
        let mut p = PointerTracker::new();
        let wide = Viewport::new(300.0, 8.0);
        let (x, y) = (150.0 + 37.5 * 0.5, 150.0 - 37.5 * 0.5);
        assert!(matches!(p.pointer_down(&mut ctx, &wide, false, x, y), PointerDown::Selected(_)));
        assert!(ctx.session.selection.is_some());
        assert_eq!(p.pointer_down(&mut ctx, &wide, false, 2.0, 2.0), PointerDown::Missed);
        assert_eq!(ctx.session.selection, None);
    }

    #[test]
    fn test_unsettled_gems_are_not_pickable() {
        let mut ctx = ctx();
        let c = Coord::new(4, 4);
        let entity = ctx.board.get(c).unwrap().entity;
        if let Some(e) = ctx.scene.get_mut(entity) {
            e.transform.position += Vec3::new(0.0, 0.3, 0.0);
        }
        let (x, y) = center(4, 4);
        assert_eq!(hit_test(&ctx, &viewport(), x, y), None);

        if let Some(e) = ctx.scene.get_mut(entity) {
            e.transform.position = ctx.layout.cell_center(c);
            e.transform.scale = Vec3::splat(0.5);
        }
        assert_eq!(hit_test(&ctx, &viewport(), x, y), None);
    }
}
