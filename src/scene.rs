//! Renderer-agnostic scene: gem entities with transform, visual and hit-volume
//! parts, stored in a generational arena.
//!
//! The board only keeps `EntityId` handles. A gem that has left the board
//! (mid-disappear) stays in the scene until its animation completes, then it
//! is despawned; stale handles simply stop resolving.

use glam::{Vec2, Vec3};

use crate::board::{Coord, GemKind};

/// Neutral tint (no color modulation).
pub const NEUTRAL_TINT: u32 = 0xff_ff_ff;
/// Tint applied while an invalid move is being rejected.
pub const ERROR_TINT: u32 = 0xff_44_44;
/// Hit volumes are slightly smaller than a cell so neighbours never overlap.
pub const HIT_HALF_EXTENT: f32 = 0.475;

// --- Transforms ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

/// Drawable part of a gem.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visual {
    pub kind: GemKind,
    pub opacity: f32,
    pub tint: u32,
}

/// Invisible pick volume; carries its own copy of the grid back-reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitVolume {
    pub grid: Coord,
    pub half_extent: f32,
}

impl HitVolume {
    /// Whether `point` (world units) lies inside the volume centered at `center`.
    pub fn contains(&self, center: Vec3, point: Vec2) -> bool {
        (point.x - center.x).abs() <= self.half_extent
            && (point.y - center.y).abs() <= self.half_extent
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GemEntity {
    pub transform: Transform,
    pub visual: Visual,
    pub hit_volume: HitVolume,
    /// Grid back-reference; always equal to `hit_volume.grid`.
    pub grid: Coord,
}

impl GemEntity {
    pub fn new(kind: GemKind, grid: Coord, position: Vec3) -> Self {
        Self {
            transform: Transform::at(position),
            visual: Visual {
                kind,
                opacity: 1.0,
                tint: NEUTRAL_TINT,
            },
            hit_volume: HitVolume {
                grid,
                half_extent: HIT_HALF_EXTENT,
            },
            grid,
        }
    }

    /// Move both back-references to `grid`.
    pub fn relocate(&mut self, grid: Coord) {
        self.grid = grid;
        self.hit_volume.grid = grid;
    }

    /// Canonical pose for the current grid cell: centered, unit scale, no
    /// rotation, fully opaque, neutral tint.
    pub fn reset_canonical(&mut self, layout: &GridLayout) {
        self.transform = Transform::at(layout.cell_center(self.grid));
        self.visual.opacity = 1.0;
        self.visual.tint = NEUTRAL_TINT;
    }

    /// True once the gem is drawn where its grid cell says it is.
    pub fn is_settled(&self, layout: &GridLayout, tolerance: f32, min_scale: f32) -> bool {
        let expected = layout.cell_center(self.grid);
        let p = self.transform.position;
        (p.x - expected.x).abs() < tolerance
            && (p.y - expected.y).abs() < tolerance
            && self.transform.scale.x > min_scale
    }
}

// --- Layout ------------------------------------------------------------------

/// Maps grid coordinates to world space. The board is centered on the origin,
/// one world unit per cell, row 0 at the top (positive y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    pub size: usize,
}

impl GridLayout {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    fn half(&self) -> f32 {
        self.size as f32 / 2.0
    }

    pub fn column_x(&self, col: usize) -> f32 {
        col as f32 - self.half() + 0.5
    }

    pub fn row_y(&self, row: usize) -> f32 {
        -(row as f32 - self.half() + 0.5)
    }

    pub fn cell_center(&self, coord: Coord) -> Vec3 {
        Vec3::new(self.column_x(coord.col), self.row_y(coord.row), 0.0)
    }

    /// Height above the board where refill gems are spawned.
    pub fn spawn_height(&self, empty_index: usize) -> f32 {
        self.half() + 2.0 + empty_index as f32 * 1.2
    }
}

// --- Arena -----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entity: Option<GemEntity>,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: GemEntity) -> EntityId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            return EntityId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
        });
        EntityId {
            index,
            generation: 0,
        }
    }

    /// Remove an entity. Returns it if the handle was still live.
    pub fn despawn(&mut self, id: EntityId) -> Option<GemEntity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&GemEntity> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut GemEntity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entity.as_mut())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &GemEntity)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.entity.as_ref().map(|e| {
                (
                    EntityId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    e,
                )
            })
        })
    }

    /// Drop every entity. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
            }
        }
        self.live = 0;
    }
}
