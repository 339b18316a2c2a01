//! Square grid of gem cells and the pure rules that operate on it.
//!
//! The board owns the logical state (which kind sits where); every gem also
//! has a scene entity for its visual and hit volume. The two are kept in sync
//! through back-references: `Gem::{row, col}`, `GemEntity::grid` and
//! `HitVolume::grid` always name the cell the gem occupies.
//!
//! Gravity and refill live in `gravity.rs`.

use std::collections::HashSet;

use rand::Rng;

use crate::error::GameError;
use crate::scene::{EntityId, GemEntity, GridLayout, Scene};

mod gravity;

pub use gravity::{Fall, Spawn};

/// Minimum run length that counts as a match.
pub const MATCH_LEN: usize = 3;

// --- Coordinates -------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Orthogonal neighbours only; diagonals and the cell itself are not adjacent.
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.manhattan(other) == 1
    }

    fn offset(self, dr: isize, dc: isize) -> Option<Coord> {
        Some(Coord {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

/// Gem color index in `[0, gem_kinds)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GemKind(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gem {
    pub kind: GemKind,
    pub row: usize,
    pub col: usize,
    pub entity: EntityId,
}

impl Gem {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

// --- Board -------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Gem>>,
}

impl Board {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Fill row-major with random kinds, never producing a run of three.
    ///
    /// Each cell draws uniformly among the kinds that would not complete a run
    /// with the gems already placed to its left and above.
    pub fn generate<R: Rng + ?Sized>(
        size: usize,
        kinds: u8,
        rng: &mut R,
        scene: &mut Scene,
        layout: &GridLayout,
    ) -> Self {
        let kinds = kinds.max(1);
        let mut board = Self::empty(size);
        for row in 0..size {
            for col in 0..size {
                let coord = Coord::new(row, col);
                let allowed: Vec<GemKind> = (0..kinds)
                    .map(GemKind)
                    .filter(|k| !board.would_create_match(coord, *k))
                    .collect();
                let kind = if allowed.is_empty() {
                    GemKind(rng.gen_range(0..kinds))
                } else {
                    allowed[rng.gen_range(0..allowed.len())]
                };
                board.place(coord, kind, scene, layout);
            }
        }
        board
    }

    /// Build a board from explicit rows; `None` leaves the cell empty.
    pub fn from_layout(
        rows: &[Vec<Option<u8>>],
        scene: &mut Scene,
        layout: &GridLayout,
    ) -> Result<Self, GameError> {
        let size = rows.len();
        if size != layout.size {
            return Err(GameError::InvalidLayout(format!(
                "{} rows for a {}x{} grid",
                size, layout.size, layout.size
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(GameError::InvalidLayout(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                size
            )));
        }
        let mut board = Self::empty(size);
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(kind) = cell {
                    board.place(Coord::new(r, c), GemKind(*kind), scene, layout);
                }
            }
        }
        Ok(board)
    }

    /// Fully populated board from rows of kinds.
    pub fn from_kinds<R: AsRef<[u8]>>(
        rows: &[R],
        scene: &mut Scene,
        layout: &GridLayout,
    ) -> Result<Self, GameError> {
        let rows: Vec<Vec<Option<u8>>> = rows
            .iter()
            .map(|r| r.as_ref().iter().copied().map(Some).collect())
            .collect();
        Self::from_layout(&rows, scene, layout)
    }

    fn place(&mut self, coord: Coord, kind: GemKind, scene: &mut Scene, layout: &GridLayout) {
        let entity = scene.spawn(GemEntity::new(kind, coord, layout.cell_center(coord)));
        if let Some(i) = self.index(coord) {
            self.cells[i] = Some(Gem {
                kind,
                row: coord.row,
                col: coord.col,
                entity,
            });
        }
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        (coord.row < self.size && coord.col < self.size).then(|| coord.row * self.size + coord.col)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.index(coord).is_some()
    }

    pub fn get(&self, coord: Coord) -> Option<&Gem> {
        self.index(coord).and_then(|i| self.cells[i].as_ref())
    }

    pub fn kind_at(&self, coord: Coord) -> Option<GemKind> {
        self.get(coord).map(|g| g.kind)
    }

    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.get(coord).is_some()
    }

    /// Remove a gem from its cell. The scene entity is left alone.
    pub fn take(&mut self, coord: Coord) -> Option<Gem> {
        let i = self.index(coord)?;
        self.cells[i].take()
    }

    pub fn gems(&self) -> impl Iterator<Item = &Gem> {
        self.cells.iter().flatten()
    }

    /// Kinds per cell, row-major. Handy for assertions and debug dumps.
    pub fn kinds_snapshot(&self) -> Vec<Vec<Option<u8>>> {
        self.cells
            .chunks(self.size.max(1))
            .map(|row| row.iter().map(|c| c.map(|g| g.kind.0)).collect())
            .collect()
    }

    /// Empty every cell and despawn the gems' entities.
    pub fn clear(&mut self, scene: &mut Scene) {
        for cell in self.cells.iter_mut() {
            if let Some(gem) = cell.take() {
                scene.despawn(gem.entity);
            }
        }
    }

    // --- Match rules ---------------------------------------------------------

    /// Same-kind occupied cells walking from `from` (exclusive) in one direction.
    fn run_from(&self, from: Coord, kind: GemKind, dr: isize, dc: isize) -> Vec<Coord> {
        let mut run = Vec::new();
        let mut cur = from.offset(dr, dc);
        while let Some(c) = cur {
            if self.kind_at(c) != Some(kind) {
                break;
            }
            run.push(c);
            cur = c.offset(dr, dc);
        }
        run
    }

    /// Would placing `kind` at `coord` complete a run of three with the gems
    /// already on the board?
    pub fn would_create_match(&self, coord: Coord, kind: GemKind) -> bool {
        let horizontal = 1 + self.run_from(coord, kind, 0, -1).len() + self.run_from(coord, kind, 0, 1).len();
        let vertical = 1 + self.run_from(coord, kind, -1, 0).len() + self.run_from(coord, kind, 1, 0).len();
        horizontal >= MATCH_LEN || vertical >= MATCH_LEN
    }

    /// Cells in the horizontal and vertical runs of 3+ through `coord`,
    /// deduplicated. Empty when `coord` is empty or off the board.
    pub fn find_matches(&self, coord: Coord) -> Vec<Coord> {
        let Some(kind) = self.kind_at(coord) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (dr, dc) in [(0, 1), (1, 0)] {
            let mut back = self.run_from(coord, kind, -dr, -dc);
            back.reverse();
            let fwd = self.run_from(coord, kind, dr, dc);
            if back.len() + 1 + fwd.len() < MATCH_LEN {
                continue;
            }
            for c in back.into_iter().chain(std::iter::once(coord)).chain(fwd) {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Every matched cell on the board, in row-major discovery order.
    pub fn scan_matches(&self) -> Vec<Coord> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                for c in self.find_matches(Coord::new(row, col)) {
                    if seen.insert(c) {
                        out.push(c);
                    }
                }
            }
        }
        out
    }

    /// Exchange two cells and resync every back-reference. Returns false if
    /// either coordinate is off the board.
    pub fn swap(&mut self, a: Coord, b: Coord, scene: &mut Scene) -> bool {
        let (Some(ia), Some(ib)) = (self.index(a), self.index(b)) else {
            return false;
        };
        self.cells.swap(ia, ib);
        self.resync(a, scene);
        self.resync(b, scene);
        true
    }

    fn resync(&mut self, coord: Coord, scene: &mut Scene) {
        let Some(i) = self.index(coord) else { return };
        if let Some(gem) = self.cells[i].as_mut() {
            gem.row = coord.row;
            gem.col = coord.col;
            if let Some(e) = scene.get_mut(gem.entity) {
                e.relocate(coord);
            }
        }
    }
}
