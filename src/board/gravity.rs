use glam::Vec3;
use rand::Rng;

use super::{Board, Coord, Gem, GemKind};
use crate::scene::{EntityId, GemEntity, GridLayout, Scene};

/// A gem that dropped to a lower cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fall {
    pub entity: EntityId,
    pub from_row: usize,
    pub to: Coord,
}

/// A gem created above the board to fill an empty cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spawn {
    pub entity: EntityId,
    pub coord: Coord,
    /// Position of this cell among the column's empty cells, counted from the top.
    pub empty_index: usize,
    pub start_y: f32,
}

impl Board {
    /// Compact every column downward, keeping gem order. Empty cells end up
    /// at the top.
    pub fn apply_gravity(&mut self, scene: &mut Scene) -> Vec<Fall> {
        let mut falls = Vec::new();
        for col in 0..self.size {
            let mut write = self.size;
            for row in (0..self.size).rev() {
                let from = Coord::new(row, col);
                if !self.is_occupied(from) {
                    continue;
                }
                write -= 1;
                if write == row {
                    continue;
                }
                let to = Coord::new(write, col);
                if let Some(gem) = self.take(from) {
                    self.put(to, gem, scene);
                    falls.push(Fall {
                        entity: gem.entity,
                        from_row: row,
                        to,
                    });
                }
            }
        }
        falls
    }

    /// Fill every empty cell with a random gem spawned above the board.
    ///
    /// New entities start invisible (scale 0, opacity 0) at their spawn
    /// height; the caller animates them in.
    pub fn refill<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        kinds: u8,
        scene: &mut Scene,
        layout: &GridLayout,
    ) -> Vec<Spawn> {
        let kinds = kinds.max(1);
        let mut spawns = Vec::new();
        for col in 0..self.size {
            let mut empty_index = 0;
            for row in 0..self.size {
                let coord = Coord::new(row, col);
                if self.is_occupied(coord) {
                    continue;
                }
                let kind = GemKind(rng.gen_range(0..kinds));
                let start_y = layout.spawn_height(empty_index);
                let mut entity = GemEntity::new(kind, coord, Vec3::new(layout.column_x(col), start_y, 0.0));
                entity.transform.scale = Vec3::ZERO;
                entity.visual.opacity = 0.0;
                let id = scene.spawn(entity);
                self.put(
                    coord,
                    Gem {
                        kind,
                        row,
                        col,
                        entity: id,
                    },
                    scene,
                );
                spawns.push(Spawn {
                    entity: id,
                    coord,
                    empty_index,
                    start_y,
                });
                empty_index += 1;
            }
        }
        spawns
    }

    fn put(&mut self, coord: Coord, mut gem: Gem, scene: &mut Scene) {
        let Some(i) = self.index(coord) else { return };
        gem.row = coord.row;
        gem.col = coord.col;
        if let Some(e) = scene.get_mut(gem.entity) {
            e.relocate(coord);
        }
        self.cells[i] = Some(gem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn column_board(column: &[Option<u8>]) -> (Board, Scene, GridLayout) {
        let size = column.len();
        let layout = GridLayout::new(size);
        let mut scene = Scene::new();
        let rows: Vec<Vec<Option<u8>>> = column
            .iter()
            .map(|cell| {
                let mut row = vec![Some(9); size];
                row[0] = *cell;
                row
            })
            .collect();
        let board = Board::from_layout(&rows, &mut scene, &layout).unwrap();
        (board, scene, layout)
    }

    fn first_column(board: &Board) -> Vec<Option<u8>> {
        board.kinds_snapshot().iter().map(|r| r[0]).collect()
    }

    #[test]
    fn test_gravity_keeps_order() {
        let (mut board, mut scene, _) = column_board(&[Some(2), None, Some(5), None]);
        let falls = board.apply_gravity(&mut scene);
        assert_eq!(first_column(&board), vec![None, None, Some(2), Some(5)]);
        assert_eq!(falls.len(), 2);
        let lower = falls.iter().find(|f| f.from_row == 2).unwrap();
        assert_eq!(lower.to, Coord::new(3, 0));
        let upper = falls.iter().find(|f| f.from_row == 0).unwrap();
        assert_eq!(upper.to, Coord::new(2, 0));
        assert_eq!(scene.get(upper.entity).unwrap().grid, Coord::new(2, 0));
        assert_eq!(scene.get(upper.entity).unwrap().hit_volume.grid, Coord::new(2, 0));
    }

    #[test]
    fn test_gravity_on_compact_column_is_noop() {
        let (mut board, mut scene, _) = column_board(&[None, None, Some(2), Some(5)]);
        assert!(board.apply_gravity(&mut scene).is_empty());
        assert_eq!(first_column(&board), vec![None, None, Some(2), Some(5)]);
    }

    #[test]
    fn test_refill_fills_top_down_above_board() {
        let (mut board, mut scene, layout) = column_board(&[None, None, Some(2), Some(5)]);
        let mut rng = StdRng::seed_from_u64(3);
        let spawns = board.refill(&mut rng, 6, &mut scene, &layout);

        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[0].coord, Coord::new(0, 0));
        assert_eq!(spawns[0].empty_index, 0);
        assert_eq!(spawns[1].coord, Coord::new(1, 0));
        assert_eq!(spawns[1].empty_index, 1);
        assert!(spawns[1].start_y > spawns[0].start_y);
        assert!(spawns[0].start_y > layout.row_y(0));

        assert!(board.gems().count() == 16);
        for s in &spawns {
            let e = scene.get(s.entity).unwrap();
            assert_eq!(e.transform.scale, Vec3::ZERO);
            assert_eq!(e.visual.opacity, 0.0);
            assert_eq!(e.grid, s.coord);
            assert!(board.kind_at(s.coord).unwrap().0 < 6);
        }
    }
}
