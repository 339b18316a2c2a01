// Integration tests (native) for board rules across many seeds: generation,
// gravity, refill and swap bookkeeping between the grid and the scene.

use gem_cascade::board::MATCH_LEN;
use gem_cascade::scene::{GridLayout, Scene};
use gem_cascade::{Board, Coord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Every gem's entity exists and points back at the gem's cell.
fn assert_back_refs(board: &Board, scene: &Scene) {
    for gem in board.gems() {
        let e = scene.get(gem.entity).expect("gem entity missing from scene");
        assert_eq!(e.grid, gem.coord());
        assert_eq!(e.hit_volume.grid, gem.coord());
    }
}

#[test]
fn test_generated_boards_never_start_with_a_match() {
    for size in [3, 6, 8] {
        for kinds in [3u8, 5, 6] {
            for seed in 0..40u64 {
                let layout = GridLayout::new(size);
                let mut scene = Scene::new();
                let mut rng = StdRng::seed_from_u64(seed);
                let board = Board::generate(size, kinds, &mut rng, &mut scene, &layout);
                assert!(
                    board.scan_matches().is_empty(),
                    "size {} kinds {} seed {}: {:?}",
                    size,
                    kinds,
                    seed,
                    board.kinds_snapshot()
                );
                assert_eq!(board.gems().count(), size * size);
                assert_eq!(scene.len(), size * size);
                assert!(board.gems().all(|g| g.kind.0 < kinds));
                assert_back_refs(&board, &scene);
            }
        }
    }
}

#[test]
fn test_gravity_keeps_column_order_with_random_holes() {
    let layout = GridLayout::new(6);
    for seed in 0..50u64 {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::generate(6, 6, &mut rng, &mut scene, &layout);

        for row in 0..6 {
            for col in 0..6 {
                if rng.gen_bool(0.3) {
                    if let Some(gem) = board.take(Coord::new(row, col)) {
                        scene.despawn(gem.entity);
                    }
                }
            }
        }
        let before: Vec<Vec<_>> = (0..6)
            .map(|col| {
                (0..6)
                    .filter_map(|row| board.get(Coord::new(row, col)).map(|g| g.entity))
                    .collect()
            })
            .collect();

        let falls = board.apply_gravity(&mut scene);

        for (col, entities) in before.iter().enumerate() {
            let holes = 6 - entities.len();
            for row in 0..holes {
                assert!(!board.is_occupied(Coord::new(row, col)), "seed {}", seed);
            }
            let after: Vec<_> = (holes..6)
                .map(|row| board.get(Coord::new(row, col)).map(|g| g.entity))
                .collect();
            let expected: Vec<_> = entities.iter().copied().map(Some).collect();
            assert_eq!(after, expected, "seed {} col {}", seed, col);
        }
        for fall in &falls {
            assert!(fall.to.row > fall.from_row);
            assert_eq!(board.get(fall.to).map(|g| g.entity), Some(fall.entity));
        }
        assert_back_refs(&board, &scene);
    }
}

#[test]
fn test_refill_fills_every_hole_with_hidden_gems() {
    let layout = GridLayout::new(6);
    let mut scene = Scene::new();
    let mut rng = StdRng::seed_from_u64(9);
    let mut board = Board::generate(6, 6, &mut rng, &mut scene, &layout);
    for row in 0..4 {
        if let Some(gem) = board.take(Coord::new(row, 2)) {
            scene.despawn(gem.entity);
        }
    }
    if let Some(gem) = board.take(Coord::new(5, 5)) {
        scene.despawn(gem.entity);
    }
    board.apply_gravity(&mut scene);

    let spawns = board.refill(&mut rng, 6, &mut scene, &layout);

    assert_eq!(spawns.len(), 5);
    assert_eq!(board.gems().count(), 36);
    assert_eq!(scene.len(), 36);
    let column: Vec<_> = spawns.iter().filter(|s| s.coord.col == 2).collect();
    assert_eq!(column.len(), 4);
    for (i, spawn) in column.iter().enumerate() {
        assert_eq!(spawn.coord.row, i);
        assert_eq!(spawn.empty_index, i);
        assert_eq!(spawn.start_y, layout.spawn_height(i));
        let e = scene.get(spawn.entity).unwrap();
        assert_eq!(e.visual.opacity, 0.0);
        assert_eq!(e.transform.position.x, layout.column_x(2));
    }
    assert_back_refs(&board, &scene);
}

#[test]
fn test_swap_twice_restores_board_and_back_refs() {
    let layout = GridLayout::new(6);
    let mut scene = Scene::new();
    let mut rng = StdRng::seed_from_u64(3);
    let mut board = Board::generate(6, 5, &mut rng, &mut scene, &layout);
    let snapshot = board.kinds_snapshot();

    for _ in 0..30 {
        let a = Coord::new(rng.gen_range(0..6), rng.gen_range(0..5));
        let b = Coord::new(a.row, a.col + 1);
        assert!(board.swap(a, b, &mut scene));
        assert_back_refs(&board, &scene);
        assert!(board.swap(a, b, &mut scene));
        assert_eq!(board.kinds_snapshot(), snapshot);
    }
    assert!(!board.swap(Coord::new(0, 0), Coord::new(0, 6), &mut scene));
}

#[test]
fn test_every_match_is_part_of_a_full_run() {
    let layout = GridLayout::new(6);
    for seed in 0..30u64 {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::generate(6, 3, &mut rng, &mut scene, &layout);
        let a = Coord::new(rng.gen_range(0..5), rng.gen_range(0..6));
        board.swap(a, Coord::new(a.row + 1, a.col), &mut scene);

        for c in board.scan_matches() {
            let kind = board.kind_at(c).unwrap();
            let run = |dr: isize, dc: isize| {
                let mut n = 0;
                let (mut r, mut col) = (c.row as isize + dr, c.col as isize + dc);
                while (0..6).contains(&r)
                    && (0..6).contains(&col)
                    && board.kind_at(Coord::new(r as usize, col as usize)) == Some(kind)
                {
                    n += 1;
                    r += dr;
                    col += dc;
                }
                n
            };
            let horizontal = 1 + run(0, -1) + run(0, 1);
            let vertical = 1 + run(-1, 0) + run(1, 0);
            assert!(horizontal >= MATCH_LEN || vertical >= MATCH_LEN, "seed {} cell {:?}", seed, c);
        }
    }
}
