use dungeon_core::{CellCoord, CostGrid, GridTransform, TileCost};
use dungeon_system_pathfinding::{build_path, nearest_free_cell, Path};
use pathfinding::prelude::dijkstra;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn random_grid(rng: &mut ChaCha8Rng, width: u32, height: u32) -> CostGrid {
    let costs = (0..width * height)
        .map(|_| {
            if rng.gen_bool(0.25) {
                TileCost::IMPASSABLE
            } else {
                TileCost::new(rng.gen_range(1..=9))
            }
        })
        .collect();
    CostGrid::from_costs(width, height, costs, GridTransform::default()).expect("valid grid")
}

fn random_cell(rng: &mut ChaCha8Rng, grid: &CostGrid) -> CellCoord {
    CellCoord::new(
        rng.gen_range(0..grid.width()),
        rng.gen_range(0..grid.height()),
    )
}

fn oracle_cost(grid: &CostGrid, start: CellCoord, goal: CellCoord) -> Option<u64> {
    dijkstra(
        &start,
        |cell| {
            OFFSETS
                .iter()
                .filter_map(|&(dc, dr)| cell.offset(dc, dr))
                .filter_map(|neighbor| {
                    grid.cost_at(neighbor)
                        .ok()
                        .filter(TileCost::is_passable)
                        .map(|cost| (neighbor, u64::from(cost.get())))
                })
                .collect::<Vec<_>>()
        },
        |cell| *cell == goal,
    )
    .map(|(_, cost)| cost)
}

fn path_cost(grid: &CostGrid, path: &Path) -> u64 {
    path.iter()
        .skip(1)
        .map(|cell| u64::from(grid.cost_at(cell).expect("in bounds").get()))
        .sum()
}

fn assert_well_formed(grid: &CostGrid, path: &Path, start: CellCoord, goal: CellCoord) {
    let cells: Vec<_> = path.iter().collect();
    assert_eq!(cells.first(), Some(&start));
    assert_eq!(cells.last(), Some(&goal));
    for pair in cells.windows(2) {
        assert_eq!(pair[0].chebyshev_distance(pair[1]), 1, "steps are adjacent");
    }
    for cell in cells.iter().skip(1) {
        assert!(grid.is_passable(*cell), "{cell:?} must be passable");
    }
}

#[test]
fn random_grids_match_uniform_cost_search() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut reachable = 0;

    for round in 0..200 {
        let width = 3 + round % 8;
        let height = 3 + (round / 8) % 8;
        let grid = random_grid(&mut rng, width, height);
        let start = random_cell(&mut rng, &grid);
        let goal = random_cell(&mut rng, &grid);

        let found = build_path(&grid, start, goal).expect("endpoints in bounds");
        let expected = if start == goal {
            Some(0)
        } else if grid.is_passable(goal) {
            oracle_cost(&grid, start, goal)
        } else {
            None
        };

        match (found, expected) {
            (Some(path), Some(cost)) => {
                reachable += 1;
                assert_well_formed(&grid, &path, start, goal);
                assert_eq!(path_cost(&grid, &path), cost, "round {round}");
            }
            (None, None) => {}
            (found, expected) => {
                panic!("round {round}: search returned {found:?}, oracle cost {expected:?}")
            }
        }
    }

    assert!(reachable > 30, "fixtures should mostly be connected");
}

#[test]
fn repeated_searches_return_identical_paths() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let grid = random_grid(&mut rng, 16, 16);
    let copy = grid.clone();

    for _ in 0..32 {
        let start = random_cell(&mut rng, &grid);
        let goal = random_cell(&mut rng, &grid);
        assert_eq!(
            build_path(&grid, start, goal),
            build_path(&copy, start, goal)
        );
    }
}

#[test]
fn uniform_ties_break_towards_first_discovered_neighbour() {
    let grid = CostGrid::filled(3, 3, TileCost::new(1), GridTransform::default())
        .expect("valid grid");
    let first = build_path(&grid, CellCoord::new(0, 0), CellCoord::new(2, 0))
        .expect("in bounds")
        .expect("reachable");
    for _ in 0..8 {
        let again = build_path(&grid, CellCoord::new(0, 0), CellCoord::new(2, 0))
            .expect("in bounds")
            .expect("reachable");
        assert_eq!(again, first);
    }
    assert_eq!(first.len(), 3);
}

#[test]
fn wall_is_crossed_through_its_gap() {
    let mut costs = vec![TileCost::new(1); 100];
    for row in 0..10 {
        if row != 4 {
            costs[row * 10 + 5] = TileCost::IMPASSABLE;
        }
    }
    let grid = CostGrid::from_costs(10, 10, costs, GridTransform::default()).expect("valid grid");
    let start = CellCoord::new(0, 4);
    let goal = CellCoord::new(9, 4);

    let path = build_path(&grid, start, goal)
        .expect("in bounds")
        .expect("reachable");

    assert_well_formed(&grid, &path, start, goal);
    assert!(path.iter().any(|cell| cell == CellCoord::new(5, 4)));
    assert_eq!(path.len(), 10);
    assert_eq!(path_cost(&grid, &path), 9);
}

#[test]
fn diagonal_route_prefers_gap_over_wall_ends() {
    let mut costs = vec![TileCost::new(1); 100];
    for row in 2..=7 {
        if row != 4 {
            costs[row * 10 + 5] = TileCost::IMPASSABLE;
        }
    }
    let grid = CostGrid::from_costs(10, 10, costs, GridTransform::default()).expect("valid grid");
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(9, 9);

    let path = build_path(&grid, start, goal)
        .expect("in bounds")
        .expect("reachable");

    assert_well_formed(&grid, &path, start, goal);
    assert!(path.iter().any(|cell| cell == CellCoord::new(5, 4)));
    assert_eq!(path_cost(&grid, &path), 10);
    assert_eq!(oracle_cost(&grid, start, goal), Some(10));
}

#[test]
fn preferred_corridor_outweighs_shorter_floor() {
    // Floor costs 40, the corridor along the top and right edges costs 1.
    let width = 6;
    let height = 6;
    let mut costs = vec![TileCost::new(40); 36];
    for column in 0..width {
        costs[(height - 1) * width + column] = TileCost::new(1);
    }
    for row in 0..height {
        costs[row * width + width - 1] = TileCost::new(1);
    }
    let grid = CostGrid::from_costs(6, 6, costs, GridTransform::default()).expect("valid grid");
    let start = CellCoord::new(0, 5);
    let goal = CellCoord::new(5, 0);

    let path = build_path(&grid, start, goal)
        .expect("in bounds")
        .expect("reachable");

    assert_eq!(path_cost(&grid, &path), 9);
    assert_eq!(oracle_cost(&grid, start, goal), Some(9));
    assert!(path.iter().skip(1).all(|cell| grid.cost_at(cell) == Ok(TileCost::new(1))));
}

#[test]
fn probe_result_is_adjacent_and_stable() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..100 {
        let grid = random_grid(&mut rng, 8, 8);
        let target = random_cell(&mut rng, &grid);
        let resolved = nearest_free_cell(&grid, target).expect("in bounds");

        assert!(resolved.chebyshev_distance(target) <= 1);
        if grid.is_passable(resolved) {
            assert_eq!(nearest_free_cell(&grid, resolved), Ok(resolved));
        } else {
            assert_eq!(resolved, target);
            let boxed_in = OFFSETS
                .iter()
                .filter_map(|&(dc, dr)| target.offset(dc, dr))
                .all(|neighbor| !grid.is_passable(neighbor));
            assert!(boxed_in);
        }
    }
}
