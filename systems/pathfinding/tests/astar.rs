use sprout_core::{BlockValue, CellCoord};
use sprout_system_pathfinding::{Connectivity, Heuristic, PathFinder};
use sprout_world::{BlockTable, GridWorld, MemoryStore, Persistence};

fn open_world() -> GridWorld {
    let store = MemoryStore::new();
    store.insert("open", BlockTable::filled(32, 24, BlockValue::EMPTY));
    GridWorld::init(1, 24, 32, Box::new(store), "open").expect("world")
}

#[test]
fn enemy_reaches_player_in_a_straight_line() {
    let world = open_world();
    let mut finder = PathFinder::new(Connectivity::Four);

    let path = finder.find_path(
        &world,
        CellCoord::new(10, 10),
        CellCoord::new(10, 13),
        Heuristic::Euclidean,
        10,
    );

    assert_eq!(
        path,
        vec![
            CellCoord::new(10, 11),
            CellCoord::new(10, 12),
            CellCoord::new(10, 13),
        ]
    );
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
    }
}

#[test]
fn a_full_wall_of_trees_separates_start_and_goal() {
    let mut world = open_world();
    for row in 0..24 {
        let planted = world
            .set_block(
                CellCoord::new(16, row),
                BlockValue::GRASS_TREE,
                Persistence::MemoryOnly,
            )
            .expect("plant");
        assert!(planted);
    }
    let mut finder = PathFinder::new(Connectivity::Eight);

    let path = finder.find_path(
        &world,
        CellCoord::new(2, 5),
        CellCoord::new(30, 5),
        Heuristic::Manhattan,
        1,
    );
    assert!(path.is_empty());

    let around = finder.find_path(
        &world,
        CellCoord::new(2, 5),
        CellCoord::new(12, 5),
        Heuristic::Manhattan,
        1,
    );
    assert_eq!(around.len(), 10);
}

#[test]
fn gap_in_the_wall_is_found_and_every_step_is_adjacent() {
    let mut world = open_world();
    for row in 0..24 {
        if row == 20 {
            continue;
        }
        let _ = world
            .set_block(
                CellCoord::new(16, row),
                BlockValue::DIRT_SEED,
                Persistence::MemoryOnly,
            )
            .expect("plant");
    }
    let mut finder = PathFinder::new(Connectivity::Four);
    let start = CellCoord::new(2, 5);
    let goal = CellCoord::new(30, 5);

    let path = finder.find_path(&world, start, goal, Heuristic::Manhattan, 1);

    assert!(path.contains(&CellCoord::new(16, 20)));
    assert_eq!(path.last(), Some(&goal));
    assert_eq!(start.manhattan_distance(path[0]), 1);
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
    }
}

#[test]
fn repeated_searches_return_identical_paths() {
    let mut world = open_world();
    for row in 3..20 {
        let _ = world
            .set_block(
                CellCoord::new(12, row),
                BlockValue::GRASS_SEED,
                Persistence::MemoryOnly,
            )
            .expect("plant");
    }
    let mut finder = PathFinder::new(Connectivity::Eight);
    let start = CellCoord::new(4, 10);
    let goal = CellCoord::new(25, 11);

    let first = finder.find_path(&world, start, goal, Heuristic::Euclidean, 10);
    assert!(!first.is_empty());
    for _ in 0..5 {
        assert_eq!(
            finder.find_path(&world, start, goal, Heuristic::Euclidean, 10),
            first
        );
    }
    let mut fresh = PathFinder::new(Connectivity::Eight);
    assert_eq!(
        fresh.find_path(&world, start, goal, Heuristic::Euclidean, 10),
        first
    );
}
