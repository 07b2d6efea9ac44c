use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sprout_core::{BlockValue, CellCoord, Event, RowOrder, TileQuery};
use sprout_world::{
    query, BlockTable, DirectoryStore, GridWorld, MemoryStore, Persistence, WorldError,
    WorldOrigin, WorldStore,
};

fn template() -> BlockTable {
    let mut rows = vec![vec![0; 12]; 24];
    rows[19][1] = 400;
    rows[19][0] = 201;
    for column in 0..12 {
        rows[20][column] = 2;
        rows[21][column] = 3;
        rows[22][column] = 3;
        rows[23][column] = 1;
    }
    BlockTable::from_rows(&rows).expect("template")
}

#[test]
fn new_worlds_are_generated_registered_and_then_reloaded() {
    let store = MemoryStore::new();
    store.insert("DEFAULT", template());
    let mut world = GridWorld::init(1, 24, 12, Box::new(store.clone()), "DEFAULT").expect("world");
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let origin = world.open_or_create("Meadow", &mut rng).expect("create");
    assert_eq!(origin, WorldOrigin::Created);
    assert_eq!(query::active_world(&world), "Meadow");
    assert_eq!(world.world_names().expect("names"), vec!["Meadow".to_owned()]);
    assert_eq!(world.block_at(CellCoord::new(1, 4)), BlockValue::PLAYER_SPAWN);
    assert_eq!(world.block_at(CellCoord::new(0, 4)), BlockValue::DOOR);
    for column in 0..12 {
        assert_eq!(world.block_at(CellCoord::new(column, 0)), BlockValue::BEDROCK);
    }
    let created = store.table("Meadow").expect("saved");

    world.load_world("DEFAULT").expect("back to template");
    let origin = world.open_or_create("Meadow", &mut rng).expect("load");
    assert_eq!(origin, WorldOrigin::Loaded);
    assert_eq!(store.table("Meadow").expect("saved"), created);
    assert_eq!(world.world_names().expect("names").len(), 1);
}

#[test]
fn procedural_extension_appends_columns_and_saves() {
    let store = MemoryStore::new();
    store.insert("DEFAULT", template());
    let mut world = GridWorld::init(1, 24, 12, Box::new(store.clone()), "DEFAULT").expect("world");
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    world.generate_procedural(20, &mut rng).expect("generate");

    assert_eq!(world.dimensions().columns(), 32);
    assert_eq!(world.block_at(CellCoord::new(1, 4)), BlockValue::PLAYER_SPAWN);
    for column in 12..32 {
        assert_eq!(world.block_at(CellCoord::new(column, 0)), BlockValue::BEDROCK);
    }
    let sky_clear = query::row_values(&world, 0, RowOrder::TopDown)
        .iter()
        .all(|value| value.is_empty());
    assert!(sky_clear, "sky row must stay clear");
    assert_eq!(
        store.table("DEFAULT").map(|table| table.dimensions().columns()),
        Some(32)
    );
}

#[test]
fn chest_opening_drops_a_collectable_above() {
    let store = MemoryStore::new();
    store.insert(
        "vault",
        BlockTable::from_rows(&[vec![0, 0], vec![4, 0], vec![1, 1]]).expect("table"),
    );
    let mut world = GridWorld::init(1, 3, 2, Box::new(store.clone()), "vault").expect("world");
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut events = Vec::new();

    assert!(!world
        .open_chest(CellCoord::new(1, 1), &mut rng, &mut events)
        .expect("not a chest"));
    assert!(world
        .open_chest(CellCoord::new(0, 1), &mut rng, &mut events)
        .expect("chest"));

    assert_eq!(world.block_at(CellCoord::new(0, 1)), BlockValue::EMPTY);
    let drop = world.block_at(CellCoord::new(0, 2));
    assert!(drop == BlockValue::STONE || drop == BlockValue::CHEESE);
    assert_eq!(
        events,
        vec![Event::ChestOpened {
            cell: CellCoord::new(0, 1),
            drop,
        }]
    );
    assert_eq!(store.table("vault").and_then(|t| t.value(0, 0)), Some(drop));
}

#[test]
fn damaged_cells_break_at_zero_health() {
    let store = MemoryStore::new();
    store.insert(
        "quarry",
        BlockTable::from_rows(&[vec![0], vec![3], vec![1]]).expect("table"),
    );
    let mut world = GridWorld::init(1, 3, 1, Box::new(store), "quarry").expect("world");
    let target = CellCoord::new(0, 1);
    let mut events = Vec::new();

    assert!(!world.damage_cell(target, 60.0, &mut events).expect("damage"));
    assert_eq!(world.cell(target).map(|cell| cell.health()), Some(40.0));
    assert!(world.damage_cell(target, 40.0, &mut events).expect("damage"));
    assert_eq!(world.block_at(target), BlockValue::EMPTY);
    assert_eq!(world.block_at(CellCoord::new(0, 2)), BlockValue::STONE);
    assert_eq!(
        events,
        vec![Event::CellDestroyed {
            cell: target,
            previous: BlockValue::DIRT,
        }]
    );
}

#[test]
fn directory_store_round_trips_a_persisted_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = DirectoryStore::new(dir.path()).expect("store");
    store
        .save("Plains", &BlockTable::from_rows(&[vec![0, 0], vec![2, 2]]).expect("table"))
        .expect("seed");

    let mut world =
        GridWorld::init(1, 2, 2, Box::new(store.clone()), "Plains").expect("world");
    let written = world
        .set(0, 1, BlockValue::GRASS_SEED, RowOrder::TopDown, Persistence::Sync)
        .expect("set");
    assert!(written);

    let text = std::fs::read_to_string(store.path_for("Plains")).expect("read");
    assert_eq!(text, "0,100\n2,2\n");
    let reloaded = GridWorld::init(1, 2, 2, Box::new(store), "Plains").expect("reload");
    assert_eq!(reloaded.block_at(CellCoord::new(1, 1)), BlockValue::GRASS_SEED);
}

#[test]
fn consumed_markers_survive_later_writes() {
    let store = MemoryStore::new();
    store.insert("DEFAULT", template());
    let mut world = GridWorld::init(1, 24, 12, Box::new(store.clone()), "DEFAULT").expect("world");

    let spawn = world.consume_marker(BlockValue::PLAYER_SPAWN);
    assert_eq!(spawn, Some(CellCoord::new(1, 4)));
    assert_eq!(world.block_at(CellCoord::new(1, 4)), BlockValue::EMPTY);

    assert!(world
        .set_block(CellCoord::new(5, 4), BlockValue::DIRT, Persistence::Sync)
        .expect("place"));

    let stored = store.table("DEFAULT").expect("saved");
    assert_eq!(stored.value(19, 1), Some(BlockValue::PLAYER_SPAWN));
    assert_eq!(stored.value(19, 5), Some(BlockValue::DIRT));
    assert_eq!(world.block_at(CellCoord::new(1, 4)), BlockValue::EMPTY);
}

#[test]
fn opening_the_template_never_regenerates_it() {
    let store = MemoryStore::new();
    store.insert("DEFAULT", template());
    let mut world = GridWorld::init(1, 24, 12, Box::new(store.clone()), "DEFAULT").expect("world");
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let origin = world.open_or_create("DEFAULT", &mut rng).expect("open");

    assert_eq!(origin, WorldOrigin::Loaded);
    assert_eq!(store.table("DEFAULT"), Some(template()));
    assert!(world.world_names().expect("names").is_empty());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn failed_creation_restores_the_previous_world() {
    let store = MemoryStore::new();
    store.insert("DEFAULT", template());
    let mut world = GridWorld::init(1, 24, 12, Box::new(store.clone()), "DEFAULT").expect("world");
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    world.open_or_create("Meadow", &mut rng).expect("create");
    assert_eq!(world.consume_marker(BlockValue::PLAYER_SPAWN), Some(CellCoord::new(1, 4)));
    assert!(world
        .set_block(CellCoord::new(6, 4), BlockValue::DIRT, Persistence::MemoryOnly)
        .expect("place"));

    store.set_reject_writes(true);
    let result = world.open_or_create("Canyon", &mut rng);

    assert!(matches!(result, Err(WorldError::Persistence { ref world, .. }) if world == "Canyon"));
    assert_eq!(query::active_world(&world), "Meadow");
    assert!(!world.is_dirty());
    assert_eq!(world.block_at(CellCoord::new(6, 4)), BlockValue::DIRT);
    assert_eq!(world.block_at(CellCoord::new(1, 4)), BlockValue::EMPTY);
    assert_eq!(world.world_names().expect("names"), vec!["Meadow".to_owned()]);
    assert_eq!(store.table("Canyon"), None);

    store.set_reject_writes(false);
    assert_eq!(
        world.open_or_create("Canyon", &mut rng).expect("retry"),
        WorldOrigin::Created
    );
    assert_eq!(
        world.world_names().expect("names"),
        vec!["Meadow".to_owned(), "Canyon".to_owned()]
    );
}
