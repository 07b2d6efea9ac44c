#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tile world for the Sprout engine.
//!
//! [`GridWorld`] owns every cell of the active world, keeps the backing store
//! in sync after each persisted mutation, grows planted seeds and lays new
//! terrain on demand. Actors never hold a reference to the world; they borrow
//! it for the duration of a single update.

mod error;
mod generation;
mod grid;
mod growth;
mod store;

use rand::Rng;
use serde::Deserialize;
use sprout_core::{BlockCategory, BlockValue, CellCoord, Dimensions, Event, RowOrder, TileQuery};

pub use error::{Result, WorldError};
pub use generation::GenerationTuning;
pub use grid::{Cell, DEFAULT_CELL_HEALTH};
pub use growth::{GrowthTuning, SeedSpecies};
pub use store::{BlockTable, DirectoryStore, MemoryStore, StoreError, WorldStore, WORLD_LIST_FILE};

use generation::{lay_columns, surface_row};
use grid::Grid;

/// Whether a mutation is written through to the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Persistence {
    /// Rewrite the whole active world before returning.
    Sync,
    /// Change the in-memory cell only.
    MemoryOnly,
}

/// How [`GridWorld::open_or_create`] obtained the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldOrigin {
    /// The world was listed by the store and loaded.
    Loaded,
    /// The world was generated from the template and registered.
    Created,
}

/// Tunables owned by the world.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Seed kinds and their growth delays.
    pub growth: GrowthTuning,
    /// Procedural terrain parameters.
    pub generation: GenerationTuning,
}

/// World state restored when creating a world fails halfway.
#[derive(Debug)]
struct Snapshot {
    grid: Grid,
    active: String,
    consumed: Vec<(usize, CellCoord, BlockValue)>,
    dirty: bool,
}

/// Multi-level tile grid bound to a persistent store.
#[derive(Debug)]
pub struct GridWorld {
    grid: Grid,
    level: usize,
    store: Box<dyn WorldStore>,
    active: String,
    tuning: WorldTuning,
    dirty: bool,
    consumed: Vec<(usize, CellCoord, BlockValue)>,
}

impl GridWorld {
    /// Allocates an empty grid and loads the named dataset into level zero.
    ///
    /// The dataset's own dimensions win over the requested ones.
    pub fn init(
        levels: u32,
        rows: u32,
        columns: u32,
        store: Box<dyn WorldStore>,
        dataset: &str,
    ) -> Result<Self> {
        let levels = usize::try_from(levels.max(1)).unwrap_or(1);
        let mut world = Self {
            grid: Grid::new(levels, Dimensions::new(columns, rows)),
            level: 0,
            store,
            active: dataset.to_owned(),
            tuning: WorldTuning::default(),
            dirty: false,
            consumed: Vec::new(),
        };
        world.load_world(dataset)?;
        Ok(world)
    }

    /// Replaces the world tunables.
    pub fn set_tuning(&mut self, tuning: WorldTuning) {
        self.tuning = tuning;
    }

    /// Currently applied tunables.
    #[must_use]
    pub fn tuning(&self) -> &WorldTuning {
        &self.tuning
    }

    /// Maps a value onto its band.
    #[must_use]
    pub const fn classify(value: BlockValue) -> BlockCategory {
        BlockCategory::classify(value)
    }

    /// Size of every level.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    /// Name of the world currently loaded.
    #[must_use]
    pub fn active_world(&self) -> &str {
        &self.active
    }

    /// Reports whether a failed write is still waiting to be retried.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Names of all worlds created so far.
    pub fn world_names(&self) -> Result<Vec<String>> {
        Ok(self.store.world_names()?)
    }

    /// Value at a row and column, or [`BlockValue::OUT_OF_BOUNDS`].
    #[must_use]
    pub fn get(&self, row: i32, column: i32, order: RowOrder) -> BlockValue {
        self.try_get(row, column, order)
            .unwrap_or(BlockValue::OUT_OF_BOUNDS)
    }

    /// Value at a row and column, if inside the grid.
    #[must_use]
    pub fn try_get(&self, row: i32, column: i32, order: RowOrder) -> Option<BlockValue> {
        self.grid
            .cell(self.level, self.storage_row(row, order), column)
            .map(Cell::value)
    }

    /// Full cell state at a gameplay coordinate.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.grid.cell(
            self.level,
            self.storage_row(cell.row(), RowOrder::BottomUp),
            cell.column(),
        )
    }

    /// Writes a value, returning `false` when the target lies outside the grid.
    ///
    /// With [`Persistence::Sync`] the whole active world is rewritten before
    /// returning. A failed write keeps the change in memory and is retried by
    /// the next persisted mutation or [`GridWorld::flush`].
    pub fn set(
        &mut self,
        row: i32,
        column: i32,
        value: BlockValue,
        order: RowOrder,
        persistence: Persistence,
    ) -> Result<bool> {
        let row = self.storage_row(row, order);
        let Some(cell) = self.grid.cell_mut(self.level, row, column) else {
            return Ok(false);
        };
        cell.replace(value);
        if persistence == Persistence::Sync {
            self.persist()?;
        }
        Ok(true)
    }

    /// Writes a value at a gameplay coordinate.
    pub fn set_block(
        &mut self,
        cell: CellCoord,
        value: BlockValue,
        persistence: Persistence,
    ) -> Result<bool> {
        self.set(
            cell.row(),
            cell.column(),
            value,
            RowOrder::BottomUp,
            persistence,
        )
    }

    /// First cell holding `value`, scanning the stored table row by row.
    #[must_use]
    pub fn find_first(&self, value: BlockValue) -> Option<CellCoord> {
        let dimensions = self.dimensions();
        let rows = i32::try_from(dimensions.rows()).ok()?;
        let columns = i32::try_from(dimensions.columns()).ok()?;
        for row in 0..rows {
            for column in 0..columns {
                let found = self
                    .grid
                    .cell(self.level, row, column)
                    .is_some_and(|cell| cell.value() == value);
                if found {
                    return Some(CellCoord::new(column, rows - 1 - row));
                }
            }
        }
        None
    }

    /// Finds a spawn marker and clears it in memory.
    ///
    /// Stored copies of the world keep the marker, so the world can be
    /// entered again after later writes.
    pub fn consume_marker(&mut self, marker: BlockValue) -> Option<CellCoord> {
        let cell = self.find_first(marker)?;
        if self.write(cell, BlockValue::EMPTY) {
            self.consumed.push((self.level, cell, marker));
            tracing::debug!(marker = %marker, cell = %cell, "consumed spawn marker");
        }
        Some(cell)
    }

    /// Advances every planted seed by `dt` seconds.
    ///
    /// A seed whose timer reaches its threshold becomes the next content code,
    /// is persisted and reports [`Event::SeedMatured`]. Promotions continue
    /// after a failed write; the first failure is returned once the scan ends.
    pub fn update_growth_timers(&mut self, dt: f32, out_events: &mut Vec<Event>) -> Result<()> {
        let mut matured = Vec::new();
        for (offset, cell) in self.grid.cells_mut(self.level) {
            let Some(species) = self.tuning.growth.species_for(cell.value()) else {
                continue;
            };
            if cell.advance_timer(dt) >= species.threshold_secs {
                cell.replace(species.grown());
                matured.push((offset, species.grown()));
            }
        }

        let mut failure = None;
        for (offset, value) in matured {
            let cell = self.coord_from_offset(offset);
            out_events.push(Event::SeedMatured { cell, value });
            if let Err(error) = self.persist() {
                let _ = failure.get_or_insert(error);
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Appends `extend_columns` columns of fresh terrain on the right edge.
    pub fn generate_procedural<R: Rng>(
        &mut self,
        extend_columns: u32,
        rng: &mut R,
    ) -> Result<()> {
        self.ensure_generation_fits()?;
        if extend_columns == 0 {
            return Ok(());
        }

        let start = i32::try_from(self.dimensions().columns()).unwrap_or(i32::MAX);
        let floor = surface_row(&self.grid, self.level, start - 1)
            .unwrap_or(self.tuning.generation.start_floor_row);
        self.grid.extend_columns(extend_columns);
        let end = i32::try_from(self.dimensions().columns()).unwrap_or(i32::MAX);
        lay_columns(
            &mut self.grid,
            self.level,
            start..end,
            floor,
            &self.tuning.generation,
            rng,
        );
        tracing::info!(
            world = %self.active,
            columns = extend_columns,
            "generated terrain"
        );
        self.persist()
    }

    /// Loads a stored world, replacing the grid contents.
    ///
    /// A pending failed write of the current world is retried first.
    pub fn load_world(&mut self, name: &str) -> Result<()> {
        self.flush()?;
        let table = self.store.load(name)?;
        if table.dimensions() != self.grid.dimensions() {
            tracing::debug!(
                world = name,
                columns = table.dimensions().columns(),
                rows = table.dimensions().rows(),
                "adopting stored dimensions"
            );
            self.grid = Grid::new(self.grid.levels(), table.dimensions());
        }
        self.grid.fill_level(self.level, table.values());
        self.consumed.clear();
        self.active = name.to_owned();
        tracing::info!(world = name, "loaded world");
        Ok(())
    }

    /// Loads `name` when the store lists it, otherwise creates it from the
    /// template dataset and registers it. The template itself is only ever
    /// loaded.
    ///
    /// Creation is all or nothing: when the new world cannot be written or
    /// registered, the previously active world is restored and the error is
    /// returned.
    pub fn open_or_create<R: Rng>(
        &mut self,
        name: &str,
        rng: &mut R,
    ) -> Result<WorldOrigin> {
        let known = self.store.world_names()?;
        let template = self.tuning.generation.template.clone();
        if name == template || known.iter().any(|known| known == name) {
            self.load_world(name)?;
            return Ok(WorldOrigin::Loaded);
        }

        let previous = Snapshot {
            grid: self.grid.clone(),
            active: self.active.clone(),
            consumed: self.consumed.clone(),
            dirty: self.dirty,
        };
        if let Err(error) = self.create_from_template(name, &template, rng) {
            tracing::warn!(
                world = name,
                kept = %previous.active,
                %error,
                "world creation failed"
            );
            self.grid = previous.grid;
            self.active = previous.active;
            self.consumed = previous.consumed;
            self.dirty = previous.dirty;
            return Err(error);
        }
        tracing::info!(world = name, template = %template, "created world");
        Ok(WorldOrigin::Created)
    }

    fn create_from_template<R: Rng>(
        &mut self,
        name: &str,
        template: &str,
        rng: &mut R,
    ) -> Result<()> {
        self.load_world(template)?;
        self.ensure_generation_fits()?;
        self.active = name.to_owned();

        let first = i32::try_from(self.tuning.generation.first_generated_column)
            .unwrap_or(i32::MAX);
        let end = i32::try_from(self.dimensions().columns()).unwrap_or(i32::MAX);
        if first < end {
            let floor = surface_row(&self.grid, self.level, first - 1)
                .unwrap_or(self.tuning.generation.start_floor_row);
            lay_columns(
                &mut self.grid,
                self.level,
                first..end,
                floor,
                &self.tuning.generation,
                rng,
            );
        }

        self.persist()?;
        self.store.register(name)?;
        Ok(())
    }

    /// Retries a write that failed earlier. Does nothing when clean.
    pub fn flush(&mut self) -> Result<()> {
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }

    /// Opens a chest, dropping a random collectable one row above it.
    ///
    /// Returns `false` when the cell does not hold a chest.
    pub fn open_chest<R: Rng>(
        &mut self,
        cell: CellCoord,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> Result<bool> {
        if self.block_at(cell) != BlockValue::CHEST {
            return Ok(false);
        }
        let drop = BlockValue::new(rng.gen_range(BlockValue::STONE.get()..=BlockValue::CHEESE.get()));
        let _ = self.write(cell, BlockValue::EMPTY);
        let _ = self.write(cell.offset(0, 1), drop);
        out_events.push(Event::ChestOpened { cell, drop });
        self.persist()?;
        Ok(true)
    }

    /// Wears down a non-empty cell. At zero health the cell is cleared and a
    /// stone drops one row above it.
    ///
    /// Returns `true` when the cell was destroyed.
    pub fn damage_cell(
        &mut self,
        cell: CellCoord,
        amount: f32,
        out_events: &mut Vec<Event>,
    ) -> Result<bool> {
        let row = self.storage_row(cell.row(), RowOrder::BottomUp);
        let Some(target) = self.grid.cell_mut(self.level, row, cell.column()) else {
            return Ok(false);
        };
        let previous = target.value();
        if previous.is_empty() || target.take_damage(amount) > 0.0 {
            return Ok(false);
        }
        target.replace(BlockValue::EMPTY);
        let _ = self.write(cell.offset(0, 1), BlockValue::STONE);
        out_events.push(Event::CellDestroyed { cell, previous });
        self.persist()?;
        Ok(true)
    }

    fn write(&mut self, cell: CellCoord, value: BlockValue) -> bool {
        let row = self.storage_row(cell.row(), RowOrder::BottomUp);
        match self.grid.cell_mut(self.level, row, cell.column()) {
            Some(target) => {
                target.replace(value);
                true
            }
            None => false,
        }
    }

    fn persist(&mut self) -> Result<()> {
        let dimensions = self.grid.dimensions();
        let mut values = self.grid.level_values(self.level);
        for &(level, cell, marker) in &self.consumed {
            if level != self.level {
                continue;
            }
            let stored = CellCoord::new(
                cell.column(),
                self.storage_row(cell.row(), RowOrder::BottomUp),
            );
            let slot = dimensions
                .index(stored)
                .and_then(|offset| values.get_mut(offset));
            if let Some(slot) = slot.filter(|slot| slot.is_empty()) {
                *slot = marker;
            }
        }
        let table = BlockTable::from_parts(dimensions, values);
        match self.store.save(&self.active, &table) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(source) => {
                self.dirty = true;
                tracing::warn!(world = %self.active, error = %source, "world write failed, retry queued");
                Err(WorldError::Persistence {
                    world: self.active.clone(),
                    source,
                })
            }
        }
    }

    fn ensure_generation_fits(&self) -> Result<()> {
        let rows = self.dimensions().rows();
        if rows < 3 {
            return Err(WorldError::GridTooSmall { rows });
        }
        Ok(())
    }

    fn storage_row(&self, row: i32, order: RowOrder) -> i32 {
        match order {
            RowOrder::TopDown => row,
            RowOrder::BottomUp => {
                let rows = i32::try_from(self.dimensions().rows()).unwrap_or(i32::MAX);
                rows - 1 - row
            }
        }
    }

    fn coord_from_offset(&self, offset: usize) -> CellCoord {
        let dimensions = self.dimensions();
        let width = usize::try_from(dimensions.columns()).unwrap_or(1).max(1);
        let rows = i32::try_from(dimensions.rows()).unwrap_or(i32::MAX);
        let column = i32::try_from(offset % width).unwrap_or(i32::MAX);
        let row = i32::try_from(offset / width).unwrap_or(i32::MAX);
        CellCoord::new(column, rows - 1 - row)
    }
}

impl TileQuery for GridWorld {
    fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    fn block_at(&self, cell: CellCoord) -> BlockValue {
        self.get(cell.row(), cell.column(), RowOrder::BottomUp)
    }
}

/// Read-only accessors used by adapters.
pub mod query {
    use super::GridWorld;
    use sprout_core::{BlockValue, Dimensions, RowOrder};

    /// Name of the loaded world.
    #[must_use]
    pub fn active_world(world: &GridWorld) -> &str {
        world.active_world()
    }

    /// Size of the loaded world.
    #[must_use]
    pub fn dimensions(world: &GridWorld) -> Dimensions {
        world.dimensions()
    }

    /// Values of a single row, left to right.
    #[must_use]
    pub fn row_values(world: &GridWorld, row: i32, order: RowOrder) -> Vec<BlockValue> {
        let columns = i32::try_from(world.dimensions().columns()).unwrap_or(0);
        (0..columns)
            .map(|column| world.get(row, column, order))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockTable, GridWorld, MemoryStore, Persistence};
    use sprout_core::{BlockValue, CellCoord, RowOrder, TileQuery};

    fn world_from(rows: &[Vec<i32>]) -> (GridWorld, MemoryStore) {
        let store = MemoryStore::new();
        store.insert("test", BlockTable::from_rows(rows).expect("table"));
        let world = GridWorld::init(1, 1, 1, Box::new(store.clone()), "test").expect("world");
        (world, store)
    }

    #[test]
    fn init_adopts_dataset_dimensions() {
        let (world, _) = world_from(&[vec![0, 0, 0], vec![1, 1, 1]]);
        assert_eq!(world.dimensions().columns(), 3);
        assert_eq!(world.dimensions().rows(), 2);
    }

    #[test]
    fn rows_can_be_addressed_in_both_orders() {
        let (world, _) = world_from(&[vec![0, 4, 0], vec![2, 2, 2]]);
        assert_eq!(world.get(0, 1, RowOrder::TopDown), BlockValue::CHEST);
        assert_eq!(world.get(1, 1, RowOrder::BottomUp), BlockValue::CHEST);
        assert_eq!(world.block_at(CellCoord::new(0, 0)), BlockValue::GRASS);
    }

    #[test]
    fn out_of_range_reads_return_sentinel() {
        let (world, _) = world_from(&[vec![1, 1], vec![1, 1]]);
        assert_eq!(world.get(-1, 0, RowOrder::BottomUp), BlockValue::OUT_OF_BOUNDS);
        assert_eq!(world.get(0, 2, RowOrder::TopDown), BlockValue::OUT_OF_BOUNDS);
        assert_eq!(world.try_get(5, 5, RowOrder::TopDown), None);
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let (mut world, store) = world_from(&[vec![0, 0]]);
        let written = world
            .set(3, 0, BlockValue::DIRT, RowOrder::TopDown, Persistence::Sync)
            .expect("set");
        assert!(!written);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn find_first_reports_gameplay_coordinates() {
        let (world, _) = world_from(&[
            vec![0, 0, 400],
            vec![0, 401, 0],
            vec![1, 1, 1],
        ]);
        assert_eq!(
            world.find_first(BlockValue::PLAYER_SPAWN),
            Some(CellCoord::new(2, 2))
        );
        assert_eq!(
            world.find_first(BlockValue::ENEMY_SPAWN),
            Some(CellCoord::new(1, 1))
        );
        assert_eq!(world.find_first(BlockValue::BOSS_SPAWN), None);
    }

    #[test]
    fn consumed_markers_are_cleared_without_saving() {
        let (mut world, store) = world_from(&[vec![401, 401], vec![1, 1]]);
        assert_eq!(
            world.consume_marker(BlockValue::ENEMY_SPAWN),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(
            world.consume_marker(BlockValue::ENEMY_SPAWN),
            Some(CellCoord::new(1, 1))
        );
        assert_eq!(world.consume_marker(BlockValue::ENEMY_SPAWN), None);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn synchronous_writes_reach_the_store() {
        let (mut world, store) = world_from(&[vec![0, 0], vec![1, 1]]);
        let written = world
            .set_block(CellCoord::new(1, 1), BlockValue::GRASS_SEED, Persistence::Sync)
            .expect("set");
        assert!(written);
        let saved = store.table("test").expect("saved");
        assert_eq!(saved.value(0, 1), Some(BlockValue::GRASS_SEED));
    }
}
