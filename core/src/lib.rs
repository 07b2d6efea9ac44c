#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sprout engine.
//!
//! This crate defines the value types that connect the authoritative tile
//! world, the pure movement and pathfinding systems, and the actors driving
//! them. The world owns every cell; systems borrow it through the read-only
//! [`TileQuery`] trait and report what happened through [`Event`] values that
//! adapters may log or render.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer content code stored in a single grid cell.
///
/// Values are grouped into bands that decide how the rest of the engine
/// treats a cell, see [`BlockCategory`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockValue(i32);

impl BlockValue {
    /// Value reported for reads outside the grid bounds.
    pub const OUT_OF_BOUNDS: Self = Self(-1);
    /// Empty air.
    pub const EMPTY: Self = Self(0);
    /// Indestructible floor at the bottom of every world.
    pub const BEDROCK: Self = Self(1);
    /// Walkable grass surface block.
    pub const GRASS: Self = Self(2);
    /// Dirt filling the ground below the surface.
    pub const DIRT: Self = Self(3);
    /// Treasure chest that drops a collectable when opened.
    pub const CHEST: Self = Self(4);
    /// Molten rock that hurts the player.
    pub const LAVA: Self = Self(5);
    /// Merchant stall.
    pub const SHOP: Self = Self(6);
    /// Freshly planted grass seed.
    pub const GRASS_SEED: Self = Self(100);
    /// Grass tree grown from [`BlockValue::GRASS_SEED`].
    pub const GRASS_TREE: Self = Self(101);
    /// Freshly planted dirt seed.
    pub const DIRT_SEED: Self = Self(102);
    /// Dirt tree grown from [`BlockValue::DIRT_SEED`].
    pub const DIRT_TREE: Self = Self(103);
    /// Door the player returns to after switching worlds.
    pub const DOOR: Self = Self(201);
    /// Stone dropped by chests and defeated blocks.
    pub const STONE: Self = Self(301);
    /// Cheese dropped by chests.
    pub const CHEESE: Self = Self(302);
    /// Marks where the player spawns.
    pub const PLAYER_SPAWN: Self = Self(400);
    /// Marks where a regular enemy spawns.
    pub const ENEMY_SPAWN: Self = Self(401);
    /// Marks where the boss enemy spawns.
    pub const BOSS_SPAWN: Self = Self(402);

    /// Wraps a raw content code.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw content code.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Band the value belongs to.
    #[must_use]
    pub const fn category(self) -> BlockCategory {
        BlockCategory::classify(self)
    }

    /// Reports whether the cell holds nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BlockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Band classification of a [`BlockValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockCategory {
    /// Solid terrain, values 1 through 99.
    Blocks,
    /// Seeds and trees, values 100 through 199.
    Trees,
    /// Decorative background such as doors, values 200 through 299.
    BackgroundBlocks,
    /// Items lying in the world, values 300 through 399.
    Collectables,
    /// Everything else, including empty cells, spawn markers and the
    /// out-of-bounds sentinel.
    Unknown,
}

impl BlockCategory {
    /// Maps a value onto its band.
    #[must_use]
    pub const fn classify(value: BlockValue) -> Self {
        match value.0 {
            1..=99 => Self::Blocks,
            100..=199 => Self::Trees,
            200..=299 => Self::BackgroundBlocks,
            300..=399 => Self::Collectables,
            _ => Self::Unknown,
        }
    }
}

/// Inclusive value range treated as an obstruction by a particular check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockedRange {
    min: i32,
    max: i32,
}

impl BlockedRange {
    /// Solid terrain that stops actors physically.
    pub const SOLID: Self = Self::new(1, 99);
    /// Trees and seeds, used by the pathfinder.
    pub const TREES: Self = Self::new(100, 199);
    /// Lava cells that damage the player.
    pub const LAVA: Self = Self::new(5, 5);

    /// Creates an inclusive range.
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Lower bound of the range.
    #[must_use]
    pub const fn min(&self) -> i32 {
        self.min
    }

    /// Upper bound of the range.
    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Reports whether the value falls inside the range.
    #[must_use]
    pub const fn contains(&self, value: BlockValue) -> bool {
        self.min <= value.0 && value.0 <= self.max
    }
}

/// Location of a tile in gameplay orientation.
///
/// Row zero is the bottom row of the world and rows grow upward. Coordinates
/// are signed so that movement code can step one tile past an edge before
/// clamping.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile, counted from the bottom.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the straight-line distance between two coordinates.
    #[must_use]
    pub fn distance(self, other: CellCoord) -> f32 {
        let dx = (self.column - other.column) as f32;
        let dy = (self.row - other.row) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Orientation used when addressing grid rows directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowOrder {
    /// Row zero is the bottom of the world. Used by actors.
    #[default]
    BottomUp,
    /// Row zero is the first line of the stored table.
    TopDown,
}

/// Axis direction of a single movement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisDirection {
    /// Towards column zero.
    Left,
    /// Towards the last column.
    Right,
    /// Towards the top row.
    Up,
    /// Towards row zero.
    Down,
}

impl AxisDirection {
    /// Reports whether the direction moves along the column axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Grid dimensions measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    columns: u32,
    rows: u32,
}

impl Dimensions {
    /// Creates a new dimension pair.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of tiles covered by the grid.
    #[must_use]
    pub fn area(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.saturating_mul(rows)
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        u32::try_from(cell.column()).map_or(false, |column| column < self.columns)
            && u32::try_from(cell.row()).map_or(false, |row| row < self.rows)
    }

    /// Row-major offset of an in-bounds coordinate.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Read access to the active level of a tile world.
pub trait TileQuery {
    /// Size of the active level.
    fn dimensions(&self) -> Dimensions;

    /// Value stored at the coordinate, or [`BlockValue::OUT_OF_BOUNDS`].
    fn block_at(&self, cell: CellCoord) -> BlockValue;
}

/// Inventory items the player can hold and place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Bedrock block, only obtainable through tooling.
    Bedrock,
    /// Grass surface block.
    GrassBlock,
    /// Dirt block.
    DirtBlock,
    /// Seed that grows into a grass tree.
    GrassSeed,
    /// Seed that grows into a dirt tree.
    DirtSeed,
    /// Stone collectable.
    Stone,
    /// Cheese collectable.
    Cheese,
}

impl ItemKind {
    /// Every item kind in inventory order.
    pub const ALL: [ItemKind; 7] = [
        ItemKind::Bedrock,
        ItemKind::GrassBlock,
        ItemKind::DirtBlock,
        ItemKind::GrassSeed,
        ItemKind::DirtSeed,
        ItemKind::Stone,
        ItemKind::Cheese,
    ];

    /// Inventory key used for the item.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ItemKind::Bedrock => "Bedrock",
            ItemKind::GrassBlock => "GrassBlock",
            ItemKind::DirtBlock => "DirtBlock",
            ItemKind::GrassSeed => "GrassSeed",
            ItemKind::DirtSeed => "DirtSeed",
            ItemKind::Stone => "Stone",
            ItemKind::Cheese => "Cheese",
        }
    }

    /// Looks an item up by its inventory key.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Block written into the world when the item is placed, if placeable.
    #[must_use]
    pub const fn placed_block(self) -> Option<BlockValue> {
        match self {
            ItemKind::Bedrock => Some(BlockValue::BEDROCK),
            ItemKind::GrassBlock => Some(BlockValue::GRASS),
            ItemKind::DirtBlock => Some(BlockValue::DIRT),
            ItemKind::GrassSeed => Some(BlockValue::GRASS_SEED),
            ItemKind::DirtSeed => Some(BlockValue::DIRT_SEED),
            ItemKind::Stone | ItemKind::Cheese => None,
        }
    }

    /// Item picked up from a collectable cell.
    #[must_use]
    pub const fn from_collectable(value: BlockValue) -> Option<Self> {
        match value.get() {
            301 => Some(ItemKind::Stone),
            302 => Some(ItemKind::Cheese),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies an enemy within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Underlying numeric representation.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Observable outcomes of a simulated frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A seed finished growing.
    SeedMatured {
        /// Location of the grown tree.
        cell: CellCoord,
        /// Value the cell holds after growing.
        value: BlockValue,
    },
    /// A chest was opened and replaced by a drop.
    ChestOpened {
        /// Location of the chest.
        cell: CellCoord,
        /// Collectable placed above the chest.
        drop: BlockValue,
    },
    /// A damaged cell was destroyed.
    CellDestroyed {
        /// Location of the destroyed cell.
        cell: CellCoord,
        /// Value the cell held before it was cleared.
        previous: BlockValue,
    },
    /// The player placed a block.
    BlockPlaced {
        /// Target location.
        cell: CellCoord,
        /// Block written into the cell.
        value: BlockValue,
    },
    /// The player harvested a cell.
    BlockHarvested {
        /// Harvested location.
        cell: CellCoord,
        /// Value the cell held before it was cleared.
        previous: BlockValue,
    },
    /// The player picked up a collectable.
    ItemCollected {
        /// Item that entered the inventory.
        item: ItemKind,
        /// Quantity gained.
        quantity: u32,
    },
    /// An enemy struck the player.
    PlayerHit {
        /// Attacking enemy.
        enemy: EnemyId,
        /// Health removed from the player.
        damage: f32,
    },
    /// The player ran out of health.
    PlayerDefeated,
    /// An enemy ran out of health and left play.
    EnemyDefeated {
        /// Enemy that was removed from play.
        enemy: EnemyId,
    },
}

#[cfg(test)]
mod tests {
    use super::{BlockCategory, BlockValue, BlockedRange, CellCoord, Dimensions, Event, ItemKind};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn classification_follows_bands() {
        let expectations = [
            (-1, BlockCategory::Unknown),
            (0, BlockCategory::Unknown),
            (1, BlockCategory::Blocks),
            (99, BlockCategory::Blocks),
            (100, BlockCategory::Trees),
            (199, BlockCategory::Trees),
            (200, BlockCategory::BackgroundBlocks),
            (299, BlockCategory::BackgroundBlocks),
            (300, BlockCategory::Collectables),
            (399, BlockCategory::Collectables),
            (400, BlockCategory::Unknown),
            (i32::MAX, BlockCategory::Unknown),
            (i32::MIN, BlockCategory::Unknown),
        ];

        for (raw, expected) in expectations {
            assert_eq!(
                BlockCategory::classify(BlockValue::new(raw)),
                expected,
                "value {raw}"
            );
        }
    }

    #[test]
    fn sentinel_is_never_solid() {
        assert!(!BlockedRange::SOLID.contains(BlockValue::OUT_OF_BOUNDS));
        assert!(!BlockedRange::TREES.contains(BlockValue::OUT_OF_BOUNDS));
        assert!(BlockedRange::SOLID.contains(BlockValue::BEDROCK));
        assert!(BlockedRange::SOLID.contains(BlockValue::new(99)));
        assert!(!BlockedRange::SOLID.contains(BlockValue::GRASS_SEED));
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
        assert!((origin.distance(CellCoord::new(4, 5)) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn dimensions_reject_negative_and_overflowing_cells() {
        let dimensions = Dimensions::new(4, 3);
        assert_eq!(dimensions.index(CellCoord::new(-1, 0)), None);
        assert_eq!(dimensions.index(CellCoord::new(4, 0)), None);
        assert_eq!(dimensions.index(CellCoord::new(0, 3)), None);
        assert_eq!(dimensions.index(CellCoord::new(3, 2)), Some(11));
        assert_eq!(dimensions.area(), 12);
    }

    #[test]
    fn items_map_to_placeable_blocks() {
        assert_eq!(
            ItemKind::GrassSeed.placed_block(),
            Some(BlockValue::GRASS_SEED)
        );
        assert_eq!(ItemKind::Stone.placed_block(), None);
        assert_eq!(ItemKind::from_name("DirtBlock"), Some(ItemKind::DirtBlock));
        assert_eq!(ItemKind::from_name("Diamond"), None);
        assert_eq!(
            ItemKind::from_collectable(BlockValue::CHEESE),
            Some(ItemKind::Cheese)
        );
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn event_round_trips_through_bincode() {
        assert_round_trip(&Event::ChestOpened {
            cell: CellCoord::new(3, 4),
            drop: BlockValue::STONE,
        });
    }
}
