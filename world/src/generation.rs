//! Procedural terrain laid column by column with a random-walk surface.

use rand::Rng;
use serde::Deserialize;
use sprout_core::BlockValue;

use crate::grid::Grid;

/// Tunables for procedural terrain.
///
/// Rows are counted from the top of the stored table. A feature rate `n`
/// means a one in `n + 1` chance per column.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationTuning {
    /// Dataset copied when a new world is created.
    pub template: String,
    /// First column regenerated when a new world is created.
    pub first_generated_column: u32,
    /// Surface row used when no existing surface can be found.
    pub start_floor_row: i32,
    /// Highest surface row, counted from the top.
    pub min_floor_row: i32,
    /// Lowest surface row, counted from the top.
    pub max_floor_row: i32,
    /// Largest change of surface height between neighbouring columns.
    pub max_step: i32,
    /// Chance of planting a seed on the surface.
    pub tree_rate: u32,
    /// Chance of placing a chest on the surface.
    pub chest_rate: u32,
    /// Chance of placing an enemy spawn marker on the surface.
    pub enemy_rate: u32,
    /// Chance of a lava pocket under the surface.
    pub lava_rate: u32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            template: "DEFAULT".to_owned(),
            first_generated_column: 3,
            start_floor_row: 20,
            min_floor_row: 18,
            max_floor_row: 22,
            max_step: 1,
            tree_rate: 8,
            chest_rate: 20,
            enemy_rate: 20,
            lava_rate: 10,
        }
    }
}

/// Lays terrain into `columns` of one level, continuing from `floor`.
///
/// A chest is forced into the last column when none spawned along the way.
pub(crate) fn lay_columns<R: Rng>(
    grid: &mut Grid,
    level: usize,
    columns: std::ops::Range<i32>,
    mut floor: i32,
    tuning: &GenerationTuning,
    rng: &mut R,
) {
    let rows = i32::try_from(grid.dimensions().rows()).unwrap_or(i32::MAX);
    let highest = tuning.min_floor_row.max(1).min(rows - 2);
    let lowest = tuning.max_floor_row.min(rows - 2).max(highest);
    let step = tuning.max_step.max(0);
    let last = columns.end - 1;
    let mut spawned_chest = false;

    for column in columns {
        floor = (floor + rng.gen_range(-step..=step)).clamp(highest, lowest);

        for row in 0..rows {
            set(grid, level, row, column, BlockValue::EMPTY);
        }

        let surface = floor - 1;
        if roll(rng, tuning.tree_rate) {
            let seed = if rng.gen_bool(0.5) {
                BlockValue::GRASS_SEED
            } else {
                BlockValue::DIRT_SEED
            };
            set(grid, level, surface, column, seed);
        }
        if roll(rng, tuning.chest_rate) {
            set(grid, level, surface, column, BlockValue::CHEST);
            spawned_chest = true;
        }
        if roll(rng, tuning.enemy_rate) {
            set(grid, level, surface, column, BlockValue::ENEMY_SPAWN);
        }
        if column == last && !spawned_chest {
            set(grid, level, surface, column, BlockValue::CHEST);
        }

        set(grid, level, floor, column, BlockValue::GRASS);
        for row in floor + 1..rows - 1 {
            set(grid, level, row, column, BlockValue::DIRT);
        }
        set(grid, level, rows - 1, column, BlockValue::BEDROCK);

        if floor + 1 != rows - 1 && roll(rng, tuning.lava_rate) {
            set(grid, level, floor + 1, column, BlockValue::LAVA);
        }
    }
}

/// Top-down row of the first ground cell in a column, if any.
pub(crate) fn surface_row(grid: &Grid, level: usize, column: i32) -> Option<i32> {
    let rows = i32::try_from(grid.dimensions().rows()).ok()?;
    (0..rows).find(|&row| {
        grid.cell(level, row, column)
            .is_some_and(|cell| is_ground(cell.value()))
    })
}

fn is_ground(value: BlockValue) -> bool {
    value == BlockValue::GRASS || value == BlockValue::DIRT || value == BlockValue::BEDROCK
}

fn roll<R: Rng>(rng: &mut R, rate: u32) -> bool {
    rng.gen_range(0..=rate) == 0
}

fn set(grid: &mut Grid, level: usize, row: i32, column: i32, value: BlockValue) {
    if let Some(cell) = grid.cell_mut(level, row, column) {
        cell.replace(value);
    }
}
