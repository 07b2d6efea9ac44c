//! Flat multi-level cell buffer.

use sprout_core::{BlockValue, Dimensions};

/// Health every cell starts with.
pub const DEFAULT_CELL_HEALTH: f32 = 100.0;

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    value: BlockValue,
    growth_timer: f32,
    health: f32,
}

impl Cell {
    /// Creates a cell holding `value` with a fresh timer and full health.
    #[must_use]
    pub const fn new(value: BlockValue) -> Self {
        Self {
            value,
            growth_timer: 0.0,
            health: DEFAULT_CELL_HEALTH,
        }
    }

    /// Content code of the cell.
    #[must_use]
    pub const fn value(&self) -> BlockValue {
        self.value
    }

    /// Seconds accumulated towards the next growth stage.
    #[must_use]
    pub const fn growth_timer(&self) -> f32 {
        self.growth_timer
    }

    /// Remaining health before the cell is destroyed.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Replaces the value, resetting timer and health.
    pub(crate) fn replace(&mut self, value: BlockValue) {
        *self = Self::new(value);
    }

    pub(crate) fn advance_timer(&mut self, dt: f32) -> f32 {
        self.growth_timer += dt;
        self.growth_timer
    }

    pub(crate) fn take_damage(&mut self, amount: f32) -> f32 {
        self.health -= amount;
        self.health
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(BlockValue::EMPTY)
    }
}

/// Owned `(level, row, column)` buffer with rows stored top-down.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    levels: usize,
    dimensions: Dimensions,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(levels: usize, dimensions: Dimensions) -> Self {
        Self {
            levels,
            dimensions,
            cells: vec![Cell::default(); levels.saturating_mul(dimensions.area())],
        }
    }

    pub(crate) const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub(crate) const fn levels(&self) -> usize {
        self.levels
    }

    fn offset(&self, level: usize, row: i32, column: i32) -> Option<usize> {
        if level >= self.levels {
            return None;
        }
        let row = u32::try_from(row).ok()?;
        let column = u32::try_from(column).ok()?;
        if row >= self.dimensions.rows() || column >= self.dimensions.columns() {
            return None;
        }
        let width = usize::try_from(self.dimensions.columns()).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        level
            .checked_mul(self.dimensions.area())?
            .checked_add(row.checked_mul(width)?)?
            .checked_add(column)
    }

    pub(crate) fn cell(&self, level: usize, row: i32, column: i32) -> Option<&Cell> {
        let offset = self.offset(level, row, column)?;
        self.cells.get(offset)
    }

    pub(crate) fn cell_mut(&mut self, level: usize, row: i32, column: i32) -> Option<&mut Cell> {
        let offset = self.offset(level, row, column)?;
        self.cells.get_mut(offset)
    }

    /// Values of one level in top-down row-major order.
    pub(crate) fn level_values(&self, level: usize) -> Vec<BlockValue> {
        let area = self.dimensions.area();
        let start = level.saturating_mul(area);
        self.cells
            .get(start..start.saturating_add(area))
            .map(|cells| cells.iter().map(Cell::value).collect())
            .unwrap_or_default()
    }

    /// Overwrites one level from top-down row-major values.
    pub(crate) fn fill_level(&mut self, level: usize, values: &[BlockValue]) {
        let area = self.dimensions.area();
        let start = level.saturating_mul(area);
        if let Some(cells) = self.cells.get_mut(start..start.saturating_add(area)) {
            for (cell, value) in cells.iter_mut().zip(values) {
                cell.replace(*value);
            }
        }
    }

    /// Appends empty columns on the right side of every level.
    pub(crate) fn extend_columns(&mut self, additional: u32) {
        if additional == 0 {
            return;
        }
        let old = self.dimensions;
        let grown = Dimensions::new(old.columns().saturating_add(additional), old.rows());
        let mut resized = Grid::new(self.levels, grown);
        let rows = i32::try_from(old.rows()).unwrap_or(i32::MAX);
        let columns = i32::try_from(old.columns()).unwrap_or(i32::MAX);
        for level in 0..self.levels {
            for row in 0..rows {
                for column in 0..columns {
                    if let (Some(source), Some(target)) = (
                        self.cell(level, row, column),
                        resized.cell_mut(level, row, column),
                    ) {
                        *target = *source;
                    }
                }
            }
        }
        *self = resized;
    }

    pub(crate) fn cells_mut(&mut self, level: usize) -> impl Iterator<Item = (usize, &mut Cell)> {
        let area = self.dimensions.area();
        let start = level.saturating_mul(area);
        self.cells
            .iter_mut()
            .skip(start)
            .take(area)
            .enumerate()
    }
}
