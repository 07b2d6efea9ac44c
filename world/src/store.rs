//! Backing stores that persist world tables.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use sprout_core::{BlockValue, Dimensions};
use thiserror::Error;

/// Name of the flat list of known worlds kept next to the tables.
pub const WORLD_LIST_FILE: &str = "WorldsList.txt";

/// Failures raised by a [`WorldStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A table cell could not be parsed as an integer.
    #[error("world `{name}` line {line}: invalid cell `{cell}`")]
    InvalidCell {
        /// World being parsed.
        name: String,
        /// One-based line number.
        line: usize,
        /// Offending text.
        cell: String,
    },
    /// A table row has a different width than the first row.
    #[error("world `{name}` line {line}: expected {expected} cells, found {found}")]
    Ragged {
        /// World being parsed.
        name: String,
        /// One-based line number.
        line: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The table contains no cells.
    #[error("world `{0}` is empty")]
    Empty(String),
    /// No table exists under the requested name.
    #[error("world `{0}` does not exist")]
    Missing(String),
    /// The store refused a write.
    #[error("store rejected write of world `{0}`")]
    Rejected(String),
}

/// Rectangular snapshot of one level, stored top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTable {
    dimensions: Dimensions,
    values: Vec<BlockValue>,
}

impl BlockTable {
    /// Creates a table where every cell holds the same value.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, value: BlockValue) -> Self {
        let dimensions = Dimensions::new(columns, rows);
        Self {
            dimensions,
            values: vec![value; dimensions.area()],
        }
    }

    /// Builds a table from raw rows, top row first.
    ///
    /// Returns `None` when the rows are empty or not all the same width.
    #[must_use]
    pub fn from_rows(rows: &[Vec<i32>]) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let values = rows
            .iter()
            .flat_map(|row| row.iter().copied().map(BlockValue::new))
            .collect();
        Some(Self {
            dimensions: Dimensions::new(u32::try_from(width).ok()?, u32::try_from(rows.len()).ok()?),
            values,
        })
    }

    pub(crate) fn from_parts(dimensions: Dimensions, values: Vec<BlockValue>) -> Self {
        Self { dimensions, values }
    }

    /// Size of the table.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Value at a top-down row and column.
    #[must_use]
    pub fn value(&self, row: u32, column: u32) -> Option<BlockValue> {
        if row >= self.dimensions.rows() || column >= self.dimensions.columns() {
            return None;
        }
        let offset = usize::try_from(row)
            .ok()?
            .checked_mul(usize::try_from(self.dimensions.columns()).ok()?)?
            .checked_add(usize::try_from(column).ok()?)?;
        self.values.get(offset).copied()
    }

    pub(crate) fn values(&self) -> &[BlockValue] {
        &self.values
    }

    /// Parses comma-separated text, one line per row.
    pub fn parse(name: &str, text: &str) -> Result<Self, StoreError> {
        let mut width = None;
        let mut rows = 0_u32;
        let mut values = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim_start_matches('\u{feff}').trim();
            if line.is_empty() {
                continue;
            }

            let before = values.len();
            for cell in line.split(',') {
                let cell = cell.trim();
                let value = cell.parse::<i32>().map_err(|_| StoreError::InvalidCell {
                    name: name.to_owned(),
                    line: number + 1,
                    cell: cell.to_owned(),
                })?;
                values.push(BlockValue::new(value));
            }

            let found = values.len() - before;
            match width {
                None => width = Some(found),
                Some(expected) if expected != found => {
                    return Err(StoreError::Ragged {
                        name: name.to_owned(),
                        line: number + 1,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            rows += 1;
        }

        let columns = width
            .and_then(|width| u32::try_from(width).ok())
            .filter(|width| *width > 0)
            .ok_or_else(|| StoreError::Empty(name.to_owned()))?;

        Ok(Self {
            dimensions: Dimensions::new(columns, rows),
            values,
        })
    }

    /// Formats the table as comma-separated text.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let width = usize::try_from(self.dimensions.columns()).unwrap_or(0).max(1);
        let mut text = String::with_capacity(self.values.len() * 3);
        for row in self.values.chunks(width) {
            let line = row
                .iter()
                .map(|value| value.get().to_string())
                .collect::<Vec<_>>()
                .join(",");
            text.push_str(&line);
            text.push('\n');
        }
        text
    }
}

/// Persistence backend holding world tables and the list of known worlds.
pub trait WorldStore: fmt::Debug {
    /// Loads the table stored under `name`.
    fn load(&self, name: &str) -> Result<BlockTable, StoreError>;

    /// Replaces the table stored under `name`.
    fn save(&mut self, name: &str, table: &BlockTable) -> Result<(), StoreError>;

    /// Names of the worlds created so far, in creation order.
    fn world_names(&self) -> Result<Vec<String>, StoreError>;

    /// Appends a world name to the list of known worlds.
    fn register(&mut self, name: &str) -> Result<(), StoreError>;
}

/// Stores each world as `<root>/<name>.csv` beside a `WorldsList.txt` index.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens a store rooted at the provided directory, creating it if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Location of the table for the named world.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    fn list_path(&self) -> PathBuf {
        self.root.join(WORLD_LIST_FILE)
    }

    fn write_atomically(path: &Path, contents: &str) -> Result<(), StoreError> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl WorldStore for DirectoryStore {
    fn load(&self, name: &str) -> Result<BlockTable, StoreError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(StoreError::Missing(name.to_owned()));
        }
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let table = BlockTable::parse(name, &text)?;
        tracing::debug!("Loaded world `{}` from {}", name, path.display());
        Ok(table)
    }

    fn save(&mut self, name: &str, table: &BlockTable) -> Result<(), StoreError> {
        let path = self.path_for(name);
        Self::write_atomically(&path, &table.to_csv())?;
        tracing::debug!("Saved world `{}` to {}", name, path.display());
        Ok(())
    }

    fn world_names(&self) -> Result<Vec<String>, StoreError> {
        let path = self.list_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn register(&mut self, name: &str) -> Result<(), StoreError> {
        let mut names = self.world_names()?;
        if names.iter().any(|known| known == name) {
            return Ok(());
        }
        names.push(name.to_owned());
        let mut contents = names.join("\n");
        contents.push('\n');
        Self::write_atomically(&self.list_path(), &contents)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, BlockTable>,
    names: Vec<String>,
    reject_writes: bool,
    saves: usize,
}

/// In-memory store whose clones share the same contents.
///
/// Useful for tests and tools that never touch the disk. Writes can be
/// switched off to exercise failure handling.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a table without registering it as a created world.
    pub fn insert(&self, name: &str, table: BlockTable) {
        let _ = self.state.borrow_mut().tables.insert(name.to_owned(), table);
    }

    /// Returns a copy of the table stored under `name`.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<BlockTable> {
        self.state.borrow().tables.get(name).cloned()
    }

    /// Makes subsequent saves fail until switched back.
    pub fn set_reject_writes(&self, reject: bool) {
        self.state.borrow_mut().reject_writes = reject;
    }

    /// Number of successful saves performed so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.borrow().saves
    }
}

impl WorldStore for MemoryStore {
    fn load(&self, name: &str) -> Result<BlockTable, StoreError> {
        self.table(name)
            .ok_or_else(|| StoreError::Missing(name.to_owned()))
    }

    fn save(&mut self, name: &str, table: &BlockTable) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.reject_writes {
            return Err(StoreError::Rejected(name.to_owned()));
        }
        let _ = state.tables.insert(name.to_owned(), table.clone());
        state.saves += 1;
        Ok(())
    }

    fn world_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.state.borrow().names.clone())
    }

    fn register(&mut self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if !state.names.iter().any(|known| known == name) {
            state.names.push(name.to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockTable, DirectoryStore, StoreError, WorldStore};
    use sprout_core::BlockValue;

    #[test]
    fn parse_accepts_trailing_blank_lines_and_whitespace() {
        let table = BlockTable::parse("demo", "0, 0,4\n2,2,2\n\n").expect("parse");
        assert_eq!(table.dimensions().columns(), 3);
        assert_eq!(table.dimensions().rows(), 2);
        assert_eq!(table.value(0, 2), Some(BlockValue::CHEST));
        assert_eq!(table.value(1, 0), Some(BlockValue::GRASS));
        assert_eq!(table.value(2, 0), None);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let error = BlockTable::parse("demo", "0,0\n1\n").expect_err("ragged");
        assert!(matches!(
            error,
            StoreError::Ragged {
                line: 2,
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_cells() {
        let error = BlockTable::parse("demo", "0,x\n").expect_err("invalid");
        assert!(matches!(error, StoreError::InvalidCell { line: 1, .. }));
    }

    #[test]
    fn csv_output_parses_back_to_same_table() {
        let table = BlockTable::from_rows(&[vec![0, 100, 0], vec![2, 2, 1]]).expect("table");
        let parsed = BlockTable::parse("demo", &table.to_csv()).expect("parse");
        assert_eq!(parsed, table);
    }

    #[test]
    fn directory_store_tracks_registered_worlds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirectoryStore::new(dir.path()).expect("store");
        assert!(store.world_names().expect("names").is_empty());

        let table = BlockTable::filled(4, 2, BlockValue::DIRT);
        store.save("Meadow", &table).expect("save");
        store.register("Meadow").expect("register");
        store.register("Meadow").expect("register twice");

        assert_eq!(store.world_names().expect("names"), vec!["Meadow".to_owned()]);
        assert_eq!(store.load("Meadow").expect("load"), table);
        assert!(store.path_for("Meadow").exists());
        assert!(matches!(store.load("Nowhere"), Err(StoreError::Missing(_))));
    }
}
