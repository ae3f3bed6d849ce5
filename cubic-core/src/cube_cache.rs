//! Cube lookup used by the processors, and an in-memory implementation.

use std::{collections::BTreeSet, sync::Arc};

use cubic_utils::{ColumnPos, CubePos, locks::SyncRwLock};
use rustc_hash::FxHashMap;

use crate::{
    block_storage::BlockStorage, column::Column, cube::Cube, opacity_index::OpacityIndex,
};

/// Read access to loaded cubes.
///
/// The lighting engine never creates or evicts cubes; it only asks whether
/// they exist and borrows them.
pub trait CubeCache: Send + Sync {
    /// Returns the cube at `pos` if it is loaded.
    fn get_cube(&self, pos: CubePos) -> Option<Arc<Cube>>;

    /// Returns true if the cube at `pos` is loaded.
    fn cube_exists(&self, pos: CubePos) -> bool {
        self.get_cube(pos).is_some()
    }
}

struct LoadedColumn {
    column: Arc<Column>,
    /// Y of every loaded cube in the column.
    cube_ys: BTreeSet<i32>,
}

#[derive(Default)]
struct CubeMapInner {
    cubes: FxHashMap<CubePos, Arc<Cube>>,
    columns: FxHashMap<ColumnPos, LoadedColumn>,
}

/// In-memory cube storage.
///
/// Columns are created when their first cube loads and dropped when their
/// last cube unloads.
#[derive(Default)]
pub struct CubeMap {
    inner: SyncRwLock<CubeMapInner>,
}

impl CubeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cube with the given blocks, creating its column if needed.
    ///
    /// Loading a cube that is already present returns the existing cube and
    /// ignores `blocks`.
    pub fn load_cube(&self, pos: CubePos, blocks: BlockStorage) -> Arc<Cube> {
        let mut inner = self.inner.write();
        if let Some(cube) = inner.cubes.get(&pos) {
            return cube.clone();
        }

        let loaded = inner
            .columns
            .entry(pos.column())
            .or_insert_with(|| LoadedColumn {
                column: Arc::new(Column::new(pos.column())),
                cube_ys: BTreeSet::new(),
            });
        loaded.cube_ys.insert(pos.y());
        let cube = Arc::new(Cube::new(pos, loaded.column.clone(), blocks));

        inner.cubes.insert(pos, cube.clone());
        cube
    }

    /// Loads a column with a saved opacity index ahead of its cubes.
    ///
    /// A column that is already loaded keeps its index and `index` is ignored.
    /// The column is dropped once a cube in it has loaded and every cube has
    /// unloaded again.
    pub fn load_column(&self, pos: ColumnPos, index: OpacityIndex) -> Arc<Column> {
        self.inner
            .write()
            .columns
            .entry(pos)
            .or_insert_with(|| LoadedColumn {
                column: Arc::new(Column::with_index(pos, index)),
                cube_ys: BTreeSet::new(),
            })
            .column
            .clone()
    }

    /// Unloads a cube, dropping its column if it was the last one.
    pub fn unload_cube(&self, pos: CubePos) -> Option<Arc<Cube>> {
        let mut inner = self.inner.write();
        let cube = inner.cubes.remove(&pos)?;

        let column_pos = pos.column();
        if let Some(loaded) = inner.columns.get_mut(&column_pos) {
            loaded.cube_ys.remove(&pos.y());
            if loaded.cube_ys.is_empty() {
                inner.columns.remove(&column_pos);
                log::trace!("Dropped empty column {column_pos:?}");
            }
        }
        Some(cube)
    }

    /// Returns the loaded column at `pos`.
    #[must_use]
    pub fn get_column(&self, pos: ColumnPos) -> Option<Arc<Column>> {
        self.inner
            .read()
            .columns
            .get(&pos)
            .map(|loaded| loaded.column.clone())
    }

    /// Returns the Y of every loaded cube in a column strictly below `below_y`,
    /// highest first.
    #[must_use]
    pub fn cube_ys_below(&self, pos: ColumnPos, below_y: i32) -> Vec<i32> {
        self.inner
            .read()
            .columns
            .get(&pos)
            .map(|loaded| loaded.cube_ys.range(..below_y).rev().copied().collect())
            .unwrap_or_default()
    }

    /// Number of loaded cubes.
    #[must_use]
    pub fn cube_count(&self) -> usize {
        self.inner.read().cubes.len()
    }

    /// Number of loaded columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.inner.read().columns.len()
    }

    /// Returns every loaded cube, in no particular order.
    #[must_use]
    pub fn cubes(&self) -> Vec<Arc<Cube>> {
        self.inner.read().cubes.values().cloned().collect()
    }
}

impl CubeCache for CubeMap {
    fn get_cube(&self, pos: CubePos) -> Option<Arc<Cube>> {
        self.inner.read().cubes.get(&pos).cloned()
    }

    fn cube_exists(&self, pos: CubePos) -> bool {
        self.inner.read().cubes.contains_key(&pos)
    }
}
