//! Uniform spatial grid over world space.
//!
//! The grid buckets unit ids into square cells of side `cell_size` so that
//! neighbourhood queries only touch a bounded block of cells. It is a pure
//! index: it stores ids, never units, and the simulation keeps it in sync
//! with unit positions.
//!
//! Cells are materialized lazily. A map that is mostly empty only pays for
//! the cells that have ever held a unit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::WorldSize;
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::UnitId;

/// Grid cell coordinates (`i` = column, `j` = row).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CellIndex {
    /// Column, `floor(x / cell_size)`.
    pub i: u32,
    /// Row, `floor(y / cell_size)`.
    pub j: u32,
}

impl CellIndex {
    /// Create a cell index.
    #[must_use]
    pub const fn new(i: u32, j: u32) -> Self {
        Self { i, j }
    }
}

/// Uniform grid of lazily-allocated cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialGrid {
    cell_size: u32,
    cols: u32,
    rows: u32,
    /// Row-major storage, `None` until the cell's first occupant.
    cells: Vec<Option<BTreeSet<UnitId>>>,
    len: usize,
}

impl SpatialGrid {
    /// Create a grid of `⌈width/cell_size⌉ × ⌈height/cell_size⌉` cells.
    ///
    /// A zero `cell_size` is treated as 1, and every grid has at least one cell.
    #[must_use]
    pub fn new(world: WorldSize, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = world.width.div_ceil(cell_size).max(1);
        let rows = world.height.div_ceil(cell_size).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![None; (cols as usize) * (rows as usize)],
            len: 0,
        }
    }

    /// Cell side length in world units.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Number of indexed units.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if no unit is indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cell a world position maps to.
    ///
    /// Positions on the far edge of the map (`x == width`) fall in the last
    /// column rather than one past it; negative positions fall in column 0.
    #[must_use]
    pub fn cell_of(&self, pos: Vec2Fixed) -> CellIndex {
        let unit = Fixed::from_num(self.cell_size);
        CellIndex::new(
            Self::axis_index(pos.x, unit, self.cols),
            Self::axis_index(pos.y, unit, self.rows),
        )
    }

    fn axis_index(coord: Fixed, unit: Fixed, count: u32) -> u32 {
        let raw = (coord / unit).floor().to_num::<i64>();
        raw.clamp(0, i64::from(count) - 1) as u32
    }

    fn slot(&self, cell: CellIndex) -> Option<usize> {
        if cell.i < self.cols && cell.j < self.rows {
            Some(cell.j as usize * self.cols as usize + cell.i as usize)
        } else {
            None
        }
    }

    /// Index a unit at `pos`. Returns the cell the caller must cache.
    pub fn insert(&mut self, id: UnitId, pos: Vec2Fixed) -> CellIndex {
        let cell = self.cell_of(pos);
        if let Some(slot) = self.slot(cell) {
            if self.cells[slot].get_or_insert_with(BTreeSet::new).insert(id) {
                self.len += 1;
            }
        }
        cell
    }

    /// Remove a unit from its recorded cell. Returns false if it was not there.
    pub fn remove(&mut self, id: UnitId, cell: CellIndex) -> bool {
        let removed = self
            .slot(cell)
            .and_then(|slot| self.cells[slot].as_mut())
            .is_some_and(|members| members.remove(&id));
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Move a unit to the cell for its new position, if that cell differs.
    ///
    /// Remove and insert happen back to back, so no query can observe the
    /// unit in two cells or in none. Returns the (possibly unchanged) cell.
    pub fn relocate(&mut self, id: UnitId, old: CellIndex, pos: Vec2Fixed) -> CellIndex {
        let new = self.cell_of(pos);
        if new == old {
            return old;
        }
        if !self.remove(id, old) {
            tracing::warn!(%id, ?old, "relocating a unit that was not in its recorded cell");
        }
        self.insert(id, pos)
    }

    /// All units in the `(2r+1)×(2r+1)` block centred on `center`.
    ///
    /// Out-of-range cells are skipped. Results come out in row-major order:
    /// rows ascending, columns ascending within a row, ids ascending within
    /// a cell. Target acquisition takes the first hostile unit in this order.
    #[must_use]
    pub fn query_radius(&self, center: CellIndex, r: u32) -> Vec<UnitId> {
        let min_i = center.i.saturating_sub(r);
        let min_j = center.j.saturating_sub(r);
        let max_i = center.i.saturating_add(r).min(self.cols - 1);
        let max_j = center.j.saturating_add(r).min(self.rows - 1);

        let mut found = Vec::new();
        for j in min_j..=max_j {
            for i in min_i..=max_i {
                found.extend(self.cell_members(CellIndex::new(i, j)));
            }
        }
        found
    }

    /// Units in a single cell, ascending.
    pub fn cell_members(&self, cell: CellIndex) -> impl Iterator<Item = UnitId> + '_ {
        self.slot(cell)
            .and_then(|slot| self.cells[slot].as_ref())
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    /// Find the cell currently holding `id` by scanning every cell.
    ///
    /// O(cells); meant for validation and tests, not the hot path.
    #[must_use]
    pub fn cell_containing(&self, id: UnitId) -> Option<CellIndex> {
        self.cells.iter().enumerate().find_map(|(slot, members)| {
            members
                .as_ref()
                .filter(|set| set.contains(&id))
                .map(|_| {
                    let cols = self.cols as usize;
                    CellIndex::new((slot % cols) as u32, (slot / cols) as u32)
                })
        })
    }

    /// Non-empty cells with their occupant counts, row-major.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (CellIndex, usize)> + '_ {
        let cols = self.cols as usize;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(slot, members)| {
                let count = members.as_ref().map_or(0, BTreeSet::len);
                (count > 0).then(|| {
                    (
                        CellIndex::new((slot % cols) as u32, (slot / cols) as u32),
                        count,
                    )
                })
            })
    }

    /// Number of cells that have been materialized.
    #[must_use]
    pub fn materialized_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SpatialGrid {
        SpatialGrid::new(WorldSize::new(100, 50), 10)
    }

    #[test]
    fn test_dimensions_round_up() {
        let grid = SpatialGrid::new(WorldSize::new(105, 50), 10);
        assert_eq!(grid.dimensions(), (11, 5));
        assert_eq!(SpatialGrid::new(WorldSize::new(0, 0), 0).dimensions(), (1, 1));
    }

    #[test]
    fn test_cell_of() {
        let grid = grid();
        assert_eq!(grid.cell_of(Vec2Fixed::from_int(0, 0)), CellIndex::new(0, 0));
        assert_eq!(grid.cell_of(Vec2Fixed::from_int(19, 9)), CellIndex::new(1, 0));
        assert_eq!(
            grid.cell_of(Vec2Fixed::new(Fixed::from_num(29.9), Fixed::from_num(10))),
            CellIndex::new(2, 1)
        );
        // Far edge clamps into the last cell
        assert_eq!(grid.cell_of(Vec2Fixed::from_int(100, 50)), CellIndex::new(9, 4));
    }

    #[test]
    fn test_cells_are_lazy() {
        let mut grid = grid();
        assert_eq!(grid.materialized_cells(), 0);
        grid.insert(UnitId(1), Vec2Fixed::from_int(5, 5));
        grid.insert(UnitId(2), Vec2Fixed::from_int(6, 6));
        assert_eq!(grid.materialized_cells(), 1);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_insert_remove() {
        let mut grid = grid();
        let cell = grid.insert(UnitId(1), Vec2Fixed::from_int(55, 25));
        assert_eq!(cell, CellIndex::new(5, 2));
        assert_eq!(grid.cell_containing(UnitId(1)), Some(cell));

        assert!(grid.remove(UnitId(1), cell));
        assert!(!grid.remove(UnitId(1), cell));
        assert!(grid.is_empty());
        assert_eq!(grid.cell_containing(UnitId(1)), None);
        // The emptied cell stays allocated but no longer counts as occupied
        assert_eq!(grid.materialized_cells(), 1);
        assert_eq!(grid.occupied_cells().count(), 0);
    }

    #[test]
    fn test_occupied_cells() {
        let mut grid = grid();
        grid.insert(UnitId(1), Vec2Fixed::from_int(95, 45));
        grid.insert(UnitId(2), Vec2Fixed::from_int(1, 1));
        grid.insert(UnitId(3), Vec2Fixed::from_int(2, 2));
        let occupied: Vec<_> = grid.occupied_cells().collect();
        assert_eq!(
            occupied,
            vec![(CellIndex::new(0, 0), 2), (CellIndex::new(9, 4), 1)]
        );
    }

    #[test]
    fn test_relocate_only_when_cell_changes() {
        let mut grid = grid();
        let cell = grid.insert(UnitId(7), Vec2Fixed::from_int(11, 11));

        let same = grid.relocate(UnitId(7), cell, Vec2Fixed::from_int(19, 19));
        assert_eq!(same, cell);

        let moved = grid.relocate(UnitId(7), cell, Vec2Fixed::from_int(21, 11));
        assert_eq!(moved, CellIndex::new(2, 1));
        assert_eq!(grid.cell_containing(UnitId(7)), Some(moved));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_query_radius_clips_to_bounds() {
        let mut grid = grid();
        grid.insert(UnitId(1), Vec2Fixed::from_int(1, 1));
        grid.insert(UnitId(2), Vec2Fixed::from_int(25, 1));
        grid.insert(UnitId(3), Vec2Fixed::from_int(95, 45));

        let near_origin = grid.query_radius(CellIndex::new(0, 0), 1);
        assert_eq!(near_origin, vec![UnitId(1)]);

        let wider = grid.query_radius(CellIndex::new(0, 0), 2);
        assert_eq!(wider, vec![UnitId(1), UnitId(2)]);

        let everything = grid.query_radius(CellIndex::new(5, 2), 100);
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_query_radius_row_major_order() {
        let mut grid = grid();
        // Row 1, column 0
        grid.insert(UnitId(1), Vec2Fixed::from_int(5, 15));
        // Row 0, column 2
        grid.insert(UnitId(2), Vec2Fixed::from_int(25, 5));
        // Row 0, column 0, two ids in one cell
        grid.insert(UnitId(9), Vec2Fixed::from_int(2, 2));
        grid.insert(UnitId(4), Vec2Fixed::from_int(3, 3));

        let found = grid.query_radius(CellIndex::new(1, 1), 1);
        assert_eq!(found, vec![UnitId(4), UnitId(9), UnitId(2), UnitId(1)]);
    }
}
