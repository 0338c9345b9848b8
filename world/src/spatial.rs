//! Uniform spatial grid tracking enemy membership per cell.

use std::collections::{BTreeMap, BTreeSet};

use horde_dash_core::{CellId, EnemyId, GridTuning, Vec2};

/// Uniform grid centred on the origin that buckets enemies by position.
///
/// The grid only tracks membership. Positions are owned by the caller and
/// supplied on registration, re-bucketing and queries. Positions outside the
/// nominal extent clamp to the border cells so that every enemy remains
/// trackable.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cells_per_row: u32,
    cell_width: f32,
    cell_height: f32,
    half_width: f32,
    half_height: f32,
    cells: Vec<BTreeSet<EnemyId>>,
    home: BTreeMap<EnemyId, CellId>,
}

impl SpatialGrid {
    /// Creates an empty grid covering `width × height` split into `partitions` cells.
    ///
    /// The grid uses `floor(sqrt(partitions))` cells per row and the same number of rows.
    #[must_use]
    pub fn new(tuning: &GridTuning) -> Self {
        let cells_per_row = (f64::from(tuning.partitions).sqrt().floor() as u32).max(1);
        let cell_count = cells_per_row as usize * cells_per_row as usize;
        Self {
            cells_per_row,
            cell_width: tuning.width / cells_per_row as f32,
            cell_height: tuning.height / cells_per_row as f32,
            half_width: tuning.width * 0.5,
            half_height: tuning.height * 0.5,
            cells: vec![BTreeSet::new(); cell_count],
            home: BTreeMap::new(),
        }
    }

    /// Number of cells along each axis.
    #[must_use]
    pub const fn cells_per_row(&self) -> u32 {
        self.cells_per_row
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of registered enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.home.len()
    }

    /// Reports whether no enemy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.home.is_empty()
    }

    /// Maps a world position to the cell containing it, clamping to the border.
    #[must_use]
    pub fn cell_index_of(&self, position: Vec2) -> CellId {
        let (column, row) = self.cell_coords(position);
        CellId::new(column + row * self.cells_per_row)
    }

    /// Cell the enemy was assigned at its last registration or re-bucket.
    #[must_use]
    pub fn cell_of(&self, enemy: EnemyId) -> Option<CellId> {
        self.home.get(&enemy).copied()
    }

    /// Enemies that are members of the provided cell, in id order.
    pub fn members(&self, cell: CellId) -> impl Iterator<Item = EnemyId> + '_ {
        self.cells
            .get(cell.get() as usize)
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    /// Adds the enemy to the cell containing `position` and returns that cell.
    ///
    /// An enemy that is already registered is moved, so it never belongs to two cells.
    pub fn register(&mut self, enemy: EnemyId, position: Vec2) -> CellId {
        let _ = self.unregister(enemy);
        let cell = self.cell_index_of(position);
        self.insert_member(cell, enemy);
        let _ = self.home.insert(enemy, cell);
        cell
    }

    /// Removes the enemy from its cell, returning the cell it belonged to.
    ///
    /// Unknown enemies are ignored.
    pub fn unregister(&mut self, enemy: EnemyId) -> Option<CellId> {
        let cell = self.home.remove(&enemy)?;
        if let Some(members) = self.cells.get_mut(cell.get() as usize) {
            let _ = members.remove(&enemy);
        }
        Some(cell)
    }

    /// Moves the enemy to the cell matching `position`.
    ///
    /// Returns the previous and new cell when the membership changed. Enemies
    /// that are not registered or that stay in their cell are left untouched.
    pub fn rebucket(&mut self, enemy: EnemyId, position: Vec2) -> Option<(CellId, CellId)> {
        let from = self.cell_of(enemy)?;
        let to = self.cell_index_of(position);
        if from == to {
            return None;
        }

        if let Some(members) = self.cells.get_mut(from.get() as usize) {
            let _ = members.remove(&enemy);
        }
        self.insert_member(to, enemy);
        let _ = self.home.insert(enemy, to);
        Some((from, to))
    }

    /// Collects the enemies within `radius` of `point` into `out`.
    ///
    /// Members of the square ring of cells covering the radius are gathered
    /// first and then filtered by exact distance using `position_of`. Enemies
    /// whose position cannot be resolved are skipped. `out` is cleared first
    /// and filled in row-major cell order, id order within a cell.
    pub fn query_radius_into<F>(
        &self,
        point: Vec2,
        radius: f32,
        position_of: F,
        out: &mut Vec<EnemyId>,
    ) where
        F: Fn(EnemyId) -> Option<Vec2>,
    {
        out.clear();
        if !(radius >= 0.0) || !point.is_finite() {
            return;
        }

        let ring = self.ring_radius(radius);
        let (column, row) = self.cell_coords(point);
        let last = i64::from(self.cells_per_row) - 1;
        let min_column = (i64::from(column) - ring).max(0);
        let max_column = (i64::from(column) + ring).min(last);
        let min_row = (i64::from(row) - ring).max(0);
        let max_row = (i64::from(row) + ring).min(last);
        let radius_squared = radius * radius;

        for cell_row in min_row..=max_row {
            for cell_column in min_column..=max_column {
                let index = (cell_column + cell_row * i64::from(self.cells_per_row)) as usize;
                let Some(members) = self.cells.get(index) else {
                    continue;
                };
                for &enemy in members {
                    let Some(position) = position_of(enemy) else {
                        continue;
                    };
                    if position.distance_squared(point) <= radius_squared {
                        out.push(enemy);
                    }
                }
            }
        }
    }

    fn insert_member(&mut self, cell: CellId, enemy: EnemyId) {
        if let Some(members) = self.cells.get_mut(cell.get() as usize) {
            let _ = members.insert(enemy);
        }
    }

    fn cell_coords(&self, position: Vec2) -> (u32, u32) {
        (
            self.axis_index(position.x + self.half_width, self.cell_width),
            self.axis_index(position.y + self.half_height, self.cell_height),
        )
    }

    fn axis_index(&self, shifted: f32, cell_size: f32) -> u32 {
        let last = self.cells_per_row - 1;
        let raw = (shifted / cell_size).floor();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else if raw >= last as f32 {
            last
        } else {
            raw as u32
        }
    }

    /// Ring half-size in cells: the radius measured in cells plus one cell of slack.
    fn ring_radius(&self, radius: f32) -> i64 {
        let across_columns = (radius / self.cell_width).ceil();
        let across_rows = (radius / self.cell_height).ceil();
        let cells = across_columns.max(across_rows);
        if cells.is_finite() && cells < self.cells_per_row as f32 {
            cells as i64 + 1
        } else {
            i64::from(self.cells_per_row)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_grid() -> SpatialGrid {
        SpatialGrid::new(&GridTuning::default())
    }

    fn lookup(positions: &BTreeMap<EnemyId, Vec2>) -> impl Fn(EnemyId) -> Option<Vec2> + '_ {
        move |enemy| positions.get(&enemy).copied()
    }

    #[test]
    fn origin_maps_to_centre_cell() {
        let grid = default_grid();

        assert_eq!(grid.cells_per_row(), 100);
        assert_eq!(grid.cell_count(), 10_000);
        assert_eq!(grid.cell_index_of(Vec2::ZERO), CellId::new(5050));
    }

    #[test]
    fn positions_near_the_border_map_to_the_last_cell() {
        let grid = default_grid();

        assert_eq!(grid.cell_index_of(Vec2::new(49.9, 49.9)), CellId::new(9999));
        assert_eq!(grid.cell_index_of(Vec2::new(50.0, 50.0)), CellId::new(9999));
        assert_eq!(grid.cell_index_of(Vec2::new(-50.0, -50.0)), CellId::new(0));
    }

    #[test]
    fn out_of_range_positions_clamp_to_border_cells() {
        let grid = default_grid();

        assert_eq!(grid.cell_index_of(Vec2::new(1_000.0, 0.0)), CellId::new(99 + 50 * 100));
        assert_eq!(grid.cell_index_of(Vec2::new(-1_000.0, -1_000.0)), CellId::new(0));
        assert_eq!(grid.cell_index_of(Vec2::new(f32::NAN, 0.0)), CellId::new(50 * 100));
    }

    #[test]
    fn partitions_round_down_to_a_square() {
        let grid = SpatialGrid::new(&GridTuning {
            width: 10.0,
            height: 10.0,
            partitions: 20,
        });

        assert_eq!(grid.cells_per_row(), 4);
        assert_eq!(grid.cell_count(), 16);
    }

    #[test]
    fn register_and_unregister_track_membership() {
        let mut grid = default_grid();
        let enemy = EnemyId::new(1);

        let cell = grid.register(enemy, Vec2::new(0.5, 0.5));

        assert_eq!(cell, CellId::new(5050));
        assert_eq!(grid.cell_of(enemy), Some(cell));
        assert_eq!(grid.members(cell).collect::<Vec<_>>(), vec![enemy]);

        assert_eq!(grid.unregister(enemy), Some(cell));
        assert_eq!(grid.cell_of(enemy), None);
        assert_eq!(grid.members(cell).count(), 0);
        assert_eq!(grid.unregister(enemy), None);
        assert!(grid.is_empty());
    }

    #[test]
    fn registering_twice_keeps_a_single_membership() {
        let mut grid = default_grid();
        let enemy = EnemyId::new(3);

        let first = grid.register(enemy, Vec2::ZERO);
        let second = grid.register(enemy, Vec2::new(10.0, 0.0));

        assert_ne!(first, second);
        assert_eq!(grid.members(first).count(), 0);
        assert_eq!(grid.members(second).collect::<Vec<_>>(), vec![enemy]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn rebucket_moves_membership_between_cells() {
        let mut grid = default_grid();
        let enemy = EnemyId::new(7);
        let start = grid.register(enemy, Vec2::ZERO);

        assert_eq!(grid.rebucket(enemy, Vec2::new(0.2, 0.3)), None);

        let moved = grid.rebucket(enemy, Vec2::new(3.5, -2.5));
        let expected = grid.cell_index_of(Vec2::new(3.5, -2.5));

        assert_eq!(moved, Some((start, expected)));
        assert_eq!(grid.cell_of(enemy), Some(expected));
        assert_eq!(grid.members(start).count(), 0);
        assert_eq!(grid.members(expected).collect::<Vec<_>>(), vec![enemy]);
    }

    #[test]
    fn rebucket_ignores_unregistered_enemies() {
        let mut grid = default_grid();

        assert_eq!(grid.rebucket(EnemyId::new(4), Vec2::new(5.0, 5.0)), None);
        assert!(grid.is_empty());
    }

    #[test]
    fn zero_radius_query_finds_enemy_at_the_point() {
        let mut grid = default_grid();
        let mut positions = BTreeMap::new();
        let enemy = EnemyId::new(2);
        let position = Vec2::new(12.25, -7.5);
        let _ = positions.insert(enemy, position);
        let _ = positions.insert(EnemyId::new(3), Vec2::new(12.3, -7.5));
        for (&id, &at) in &positions {
            let _ = grid.register(id, at);
        }

        let mut found = Vec::new();
        grid.query_radius_into(position, 0.0, lookup(&positions), &mut found);

        assert_eq!(found, vec![enemy]);
    }

    #[test]
    fn queries_at_the_boundary_do_not_panic() {
        let mut grid = default_grid();
        let mut positions = BTreeMap::new();
        let _ = positions.insert(EnemyId::new(1), Vec2::new(49.5, 49.5));
        let _ = positions.insert(EnemyId::new(2), Vec2::new(80.0, 80.0));
        for (&id, &at) in &positions {
            let _ = grid.register(id, at);
        }

        let mut found = Vec::new();
        grid.query_radius_into(Vec2::new(50.0, 50.0), 1.0, lookup(&positions), &mut found);
        assert_eq!(found, vec![EnemyId::new(1)]);

        grid.query_radius_into(Vec2::new(80.0, 80.0), 0.5, lookup(&positions), &mut found);
        assert_eq!(found, vec![EnemyId::new(2)]);

        grid.query_radius_into(
            Vec2::new(-500.0, 500.0),
            10_000.0,
            lookup(&positions),
            &mut found,
        );
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn negative_or_nan_radius_finds_nothing() {
        let mut grid = default_grid();
        let mut positions = BTreeMap::new();
        let _ = positions.insert(EnemyId::new(1), Vec2::ZERO);
        let _ = grid.register(EnemyId::new(1), Vec2::ZERO);

        let mut found = vec![EnemyId::new(99)];
        grid.query_radius_into(Vec2::ZERO, -1.0, lookup(&positions), &mut found);
        assert!(found.is_empty());

        grid.query_radius_into(Vec2::ZERO, f32::NAN, lookup(&positions), &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn unresolvable_members_are_skipped() {
        let mut grid = default_grid();
        let _ = grid.register(EnemyId::new(1), Vec2::ZERO);

        let mut found = Vec::new();
        grid.query_radius_into(Vec2::ZERO, 5.0, |_| None, &mut found);

        assert!(found.is_empty());
    }

    fn coordinate() -> impl Strategy<Value = f32> {
        prop_oneof![
            8 => -50.0f32..50.0,
            1 => -120.0f32..120.0,
        ]
    }

    proptest! {
        #[test]
        fn query_matches_brute_force_scan(
            placements in prop::collection::vec((coordinate(), coordinate()), 0..120),
            moves in prop::collection::vec((0usize..120, coordinate(), coordinate()), 0..40),
            query in (coordinate(), coordinate()),
            radius in 0.0f32..30.0,
        ) {
            let mut grid = default_grid();
            let mut positions = BTreeMap::new();
            for (index, (x, y)) in placements.iter().enumerate() {
                let id = EnemyId::new(index as u32);
                let position = Vec2::new(*x, *y);
                let _ = positions.insert(id, position);
                let _ = grid.register(id, position);
            }
            for (index, x, y) in moves {
                let id = EnemyId::new(index as u32);
                if let Some(position) = positions.get_mut(&id) {
                    *position = Vec2::new(x, y);
                    let _ = grid.rebucket(id, *position);
                }
            }

            let point = Vec2::new(query.0, query.1);
            let mut found = Vec::new();
            grid.query_radius_into(point, radius, lookup(&positions), &mut found);
            found.sort();

            let expected: Vec<EnemyId> = positions
                .iter()
                .filter(|(_, position)| position.distance_squared(point) <= radius * radius)
                .map(|(id, _)| *id)
                .collect();

            prop_assert_eq!(found, expected);
        }

        #[test]
        fn every_enemy_belongs_to_exactly_its_current_cell(
            path in prop::collection::vec((coordinate(), coordinate()), 1..30),
        ) {
            let mut grid = SpatialGrid::new(&GridTuning {
                width: 100.0,
                height: 100.0,
                partitions: 400,
            });
            let enemy = EnemyId::new(0);
            let _ = grid.register(enemy, Vec2::new(path[0].0, path[0].1));

            for (x, y) in path.iter().skip(1) {
                let position = Vec2::new(*x, *y);
                let _ = grid.rebucket(enemy, position);

                let expected = grid.cell_index_of(position);
                prop_assert_eq!(grid.cell_of(enemy), Some(expected));
                let memberships = (0..grid.cell_count() as u32)
                    .filter(|cell| grid.members(CellId::new(*cell)).any(|id| id == enemy))
                    .count();
                prop_assert_eq!(memberships, 1);
            }
        }
    }
}
