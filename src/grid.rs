//! # Process grid topology
//!
//! Workers are arranged on a periodic `q x q` grid. Worker `rank`
//! sits at `(rank / q, rank % q)`; the grid wraps around in both
//! directions.
//!
//! The schedule arithmetic of the Fox algorithm (which column supplies
//! the pivot block, where the B-block travels) is kept in free
//! functions of the coordinate, so it can be checked without any
//! communication.
use crate::error::{FoxError, Result};

/// Position of a worker in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    /// Grid row
    pub row: usize,
    /// Grid column
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Logical `q x q` arrangement of workers.
///
/// Immutable once built. Row group `r` holds the workers
/// `(r, 0), .., (r, q-1)`, column group `c` holds `(0, c), .., (q-1, c)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGrid {
    /// Grid side length
    q: usize,
}

impl ProcessGrid {
    /// Build grid for `workers` workers.
    ///
    /// # Errors
    /// [`FoxError::Configuration`] if `workers` is not a positive perfect square.
    pub fn new(workers: usize) -> Result<Self> {
        let q = integer_sqrt(workers).ok_or_else(|| {
            FoxError::config(format!(
                "number of workers must be a perfect square, got {}",
                workers
            ))
        })?;
        Ok(Self { q })
    }

    /// Grid side length
    pub fn side(&self) -> usize {
        self.q
    }

    /// Total number of workers, `q * q`
    pub fn workers(&self) -> usize {
        self.q * self.q
    }

    /// Coordinate of worker `rank`
    ///
    /// # Panics
    /// If `rank` is outside the grid.
    pub fn coord_of(&self, rank: usize) -> Coord {
        assert!(rank < self.workers(), "rank {} outside grid", rank);
        Coord::new(rank / self.q, rank % self.q)
    }

    /// Rank of the worker at `coord`
    ///
    /// # Panics
    /// If `coord` is outside the grid.
    pub fn rank_of(&self, coord: Coord) -> usize {
        assert!(
            coord.row < self.q && coord.col < self.q,
            "coordinate {} outside grid",
            coord
        );
        coord.row * self.q + coord.col
    }

    /// Ranks of grid row `row`, ordered by column
    pub fn row_members(&self, row: usize) -> Vec<usize> {
        (0..self.q).map(|col| self.rank_of(Coord::new(row, col))).collect()
    }

    /// Ranks of grid column `col`, ordered by row
    pub fn col_members(&self, col: usize) -> Vec<usize> {
        (0..self.q).map(|row| self.rank_of(Coord::new(row, col))).collect()
    }

    /// Side length of a block for a global `n x n` matrix.
    ///
    /// # Errors
    /// [`FoxError::Configuration`] if `n` is zero or not divisible by `q`.
    pub fn block_size(&self, n: usize) -> Result<usize> {
        if n == 0 {
            return Err(FoxError::config("matrix size must be positive"));
        }
        if n % self.q != 0 {
            return Err(FoxError::config(format!(
                "matrix size {} is not divisible by grid size {}",
                n, self.q
            )));
        }
        Ok(n / self.q)
    }
}

/// Column whose A-block is broadcast along grid row `row` in
/// round `iteration`.
pub fn pivot_column(row: usize, iteration: usize, q: usize) -> usize {
    (row + iteration) % q
}

/// Row the B-block of grid row `row` is sent to during the ring shift.
pub fn shift_destination(row: usize, q: usize) -> usize {
    (row + q - 1) % q
}

/// Row the new B-block of grid row `row` comes from during the ring shift.
pub fn shift_source(row: usize, q: usize) -> usize {
    (row + 1) % q
}

/// Exact integer square root, `None` if `n` is not a perfect square
/// or zero.
pub fn integer_sqrt(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let squares_above = |q: usize| q.checked_mul(q).map_or(true, |sq| sq > n);
    // correct float rounding in both directions
    let mut q = (n as f64).sqrt() as usize;
    while squares_above(q) {
        q -= 1;
    }
    while !squares_above(q + 1) {
        q += 1;
    }
    if q * q == n {
        Some(q)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_non_square_worker_count() {
        for p in [0, 2, 3, 5, 8, 10, 15] {
            assert!(matches!(
                ProcessGrid::new(p),
                Err(FoxError::Configuration(_))
            ));
        }
        assert_eq!(ProcessGrid::new(16).unwrap().side(), 4);
    }

    #[test]
    fn test_huge_worker_count() {
        assert!(matches!(
            ProcessGrid::new(usize::MAX),
            Err(FoxError::Configuration(_))
        ));
        let q = (1usize << (usize::BITS / 2)) - 1;
        assert_eq!(integer_sqrt(q * q), Some(q));
        assert_eq!(integer_sqrt(q * q + 1), None);
    }

    #[test]
    fn test_coords_bijection() {
        for q in 1..6 {
            let grid = ProcessGrid::new(q * q).unwrap();
            let mut seen = HashSet::new();
            for rank in 0..grid.workers() {
                let c = grid.coord_of(rank);
                assert!(c.row < q && c.col < q);
                assert!(seen.insert(c));
                assert_eq!(grid.rank_of(c), rank);
            }
            assert_eq!(seen.len(), q * q);
        }
    }

    #[test]
    fn test_group_members() {
        let grid = ProcessGrid::new(9).unwrap();
        assert_eq!(grid.row_members(1), vec![3, 4, 5]);
        assert_eq!(grid.col_members(2), vec![2, 5, 8]);
        for r in 0..3 {
            for rank in grid.row_members(r) {
                assert_eq!(grid.coord_of(rank).row, r);
            }
            for rank in grid.col_members(r) {
                assert_eq!(grid.coord_of(rank).col, r);
            }
        }
    }

    #[test]
    fn test_block_size() {
        let grid = ProcessGrid::new(4).unwrap();
        assert_eq!(grid.block_size(8).unwrap(), 4);
        assert!(matches!(
            grid.block_size(7),
            Err(FoxError::Configuration(_))
        ));
        assert!(grid.block_size(0).is_err());
    }

    #[test]
    fn test_pivot_column_visits_every_column() {
        let q = 4;
        for row in 0..q {
            let cols: HashSet<usize> = (0..q).map(|t| pivot_column(row, t, q)).collect();
            assert_eq!(cols.len(), q);
            assert_eq!(pivot_column(row, 0, q), row);
        }
    }

    #[test]
    fn test_shift_neighbours() {
        let q = 3;
        assert_eq!(shift_destination(0, q), 2);
        assert_eq!(shift_source(2, q), 0);
        for row in 0..q {
            assert_eq!(shift_source(shift_destination(row, q), q), row);
        }
        assert_eq!(shift_destination(0, 1), 0);
        assert_eq!(shift_source(0, 1), 0);
    }
}
