//! # Checkerboard decomposition
//!
//! A global `n x n` matrix is cut into `q x q` blocks of side `n / q`;
//! block `(i, j)` lives on the worker at grid coordinate `(i, j)`.
//!
//! Distribution runs in two phases:
//! 1. The coordinator scatters block-rows (`n / q` rows each) along grid
//!    column 0, one block-row per grid row.
//! 2. Each worker of column 0 cuts its block-row into `q` blocks and
//!    scatters them along its grid row.
//!
//! Gathering is the exact inverse: blocks are collected along the rows
//! into block-rows, block-rows along column 0 onto the coordinator.
use crate::comm::{GridComms, GroupComm};
use crate::error::{FoxError, Result};
use crate::grid::Coord;
use crate::utils::{try_buffer, try_zeros};
use ndarray::{s, Array2, ArrayBase, ArrayView2, Data, Ix2};
use tracing::debug;

/// View of block `coord` of a global matrix with block side `bs`
pub fn block_view<S: Data<Elem = f64>>(
    global: &ArrayBase<S, Ix2>,
    coord: Coord,
    bs: usize,
) -> ArrayView2<f64> {
    global.slice(s![
        coord.row * bs..(coord.row + 1) * bs,
        coord.col * bs..(coord.col + 1) * bs
    ])
}

/// Distribute a global matrix from the coordinator; every worker
/// returns its own block.
///
/// `global` is only read on the coordinator.
///
/// # Errors
/// - [`FoxError::Configuration`] if `n` does not fit the grid or the
///   coordinator's matrix is not `n x n`. Raised before any data moves.
/// - [`FoxError::Communication`] if an exchange fails.
pub fn scatter_checkerboard<C: GroupComm>(
    comms: &GridComms<C>,
    global: Option<&Array2<f64>>,
    n: usize,
) -> Result<Array2<f64>> {
    let q = comms.side();
    let bs = comms.grid().block_size(n)?;
    let coord = comms.coord();

    let send = if comms.is_coordinator() {
        let global = global
            .ok_or_else(|| FoxError::config("coordinator has no matrix to distribute"))?;
        if global.dim() != (n, n) {
            return Err(FoxError::config(format!(
                "expected {}x{} matrix, got {:?}",
                n,
                n,
                global.dim()
            )));
        }
        Some(flatten(global)?)
    } else {
        None
    };

    // Phase 1: block-rows along column 0
    let packed = if coord.col == 0 {
        let data = comms.col().scatter(0, send.as_deref(), bs * n)?;
        let block_row = Array2::from_shape_vec((bs, n), data)
            .map_err(|e| FoxError::comm(format!("malformed block-row: {}", e)))?;
        debug!(row = coord.row, "received block-row");
        Some(pack_blocks(&block_row.view(), q, bs)?)
    } else {
        None
    };

    // Phase 2: blocks along each row
    let data = comms.row().scatter(0, packed.as_deref(), bs * bs)?;
    Array2::from_shape_vec((bs, bs), data)
        .map_err(|e| FoxError::comm(format!("malformed block: {}", e)))
}

/// Collect the blocks of all workers into the global matrix.
///
/// Returns `Some` on the coordinator and `None` on every other worker.
///
/// # Errors
/// - [`FoxError::Configuration`] if `n` does not fit the grid or `block`
///   has the wrong shape.
/// - [`FoxError::Communication`] if an exchange fails.
pub fn gather_checkerboard<C: GroupComm>(
    comms: &GridComms<C>,
    block: &Array2<f64>,
    n: usize,
) -> Result<Option<Array2<f64>>> {
    let q = comms.side();
    let bs = comms.grid().block_size(n)?;
    if block.dim() != (bs, bs) {
        return Err(FoxError::config(format!(
            "expected {}x{} block, got {:?}",
            bs,
            bs,
            block.dim()
        )));
    }

    // Phase 1: blocks along each row
    let flat = flatten(block)?;
    let gathered = comms.row().gather(0, &flat)?;
    if comms.coord().col != 0 {
        return Ok(None);
    }
    let packed =
        gathered.ok_or_else(|| FoxError::comm("row gather left representative empty"))?;
    let block_row = unpack_blocks(&packed, q, bs)?;

    // Phase 2: block-rows along column 0
    let flat = flatten(&block_row)?;
    let gathered = comms.col().gather(0, &flat)?;
    if !comms.is_coordinator() {
        return Ok(None);
    }
    let data = gathered.ok_or_else(|| FoxError::comm("column gather left coordinator empty"))?;
    debug!(n, "assembled global matrix");
    Array2::from_shape_vec((n, n), data)
        .map(Some)
        .map_err(|e| FoxError::comm(format!("malformed global matrix: {}", e)))
}

/// Row-major copy of a matrix as a message buffer
fn flatten<S: Data<Elem = f64>>(matrix: &ArrayBase<S, Ix2>) -> Result<Vec<f64>> {
    let mut flat = try_buffer(matrix.len())?;
    flat.extend(matrix.iter().copied());
    Ok(flat)
}

/// Rearrange a `bs x (q * bs)` block-row into `q` contiguous blocks
fn pack_blocks(block_row: &ArrayView2<f64>, q: usize, bs: usize) -> Result<Vec<f64>> {
    let mut packed = try_buffer(block_row.len())?;
    for j in 0..q {
        packed.extend(block_row.slice(s![.., j * bs..(j + 1) * bs]).iter().copied());
    }
    Ok(packed)
}

/// Inverse of [`pack_blocks`]
fn unpack_blocks(packed: &[f64], q: usize, bs: usize) -> Result<Array2<f64>> {
    if packed.len() != q * bs * bs {
        return Err(FoxError::comm(format!(
            "expected {} values for a block-row, got {}",
            q * bs * bs,
            packed.len()
        )));
    }
    let mut block_row = try_zeros(bs, q * bs)?;
    for (j, chunk) in packed.chunks(bs * bs).enumerate() {
        let block = ArrayView2::from_shape((bs, bs), chunk)
            .map_err(|e| FoxError::comm(format!("malformed block: {}", e)))?;
        block_row
            .slice_mut(s![.., j * bs..(j + 1) * bs])
            .assign(&block);
    }
    Ok(block_row)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::comm::LocalFabric;
    use crate::grid::ProcessGrid;
    use crate::utils::approx_eq;
    use std::thread;

    fn numbered(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, n), |(i, j)| (i * n + j) as f64)
    }

    #[test]
    fn test_pack_unpack() {
        let row = Array2::from_shape_fn((2, 6), |(i, j)| (i * 6 + j) as f64);
        let packed = pack_blocks(&row.view(), 3, 2).unwrap();
        assert_eq!(&packed[..4], &[0., 1., 6., 7.]);
        approx_eq(&unpack_blocks(&packed, 3, 2).unwrap(), &row);
        assert!(unpack_blocks(&packed[1..], 3, 2).is_err());
    }

    #[test]
    fn test_scatter_then_gather() {
        let n = 6;
        let grid = ProcessGrid::new(9).unwrap();
        let global = numbered(n);
        let comms = LocalFabric::build(&grid, None).unwrap();
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|c| {
                    let global = &global;
                    s.spawn(move || {
                        let input = if c.is_coordinator() { Some(global) } else { None };
                        let block = scatter_checkerboard(&c, input, n).unwrap();
                        approx_eq(&block, &block_view(global, c.coord(), 2).to_owned());
                        gather_checkerboard(&c, &block, n).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        approx_eq(results[0].as_ref().unwrap(), &global);
        assert!(results[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_indivisible_size() {
        let grid = ProcessGrid::new(4).unwrap();
        let comms = LocalFabric::build(&grid, None).unwrap();
        let global = numbered(7);
        // fails before touching any channel, so a single worker suffices
        let err = scatter_checkerboard(&comms[0], Some(&global), 7).unwrap_err();
        assert!(matches!(err, FoxError::Configuration(_)));
    }

    #[test]
    fn test_wrong_global_shape() {
        let grid = ProcessGrid::new(1).unwrap();
        let comms = LocalFabric::build(&grid, None).unwrap();
        let global = numbered(3);
        let err = scatter_checkerboard(&comms[0], Some(&global), 4).unwrap_err();
        assert!(matches!(err, FoxError::Configuration(_)));
    }
}
