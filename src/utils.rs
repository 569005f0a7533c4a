//! Collection of helpers around the distributed product:
//! sequential reference product, result comparison, console output
//! and fallible buffer allocation.
use crate::error::{FoxError, Result};
use crate::types::FloatNum;
use ndarray::{Array2, ArrayBase, Data, Dimension, Ix2};
use std::fmt::Write;

/// Empty vector with room for `len` entries, reporting failure instead
/// of aborting.
///
/// # Errors
/// [`FoxError::Allocation`] if the buffer cannot be reserved.
pub fn try_buffer<T>(len: usize) -> Result<Vec<T>> {
    let mut data: Vec<T> = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FoxError::Allocation { elements: len })?;
    Ok(data)
}

/// Fallible `slice.to_vec()`
///
/// # Errors
/// [`FoxError::Allocation`] if the copy cannot be reserved.
pub fn try_copy<T: Copy>(slice: &[T]) -> Result<Vec<T>> {
    let mut data = try_buffer(slice.len())?;
    data.extend_from_slice(slice);
    Ok(data)
}

/// Allocate a zeroed `rows x cols` matrix, reporting failure instead
/// of aborting.
///
/// # Errors
/// [`FoxError::Allocation`] if the buffer cannot be reserved.
pub fn try_zeros(rows: usize, cols: usize) -> Result<Array2<f64>> {
    let elements = rows
        .checked_mul(cols)
        .ok_or(FoxError::Allocation { elements: usize::MAX })?;
    let mut data = try_buffer(elements)?;
    data.resize(elements, 0.);
    Array2::from_shape_vec((rows, cols), data).map_err(|_| FoxError::Allocation { elements })
}

/// Sequential reference product with the naive `i, j, k` loop
///
/// # Panics
/// If the inner dimensions do not agree.
#[allow(clippy::many_single_char_names)]
pub fn serial_multiply<S1, S2, A>(a: &ArrayBase<S1, Ix2>, b: &ArrayBase<S2, Ix2>) -> Array2<A>
where
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    A: FloatNum,
{
    let (m, k) = a.dim();
    let (k2, n) = b.dim();
    assert_eq!(k, k2, "inner dimensions do not agree");
    let mut c = Array2::<A>::zeros((m, n));
    for i in 0..m {
        for j in 0..n {
            for l in 0..k {
                c[[i, j]] = c[[i, j]] + a[[i, l]] * b[[l, j]];
            }
        }
    }
    c
}

/// Largest element-wise deviation, relative to `max(1, |x|, |y|)`.
///
/// Returns infinity if the shapes differ.
pub fn max_relative_error<S1, S2, D>(x: &ArrayBase<S1, D>, y: &ArrayBase<S2, D>) -> f64
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    if x.shape() != y.shape() {
        return f64::INFINITY;
    }
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs() / 1f64.max(a.abs()).max(b.abs()))
        .fold(0., f64::max)
}

/// True if every element of `x` and `y` agrees within relative tolerance `tol`
pub fn results_match<S1, S2, D>(x: &ArrayBase<S1, D>, y: &ArrayBase<S2, D>, tol: f64) -> bool
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    max_relative_error(x, y) <= tol
}

/// Format matrix row by row, every entry as `{:7.4}`
pub fn format_matrix<S: Data<Elem = f64>>(matrix: &ArrayBase<S, Ix2>) -> String {
    let mut out = String::new();
    for row in matrix.rows() {
        for v in row.iter() {
            let _ = write!(out, "{:7.4} ", v);
        }
        out.push('\n');
    }
    out
}

/// Print matrix to stdout
pub fn print_matrix<S: Data<Elem = f64>>(matrix: &ArrayBase<S, Ix2>) {
    print!("{}", format_matrix(matrix));
}

/// Test approx equality of two arrays element-wise
///
/// # Panics
/// Panics when difference is larger than 1e-3.
pub fn approx_eq<S, D, A>(result: &ArrayBase<S, D>, expected: &ArrayBase<S, D>)
where
    S: Data<Elem = A>,
    D: Dimension,
    A: FloatNum,
{
    let dif = A::from(1e-3).unwrap();
    assert_eq!(result.shape(), expected.shape(), "shape mismatch");
    for (a, b) in expected.iter().zip(result.iter()) {
        if (*a - *b).abs() > dif {
            panic!("Large difference of values, got {:?} expected {:?}.", b, a)
        }
    }
}
