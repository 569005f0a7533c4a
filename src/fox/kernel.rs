//! # Local block product
//! $$
//! C \leftarrow C + A B
//! $$
use crate::types::FloatNum;
use ndarray::{ArrayBase, Data, DataMut, Ix2};

/// Accumulate the product of two square blocks into `c`.
///
/// Plain `i, j, k` loop with `k` innermost, adding each product straight
/// into `c[[i, j]]`. The summation order therefore equals the one of a
/// naive sequential product.
///
/// # Panics
/// If the three blocks do not share the same square shape.
#[allow(clippy::many_single_char_names)]
pub fn block_multiply_acc<S1, S2, S3, A>(
    a: &ArrayBase<S1, Ix2>,
    b: &ArrayBase<S2, Ix2>,
    c: &mut ArrayBase<S3, Ix2>,
) where
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    S3: DataMut<Elem = A>,
    A: FloatNum,
{
    let bs = c.nrows();
    assert_eq!(c.ncols(), bs, "accumulator block must be square");
    assert_eq!(a.dim(), (bs, bs), "A-block shape mismatch");
    assert_eq!(b.dim(), (bs, bs), "B-block shape mismatch");
    for i in 0..bs {
        for j in 0..bs {
            for k in 0..bs {
                c[[i, j]] = c[[i, j]] + a[[i, k]] * b[[k, j]];
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::approx_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_block_multiply() {
        let a = array![[1., 2.], [3., 4.]];
        let b = array![[5., 6.], [7., 8.]];
        let mut c = Array2::<f64>::zeros((2, 2));
        block_multiply_acc(&a, &b, &mut c);
        approx_eq(&c, &array![[19., 22.], [43., 50.]]);
    }

    #[test]
    fn test_block_multiply_accumulates() {
        let a = array![[1., 0.], [0., 1.]];
        let b = array![[2., 3.], [4., 5.]];
        let mut c = array![[1., 1.], [1., 1.]];
        block_multiply_acc(&a, &b, &mut c);
        block_multiply_acc(&a, &b, &mut c);
        approx_eq(&c, &array![[5., 7.], [9., 11.]]);
    }

    #[test]
    fn test_block_multiply_f32_views() {
        let a = Array2::<f32>::ones((4, 4));
        let b = Array2::<f32>::from_elem((4, 4), 2.);
        let mut c = Array2::<f32>::zeros((6, 6));
        let mut sub = c.slice_mut(ndarray::s![1..5, 1..5]);
        block_multiply_acc(&a.view(), &b.view(), &mut sub);
        assert!(sub.iter().all(|v| (*v - 8.).abs() < 1e-6));
        assert_eq!(c[[0, 0]], 0.);
    }

    #[test]
    #[should_panic]
    fn test_shape_mismatch() {
        let a = Array2::<f64>::zeros((2, 3));
        let b = Array2::<f64>::zeros((2, 2));
        let mut c = Array2::<f64>::zeros((2, 2));
        block_multiply_acc(&a, &b, &mut c);
    }
}
