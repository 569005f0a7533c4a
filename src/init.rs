//! Input matrix generators
use enum_dispatch::enum_dispatch;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fill a square matrix with input values
#[enum_dispatch]
pub trait Initialize {
    /// Overwrite every entry of `matrix`
    fn fill(&self, matrix: &mut Array2<f64>);

    /// Return a new `n x n` matrix
    fn generate(&self, n: usize) -> Array2<f64> {
        let mut matrix = Array2::zeros((n, n));
        self.fill(&mut matrix);
        matrix
    }
}

/// Every entry equal to one
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyInit;

impl Initialize for DummyInit {
    fn fill(&self, matrix: &mut Array2<f64>) {
        matrix.fill(1.);
    }
}

/// Uniform values in `[0, 10)` from a seeded generator.
///
/// The same seed always yields the same matrix.
#[derive(Debug, Clone, Copy)]
pub struct RandomInit {
    seed: u64,
}

impl RandomInit {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator for a second, independent matrix
    pub fn successor(&self) -> Self {
        Self::new(self.seed.wrapping_add(1))
    }
}

impl Initialize for RandomInit {
    fn fill(&self, matrix: &mut Array2<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for v in matrix.iter_mut() {
            *v = rng.gen_range(0.0..10.0);
        }
    }
}

/// All available generators
#[enum_dispatch(Initialize)]
#[derive(Debug, Clone, Copy)]
pub enum MatrixInit {
    /// All ones
    DummyInit(DummyInit),
    /// Seeded uniform random values
    RandomInit(RandomInit),
}

impl MatrixInit {
    /// Generators for the two inputs A and B
    pub fn pair(&self) -> (MatrixInit, MatrixInit) {
        match self {
            MatrixInit::DummyInit(d) => (MatrixInit::from(*d), MatrixInit::from(*d)),
            MatrixInit::RandomInit(r) => (MatrixInit::from(*r), MatrixInit::from(r.successor())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dummy() {
        let m = MatrixInit::from(DummyInit).generate(3);
        assert!(m.iter().all(|v| *v == 1.));
    }

    #[test]
    fn test_random_is_seeded() {
        let a = RandomInit::new(7).generate(5);
        let b = RandomInit::new(7).generate(5);
        let c = RandomInit::new(8).generate(5);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|v| (0.0..10.0).contains(v)));
    }

    #[test]
    fn test_pair() {
        let (a, b) = MatrixInit::from(RandomInit::new(1)).pair();
        assert_ne!(a.generate(4), b.generate(4));
        let (a, b) = MatrixInit::from(DummyInit).pair();
        assert_eq!(a.generate(4), b.generate(4));
    }
}
