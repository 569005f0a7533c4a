//! Run configuration
use crate::error::{FoxError, Result};
use crate::grid::ProcessGrid;
use crate::init::{DummyInit, MatrixInit, RandomInit};
use std::time::Duration;

/// Kind of input data
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InitKind {
    /// All entries one
    Dummy,
    /// Seeded uniform random entries
    Random,
}

impl std::fmt::Display for InitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            InitKind::Dummy => write!(f, "dummy"),
            InitKind::Random => write!(f, "random"),
        }
    }
}

/// Settings of one multiplication run
#[derive(Debug, Clone)]
pub struct FoxConfig {
    /// Number of workers, must be a perfect square
    pub workers: usize,
    /// Matrix size n, must be divisible by the grid side
    pub size: usize,
    /// Input data
    pub init: InitKind,
    /// Seed for random inputs, drawn from the OS if missing
    pub seed: Option<u64>,
    /// Matrices up to this size are printed
    pub display_threshold: usize,
    /// Relative tolerance against the sequential product
    pub tolerance: f64,
    /// Upper bound for a single blocking receive
    pub comm_timeout: Option<Duration>,
}

impl Default for FoxConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            size: 16,
            init: InitKind::Dummy,
            seed: None,
            display_threshold: 10,
            tolerance: 1e-9,
            comm_timeout: None,
        }
    }
}

impl FoxConfig {
    /// Check the settings and build the grid they describe.
    ///
    /// # Errors
    /// [`FoxError::Configuration`] for a non-square worker count, a size
    /// that does not fit the grid, or a non-positive tolerance.
    pub fn validate(&self) -> Result<ProcessGrid> {
        let grid = ProcessGrid::new(self.workers)?;
        grid.block_size(self.size)?;
        if !(self.tolerance.is_finite() && self.tolerance > 0.) {
            return Err(FoxError::config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(grid)
    }

    /// Generator for the configured input data
    pub fn initializer(&self) -> MatrixInit {
        match self.init {
            InitKind::Dummy => DummyInit.into(),
            InitKind::Random => RandomInit::new(self.seed.unwrap_or_else(rand::random)).into(),
        }
    }

    /// Whether matrices of the configured size are printed
    pub fn display(&self) -> bool {
        self.size <= self.display_threshold
    }
}
