use nalgebra::{DMatrix, DVector};
use rand::Rng;

// Anything able to hand out independent draws in [0, 1)
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<R: Rng> UniformSource for R {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of quantiles, wrapping around once exhausted.
/// Meant for pinning down draws in tests and reproducible runs.
#[derive(Debug, Clone)]
pub struct ReplayUniform {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplayUniform {
    // Returns None if there is nothing to replay
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() { return None }

        Some(Self { values, cursor: 0 })
    }

    pub fn draws_made(&self) -> usize {
        self.cursor
    }
}

impl UniformSource for ReplayUniform {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

// Running sum of a probability vector
pub fn cumulative_sum(probs: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut cumsum = 0.0;
    probs
        .into_iter()
        .map(|p| {
            cumsum += p;
            cumsum
        })
        .collect()
}

// Column-wise running sum down the row axis
pub fn cumulative_columns(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let mut cumulative = DMatrix::<f64>::zeros(matrix.nrows(), matrix.ncols());

    for (col_id, column) in matrix.column_iter().enumerate() {
        let running = cumulative_sum(column.iter().copied());
        cumulative.set_column(col_id, &DVector::from_vec(running));
    }

    cumulative
}

/// Inverse-CDF lookup: first index whose cumulative value reaches `u`.
/// If rounding leaves the last entry short of `u`, the last index is returned.
/// Returns None only for an empty table.
pub fn draw_from_cumulative<I>(cumulative: I, u: f64) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut last = None;

    for (id, value) in cumulative.into_iter().enumerate() {
        if value >= u {
            return Some(id);
        }
        last = Some(id);
    }

    last
}
