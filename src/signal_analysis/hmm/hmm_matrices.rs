use nalgebra::{DMatrix, DVector};
use std::ops::{Index, IndexMut};
use thiserror::Error;

use super::hmm_tools::cumulative_columns;

// Tolerance used when checking that probabilities add up to 1
pub const PROB_SUM_MARGIN: f64 = 1e-4;

pub trait ProbabilityMatrix {

    // Check if the matrix is valid
    fn validate(&self) -> Result<(), MatrixValidationError>;
}

// Custom error for matrix value validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixValidationError {
    #[error("transition matrix must be square with equal-length rows")]
    IncorrectShape,
    #[error("probability vector does not sum to 1: {values:?}")]
    VectorIncorrectValues { values: Vec<f64> },
    #[error("rows {rows:?} do not sum to 1")]
    RowsIncorrectValues { rows: Vec<usize>, values: Vec<Vec<f64>> },
    #[error("matrix holds no probability mass")]
    MatrixEmpty,
    #[error("rows {rows:?} hold no probability mass")]
    RowsEmpty { rows: Vec<usize> },
    #[error("found a value outside of [0, 1]")]
    InvalidValue,
}

/// Row-stochastic matrix: entry (i, j) is P(next state = j | current state = i).
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    pub matrix: DMatrix<f64>,
}

impl TransitionMatrix {
    // Create a new transition matrix from row-major input. Rows must all be num_states long
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, MatrixValidationError> {
        let num_states = rows.len();
        if num_states == 0 || rows.iter().any(|row| row.len() != num_states) {
            return Err(MatrixValidationError::IncorrectShape);
        }

        let matrix = DMatrix::from_fn(num_states, num_states, |i, j| rows[i][j]);

        Ok(Self { matrix })
    }

    pub fn from_dmatrix(matrix: DMatrix<f64>) -> Result<Self, MatrixValidationError> {
        if !matrix.is_square() || matrix.nrows() == 0 {
            return Err(MatrixValidationError::IncorrectShape);
        }

        Ok(Self { matrix })
    }

    // Create an empty (all zero) transition matrix
    pub fn empty(size: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(size, size),
        }
    }

    // Every transition equally likely, self-transitions included
    pub fn uniform(num_states: usize) -> Self {
        let uniform = 1.0 / num_states as f64;

        Self {
            matrix: DMatrix::from_element(num_states, num_states, uniform),
        }
    }

    // Self-loop weight of 1 against 1/num_states everywhere else, then each row is
    // normalized. Off-diagonal mass ends up split evenly between the other states
    pub fn self_biased(num_states: usize) -> Self {
        let uniform = 1.0 / num_states as f64;

        let mut matrix = DMatrix::from_element(num_states, num_states, uniform);
        matrix.fill_diagonal(1.0);

        for mut row in matrix.row_iter_mut() {
            let sum = row.sum();
            row /= sum;
        }

        Self { matrix }
    }

    pub fn num_states(&self) -> usize {
        self.matrix.nrows()
    }

    // Get probability for a given transition
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.matrix[(from, to)]
    }

    // Set the probability of transitioning from one state to another
    pub fn set(&mut self, from: usize, to: usize, prob: f64) {
        self.matrix[(from, to)] = prob;
    }

    /// Cumulative transition table, stored transposed so that column i holds the
    /// running sum of row i: `cumulative[(j, i)] = sum_{k <= j} A[(i, k)]`.
    pub fn cumulative_transposed(&self) -> DMatrix<f64> {
        cumulative_columns(&self.matrix.transpose())
    }
}

impl ProbabilityMatrix for TransitionMatrix {

    // Check if the matrix is valid
    fn validate(&self) -> Result<(), MatrixValidationError> {
        if !self.matrix.is_square() || self.matrix.nrows() == 0 {
            return Err(MatrixValidationError::IncorrectShape)
        }

        // Check if values are valid
        if self.matrix.iter().any(|&val| !(0.0..=1.0 + PROB_SUM_MARGIN).contains(&val)) {
            return Err(MatrixValidationError::InvalidValue);
        }

        let mut empty_rows = Vec::<usize>::new();
        let mut incorrect_rows_id = Vec::<usize>::new();
        let mut incorrect_rows_values = Vec::<Vec<f64>>::new();

        for (i, row) in self.matrix.row_iter().enumerate() {
            // Check if the row is empty
            if row.iter().all(|&val| val == 0.0) {
                empty_rows.push(i);
            }
            // Check if the row doesn't sum to 1.0
            else if (row.sum() - 1.0).abs() > PROB_SUM_MARGIN {
                incorrect_rows_id.push(i);
                incorrect_rows_values.push(row.iter().copied().collect());
            }
        }

        // Entire matrix is empty
        if empty_rows.len() == self.matrix.nrows() {
            return Err(MatrixValidationError::MatrixEmpty);
        }
        // Some rows are empty
        else if !empty_rows.is_empty() {
            return Err(MatrixValidationError::RowsEmpty { rows: empty_rows });
        }
        // Some rows have incorrect values
        else if !incorrect_rows_id.is_empty() {
            return Err(MatrixValidationError::RowsIncorrectValues {
                rows: incorrect_rows_id,
                values: incorrect_rows_values,
            });
        }

        Ok(())
    }
}

impl Index<(usize, usize)> for TransitionMatrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.matrix[index]
    }
}

impl IndexMut<(usize, usize)> for TransitionMatrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.matrix[index]
    }
}

/// Initial state distribution, P(q_0 = s_i).
#[derive(Debug, Clone, PartialEq)]
pub struct StartMatrix {
    pub matrix: DVector<f64>,
}

impl StartMatrix {
    pub fn new(matrix: Vec<f64>) -> Self {
        Self { matrix: DVector::from_vec(matrix) }
    }

    // Create an empty start matrix
    pub fn empty(size: usize) -> Self {
        Self {
            matrix: DVector::zeros(size),
        }
    }

    pub fn uniform(num_states: usize) -> Self {
        Self {
            matrix: DVector::from_element(num_states, 1.0 / num_states as f64),
        }
    }

    // Weights 1, 1/2, 1/3, ... normalized. Skewed toward the first state
    pub fn harmonic(num_states: usize) -> Self {
        let mut matrix = DVector::from_fn(num_states, |i, _| 1.0 / (i + 1) as f64);
        let sum = matrix.sum();
        matrix /= sum;

        Self { matrix }
    }

    pub fn num_states(&self) -> usize {
        self.matrix.len()
    }

    pub fn get(&self, state: usize) -> f64 {
        self.matrix[state]
    }

    pub fn set(&mut self, state: usize, prob: f64) {
        self.matrix[state] = prob;
    }
}

impl ProbabilityMatrix for StartMatrix {
    // Validate the 1D start matrix
    fn validate(&self) -> Result<(), MatrixValidationError> {

        // Check if all values are valid
        if self.matrix.iter().any(|&val| !(0.0..=1.0 + PROB_SUM_MARGIN).contains(&val)) {
            return Err(MatrixValidationError::InvalidValue);
        }

        // Check if all elements are zero (i.e., the matrix is empty)
        if self.matrix.iter().all(|&val| val == 0.0) {
            return Err(MatrixValidationError::MatrixEmpty);
        }

        if (self.matrix.sum() - 1.0).abs() > PROB_SUM_MARGIN {
            return Err(MatrixValidationError::VectorIncorrectValues {
                values: self.matrix.iter().copied().collect(),
            });
        }

        Ok(())
    }
}

impl Index<usize> for StartMatrix {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.matrix[index]
    }
}

impl IndexMut<usize> for StartMatrix {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.matrix[index]
    }
}

#[cfg(test)]
mod tests_transition_matrix {
    use super::*;

    #[test]
    fn test_transition_matrix_new() {
        let transition_matrix = TransitionMatrix::new(vec![
            vec![0.5, 0.5],
            vec![0.3, 0.7],
        ]).unwrap();

        assert_eq!(transition_matrix[(0, 1)], 0.5);
        assert_eq!(transition_matrix[(1, 0)], 0.3);
        assert!(transition_matrix.validate().is_ok());
    }

    #[test]
    fn test_transition_matrix_incorrect_shape() {
        let res = TransitionMatrix::new(vec![
            vec![0.5, 0.5],
            vec![0.3, 0.7],
            vec![0.1, 0.9],
        ]);
        assert_eq!(res, Err(MatrixValidationError::IncorrectShape));

        let res = TransitionMatrix::from_dmatrix(DMatrix::zeros(2, 3));
        assert_eq!(res, Err(MatrixValidationError::IncorrectShape));
    }

    #[test]
    fn test_transition_matrix_empty() {
        let transition_matrix = TransitionMatrix::empty(3);
        assert_eq!(transition_matrix.num_states(), 3);
        assert!(transition_matrix.matrix.iter().all(|&val| val == 0.0));

        match transition_matrix.validate() {
            Err(MatrixValidationError::MatrixEmpty) => (),
            _ => panic!("Expected MatrixEmpty error"),
        }
    }

    #[test]
    fn test_transition_matrix_validation_rows_empty() {
        let mut transition_matrix = TransitionMatrix::empty(3);
        transition_matrix.set(0, 0, 1.0);

        match transition_matrix.validate() {
            Err(MatrixValidationError::RowsEmpty { rows }) => assert_eq!(rows, vec![1, 2]),
            _ => panic!("Expected RowsEmpty error"),
        }
    }

    #[test]
    fn test_transition_matrix_validation_incorrect_rows() {
        let mut transition_matrix = TransitionMatrix::empty(2);
        transition_matrix.set(0, 0, 0.7);
        transition_matrix.set(0, 1, 0.7); // Row 0 sums to 1.4
        transition_matrix.set(1, 0, 0.5);
        transition_matrix.set(1, 1, 0.5);

        match transition_matrix.validate() {
            Err(MatrixValidationError::RowsIncorrectValues { rows, values }) => {
                assert_eq!(rows, vec![0]);
                assert_eq!(values, vec![vec![0.7, 0.7]]);
            },
            _ => panic!("Expected RowsIncorrectValues error"),
        }
    }

    #[test]
    fn test_transition_matrix_validation_invalid_value() {
        let mut transition_matrix = TransitionMatrix::empty(2);
        transition_matrix[(0, 0)] = 1.5;
        transition_matrix[(1, 1)] = -0.2;

        assert_eq!(transition_matrix.validate(), Err(MatrixValidationError::InvalidValue));
    }

    #[test]
    fn test_uniform_transition_matrix() {
        let transition_matrix = TransitionMatrix::uniform(4);
        assert!(transition_matrix.validate().is_ok());
        assert!(transition_matrix.matrix.iter().all(|&val| val == 0.25));
    }

    #[test]
    fn test_self_biased_transition_matrix() {
        // Row weights (1, 1/3, 1/3) normalized by 5/3
        let transition_matrix = TransitionMatrix::self_biased(3);

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 0.6 } else { 0.2 };
                assert!((transition_matrix[(i, j)] - expected).abs() < 1e-12);
            }
        }
        assert!(transition_matrix.validate().is_ok());
    }

    #[test]
    fn test_self_biased_single_state() {
        let transition_matrix = TransitionMatrix::self_biased(1);
        assert_eq!(transition_matrix[(0, 0)], 1.0);
    }

    #[test]
    fn test_cumulative_transposed() {
        let transition_matrix = TransitionMatrix::new(vec![
            vec![0.1, 0.2, 0.7],
            vec![0.5, 0.5, 0.0],
            vec![0.0, 0.0, 1.0],
        ]).unwrap();

        let cumulative = transition_matrix.cumulative_transposed();

        // Column i is the running sum of row i
        let expected = [
            [0.1, 0.3, 1.0],
            [0.5, 1.0, 1.0],
            [0.0, 0.0, 1.0],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert!((cumulative[(j, i)] - expected[i][j]).abs() < 1e-12);
            }
        }
    }
}
