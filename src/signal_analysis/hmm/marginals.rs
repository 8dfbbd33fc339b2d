use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::emission::EmissionDistribution;
use super::hmm_model::{HMMModel, ModelError};
use super::hmm_tools::cumulative_columns;

// P(q_t = s_i | theta) for t in [0, time_horizon): the start distribution pushed
// through the chain, p_t = A^T p_{t-1}. No observation enters the recursion
pub fn propagate_marginals(start: &DVector<f64>, transition: &DMatrix<f64>, time_horizon: usize) -> DMatrix<f64> {
    let num_states = start.len();
    let mut marginals = DMatrix::<f64>::zeros(num_states, time_horizon);

    if time_horizon == 0 {
        return marginals;
    }

    // Base case
    marginals.set_column(0, start);

    // Recursive step
    let transposed = transition.transpose();
    for t in 1..time_horizon {
        let next = &transposed * marginals.column(t - 1);
        marginals.set_column(t, &next);
    }

    marginals
}

impl<D: EmissionDistribution> HMMModel<D> {
    /// Fills the marginal state probabilities for every time step of the horizon
    /// and their per-column cumulative table used by `draw_state_at_time`.
    /// Fails if either source matrix has never been initialized or set.
    pub fn compute_marginal_probabilities(&mut self) -> Result<(), ModelError> {
        self.ensure_parameters(true, true)?;

        let marginals = propagate_marginals(
            &self.start_matrix().matrix,
            &self.transition_matrix().matrix,
            self.time_horizon(),
        );

        self.marginal_cumulative = Some(cumulative_columns(&marginals));
        self.marginals = Some(marginals);

        debug!(
            num_states = self.num_states(),
            time_horizon = self.time_horizon(),
            "Marginal state probabilities propagated"
        );

        Ok(())
    }

    pub fn marginal_probabilities(&self) -> Result<&DMatrix<f64>, ModelError> {
        self.marginals.as_ref().ok_or(ModelError::MarginalsNotReady)
    }

    pub fn marginal_cumulative(&self) -> Result<&DMatrix<f64>, ModelError> {
        self.marginal_cumulative.as_ref().ok_or(ModelError::MarginalsNotReady)
    }

    /// Marginal distribution over states at a single time step.
    pub fn marginals_at(&self, time_step: usize) -> Result<DVector<f64>, ModelError> {
        if time_step >= self.time_horizon() {
            return Err(ModelError::TimeOutOfRange { time_step, time_horizon: self.time_horizon() });
        }

        Ok(self.marginal_probabilities()?.column(time_step).into_owned())
    }
}
