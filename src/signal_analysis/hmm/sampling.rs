use nalgebra::DVector;
use rand::Rng;
use tracing::trace;

use super::emission::{EmissionDistribution, SampleEmission};
use super::hmm_model::{HMMModel, ModelError};
use super::hmm_tools::{cumulative_sum, draw_from_cumulative, UniformSource};

impl<D: EmissionDistribution> HMMModel<D> {
    /// Draws a state from P(q_t), the marginal at `time_step`.
    ///
    /// Needs the marginal tables from `compute_marginal_probabilities`.
    pub fn draw_state_at_time<S: UniformSource>(&self, time_step: usize, source: &mut S) -> Result<usize, ModelError> {
        if time_step >= self.time_horizon() {
            return Err(ModelError::TimeOutOfRange { time_step, time_horizon: self.time_horizon() });
        }

        let cumulative = self.marginal_cumulative()?;
        let u = source.next_uniform();

        let state = draw_from_cumulative(cumulative.column(time_step).iter().copied(), u)
            .ok_or(ModelError::MarginalsNotReady)?;

        trace!(time_step, u, state, "Drew state from marginals");

        Ok(state)
    }

    /// Draws a state from P(q_t | q_{t-1} = current_state).
    ///
    /// Needs the cumulative transition table.
    pub fn draw_next_state<S: UniformSource>(&self, current_state: usize, source: &mut S) -> Result<usize, ModelError> {
        if current_state >= self.num_states() {
            return Err(ModelError::StateOutOfRange { state: current_state, num_states: self.num_states() });
        }

        let cumulative = self.transition_cumulative()?;
        let u = source.next_uniform();

        let next_state = draw_from_cumulative(cumulative.column(current_state).iter().copied(), u)
            .ok_or(ModelError::CumulativeTransitionNotReady)?;

        trace!(current_state, u, next_state, "Drew successor state");

        Ok(next_state)
    }
}

impl<D: SampleEmission> HMMModel<D> {
    /// Generates a state path of `length` steps together with one emitted
    /// observation per step. The first state comes from the start matrix, the
    /// rest follow the transition matrix.
    pub fn generate_sequence<R: Rng>(&self, length: usize, rng: &mut R) -> Result<(Vec<usize>, Vec<DVector<f64>>), ModelError> {
        let mut sequence = Vec::with_capacity(length);
        let mut values = Vec::with_capacity(length);

        if length == 0 {
            return Ok((sequence, values));
        }

        // Fail before drawing anything if the path cannot be drawn
        self.ensure_parameters(true, false)?;
        self.transition_cumulative()?;

        let start_cumulative = cumulative_sum(self.start_matrix().matrix.iter().copied());
        let u = rng.next_uniform();
        let mut current_state = draw_from_cumulative(start_cumulative, u)
            .ok_or(ModelError::ParametersNotInitialized { start_missing: true, transition_missing: false })?;

        sequence.push(current_state);
        values.push(self.emissions()[current_state].sample(rng)?);

        for _ in 1..length {
            current_state = self.draw_next_state(current_state, rng)?;

            sequence.push(current_state);
            values.push(self.emissions()[current_state].sample(rng)?);
        }

        Ok((sequence, values))
    }
}
