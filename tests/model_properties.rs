//! Property-based tests for initialization and propagation invariants.

use nalgebra::DMatrix;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use hmm_marginals::signal_analysis::hmm::{
    GaussianEmission, HMMModel, InitMethod, ModelSetup, StartMatrix, TransitionMatrix,
};

fn assert_rows_stochastic(matrix: &DMatrix<f64>) -> Result<(), TestCaseError> {
    for row in matrix.row_iter() {
        let sum = row.sum();
        prop_assert!((sum - 1.0).abs() < 1e-9, "row sum={sum}");
    }
    Ok(())
}

// Random probability vector of the given length
fn prob_vector(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..1.0, len).prop_map(|weights| {
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    })
}

fn chain_strategy() -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>, usize)> {
    (1usize..=6).prop_flat_map(|num_states| {
        (
            prob_vector(num_states),
            prop::collection::vec(prob_vector(num_states), num_states),
            1usize..=40,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn uniform_initialization_is_normalized(num_states in 1usize..=32, seed in any::<u64>()) {
        let mut model = HMMModel::<GaussianEmission>::new(num_states, 2, 3).unwrap();
        model.randomly_initialize(&mut StdRng::seed_from_u64(seed)).unwrap();

        let start_sum = model.start_matrix().matrix.sum();
        prop_assert!((start_sum - 1.0).abs() < 1e-9, "start sum={start_sum}");
        assert_rows_stochastic(&model.transition_matrix().matrix)?;
    }

    #[test]
    fn biased_initialization_is_skewed(num_states in 2usize..=32, seed in any::<u64>()) {
        let mut model = HMMModel::<GaussianEmission>::new(num_states, 1, 3).unwrap();
        model.biased_initialize(&mut StdRng::seed_from_u64(seed)).unwrap();

        let start = &model.start_matrix().matrix;
        for i in 1..num_states {
            prop_assert!(start[i - 1] > start[i]);
        }

        let transition = &model.transition_matrix().matrix;
        assert_rows_stochastic(transition)?;
        for j in 0..num_states {
            for k in 0..num_states {
                if k != j {
                    prop_assert!(transition[(j, j)] > transition[(j, k)]);
                }
            }
        }
    }

    #[test]
    fn propagation_conserves_mass((start, rows, horizon) in chain_strategy()) {
        let num_states = start.len();
        let mut model = HMMModel::<GaussianEmission>::new(num_states, 1, horizon).unwrap();
        model.set_start_matrix(StartMatrix::new(start)).unwrap();
        model.set_transition_matrix(TransitionMatrix::new(rows).unwrap()).unwrap();
        model.compute_marginal_probabilities().unwrap();

        let marginals = model.marginal_probabilities().unwrap();
        prop_assert_eq!(marginals.shape(), (num_states, horizon));
        for column in marginals.column_iter() {
            let sum = column.sum();
            prop_assert!(column.iter().all(|&p| p >= 0.0));
            prop_assert!((sum - 1.0).abs() < 1e-9, "column sum={sum}");
        }
    }

    #[test]
    fn cumulative_transition_is_idempotent((_, rows, _) in chain_strategy()) {
        let num_states = rows.len();
        let mut model = HMMModel::<GaussianEmission>::new(num_states, 1, 1).unwrap();
        model.set_transition_matrix(TransitionMatrix::new(rows).unwrap()).unwrap();

        model.compute_cumulative_transition().unwrap();
        let first = model.transition_cumulative().unwrap().clone();
        model.compute_cumulative_transition().unwrap();
        let second = model.transition_cumulative().unwrap();

        prop_assert_eq!(&first, second);
    }

    #[test]
    fn draws_stay_in_range((start, rows, horizon) in chain_strategy(), seed in any::<u64>()) {
        let num_states = start.len();
        let mut model = HMMModel::<GaussianEmission>::new(num_states, 1, horizon).unwrap();
        model.set_start_matrix(StartMatrix::new(start)).unwrap();
        model.set_transition_matrix(TransitionMatrix::new(rows).unwrap()).unwrap();
        model.finalize().unwrap();

        let mut rng = StdRng::seed_from_u64(seed);
        for t in 0..horizon {
            let state = model.draw_state_at_time(t, &mut rng).unwrap();
            prop_assert!(state < num_states);
            let next = model.draw_next_state(state, &mut rng).unwrap();
            prop_assert!(next < num_states);
        }
    }

    #[test]
    fn setup_builds_ready_model(num_states in 1usize..=8, horizon in 1usize..=20, biased in any::<bool>(), seed in any::<u64>()) {
        let init_method = if biased { InitMethod::Biased } else { InitMethod::UniformRandom };
        let setup = ModelSetup::new(num_states, 1, horizon).with_init_method(init_method);

        let model = HMMModel::<GaussianEmission>::from_setup(&setup, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert!(model.marginal_probabilities().is_ok());
        prop_assert!(model.marginal_cumulative().is_ok());
        prop_assert!(model.transition_cumulative().is_ok());
    }
}
