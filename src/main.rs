use std::collections::HashMap;

use hmm_marginals::signal_analysis::hmm::{
    GaussianEmission, HMMModel, InitMethod, ModelSetup, StartMatrix, TransitionMatrix,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = rand::thread_rng();

    /****** Biased model, straight from a setup ******/

    let setup = ModelSetup::new(3, 2, 10).with_init_method(InitMethod::Biased);
    let model = match HMMModel::<GaussianEmission>::from_setup(&setup, &mut rng) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("Could not build model: {}", err);
            return
        }
    };

    if let Err(err) = model.write_report("biased", &mut std::io::stdout()) {
        eprintln!("Could not write report: {}", err);
        return
    }

    if let Ok(marginals) = model.marginal_probabilities() {
        println!("Marginal state probabilities over time:\n{}", marginals);
    }

    /****** Hand-set matrices, empirical check of P(q_t) ******/

    let mut model = match HMMModel::<GaussianEmission>::new(3, 1, 5) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("Could not build model: {}", err);
            return
        }
    };

    let start_matrix = StartMatrix::new(vec![0.1, 0.8, 0.1]);
    let transition_matrix = match TransitionMatrix::new(vec![
        vec![0.8, 0.1, 0.1],
        vec![0.1, 0.7, 0.2],
        vec![0.2, 0.05, 0.75],
    ]) {
        Ok(matrix) => matrix,
        Err(err) => {
            eprintln!("Bad transition matrix: {}", err);
            return
        }
    };

    let res = model.set_start_matrix(start_matrix)
        .and_then(|_| model.set_transition_matrix(transition_matrix))
        .and_then(|_| model.finalize());
    if let Err(err) = res {
        eprintln!("Could not prepare model: {}", err);
        return
    }

    let time_step = model.time_horizon() - 1;
    let num_draws = 100_000;
    let mut counts: HashMap<usize, usize> = HashMap::new();

    for _ in 0..num_draws {
        match model.draw_state_at_time(time_step, &mut rng) {
            Ok(state) => *counts.entry(state).or_insert(0) += 1,
            Err(err) => {
                eprintln!("Draw failed: {}", err);
                return
            }
        }
    }

    let Ok(expected) = model.marginals_at(time_step) else { return };

    println!("State frequencies at t = {}:", time_step);
    for state in 0..model.num_states() {
        let freq = *counts.get(&state).unwrap_or(&0) as f64 / num_draws as f64;
        println!("  state {}: drawn {:.4}, expected {:.4}", state, freq, expected[state]);
    }

    match model.generate_sequence(20, &mut rng) {
        Ok((states, _)) => println!("Sampled path: {:?}", states),
        Err(err) => eprintln!("Could not generate a sequence: {}", err),
    }
}
