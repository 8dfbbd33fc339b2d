use std::io::{self, Write};

use nalgebra::{DMatrix, DVector};

use super::emission::EmissionDistribution;
use super::hmm_model::HMMModel;

fn write_vector<W: Write>(sink: &mut W, label: &str, vector: &DVector<f64>) -> io::Result<()> {
    let entries: Vec<String> = vector.iter().map(|v| format!("{:.6}", v)).collect();
    writeln!(sink, "{} ({}):", label, vector.len())?;
    writeln!(sink, "  [{}]", entries.join(", "))
}

fn write_matrix<W: Write>(sink: &mut W, label: &str, matrix: &DMatrix<f64>) -> io::Result<()> {
    writeln!(sink, "{} ({}x{}):", label, matrix.nrows(), matrix.ncols())?;
    for row in matrix.row_iter() {
        let entries: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
        writeln!(sink, "  [{}]", entries.join(", "))?;
    }
    Ok(())
}

impl<D: EmissionDistribution> HMMModel<D> {
    /// Renders start probabilities, transition probabilities and each state's
    /// emission location/spread. Does not touch the model.
    pub fn write_report<W: Write>(&self, name: &str, sink: &mut W) -> io::Result<()> {
        writeln!(sink, "----- HMM {} ------", name)?;

        write_vector(sink, "initial probabilities", &self.start_matrix().matrix)?;
        write_matrix(sink, "transition probabilities", &self.transition_matrix().matrix)?;

        for (id, emission) in self.emissions().iter().enumerate() {
            writeln!(sink, "state {}:", id + 1)?;
            write_vector(sink, "mu", emission.location())?;
            write_matrix(sink, "sigma", emission.spread())?;
            writeln!(sink)?;
        }

        Ok(())
    }
}
