//! Flat-text parameter persistence.
//!
//! Each layer transition is written as two whitespace-delimited text files
//! in one directory: `weights{k}.txt` (one matrix row per line) and
//! `biases{k}.txt` (one value per line). Loading is the inverse; the
//! topology is recovered from the tensor shapes on disk.

use crate::network::Network;
use matrix::matrix::Matrix;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors raised while saving or loading network parameters.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed tensor file {file}: {reason}")]
    MalformedTensor { file: String, reason: String },
    #[error("Tensor shapes disagree: {0}")]
    ShapeMismatch(String),
    #[error("No weight files found in {0}")]
    EmptyModel(String),
}

impl Network {
    /// Writes every layer's weight matrix and bias column under `dir`,
    /// creating the directory if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), PersistenceError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        for (k, (weight, bias)) in self.weights().iter().zip(self.biases()).enumerate() {
            write_matrix(&dir.join(format!("weights{k}.txt")), weight)?;
            write_matrix(&dir.join(format!("biases{k}.txt")), bias)?;
        }
        Ok(())
    }

    /// Reads parameters previously written by [`Network::save`].
    ///
    /// Layer widths are inferred from the tensor shapes; weight and bias
    /// files must agree with each other and chain consistently from one
    /// transition to the next.
    pub fn load<P: AsRef<Path>>(
        dir: P,
        learning_rate: f64,
        lambda: f64,
    ) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref();

        let mut weights = Vec::new();
        let mut biases = Vec::new();
        for k in 0.. {
            let weight_path = dir.join(format!("weights{k}.txt"));
            if !weight_path.exists() {
                break;
            }
            weights.push(read_matrix(&weight_path)?);
            biases.push(read_matrix(&dir.join(format!("biases{k}.txt")))?);
        }

        if weights.is_empty() {
            return Err(PersistenceError::EmptyModel(dir.display().to_string()));
        }

        let mut layers = vec![weights[0].cols()];
        for (k, (weight, bias)) in weights.iter().zip(biases.iter()).enumerate() {
            if weight.cols() != layers[k] {
                return Err(PersistenceError::ShapeMismatch(format!(
                    "weights{k} expects {} inputs but the previous layer has {} outputs",
                    weight.cols(),
                    layers[k]
                )));
            }
            if bias.cols() != 1 || bias.rows() != weight.rows() {
                return Err(PersistenceError::ShapeMismatch(format!(
                    "biases{k} is {}x{} but weights{k} has {} rows",
                    bias.rows(),
                    bias.cols(),
                    weight.rows()
                )));
            }
            layers.push(weight.rows());
        }

        Ok(Network::from_parameters(
            layers,
            weights,
            biases,
            learning_rate,
            lambda,
        ))
    }
}

fn write_matrix(path: &Path, matrix: &Matrix) -> Result<(), PersistenceError> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for i in 0..matrix.rows() {
        let row = (0..matrix.cols())
            .map(|j| matrix.get(i, j).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

fn read_matrix(path: &Path) -> Result<Matrix, PersistenceError> {
    let malformed = |reason: String| PersistenceError::MalformedTensor {
        file: path.display().to_string(),
        reason,
    };

    let text = fs::read_to_string(path)?;
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| malformed(format!("line {}: {e}", line_idx + 1)))?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(malformed("no rows".into()));
    }
    let cols = rows[0].len();
    if rows.iter().any(|row| row.len() != cols) {
        return Err(malformed("rows have differing lengths".into()));
    }

    let row_count = rows.len();
    let data = rows.into_iter().flatten().collect();
    Ok(Matrix::new(row_count, cols, data))
}
