//! MNIST-in-CSV dataset loader.
//!
//! Reads row-oriented CSV files where each line is an integer label
//! followed by 784 raw pixel values (`label,p0,...,p783`). Pixels are
//! binarized against a fixed threshold and labels are one-hot encoded.
//! The whole set is held in memory as column-per-example matrices ready
//! for batched training.

use indicatif::{ProgressBar, ProgressStyle};
use matrix::matrix::Matrix;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

pub const INPUT_NODES: usize = 784;
pub const OUTPUT_NODES: usize = 10;

/// Raw pixel values above this binarize to 1.0, everything else to 0.0.
pub const BINARIZE_THRESHOLD: f64 = 50.0;

/// Errors that can occur while handling MNIST data
#[derive(Debug, Error)]
pub enum MnistError {
    /// Wrapper for standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error for rows whose label or pixel fields do not parse
    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
    /// Error for rows with the wrong number of pixel values
    #[error("Row {row} has {actual} pixel values, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// Error for labels outside the class range
    #[error("Label {label} on row {row} is outside 0..{num_classes}")]
    LabelOutOfRange {
        row: usize,
        label: i64,
        num_classes: usize,
    },
    /// Error for mismatches between inputs, targets and labels
    #[error("Data mismatch: {0}")]
    DataMismatch(String),
}

/// A labelled dataset in column-per-example matrix form.
///
/// `inputs` is `(INPUT_NODES, n)`, `targets` the one-hot
/// `(OUTPUT_NODES, n)` encoding of `labels`. Read-only after loading;
/// training reorders examples through index permutations, never by
/// mutating the matrices.
#[derive(Debug)]
pub struct MnistData {
    inputs: Matrix,
    targets: Matrix,
    labels: Vec<usize>,
}

impl MnistData {
    /// Creates a dataset from pre-built matrices, validating that the
    /// three parts describe the same examples.
    pub fn new(inputs: Matrix, targets: Matrix, labels: Vec<usize>) -> Result<Self, MnistError> {
        if inputs.cols() != labels.len() || targets.cols() != labels.len() {
            return Err(MnistError::DataMismatch(format!(
                "{} input columns and {} target columns for {} labels",
                inputs.cols(),
                targets.cols(),
                labels.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&label| label >= targets.rows()) {
            return Err(MnistError::DataMismatch(format!(
                "label {} does not fit {} target rows",
                label,
                targets.rows()
            )));
        }
        Ok(Self {
            inputs,
            targets,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    pub fn targets(&self) -> &Matrix {
        &self.targets
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}

/// Creates a progress spinner with a consistent style
pub(crate) fn create_progress_spinner(message: &'static str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}: {pos} rows")
            .unwrap(),
    );
    progress.set_message(message);
    progress
}

/// Loads a CSV dataset of `label,p0,...,p783` rows.
///
/// Every pixel is binarized against [`BINARIZE_THRESHOLD`] at load time.
/// Any malformed row (wrong field count, unparsable number, label outside
/// `0..10`) aborts the load; partially-read datasets are never returned.
pub fn load_csv(path: impl AsRef<Path>) -> Result<MnistData, MnistError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let progress = create_progress_spinner("Loading");

    let mut labels: Vec<usize> = Vec::new();
    let mut examples: Vec<Vec<f64>> = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line_idx + 1;

        let mut fields = line.split(',');
        let label: i64 = fields
            .next()
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|e| MnistError::MalformedRow {
                row,
                reason: format!("label: {e}"),
            })?;
        if !(0..OUTPUT_NODES as i64).contains(&label) {
            return Err(MnistError::LabelOutOfRange {
                row,
                label,
                num_classes: OUTPUT_NODES,
            });
        }

        let mut pixels = Vec::with_capacity(INPUT_NODES);
        for field in fields {
            let value: f64 = field.trim().parse().map_err(|e| MnistError::MalformedRow {
                row,
                reason: format!("pixel {}: {e}", pixels.len()),
            })?;
            pixels.push(if value > BINARIZE_THRESHOLD { 1.0 } else { 0.0 });
        }
        if pixels.len() != INPUT_NODES {
            return Err(MnistError::RowLength {
                row,
                expected: INPUT_NODES,
                actual: pixels.len(),
            });
        }

        labels.push(label as usize);
        examples.push(pixels);
        progress.inc(1);
    }
    progress.finish_with_message("Loaded");

    if labels.is_empty() {
        return Err(MnistError::DataMismatch(format!(
            "no rows in {}",
            path.display()
        )));
    }

    let count = labels.len();
    let mut input_data = vec![0.0; INPUT_NODES * count];
    for (column, pixels) in examples.iter().enumerate() {
        for (row, &value) in pixels.iter().enumerate() {
            input_data[row * count + column] = value;
        }
    }
    let mut target_data = vec![0.0; OUTPUT_NODES * count];
    for (column, &label) in labels.iter().enumerate() {
        target_data[label * count + column] = 1.0;
    }

    MnistData::new(
        Matrix::new(INPUT_NODES, count, input_data),
        Matrix::new(OUTPUT_NODES, count, target_data),
        labels,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    /// One CSV row: the label followed by 784 pixel values, all zero
    /// except the listed `(index, value)` overrides.
    fn csv_row(label: usize, overrides: &[(usize, i64)]) -> String {
        let mut pixels = vec![0i64; INPUT_NODES];
        for &(index, value) in overrides {
            pixels[index] = value;
        }
        let mut fields = vec![label.to_string()];
        fields.extend(pixels.iter().map(|p| p.to_string()));
        fields.join(",")
    }

    fn write_csv(rows: &[String]) -> Result<assert_fs::NamedTempFile, Box<dyn std::error::Error>> {
        let file = assert_fs::NamedTempFile::new("data.csv")?;
        file.write_str(&(rows.join("\n") + "\n"))?;
        Ok(file)
    }

    #[test]
    fn test_load_csv_shapes_and_labels() -> Result<(), Box<dyn std::error::Error>> {
        let file = write_csv(&[
            csv_row(5, &[(0, 255), (1, 128)]),
            csv_row(0, &[(783, 200)]),
        ])?;

        let data = load_csv(file.path())?;

        assert_eq!(data.len(), 2);
        assert_eq!((data.inputs().rows(), data.inputs().cols()), (784, 2));
        assert_eq!((data.targets().rows(), data.targets().cols()), (10, 2));
        assert_eq!(data.labels(), &[5, 0]);

        // One-hot targets line up with the labels.
        assert_eq!(data.targets().get(5, 0), 1.0);
        assert_eq!(data.targets().get(0, 1), 1.0);
        assert_eq!(data.targets().get(0, 0), 0.0);
        Ok(())
    }

    #[test]
    fn test_load_csv_binarizes_pixels() -> Result<(), Box<dyn std::error::Error>> {
        // 51 is just above the threshold, 50 just at it.
        let file = write_csv(&[csv_row(1, &[(0, 255), (1, 51), (2, 50), (3, 1)])])?;

        let data = load_csv(file.path())?;

        assert_eq!(data.inputs().get(0, 0), 1.0);
        assert_eq!(data.inputs().get(1, 0), 1.0);
        assert_eq!(data.inputs().get(2, 0), 0.0);
        assert_eq!(data.inputs().get(3, 0), 0.0);
        assert_eq!(data.inputs().get(4, 0), 0.0);
        Ok(())
    }

    #[test]
    fn test_load_csv_rejects_short_row() -> Result<(), Box<dyn std::error::Error>> {
        let file = assert_fs::NamedTempFile::new("data.csv")?;
        file.write_str("3,255,0,0\n")?;

        match load_csv(file.path()) {
            Err(MnistError::RowLength {
                row,
                expected,
                actual,
            }) => {
                assert_eq!(row, 1);
                assert_eq!(expected, 784);
                assert_eq!(actual, 3);
            }
            other => panic!("Expected RowLength error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_load_csv_rejects_bad_label() -> Result<(), Box<dyn std::error::Error>> {
        let file = write_csv(&[csv_row(0, &[]).replacen('0', "12", 1)])?;

        match load_csv(file.path()) {
            Err(MnistError::LabelOutOfRange { label, .. }) => assert_eq!(label, 12),
            other => panic!("Expected LabelOutOfRange error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_load_csv_rejects_unparsable_pixel() -> Result<(), Box<dyn std::error::Error>> {
        let row = csv_row(3, &[]).replacen(",0,", ",oops,", 1);
        let file = write_csv(&[row])?;

        assert!(matches!(
            load_csv(file.path()),
            Err(MnistError::MalformedRow { row: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_load_csv_rejects_empty_file() -> Result<(), Box<dyn std::error::Error>> {
        let file = assert_fs::NamedTempFile::new("data.csv")?;
        file.write_str("")?;

        assert!(matches!(
            load_csv(file.path()),
            Err(MnistError::DataMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn test_load_csv_missing_file_is_io_error() {
        assert!(matches!(
            load_csv("/definitely/not/here.csv"),
            Err(MnistError::Io(_))
        ));
    }

    #[test]
    fn test_mnist_data_new_mismatch() {
        let inputs = Matrix::zeros(784, 2);
        let targets = Matrix::zeros(10, 2);

        let result = MnistData::new(inputs, targets, vec![1]);
        assert!(matches!(result, Err(MnistError::DataMismatch(_))));
    }

    #[test]
    fn test_mnist_data_rejects_label_beyond_classes() {
        let inputs = Matrix::zeros(784, 1);
        let targets = Matrix::zeros(10, 1);

        let result = MnistData::new(inputs, targets, vec![10]);
        assert!(matches!(result, Err(MnistError::DataMismatch(_))));
    }
}
