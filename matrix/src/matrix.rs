use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense row-major matrix of `f64` values.
///
/// Batches of examples are stored one example per column, so a batch of
/// `n` input vectors of length `d` is a `(d, n)` matrix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Matrix {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) data: Vec<f64>,
}

impl Matrix {
    #[must_use]
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "Data length must match rows * cols"
        );
        Self { rows, cols, data }
    }

    #[inline(always)]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "Index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Fills a new matrix with draws from the standard normal distribution.
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.sample(StandardNormal))
            .collect();

        Self { rows, cols, data }
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; cols * rows],
        }
    }

    fn zip_with<F>(&self, other: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.rows, other.rows, "Matrix rows must match");
        assert_eq!(self.cols, other.cols, "Matrix columns must match");

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    #[must_use]
    pub fn add(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a + b)
    }

    #[must_use]
    pub fn subtract(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a - b)
    }

    #[must_use]
    pub fn elementwise_multiply(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a * b)
    }

    #[must_use]
    pub fn dot_multiply(&self, other: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, other.rows,
            "Invalid matrix dimensions for multiplication"
        );

        // Transpose the right-hand side so both operands are walked row-wise.
        let other_t = other.transpose();
        let mut data = Vec::with_capacity(self.rows * other.cols);

        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            for j in 0..other.cols {
                let col = &other_t.data[j * other.rows..(j + 1) * other.rows];
                data.push(row.iter().zip(col).map(|(a, b)| a * b).sum());
            }
        }

        Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        }
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.rows * self.cols];

        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }

        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let data = self.data.iter().map(|&x| f(x)).collect();

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    #[must_use]
    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Adds a single-column matrix to every column of `self`.
    #[must_use]
    pub fn add_column(&self, column: &Matrix) -> Matrix {
        assert_eq!(column.cols, 1, "Broadcast operand must be a single column");
        assert_eq!(self.rows, column.rows, "Matrix rows must match");

        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(idx, &x)| x + column.data[idx / self.cols])
            .collect();

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    /// Sums every row across all columns into a single-column matrix.
    #[must_use]
    pub fn row_sum(&self) -> Matrix {
        let data = (0..self.rows)
            .map(|i| self.data[i * self.cols..(i + 1) * self.cols].iter().sum())
            .collect();

        Matrix {
            rows: self.rows,
            cols: 1,
            data,
        }
    }

    /// Copies the selected columns, in the given order, into a new matrix.
    #[must_use]
    pub fn gather_columns(&self, indices: &[usize]) -> Matrix {
        assert!(
            indices.iter().all(|&c| c < self.cols),
            "Column index out of bounds"
        );

        let mut data = Vec::with_capacity(self.rows * indices.len());
        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            data.extend(indices.iter().map(|&c| row[c]));
        }

        Matrix {
            rows: self.rows,
            cols: indices.len(),
            data,
        }
    }

    /// Row index of the largest value in each column.
    #[must_use]
    pub fn column_argmax(&self) -> Vec<usize> {
        assert!(self.rows > 0, "Cannot take the argmax of an empty column");

        (0..self.cols)
            .map(|j| {
                let mut best = 0;
                for i in 1..self.rows {
                    if self.data[i * self.cols + j] > self.data[best * self.cols + j] {
                        best = i;
                    }
                }
                best
            })
            .collect()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}

impl From<Vec<f64>> for Matrix {
    fn from(vec: Vec<f64>) -> Self {
        let rows = vec.len();
        Matrix {
            rows,
            cols: 1,
            data: vec,
        }
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                write!(f, "{:8.4}", self.data[i * self.cols + j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
