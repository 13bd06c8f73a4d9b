//! Dense row-major matrices with public shape.

use itertools::Itertools;

use super::LinAlgError;

/// A `rows x cols` matrix stored row-major.
///
/// The shape is public metadata; the entries are whatever the caller stores in them,
/// usually secret handles.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    entries: Vec<T>,
}

impl<T> Matrix<T> {
    /// Wrap row-major `entries` as a `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize, entries: Vec<T>) -> Result<Self, LinAlgError> {
        if rows == 0 || cols == 0 {
            return Err(LinAlgError::EmptyInput);
        }
        if entries.len() != rows * cols {
            return Err(LinAlgError::DimensionMismatch {
                expected: rows * cols,
                actual: entries.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            entries,
        })
    }

    /// Build a matrix by evaluating `entry(i, j)` for every position in row-major order.
    pub fn build(
        rows: usize,
        cols: usize,
        mut entry: impl FnMut(usize, usize) -> T,
    ) -> Result<Self, LinAlgError> {
        let entries = (0..rows)
            .cartesian_product(0..cols)
            .map(|(i, j)| entry(i, j))
            .collect_vec();
        Self::new(rows, cols, entries)
    }

    /// Build a matrix from its rows, all of which must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, LinAlgError> {
        let num_rows = rows.len();
        let num_cols = rows.first().map_or(0, Vec::len);
        if let Some((row, bad)) = rows.iter().find_position(|row| row.len() != num_cols) {
            return Err(LinAlgError::RaggedMatrix {
                row,
                expected: num_cols,
                actual: bad.len(),
            });
        }
        Self::new(num_rows, num_cols, rows.into_iter().flatten().collect())
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All entries in row-major order
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Entry at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.entries.get(row * self.cols + col)
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> Option<&[T]> {
        if i >= self.rows {
            return None;
        }
        Some(&self.entries[i * self.cols..(i + 1) * self.cols])
    }

    /// Iterate over the rows in order.
    pub fn row_iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.entries.chunks(self.cols)
    }

    /// Iterate down column `j` without materializing it.
    pub fn column_iter(&self, j: usize) -> impl Iterator<Item = &T> + '_ {
        let len = if j < self.cols { self.rows } else { 0 };
        self.entries.iter().skip(j).step_by(self.cols).take(len)
    }

    /// Column `j`, cloned out of the matrix.
    pub fn column(&self, j: usize) -> Option<Vec<T>>
    where
        T: Clone,
    {
        if j >= self.cols {
            return None;
        }
        Some(self.column_iter(j).cloned().collect())
    }

    /// Apply `f` to every entry, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            entries: self.entries.iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<i32> {
        Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap()
    }

    #[test]
    fn test_shape_and_access() {
        let m = sample();
        assert_eq!((m.rows(), m.cols()), (2, 3));
        assert_eq!(m.row(1), Some(&[4, 5, 6][..]));
        assert_eq!(m.column(2), Some(vec![3, 6]));
        assert_eq!(m.get(0, 1), Some(&2));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.column(3), None);
        assert_eq!(m.column_iter(5).count(), 0);
    }

    #[test]
    fn test_build_matches_from_rows() {
        let built = Matrix::build(2, 3, |i, j| (3 * i + j + 1) as i32).unwrap();
        assert_eq!(built, sample());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Matrix::from_rows(vec![vec![1, 2], vec![3]]);
        assert_eq!(
            result,
            Err(LinAlgError::RaggedMatrix {
                row: 1,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            Matrix::<i32>::from_rows(vec![]),
            Err(LinAlgError::EmptyInput)
        );
        assert_eq!(
            Matrix::new(2, 2, vec![1, 2, 3]),
            Err(LinAlgError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
