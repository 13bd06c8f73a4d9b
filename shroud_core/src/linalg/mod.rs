//! Vector and matrix operations over secret fixed-point values.
//!
//! Every function checks the public shapes of its arguments before it touches a secret,
//! so a shape error never leaves a half-built computation behind. Independent
//! coordinates are built inside a parallel scope; the stages of a single coordinate are
//! built inside a sequential one.

pub mod matrix;

#[cfg(test)]
mod tests;

use itertools::Itertools;
use shroud_shared_types::Numeric;
use thiserror::Error;

pub use matrix::Matrix;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors to do with the public shapes of vectors and matrices
pub enum LinAlgError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    /// Two shapes that must agree do not
    DimensionMismatch {
        /// The length required by the other operand
        expected: usize,
        /// The length actually supplied
        actual: usize,
    },
    #[error("Row {row} has {actual} entries, expected {expected}")]
    /// Rows of different lengths
    RaggedMatrix {
        /// Index of the first offending row
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        actual: usize,
    },
    #[error("Empty input")]
    /// An operation that needs at least one element got none
    EmptyInput,
}

/// Check that a public length matches what the other operand requires.
pub fn check_len(expected: usize, actual: usize) -> Result<(), LinAlgError> {
    if expected != actual {
        return Err(LinAlgError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Products in one parallel batch, then their sum.
fn dot<'a, N: Numeric>(
    numeric: &mut N,
    pairs: impl IntoIterator<Item = (&'a N::SFixed, &'a N::SFixed)>,
) -> N::SFixed
where
    N::SFixed: 'a,
{
    numeric.seq(|seq| {
        let products = seq.par(|par| pairs.into_iter().map(|(a, b)| par.mult(a, b)).collect_vec());
        seq.sum(&products)
    })
}

/// `Σ a_i b_i`
pub fn inner_product<N: Numeric>(
    numeric: &mut N,
    a: &[N::SFixed],
    b: &[N::SFixed],
) -> Result<N::SFixed, LinAlgError> {
    check_len(a.len(), b.len())?;
    Ok(dot(numeric, a.iter().zip(b)))
}

/// `M · x`, one inner product per row.
pub fn vector_mult<N: Numeric>(
    numeric: &mut N,
    matrix: &Matrix<N::SFixed>,
    x: &[N::SFixed],
) -> Result<Vec<N::SFixed>, LinAlgError> {
    check_len(matrix.cols(), x.len())?;
    Ok(numeric.par(|par| {
        matrix
            .row_iter()
            .map(|row| dot(par, row.iter().zip(x)))
            .collect_vec()
    }))
}

/// `M · x + b`
pub fn affine_map<N: Numeric>(
    numeric: &mut N,
    matrix: &Matrix<N::SFixed>,
    x: &[N::SFixed],
    b: &[N::SFixed],
) -> Result<Vec<N::SFixed>, LinAlgError> {
    check_len(matrix.cols(), x.len())?;
    check_len(matrix.rows(), b.len())?;
    Ok(numeric.par(|par| {
        matrix
            .row_iter()
            .zip(b)
            .map(|(row, bias)| {
                par.seq(|seq| {
                    let product = dot(seq, row.iter().zip(x));
                    seq.add(&product, bias)
                })
            })
            .collect_vec()
    }))
}

/// `Mᵀ · y`, computed column by column without building the transpose.
pub fn transposed_action<N: Numeric>(
    numeric: &mut N,
    matrix: &Matrix<N::SFixed>,
    y: &[N::SFixed],
) -> Result<Vec<N::SFixed>, LinAlgError> {
    check_len(matrix.rows(), y.len())?;
    Ok(numeric.par(|par| {
        (0..matrix.cols())
            .map(|j| dot(par, matrix.column_iter(j).zip(y)))
            .collect_vec()
    }))
}

/// `a ⊗ b`, the `a.len() x b.len()` matrix of pairwise products.
pub fn outer_product<N: Numeric>(
    numeric: &mut N,
    a: &[N::SFixed],
    b: &[N::SFixed],
) -> Result<Matrix<N::SFixed>, LinAlgError> {
    if a.is_empty() || b.is_empty() {
        return Err(LinAlgError::EmptyInput);
    }
    let entries = numeric.par(|par| {
        a.iter()
            .cartesian_product(b)
            .map(|(x, y)| par.mult(x, y))
            .collect_vec()
    });
    Matrix::new(a.len(), b.len(), entries)
}

/// Apply a scalar function to every coordinate.
///
/// The coordinates form one parallel batch; whatever `f` builds for a single coordinate
/// runs as a sequential stage.
pub fn entrywise_unary<N, F>(numeric: &mut N, v: &[N::SFixed], mut f: F) -> Vec<N::SFixed>
where
    N: Numeric,
    F: FnMut(&mut N, &N::SFixed) -> N::SFixed,
{
    numeric.par(|par| {
        v.iter()
            .map(|x| par.seq(|seq| f(seq, x)))
            .collect_vec()
    })
}

/// Combine two vectors coordinate by coordinate.
pub fn entrywise_binary<N, F>(
    numeric: &mut N,
    a: &[N::SFixed],
    b: &[N::SFixed],
    mut f: F,
) -> Result<Vec<N::SFixed>, LinAlgError>
where
    N: Numeric,
    F: FnMut(&mut N, &N::SFixed, &N::SFixed) -> N::SFixed,
{
    check_len(a.len(), b.len())?;
    Ok(numeric.par(|par| {
        a.iter()
            .zip(b)
            .map(|(x, y)| par.seq(|seq| f(seq, x, y)))
            .collect_vec()
    }))
}

/// Coordinate-wise sum of equally long vectors.
pub fn vector_sum<N: Numeric>(
    numeric: &mut N,
    terms: &[Vec<N::SFixed>],
) -> Result<Vec<N::SFixed>, LinAlgError> {
    let len = terms.first().map(Vec::len).ok_or(LinAlgError::EmptyInput)?;
    for term in terms {
        check_len(len, term.len())?;
    }
    Ok(numeric.par(|par| {
        (0..len)
            .map(|i| {
                let column = terms.iter().map(|term| term[i].clone()).collect_vec();
                par.sum(&column)
            })
            .collect_vec()
    }))
}

/// `v + η · step`, with `η` public.
pub fn scaled_step<N: Numeric>(
    numeric: &mut N,
    v: &[N::SFixed],
    rate: f64,
    step: &[N::SFixed],
) -> Result<Vec<N::SFixed>, LinAlgError> {
    entrywise_binary(numeric, v, step, |seq, x, dx| {
        let scaled = seq.mult_known(rate, dx);
        seq.add(x, &scaled)
    })
}
