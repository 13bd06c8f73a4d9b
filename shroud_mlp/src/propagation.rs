//! Per-sample records produced while propagating through a network.

use std::fmt;

use shroud::linalg::{outer_product, vector_sum, LinAlgError, Matrix};
use shroud_shared_types::Numeric;

/// What a layer computed for one sample on the way forward.
pub struct ForwardPropagationOutput<N: Numeric> {
    /// `W·x + b`
    pub before_activation: Vec<N::SFixed>,
    /// The activation applied to `before_activation`
    pub after_activation: Vec<N::SFixed>,
}

/// What a layer computed for one sample on the way back.
pub struct BackPropagationOutput<N: Numeric> {
    /// Error signal arriving at the layer output
    pub error: Vec<N::SFixed>,
    /// `error ⊙ activation'`
    pub delta: Vec<N::SFixed>,
}

/// Descent direction for one layer.
///
/// For a single sample this is `δ ⊗ a` for the weights and `δ` for the bias, where `a`
/// is the input the layer saw. Summing over samples gives the full-batch direction.
pub struct Gradient<N: Numeric> {
    /// Same shape as the layer weights
    pub weights: Matrix<N::SFixed>,
    /// Same length as the layer bias
    pub bias: Vec<N::SFixed>,
}

impl<N: Numeric> Gradient<N> {
    /// `(δ ⊗ input, δ)` for a single sample.
    pub fn from_delta(
        numeric: &mut N,
        delta: &[N::SFixed],
        input: &[N::SFixed],
    ) -> Result<Self, LinAlgError> {
        Ok(Self {
            weights: outer_product(numeric, delta, input)?,
            bias: delta.to_vec(),
        })
    }

    /// Coordinate-wise sum of gradients of the same shape.
    pub fn sum(numeric: &mut N, gradients: &[Self]) -> Result<Self, LinAlgError> {
        let first = gradients.first().ok_or(LinAlgError::EmptyInput)?;
        let (rows, cols) = (first.weights.rows(), first.weights.cols());

        let weight_terms = gradients
            .iter()
            .map(|gradient| gradient.weights.entries().to_vec())
            .collect::<Vec<_>>();
        let bias_terms = gradients
            .iter()
            .map(|gradient| gradient.bias.clone())
            .collect::<Vec<_>>();

        let (weights, bias) = numeric.par(|par| {
            let weights = vector_sum(par, &weight_terms);
            let bias = vector_sum(par, &bias_terms);
            (weights, bias)
        });
        Ok(Self {
            weights: Matrix::new(rows, cols, weights?)?,
            bias: bias?,
        })
    }
}

impl<N: Numeric> Clone for ForwardPropagationOutput<N> {
    fn clone(&self) -> Self {
        Self {
            before_activation: self.before_activation.clone(),
            after_activation: self.after_activation.clone(),
        }
    }
}

impl<N: Numeric> Clone for BackPropagationOutput<N> {
    fn clone(&self) -> Self {
        Self {
            error: self.error.clone(),
            delta: self.delta.clone(),
        }
    }
}

impl<N: Numeric> Clone for Gradient<N> {
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.clone(),
            bias: self.bias.clone(),
        }
    }
}

impl<N: Numeric> fmt::Debug for ForwardPropagationOutput<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardPropagationOutput")
            .field("before_activation", &self.before_activation)
            .field("after_activation", &self.after_activation)
            .finish()
    }
}

impl<N: Numeric> fmt::Debug for BackPropagationOutput<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackPropagationOutput")
            .field("error", &self.error)
            .field("delta", &self.delta)
            .finish()
    }
}
