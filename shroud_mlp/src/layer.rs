// Copyright © 2024.  Modulus Labs, Inc.

// Restricted Use License

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the ìSoftwareî), to use the Software internally for evaluation, non-production purposes only.  Any redistribution, reproduction, modification, sublicensing, publication, or other use of the Software is strictly prohibited.  In addition, usage of the Software is subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED ìAS ISî, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! Fully connected layers.

use std::fmt;

use itertools::Itertools;
use rand::Rng;
use rand_distr::StandardNormal;
use shroud::linalg::{affine_map, check_len, entrywise_binary, scaled_step, transposed_action, Matrix};
use shroud_shared_types::Numeric;

use crate::{
    activation::ActivationFunction,
    error::MlpError,
    propagation::{ForwardPropagationOutput, Gradient},
};

/// A fully connected layer `x ↦ act(W·x + b)`.
///
/// `W` has one row per output neuron. Layers are never modified; training replaces them
/// with the result of [`Layer::update`].
pub struct Layer<N: Numeric> {
    weights: Matrix<N::SFixed>,
    bias: Vec<N::SFixed>,
    activation: ActivationFunction,
}

impl<N: Numeric> Layer<N> {
    /// Create a layer from secret weights and bias.
    pub fn new(
        weights: Matrix<N::SFixed>,
        bias: Vec<N::SFixed>,
        activation: ActivationFunction,
    ) -> Result<Self, MlpError> {
        if weights.rows() != bias.len() {
            return Err(MlpError::BiasMismatch {
                rows: weights.rows(),
                bias: bias.len(),
            });
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    /// Create a layer whose parameters are public constants.
    pub fn from_plain(
        numeric: &mut N,
        weights: &[Vec<f64>],
        bias: &[f64],
        activation: ActivationFunction,
    ) -> Result<Self, MlpError> {
        // --- Validate the plaintext shape before injecting anything ---
        let weights = Matrix::from_rows(weights.to_vec())?;
        if weights.rows() != bias.len() {
            return Err(MlpError::BiasMismatch {
                rows: weights.rows(),
                bias: bias.len(),
            });
        }
        let weights = weights.map(|w| numeric.known(*w));
        let bias = bias.iter().map(|b| numeric.known(*b)).collect_vec();
        Self::new(weights, bias, activation)
    }

    /// Create a layer with Gaussian weights scaled by `1 / outputs` and a zero bias.
    pub fn random<R: Rng>(
        numeric: &mut N,
        inputs: usize,
        outputs: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Result<Self, MlpError> {
        let scale = outputs as f64;
        let weights = Matrix::build(outputs, inputs, |_, _| {
            let sample: f64 = rng.sample(StandardNormal);
            numeric.known(sample / scale)
        })?;
        let bias = (0..outputs).map(|_| numeric.known(0.0)).collect_vec();
        Self::new(weights, bias, activation)
    }

    /// The weight matrix, one row per output
    pub fn weights(&self) -> &Matrix<N::SFixed> {
        &self.weights
    }

    pub fn bias(&self) -> &[N::SFixed] {
        &self.bias
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Number of inputs the layer takes
    pub fn inputs(&self) -> usize {
        self.weights.cols()
    }

    /// Number of outputs the layer produces
    pub fn outputs(&self) -> usize {
        self.weights.rows()
    }

    /// `W·x + b`
    pub fn affine(&self, numeric: &mut N, x: &[N::SFixed]) -> Result<Vec<N::SFixed>, MlpError> {
        check_len(self.inputs(), x.len()).map_err(|_| MlpError::InputLength {
            expected: self.inputs(),
            actual: x.len(),
        })?;
        Ok(affine_map(numeric, &self.weights, x, &self.bias)?)
    }

    /// Apply the activation of this layer.
    pub fn activate(&self, numeric: &mut N, z: &[N::SFixed]) -> Vec<N::SFixed> {
        self.activation.apply(numeric, z)
    }

    /// Run the layer on `x`, keeping the value before the activation as well.
    pub fn forward_propagation(
        &self,
        numeric: &mut N,
        x: &[N::SFixed],
    ) -> Result<ForwardPropagationOutput<N>, MlpError> {
        numeric.seq(|seq| {
            let before_activation = self.affine(seq, x)?;
            let after_activation = self.activate(seq, &before_activation);
            Ok(ForwardPropagationOutput {
                before_activation,
                after_activation,
            })
        })
    }

    /// `δ = error ⊙ act'` at the output recorded in `output`.
    ///
    /// For a softmax layer the error passes through unchanged.
    pub fn delta(
        &self,
        numeric: &mut N,
        output: &ForwardPropagationOutput<N>,
        error: &[N::SFixed],
    ) -> Result<Vec<N::SFixed>, MlpError> {
        check_len(self.outputs(), error.len()).map_err(|_| MlpError::ErrorLength {
            expected: self.outputs(),
            actual: error.len(),
        })?;
        numeric.seq(|seq| {
            let derivative = self.activation.derivative(
                seq,
                &output.before_activation,
                &output.after_activation,
            );
            match derivative {
                Some(derivative) => {
                    entrywise_binary(seq, error, &derivative, |seq, e, d| seq.mult(e, d))
                        .map_err(MlpError::from)
                }
                None => Ok(error.to_vec()),
            }
        })
    }

    /// The error arriving at the input of this layer, `Wᵀ·δ`.
    pub fn back_propagation(
        &self,
        numeric: &mut N,
        delta: &[N::SFixed],
    ) -> Result<Vec<N::SFixed>, MlpError> {
        Ok(transposed_action(numeric, &self.weights, delta)?)
    }

    /// A new layer with `W + η·ΔW` and `b + η·Δb`.
    pub fn update(
        &self,
        numeric: &mut N,
        gradient: &Gradient<N>,
        learning_rate: f64,
    ) -> Result<Self, MlpError> {
        check_len(self.outputs(), gradient.weights.rows())?;
        check_len(self.inputs(), gradient.weights.cols())?;
        check_len(self.outputs(), gradient.bias.len())?;

        let (weights, bias) = numeric.par(|par| {
            let weights = scaled_step(
                par,
                self.weights.entries(),
                learning_rate,
                gradient.weights.entries(),
            );
            let bias = scaled_step(par, &self.bias, learning_rate, &gradient.bias);
            (weights, bias)
        });
        let weights = Matrix::new(self.outputs(), self.inputs(), weights?)?;
        Self::new(weights, bias?, self.activation)
    }
}

impl<N: Numeric> Clone for Layer<N> {
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.clone(),
            bias: self.bias.clone(),
            activation: self.activation,
        }
    }
}

impl<N: Numeric> fmt::Debug for Layer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("inputs", &self.inputs())
            .field("outputs", &self.outputs())
            .field("activation", &self.activation)
            .finish()
    }
}
