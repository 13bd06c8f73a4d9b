// Copyright © 2024.  Modulus Labs, Inc.

// Restricted Use License

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the ìSoftwareî), to use the Software internally for evaluation, non-production purposes only.  Any redistribution, reproduction, modification, sublicensing, publication, or other use of the Software is strictly prohibited.  In addition, usage of the Software is subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED ìAS ISî, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! Activation functions and their derivatives over secret values.
//!
//! Comparisons inside the rectifier produce secret indicators which are folded back into
//! the arithmetic; nothing here branches on a secret.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use shroud::linalg::entrywise_unary;
use shroud_shared_types::Numeric;

use crate::error::MlpError;

/// The activation applied to the output of a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ActivationFunction {
    /// `max(0, x)`
    Relu,
    /// `1 / (1 + e^-x)`
    #[default]
    Sigmoid,
    /// `e^x_i / Σ_j e^x_j`; only valid on the last layer of a network
    Softmax,
}

impl ActivationFunction {
    /// Name used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Relu => "relu",
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Softmax => "softmax",
        }
    }

    /// Apply the activation to a whole layer output.
    pub fn apply<N: Numeric>(&self, numeric: &mut N, z: &[N::SFixed]) -> Vec<N::SFixed> {
        match self {
            ActivationFunction::Relu => entrywise_unary(numeric, z, relu::<N>),
            ActivationFunction::Sigmoid => entrywise_unary(numeric, z, sigmoid::<N>),
            ActivationFunction::Softmax => softmax(numeric, z),
        }
    }

    /// Coordinate-wise derivative at a layer output.
    ///
    /// The rectifier derivative reads the pre-activation `before`, the sigmoid derivative
    /// reads the post-activation `after`. Softmax has no coordinate-wise derivative and
    /// yields `None`: on the last layer its gradient is already folded into the error
    /// signal.
    pub fn derivative<N: Numeric>(
        &self,
        numeric: &mut N,
        before: &[N::SFixed],
        after: &[N::SFixed],
    ) -> Option<Vec<N::SFixed>> {
        match self {
            ActivationFunction::Relu => Some(entrywise_unary(numeric, before, relu_derivative::<N>)),
            ActivationFunction::Sigmoid => {
                Some(entrywise_unary(numeric, after, sigmoid_derivative::<N>))
            }
            ActivationFunction::Softmax => None,
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = MlpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu" => Ok(ActivationFunction::Relu),
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "softmax" => Ok(ActivationFunction::Softmax),
            _ => Err(MlpError::UnknownActivation(s.to_string())),
        }
    }
}

impl TryFrom<String> for ActivationFunction {
    type Error = MlpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// `x · (1 − 1[x ≤ 0])`
pub fn relu<N: Numeric>(numeric: &mut N, x: &N::SFixed) -> N::SFixed {
    numeric.seq(|seq| {
        let keep = relu_derivative(seq, x);
        seq.mult(x, &keep)
    })
}

/// `1 − 1[x ≤ 0]`
pub fn relu_derivative<N: Numeric>(numeric: &mut N, x: &N::SFixed) -> N::SFixed {
    numeric.seq(|seq| {
        let zero = seq.known(0.0);
        let non_positive = seq.leq(x, &zero);
        let non_positive = seq.from_sint(&non_positive);
        seq.known_sub(1.0, &non_positive)
    })
}

/// `1 / (1 + e^-x)`
pub fn sigmoid<N: Numeric>(numeric: &mut N, x: &N::SFixed) -> N::SFixed {
    numeric.seq(|seq| {
        let negated = seq.mult_known(-1.0, x);
        let exp = seq.exp(&negated);
        let denominator = seq.add_known(1.0, &exp);
        seq.reciprocal(&denominator)
    })
}

/// `y · (1 − y)` where `y` is a sigmoid output
pub fn sigmoid_derivative<N: Numeric>(numeric: &mut N, y: &N::SFixed) -> N::SFixed {
    numeric.seq(|seq| {
        let complement = seq.known_sub(1.0, y);
        seq.mult(y, &complement)
    })
}

/// Normalized exponentials. No maximum is subtracted first, so large inputs can
/// overflow the fixed-point range.
pub fn softmax<N: Numeric>(numeric: &mut N, z: &[N::SFixed]) -> Vec<N::SFixed> {
    if z.is_empty() {
        return vec![];
    }
    numeric.seq(|seq| {
        let exps = seq.par(|par| z.iter().map(|x| par.exp(x)).collect_vec());
        let total = seq.sum(&exps);
        let inverse = seq.reciprocal(&total);
        seq.par(|par| exps.iter().map(|e| par.mult(e, &inverse)).collect_vec())
    })
}
