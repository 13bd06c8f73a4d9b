// Copyright © 2024.  Modulus Labs, Inc.

// Restricted Use License

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the ìSoftwareî), to use the Software internally for evaluation, non-production purposes only.  Any redistribution, reproduction, modification, sublicensing, publication, or other use of the Software is strictly prohibited.  In addition, usage of the Software is subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED ìAS ISî, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! Training and architecture configuration.

use serde::{Deserialize, Serialize};

use crate::{activation::ActivationFunction, error::MlpError};

/// When the layers are updated during an epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSchedule {
    /// Accumulate over the whole training set, then update once per epoch
    #[default]
    FullBatch,
    /// Update after every sample, in order
    PerSample,
}

/// Parameters of the gradient-descent loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the training set
    pub epochs: usize,
    /// Step size applied to both weights and bias
    pub learning_rate: f64,
    pub schedule: UpdateSchedule,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            learning_rate: 1.0,
            schedule: UpdateSchedule::default(),
        }
    }
}

impl TrainingConfig {
    /// Full-batch training with the given epoch count and learning rate.
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        Self {
            epochs,
            learning_rate,
            schedule: UpdateSchedule::FullBatch,
        }
    }

    pub fn with_schedule(mut self, schedule: UpdateSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Reject parameters the loop cannot use.
    pub fn validate(&self) -> Result<(), MlpError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(MlpError::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Shape and activation of one layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub inputs: usize,
    pub outputs: usize,
    #[serde(default)]
    pub activation: ActivationFunction,
}

/// Architecture of a randomly initialized network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub layers: Vec<LayerConfig>,
}

impl NetworkConfig {
    /// Check the architecture without creating any secret.
    pub fn validate(&self) -> Result<(), MlpError> {
        if let Some(empty) = self
            .layers
            .iter()
            .position(|layer| layer.inputs == 0 || layer.outputs == 0)
        {
            return Err(MlpError::EmptyLayer(empty));
        }
        check_architecture(
            self.layers
                .iter()
                .map(|layer| (layer.inputs, layer.outputs, layer.activation)),
        )
    }
}

/// Checks shared by every way of assembling a network: at least one layer, each layer
/// takes as many inputs as the previous one produces, and softmax only comes last.
pub(crate) fn check_architecture(
    layers: impl ExactSizeIterator<Item = (usize, usize, ActivationFunction)>,
) -> Result<(), MlpError> {
    let count = layers.len();
    if count == 0 {
        return Err(MlpError::EmptyNetwork);
    }
    let mut previous_outputs = None;
    for (index, (inputs, outputs, activation)) in layers.enumerate() {
        if let Some(actual) = previous_outputs {
            if actual != inputs {
                return Err(MlpError::LayerMismatch {
                    layer: index,
                    expected: inputs,
                    actual,
                });
            }
        }
        if activation == ActivationFunction::Softmax && index + 1 < count {
            return Err(MlpError::NonTerminalSoftmax(index));
        }
        previous_outputs = Some(outputs);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_config_from_json() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"epochs": 3, "schedule": "per_sample"}"#).unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.learning_rate, 1.0);
        assert_eq!(config.schedule, UpdateSchedule::PerSample);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_learning_rate() {
        assert!(TrainingConfig::new(1, 0.0).validate().is_err());
        assert!(TrainingConfig::new(1, f64::NAN).validate().is_err());
        assert!(TrainingConfig::new(1, 0.1).validate().is_ok());
    }

    #[test]
    fn test_network_config_rejects_unknown_activation() {
        let result = serde_json::from_str::<NetworkConfig>(
            r#"{"layers": [{"inputs": 2, "outputs": 3, "activation": "tanh"}]}"#,
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Unknown activation function: tanh"), "{}", message);
    }

    #[test]
    fn test_network_config_validation() {
        let config: NetworkConfig = serde_json::from_str(
            r#"{"layers": [
                {"inputs": 2, "outputs": 4, "activation": "relu"},
                {"inputs": 4, "outputs": 3}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.layers[1].activation, ActivationFunction::Sigmoid);
        assert!(config.validate().is_ok());

        let mismatched = NetworkConfig {
            layers: vec![
                LayerConfig {
                    inputs: 2,
                    outputs: 4,
                    activation: ActivationFunction::Relu,
                },
                LayerConfig {
                    inputs: 5,
                    outputs: 1,
                    activation: ActivationFunction::Sigmoid,
                },
            ],
        };
        assert_eq!(
            mismatched.validate(),
            Err(MlpError::LayerMismatch {
                layer: 1,
                expected: 5,
                actual: 4
            })
        );

        let softmax_first = NetworkConfig {
            layers: vec![
                LayerConfig {
                    inputs: 2,
                    outputs: 4,
                    activation: ActivationFunction::Softmax,
                },
                LayerConfig {
                    inputs: 4,
                    outputs: 1,
                    activation: ActivationFunction::Sigmoid,
                },
            ],
        };
        assert_eq!(softmax_first.validate(), Err(MlpError::NonTerminalSoftmax(0)));
        assert_eq!(NetworkConfig::default().validate(), Err(MlpError::EmptyNetwork));
    }
}
