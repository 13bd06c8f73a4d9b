//! Layered networks: forward and backward propagation and the gradient-descent loop.

use std::fmt;

use itertools::Itertools;
use rand::Rng;
use shroud_shared_types::Numeric;
use tracing::{debug, info, instrument};

use crate::{
    config::{check_architecture, NetworkConfig, TrainingConfig, UpdateSchedule},
    error::MlpError,
    layer::Layer,
    propagation::{BackPropagationOutput, ForwardPropagationOutput, Gradient},
};

/// A feed-forward network over secret values.
///
/// The network owns its layers. Every layer takes as many inputs as the layer before it
/// produces, and a softmax layer can only come last.
pub struct Mlp<N: Numeric> {
    layers: Vec<Layer<N>>,
}

/// `label − output`, the error signal of a squared-error objective.
pub fn output_error<N: Numeric>(
    numeric: &mut N,
    label: &[N::SFixed],
    output: &[N::SFixed],
) -> Vec<N::SFixed> {
    numeric.par(|par| {
        label
            .iter()
            .zip(output)
            .map(|(expected, actual)| par.sub(expected, actual))
            .collect_vec()
    })
}

impl<N: Numeric> Mlp<N> {
    /// Assemble a network from layers, checking that they fit together.
    pub fn new(layers: Vec<Layer<N>>) -> Result<Self, MlpError> {
        check_architecture(
            layers
                .iter()
                .map(|layer| (layer.inputs(), layer.outputs(), layer.activation())),
        )?;
        Ok(Self { layers })
    }

    /// A randomly initialized network with the architecture in `config`.
    pub fn random<R: Rng>(
        numeric: &mut N,
        config: &NetworkConfig,
        rng: &mut R,
    ) -> Result<Self, MlpError> {
        config.validate()?;
        let layers = config
            .layers
            .iter()
            .map(|layer| Layer::random(numeric, layer.inputs, layer.outputs, layer.activation, rng))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(layers)
    }

    pub fn layers(&self) -> &[Layer<N>] {
        &self.layers
    }

    /// The layer at `index`, if there is one.
    pub fn layer(&self, index: usize) -> Option<&Layer<N>> {
        self.layers.get(index)
    }

    /// Length of the input vector
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::inputs)
    }

    /// Length of the output vector
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::outputs)
    }

    fn check_input(&self, input: &[N::SFixed]) -> Result<(), MlpError> {
        if input.len() != self.input_size() {
            return Err(MlpError::InputLength {
                expected: self.input_size(),
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// Run every layer in order, keeping what each one computed.
    pub fn forward_propagation(
        &self,
        numeric: &mut N,
        input: &[N::SFixed],
    ) -> Result<Vec<ForwardPropagationOutput<N>>, MlpError> {
        self.check_input(input)?;
        numeric.seq(|seq| {
            let mut outputs: Vec<ForwardPropagationOutput<N>> = Vec::with_capacity(self.layers.len());
            for layer in &self.layers {
                let x = outputs
                    .last()
                    .map_or(input, |previous| previous.after_activation.as_slice());
                let output = layer.forward_propagation(seq, x)?;
                outputs.push(output);
            }
            Ok(outputs)
        })
    }

    /// The output of the network on `input`.
    pub fn apply(&self, numeric: &mut N, input: &[N::SFixed]) -> Result<Vec<N::SFixed>, MlpError> {
        let mut outputs = self.forward_propagation(numeric, input)?;
        outputs
            .pop()
            .map(|output| output.after_activation)
            .ok_or(MlpError::EmptyNetwork)
    }

    /// Error and delta of every layer, given the forward records of one sample and the
    /// error signal at the output.
    ///
    /// Records are returned in layer order. The error of the network input is never
    /// computed, so the first record holds the error arriving at the first layer's
    /// output.
    pub fn back_propagation(
        &self,
        numeric: &mut N,
        outputs: &[ForwardPropagationOutput<N>],
        error: &[N::SFixed],
    ) -> Result<Vec<BackPropagationOutput<N>>, MlpError> {
        if outputs.len() != self.layers.len() {
            return Err(MlpError::RecordLength {
                expected: self.layers.len(),
                actual: outputs.len(),
            });
        }
        if error.len() != self.output_size() {
            return Err(MlpError::ErrorLength {
                expected: self.output_size(),
                actual: error.len(),
            });
        }

        numeric.seq(|seq| {
            let mut records = Vec::with_capacity(self.layers.len());
            let mut error = error.to_vec();
            for (index, (layer, output)) in self.layers.iter().zip(outputs).enumerate().rev() {
                let delta = layer.delta(seq, output, &error)?;
                let next_error = match index {
                    0 => None,
                    _ => Some(layer.back_propagation(seq, &delta)?),
                };
                records.push(BackPropagationOutput { error, delta });
                match next_error {
                    Some(next_error) => error = next_error,
                    None => break,
                }
            }
            records.reverse();
            Ok(records)
        })
    }

    /// Train with the full-batch schedule and the `label − output` error signal.
    pub fn fit(
        &mut self,
        numeric: &mut N,
        samples: &[Vec<N::SFixed>],
        labels: &[Vec<N::SFixed>],
        epochs: usize,
        learning_rate: f64,
    ) -> Result<&mut Self, MlpError> {
        let config = TrainingConfig::new(epochs, learning_rate);
        self.fit_with(numeric, samples, labels, &config, output_error::<N>)
    }

    /// Gradient descent with an explicit configuration and error signal.
    ///
    /// `terminal_error(numeric, label, output)` must return the negative derivative of
    /// the loss with respect to the network output. Runs exactly `config.epochs` epochs.
    #[instrument(skip_all, fields(epochs = config.epochs, samples = samples.len(), schedule = ?config.schedule))]
    pub fn fit_with<F>(
        &mut self,
        numeric: &mut N,
        samples: &[Vec<N::SFixed>],
        labels: &[Vec<N::SFixed>],
        config: &TrainingConfig,
        mut terminal_error: F,
    ) -> Result<&mut Self, MlpError>
    where
        F: FnMut(&mut N, &[N::SFixed], &[N::SFixed]) -> Vec<N::SFixed>,
    {
        config.validate()?;
        self.check_training_set(samples, labels)?;

        // Layers are only replaced once every epoch has gone through
        let mut trained = self.clone();
        numeric.seq(|seq| {
            for epoch in 0..config.epochs {
                info!(
                    "Fitting model: {}% (epoch {}/{})",
                    100 * epoch / config.epochs,
                    epoch,
                    config.epochs
                );
                match config.schedule {
                    UpdateSchedule::FullBatch => {
                        trained.layers = trained.full_batch_epoch(
                            seq,
                            samples,
                            labels,
                            config.learning_rate,
                            &mut terminal_error,
                        )?;
                    }
                    UpdateSchedule::PerSample => {
                        trained.per_sample_epoch(seq, samples, labels, config, epoch, &mut terminal_error)?;
                    }
                }
            }
            Ok::<_, MlpError>(())
        })?;
        self.layers = trained.layers;

        info!("Fitting model: 100% ({} epochs)", config.epochs);
        Ok(self)
    }

    fn check_training_set(
        &self,
        samples: &[Vec<N::SFixed>],
        labels: &[Vec<N::SFixed>],
    ) -> Result<(), MlpError> {
        if samples.len() != labels.len() {
            return Err(MlpError::SampleLabelCount {
                samples: samples.len(),
                labels: labels.len(),
            });
        }
        if samples.is_empty() {
            return Err(MlpError::EmptyTrainingSet);
        }
        for sample in samples {
            self.check_input(sample)?;
        }
        if let Some((sample, label)) = labels
            .iter()
            .find_position(|label| label.len() != self.output_size())
        {
            return Err(MlpError::LabelLength {
                sample,
                expected: self.output_size(),
                actual: label.len(),
            });
        }
        Ok(())
    }

    /// Forward, error, backward for one sample; returns the descent direction of every
    /// layer.
    fn sample_gradients<F>(
        &self,
        numeric: &mut N,
        sample: &[N::SFixed],
        label: &[N::SFixed],
        terminal_error: &mut F,
    ) -> Result<Vec<Gradient<N>>, MlpError>
    where
        F: FnMut(&mut N, &[N::SFixed], &[N::SFixed]) -> Vec<N::SFixed>,
    {
        numeric.seq(|seq| {
            let outputs = self.forward_propagation(seq, sample)?;
            let prediction = outputs
                .last()
                .map(|output| output.after_activation.as_slice())
                .ok_or(MlpError::EmptyNetwork)?;
            let error = terminal_error(seq, label, prediction);
            let records = self.back_propagation(seq, &outputs, &error)?;

            seq.par(|par| {
                records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| {
                        let input = match index {
                            0 => sample,
                            _ => outputs[index - 1].after_activation.as_slice(),
                        };
                        Gradient::from_delta(par, &record.delta, input).map_err(MlpError::from)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
        })
    }

    fn full_batch_epoch<F>(
        &self,
        numeric: &mut N,
        samples: &[Vec<N::SFixed>],
        labels: &[Vec<N::SFixed>],
        learning_rate: f64,
        terminal_error: &mut F,
    ) -> Result<Vec<Layer<N>>, MlpError>
    where
        F: FnMut(&mut N, &[N::SFixed], &[N::SFixed]) -> Vec<N::SFixed>,
    {
        numeric.seq(|seq| {
            let per_sample = seq.par(|par| {
                samples
                    .iter()
                    .zip(labels)
                    .map(|(sample, label)| self.sample_gradients(par, sample, label, terminal_error))
                    .collect::<Result<Vec<_>, _>>()
            })?;

            seq.par(|par| {
                self.layers
                    .iter()
                    .enumerate()
                    .map(|(index, layer)| {
                        let gradients = per_sample
                            .iter()
                            .map(|gradients| gradients[index].clone())
                            .collect_vec();
                        par.seq(|seq| {
                            let total = Gradient::sum(seq, &gradients)?;
                            debug!(layer = index, "Updating layer from {} samples", gradients.len());
                            layer.update(seq, &total, learning_rate)
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
        })
    }

    fn per_sample_epoch<F>(
        &mut self,
        numeric: &mut N,
        samples: &[Vec<N::SFixed>],
        labels: &[Vec<N::SFixed>],
        config: &TrainingConfig,
        epoch: usize,
        terminal_error: &mut F,
    ) -> Result<(), MlpError>
    where
        F: FnMut(&mut N, &[N::SFixed], &[N::SFixed]) -> Vec<N::SFixed>,
    {
        let total_steps = config.epochs * samples.len();
        numeric.seq(|seq| {
            for (index, (sample, label)) in samples.iter().zip(labels).enumerate() {
                debug!(
                    "Fitting model: {}% (epoch {}/{}, sample {}/{})",
                    100 * (epoch * samples.len() + index) / total_steps,
                    epoch,
                    config.epochs,
                    index,
                    samples.len()
                );
                let gradients = self.sample_gradients(seq, sample, label, terminal_error)?;
                let layers = seq.par(|par| {
                    self.layers
                        .iter()
                        .zip(&gradients)
                        .map(|(layer, gradient)| layer.update(par, gradient, config.learning_rate))
                        .collect::<Result<Vec<_>, _>>()
                })?;
                self.layers = layers;
            }
            Ok(())
        })
    }
}

impl<N: Numeric> Clone for Mlp<N> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<N: Numeric> fmt::Debug for Mlp<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mlp").field("layers", &self.layers).finish()
    }
}
