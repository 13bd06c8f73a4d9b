//! Prediction and accuracy of a trained network.

use itertools::Itertools;
use shroud::compare::arg_max;
use shroud_shared_types::Numeric;
use tracing::{debug, instrument};

use crate::{error::MlpError, network::Mlp};

/// Secret index of the largest output of `network` on `input`.
pub fn predict<N: Numeric>(
    numeric: &mut N,
    network: &Mlp<N>,
    input: &[N::SFixed],
) -> Result<N::SInt, MlpError> {
    numeric.seq(|seq| {
        let output = network.apply(seq, input)?;
        debug!(classes = output.len(), "Selecting predicted class");
        Ok(arg_max(seq, &output)?)
    })
}

/// Secret number of samples whose predicted class equals their label.
#[instrument(skip_all, fields(samples = samples.len()))]
pub fn accuracy<N: Numeric>(
    numeric: &mut N,
    network: &Mlp<N>,
    samples: &[Vec<N::SFixed>],
    labels: &[N::SInt],
) -> Result<N::SInt, MlpError> {
    if samples.len() != labels.len() {
        return Err(MlpError::SampleLabelCount {
            samples: samples.len(),
            labels: labels.len(),
        });
    }
    if let Some(sample) = samples
        .iter()
        .find(|sample| sample.len() != network.input_size())
    {
        return Err(MlpError::InputLength {
            expected: network.input_size(),
            actual: sample.len(),
        });
    }

    numeric.seq(|seq| {
        let predictions = seq.par(|par| {
            samples
                .iter()
                .map(|sample| predict(par, network, sample))
                .collect::<Result<Vec<_>, _>>()
        })?;
        let hits = seq.par(|par| {
            predictions
                .iter()
                .zip(labels)
                .map(|(predicted, label)| par.equals(predicted, label))
                .collect_vec()
        });
        Ok(seq.sum_int(&hits))
    })
}
