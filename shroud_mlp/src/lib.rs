//! Feed-forward neural networks trained and evaluated over secret values.
//!
//! Everything here is written against the [`Numeric`](shroud_shared_types::Numeric)
//! trait: the network never sees a plaintext weight, activation or label, and only the
//! caller decides what to open.

pub mod activation;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod layer;
pub mod network;
pub mod propagation;


pub use activation::ActivationFunction;
pub use config::{LayerConfig, NetworkConfig, TrainingConfig, UpdateSchedule};
pub use error::MlpError;
pub use evaluation::{accuracy, predict};
pub use layer::Layer;
pub use network::{output_error, Mlp};
pub use propagation::{BackPropagationOutput, ForwardPropagationOutput, Gradient};
