use shroud::linalg::LinAlgError;
use shroud_shared_types::NumericError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Errors to do with building, training or evaluating a network
pub enum MlpError {
    #[error("A network needs at least one layer")]
    /// No layers were supplied
    EmptyNetwork,
    #[error("Layer {layer} takes {expected} inputs but the layer before it has {actual} outputs")]
    /// Adjacent layers do not fit together
    LayerMismatch {
        /// Index of the layer whose input does not fit
        layer: usize,
        /// Number of inputs that layer takes
        expected: usize,
        /// Number of outputs of the layer before it
        actual: usize,
    },
    #[error("Layer has {rows} weight rows but {bias} bias entries")]
    /// Bias vector and weight matrix disagree on the output count
    BiasMismatch {
        /// Rows of the weight matrix
        rows: usize,
        /// Length of the bias vector
        bias: usize,
    },
    #[error("Softmax is only supported on the last layer, found it on layer {0}")]
    /// A softmax layer feeds another layer
    NonTerminalSoftmax(usize),
    #[error("Layer {0} has no inputs or no outputs")]
    /// A layer configuration with a zero dimension
    EmptyLayer(usize),
    #[error("Expected an input of length {expected}, got {actual}")]
    /// A sample does not match the input size of the network
    InputLength {
        /// Input size of the network
        expected: usize,
        /// Length of the sample
        actual: usize,
    },
    #[error("Label {sample} has length {actual}, expected {expected}")]
    /// A label does not match the output size of the network
    LabelLength {
        /// Index of the offending label
        sample: usize,
        /// Output size of the network
        expected: usize,
        /// Length of the label
        actual: usize,
    },
    #[error("Expected an error vector of length {expected}, got {actual}")]
    /// The terminal error does not match the output size of the network
    ErrorLength {
        /// Output size of the network
        expected: usize,
        /// Length of the error vector
        actual: usize,
    },
    #[error("Forward pass covers {actual} layers but the network has {expected}")]
    /// Backward propagation was handed records from a different network
    RecordLength {
        /// Number of layers in the network
        expected: usize,
        /// Number of forward records supplied
        actual: usize,
    },
    #[error("Got {samples} samples but {labels} labels")]
    /// Samples and labels must pair up
    SampleLabelCount {
        /// Number of samples
        samples: usize,
        /// Number of labels
        labels: usize,
    },
    #[error("The training set is empty")]
    /// Nothing to train or evaluate on
    EmptyTrainingSet,
    #[error("Unknown activation function: {0}")]
    /// An activation name outside the supported set
    UnknownActivation(String),
    #[error("Invalid training configuration: {0}")]
    /// Training parameters that cannot be used
    InvalidConfig(String),
    #[error("Linear algebra error: {0}")]
    /// Shape error from the linear algebra helpers
    LinAlg(#[from] LinAlgError),
    #[error("Numeric error: {0}")]
    /// Error raised by the secure-arithmetic runtime
    Numeric(#[from] NumericError),
}
