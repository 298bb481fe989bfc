use crate::activations::{Activation, SIGMOID};
use matrix::matrix::Matrix;
use rand::Rng;
use std::fmt;

/// Per-batch intermediates produced by a training forward pass.
///
/// Owns one pre-activation (`z`) and one activation (`a`) matrix per layer
/// transition, in input-to-output order. Dropped once the parameter update
/// for the batch has been applied; nothing is carried across batches.
#[derive(Debug)]
pub struct ForwardPass {
    pre_activations: Vec<Matrix>,
    activations: Vec<Matrix>,
}

impl ForwardPass {
    #[must_use]
    pub fn pre_activations(&self) -> &[Matrix] {
        &self.pre_activations
    }

    #[must_use]
    pub fn activations(&self) -> &[Matrix] {
        &self.activations
    }

    /// The last layer's activations, one prediction column per example.
    #[must_use]
    pub fn output(&self) -> &Matrix {
        &self.activations[self.activations.len() - 1]
    }
}

/// Result of running the network over a labelled evaluation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} correct ({:.2}%)",
            self.correct,
            self.total,
            self.accuracy()
        )
    }
}

/// A fully-connected feed-forward classifier trained with mini-batch SGD
/// and L2 weight decay.
///
/// The topology is fixed at construction: `layers[0]` input features,
/// `layers[layers.len() - 1]` output classes, sigmoid activations
/// throughout. For each layer transition `k`, `weights[k]` has shape
/// `(layers[k + 1], layers[k])` and `biases[k]` is a single column of
/// height `layers[k + 1]`; only the numeric contents change during
/// training.
///
/// # Examples
///
/// ```
/// use matrix::matrix::Matrix;
/// use neural_network::Network;
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let network = Network::new(vec![4, 3, 2], 0.5, 0.0, &mut rng);
///
/// let batch = Matrix::zeros(4, 8);
/// let prediction = network.predict(&batch);
/// assert_eq!((prediction.rows(), prediction.cols()), (2, 8));
/// ```
#[derive(Clone)]
pub struct Network {
    layers: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    activation: Activation,
    learning_rate: f64,
    lambda: f64,
}

impl Network {
    /// Creates a network with normally-distributed initial parameters.
    ///
    /// `layers` lists every layer width, input and output included, and
    /// must have at least two entries. `lambda` is the L2 weight-decay
    /// coefficient; zero disables regularization.
    pub fn new(layers: Vec<usize>, learning_rate: f64, lambda: f64, rng: &mut impl Rng) -> Self {
        assert!(
            layers.len() >= 2,
            "A network needs an input and an output layer"
        );

        let (weights, biases): (Vec<Matrix>, Vec<Matrix>) = layers
            .windows(2)
            .map(|window| {
                (
                    Matrix::random(window[1], window[0], rng),
                    Matrix::random(window[1], 1, rng),
                )
            })
            .unzip();

        Network {
            layers,
            weights,
            biases,
            activation: SIGMOID,
            learning_rate,
            lambda,
        }
    }

    /// Builds a network from existing parameters, checking every shape
    /// against the topology.
    pub fn from_parameters(
        layers: Vec<usize>,
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
        learning_rate: f64,
        lambda: f64,
    ) -> Self {
        assert!(
            layers.len() >= 2,
            "A network needs an input and an output layer"
        );
        assert_eq!(
            weights.len(),
            layers.len() - 1,
            "One weight matrix per layer transition"
        );
        assert_eq!(
            biases.len(),
            layers.len() - 1,
            "One bias column per layer transition"
        );
        for (k, (weight, bias)) in weights.iter().zip(biases.iter()).enumerate() {
            assert_eq!(
                (weight.rows(), weight.cols()),
                (layers[k + 1], layers[k]),
                "Weight shape must match the layer transition"
            );
            assert_eq!(
                (bias.rows(), bias.cols()),
                (layers[k + 1], 1),
                "Bias shape must match the layer transition"
            );
        }

        Network {
            layers,
            weights,
            biases,
            activation: SIGMOID,
            learning_rate,
            lambda,
        }
    }

    #[must_use]
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    #[must_use]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    /// Number of layer transitions, one fewer than the number of layers.
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.weights.len()
    }

    /// Runs the batch through every layer, retaining the pre-activation
    /// and activation matrices backpropagation needs.
    ///
    /// `inputs` holds one example per column and must have `layers[0]`
    /// rows. Parameters are not touched; calling this twice with the same
    /// batch yields identical results.
    #[must_use]
    pub fn feed_forward(&self, inputs: &Matrix) -> ForwardPass {
        assert_eq!(
            inputs.rows(),
            self.layers[0],
            "Input rows must match the input layer width"
        );

        let mut pre_activations = Vec::with_capacity(self.transitions());
        let mut activations: Vec<Matrix> = Vec::with_capacity(self.transitions());

        for k in 0..self.transitions() {
            let layer_input = if k == 0 { inputs } else { &activations[k - 1] };
            let z = self.weights[k]
                .dot_multiply(layer_input)
                .add_column(&self.biases[k]);
            activations.push(z.map(self.activation.function));
            pre_activations.push(z);
        }

        ForwardPass {
            pre_activations,
            activations,
        }
    }

    /// Evaluation-only forward pass; keeps nothing but the final
    /// activations.
    #[must_use]
    pub fn predict(&self, inputs: &Matrix) -> Matrix {
        assert_eq!(
            inputs.rows(),
            self.layers[0],
            "Input rows must match the input layer width"
        );

        let mut current = inputs.clone();
        for (weight, bias) in self.weights.iter().zip(self.biases.iter()) {
            current = weight
                .dot_multiply(&current)
                .add_column(bias)
                .map(self.activation.function);
        }
        current
    }

    /// Computes the error signal for every layer transition, last to
    /// first.
    ///
    /// The output-layer error is taken directly as `output - targets`,
    /// without the activation-derivative factor; hidden-layer errors are
    /// `(Wᵗ · delta) ⊙ σ'(z)`. Returned in input-to-output order.
    #[must_use]
    pub fn back_propagate(&self, pass: &ForwardPass, targets: &Matrix) -> Vec<Matrix> {
        let transitions = self.transitions();
        assert_eq!(
            targets.rows(),
            self.layers[transitions],
            "Target rows must match the output layer width"
        );
        assert_eq!(
            targets.cols(),
            pass.output().cols(),
            "Target batch width must match the forward batch"
        );

        let mut deltas = vec![Matrix::default(); transitions];
        deltas[transitions - 1] = pass.output().subtract(targets);

        for k in (0..transitions - 1).rev() {
            let propagated = self.weights[k + 1].transpose().dot_multiply(&deltas[k + 1]);
            deltas[k] = propagated
                .elementwise_multiply(&pass.pre_activations[k].map(self.activation.derivative));
        }

        deltas
    }

    /// Applies the L2-regularized SGD update for one mini-batch.
    ///
    /// Each weight matrix is first decayed by `1 - η·λ/n` (`n` = training
    /// set size), then the gradient `delta · aᵗ` scaled by `η/m` (`m` =
    /// batch width) is subtracted. Biases take the column-summed delta
    /// scaled by `η/m`, with no decay term.
    pub fn update_parameters(
        &mut self,
        inputs: &Matrix,
        pass: &ForwardPass,
        deltas: &[Matrix],
        train_size: usize,
    ) {
        assert_eq!(
            deltas.len(),
            self.transitions(),
            "One delta per layer transition"
        );

        let m = inputs.cols() as f64;
        let n = train_size as f64;
        let decay = 1.0 - self.learning_rate * self.lambda / n;

        for k in 0..self.transitions() {
            let upstream = if k == 0 {
                inputs
            } else {
                &pass.activations[k - 1]
            };
            let weight_gradient = deltas[k].dot_multiply(&upstream.transpose());
            self.weights[k] = self.weights[k]
                .scale(decay)
                .subtract(&weight_gradient.scale(self.learning_rate / m));

            let bias_gradient = deltas[k].row_sum();
            self.biases[k] =
                self.biases[k].subtract(&bias_gradient.scale(self.learning_rate / m));
        }
    }

    /// One full training step: forward, backward, parameter update.
    ///
    /// `inputs` is `(layers[0], m)`, `targets` the matching one-hot
    /// `(layers[last], m)` batch; `train_size` is the size of the whole
    /// training set, which scales the weight-decay term.
    pub fn train_batch(&mut self, inputs: &Matrix, targets: &Matrix, train_size: usize) {
        assert_eq!(
            inputs.cols(),
            targets.cols(),
            "Input and target batches must be the same width"
        );

        let pass = self.feed_forward(inputs);
        let deltas = self.back_propagate(&pass, targets);
        self.update_parameters(inputs, &pass, &deltas, train_size);
    }

    /// Counts how many columns of `inputs` the network classifies as
    /// their label, taking the arg-max row of the prediction as the
    /// class. Runs the forward pass only.
    #[must_use]
    pub fn evaluate(&self, inputs: &Matrix, labels: &[usize]) -> Evaluation {
        assert_eq!(inputs.cols(), labels.len(), "One label per input column");

        let output = self.predict(inputs);
        let correct = output
            .column_argmax()
            .iter()
            .zip(labels.iter())
            .filter(|(predicted, label)| predicted == label)
            .count();

        Evaluation {
            correct,
            total: labels.len(),
        }
    }
}
