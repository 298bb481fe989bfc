//! Training scheduler for the neural network implementation.
//!
//! Drives the epoch loop: each epoch shuffles an index permutation over
//! the training set, slices it into exactly-sized mini-batches, runs one
//! forward/backward/update cycle per batch, and then evaluates the
//! held-out set. Accuracy is reported once per epoch; there is no
//! per-batch logging and no early stopping.

use crate::training_config::ConfigError;
use crate::{TrainingConfig, TrainingHistory};
use indicatif::{ProgressBar, ProgressStyle};
use mnist::MnistData;
use neural_network::{Network, PersistenceError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use thiserror::Error;

/// Errors that can abort a training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to persist network: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Trainer manages the neural network training process.
///
/// Owns the network, the run configuration, the recorded history and the
/// random generator used for both parameter initialization and the
/// per-epoch shuffle. With a fixed `seed` in the configuration, a whole
/// run is reproducible.
pub struct Trainer {
    network: Network,
    config: TrainingConfig,
    history: TrainingHistory,
    rng: StdRng,
}

impl Trainer {
    /// Creates a trainer with a freshly initialized network.
    pub fn new(config: TrainingConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let network = Network::new(
            config.layer_sizes(),
            config.learning_rate,
            config.lambda,
            &mut rng,
        );

        Self {
            network,
            config,
            history: TrainingHistory::new(),
            rng,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns the per-epoch evaluation history recorded so far
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Trains on `train` for the configured number of epochs, evaluating
    /// against the held-out `test` set after each epoch.
    ///
    /// The configuration is validated against the dataset before the
    /// first batch; any violation aborts the run with a [`ConfigError`].
    pub fn train(&mut self, train: &MnistData, test: &MnistData) -> Result<(), TrainingError> {
        self.config.validate(train.len(), train.targets().rows())?;

        let progress = ProgressBar::new(self.config.epochs as u64);
        progress.set_style(create_progress_style(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} {msg}",
        ));

        for epoch in 1..=self.config.epochs {
            let indices = epoch_permutation(train.len(), &mut self.rng);
            for batch in indices.chunks(self.config.batch_size) {
                let inputs = train.inputs().gather_columns(batch);
                let targets = train.targets().gather_columns(batch);
                self.network.train_batch(&inputs, &targets, train.len());
            }

            let evaluation = self.network.evaluate(test.inputs(), test.labels());
            self.history
                .record_epoch(epoch, evaluation.correct, evaluation.accuracy());
            progress.set_message(format!("Epoch {epoch}: {evaluation}"));
            progress.inc(1);
        }

        progress.finish();
        Ok(())
    }

    /// Saves the learned parameters under `path`.
    pub fn save_network<P: AsRef<Path>>(&self, path: P) -> Result<(), TrainingError> {
        Ok(self.network.save(path)?)
    }

    /// Rebuilds a trainer around parameters previously saved with
    /// [`Trainer::save_network`].
    pub fn load_network<P: AsRef<Path>>(
        path: P,
        config: TrainingConfig,
    ) -> Result<Self, TrainingError> {
        let network = Network::load(path, config.learning_rate, config.lambda)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            network,
            config,
            history: TrainingHistory::new(),
            rng,
        })
    }
}

/// Shuffled assignment of every training example to this epoch's
/// mini-batches; each index appears exactly once.
fn epoch_permutation(len: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}

/// Creates a progress bar style with the specified template.
fn create_progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap()
        .progress_chars("##-")
}
