use mnist::{INPUT_NODES, OUTPUT_NODES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors, all fatal and all reported before the first
/// batch runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Mini-batch size must be greater than zero")]
    ZeroBatchSize,
    #[error("Mini-batch size {batch_size} does not evenly divide the training set size {train_size}")]
    BatchSizeMismatch { batch_size: usize, train_size: usize },
    #[error("Epoch count must be greater than zero")]
    ZeroEpochs,
    #[error("A network needs at least an input and an output layer, got {0} layers")]
    TooFewLayers(usize),
    #[error("Layer {0} has zero width")]
    ZeroWidthLayer(usize),
    #[error("Output layer width {output} does not match the {num_classes} dataset classes")]
    OutputWidthMismatch { output: usize, num_classes: usize },
}

/// Configuration parameters for neural network training.
///
/// All values are fixed for the lifetime of a training run. Defaults
/// reproduce the reference MNIST setup: a 784-100-30-10 topology trained
/// with learning rate 0.1, weight decay 5.0 and mini-batches of 10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Size of each training mini-batch; must evenly divide the training
    /// set size
    pub batch_size: usize,
    /// Number of training epochs
    pub epochs: u32,
    /// Learning rate for gradient descent
    pub learning_rate: f64,
    /// L2 weight-decay coefficient
    pub lambda: f64,
    /// Number of nodes in each hidden layer
    pub hidden_layers: Vec<usize>,
    /// Seed for parameter initialization and mini-batch shuffling; a
    /// fresh OS seed is drawn when absent
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            epochs: 30,
            learning_rate: 0.1,
            lambda: 5.0,
            hidden_layers: vec![100, 30],
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&config_str)?)
    }

    /// Full layer-width sequence, input and output layers included.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![INPUT_NODES];
        sizes.extend(&self.hidden_layers);
        sizes.push(OUTPUT_NODES);
        sizes
    }

    /// Checks every configuration invariant against the dataset this run
    /// will train on.
    pub fn validate(&self, train_size: usize, num_classes: usize) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.epochs == 0 {
            return Err(ConfigError::ZeroEpochs);
        }
        if train_size % self.batch_size != 0 {
            return Err(ConfigError::BatchSizeMismatch {
                batch_size: self.batch_size,
                train_size,
            });
        }

        let sizes = self.layer_sizes();
        if sizes.len() < 2 {
            return Err(ConfigError::TooFewLayers(sizes.len()));
        }
        if let Some(position) = sizes.iter().position(|&width| width == 0) {
            return Err(ConfigError::ZeroWidthLayer(position));
        }
        let output = sizes[sizes.len() - 1];
        if output != num_classes {
            return Err(ConfigError::OutputWidthMismatch {
                output,
                num_classes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_training_config_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.epochs, 30);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.lambda, 5.0);
        assert_eq!(config.hidden_layers, vec![100, 30]);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_layer_sizes_bracket_hidden_layers() {
        let config = TrainingConfig {
            hidden_layers: vec![100, 30],
            ..TrainingConfig::default()
        };
        assert_eq!(config.layer_sizes(), vec![784, 100, 30, 10]);

        let no_hidden = TrainingConfig {
            hidden_layers: vec![],
            ..TrainingConfig::default()
        };
        assert_eq!(no_hidden.layer_sizes(), vec![784, 10]);
    }

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("test_config.json");

        let config_json = r#"{
            "batch_size": 20,
            "epochs": 300,
            "learning_rate": 0.05,
            "lambda": 1.0,
            "hidden_layers": [200],
            "seed": 9
        }"#;

        let mut file = std::fs::File::create(&config_path).unwrap();
        file.write_all(config_json.as_bytes()).unwrap();

        let config = TrainingConfig::load(&config_path).unwrap();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.epochs, 300);
        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.lambda, 1.0);
        assert_eq!(config.hidden_layers, vec![200]);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_load_config_rejects_bad_json() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            TrainingConfig::load(&config_path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_accepts_exact_division() {
        let config = TrainingConfig::default();
        assert!(config.validate(60_000, 10).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = TrainingConfig {
            batch_size: 0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            config.validate(100, 10),
            Err(ConfigError::ZeroBatchSize)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_epochs() {
        let config = TrainingConfig {
            epochs: 0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            config.validate(100, 10),
            Err(ConfigError::ZeroEpochs)
        ));
    }

    #[test]
    fn test_validate_rejects_uneven_batches() {
        let config = TrainingConfig {
            batch_size: 7,
            ..TrainingConfig::default()
        };
        match config.validate(100, 10) {
            Err(ConfigError::BatchSizeMismatch {
                batch_size,
                train_size,
            }) => {
                assert_eq!(batch_size, 7);
                assert_eq!(train_size, 100);
            }
            other => panic!("Expected BatchSizeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_width_layer() {
        let config = TrainingConfig {
            hidden_layers: vec![100, 0],
            ..TrainingConfig::default()
        };
        assert!(matches!(
            config.validate(100, 10),
            Err(ConfigError::ZeroWidthLayer(2))
        ));
    }

    #[test]
    fn test_validate_rejects_class_count_mismatch() {
        let config = TrainingConfig::default();
        assert!(matches!(
            config.validate(100, 12),
            Err(ConfigError::OutputWidthMismatch { .. })
        ));
    }
}
