mod training;
mod training_config;
mod training_history;

pub use training::{Trainer, TrainingError};
pub use training_config::{ConfigError, TrainingConfig};
pub use training_history::TrainingHistory;

pub mod prelude {
    pub use crate::Trainer;
    pub use crate::TrainingConfig;
    pub use crate::TrainingHistory;
}
