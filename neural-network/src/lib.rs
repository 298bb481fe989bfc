// Modules
mod activations;
mod network;
mod persistence;

pub use activations::{Activation, SIGMOID, sigmoid, sigmoid_prime};
pub use network::{Evaluation, ForwardPass, Network};
pub use persistence::PersistenceError;
