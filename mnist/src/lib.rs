pub mod mnist;

pub use crate::mnist::*;
