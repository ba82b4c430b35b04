//! Utility modules

pub mod mock_generator;
pub mod validation;

pub use mock_generator::*;
pub use validation::*;
