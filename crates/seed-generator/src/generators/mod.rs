//! Value helpers shared by record generators.
//!
//! Each helper takes the caller's RNG, so a generator stays a pure function
//! of its RNG state and parent keys.

pub mod fake;
pub mod numeric;
pub mod timestamp;
pub mod uuid;
pub mod weighted;

pub use weighted::WeightedChoice;
