//! Weighted categorical choice.

use crate::generator::GeneratorError;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

/// A fixed set of values drawn with fixed relative weights.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T: 'static> {
    values: &'static [T],
    weights: Vec<u32>,
    index: WeightedIndex<u32>,
}

impl<T> WeightedChoice<T> {
    /// Build from parallel value and weight slices.
    pub fn new(values: &'static [T], weights: &[u32]) -> Result<Self, GeneratorError> {
        if values.len() != weights.len() {
            return Err(GeneratorError::InvalidWeights(format!(
                "{} values but {} weights",
                values.len(),
                weights.len()
            )));
        }
        let index = WeightedIndex::new(weights.iter().copied())
            .map_err(|e| GeneratorError::InvalidWeights(e.to_string()))?;
        Ok(Self {
            values,
            weights: weights.to_vec(),
            index,
        })
    }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static T {
        &self.values[self.index.sample(rng)]
    }

    /// Probability of the value at `position`.
    pub fn probability(&self, position: usize) -> f64 {
        let total: u32 = self.weights.iter().sum();
        if total == 0 {
            return 0.0;
        }
        self.weights.get(position).copied().unwrap_or(0) as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const COLORS: &[&str] = &["red", "green", "blue"];

    #[test]
    fn test_weighted_choice_shape() {
        let choice = WeightedChoice::new(COLORS, &[80, 15, 5]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let mut red = 0;
        for _ in 0..10_000 {
            if *choice.sample(&mut rng) == "red" {
                red += 1;
            }
        }
        assert!((7_500..8_500).contains(&red), "red drawn {red} times");
        assert!((choice.probability(0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(matches!(
            WeightedChoice::new(COLORS, &[1, 2]),
            Err(GeneratorError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_all_zero_weights() {
        assert!(WeightedChoice::new(COLORS, &[0, 0, 0]).is_err());
    }
}
