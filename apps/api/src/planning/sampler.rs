//! Repetition-minimizing sampler.
//!
//! Draws `k` items so that no item repeats before every item has been used
//! once. Used for style flags, deck templates and speaker instruction pools.

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::planning::PlanError;

/// Samples `k` items from `population`.
///
/// - `k <= len`: uniform sample without replacement, in random order.
/// - `k > len`: `k / len` independently shuffled full passes, followed by a
///   sample of `k % len` items without replacement.
///
/// Every item therefore appears `k / len` or `k / len + 1` times.
pub fn sample_minimal_repetitions<T, R>(
    population: &[T],
    k: usize,
    rng: &mut R,
) -> Result<Vec<T>, PlanError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if k == 0 {
        return Ok(Vec::new());
    }
    let size = population.len();
    if size == 0 {
        return Err(PlanError::EmptyPopulation { requested: k });
    }

    let mut sample = Vec::with_capacity(k);
    for _ in 0..k / size {
        let mut pass = population.to_vec();
        pass.shuffle(rng);
        sample.extend(pass);
    }
    sample.extend(
        index::sample(rng, size, k % size)
            .into_iter()
            .map(|i| population[i].clone()),
    );
    Ok(sample)
}
