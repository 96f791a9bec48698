//! Random derangements.
//!
//! Both variants use the same greedy scheme: every source element is placed on
//! a random free target slot outside its forbidden block. A dead end discards
//! the partial placement and starts over, up to `MAX_DERANGEMENT_ATTEMPTS`.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::planning::PlanError;

/// Attempts before a derangement is reported as exhausted.
pub const MAX_DERANGEMENT_ATTEMPTS: u32 = 100;

/// Permutes `items` so that no element keeps its index.
pub fn derange<T, R>(items: &[T], rng: &mut R) -> Result<Vec<T>, PlanError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if items.len() < 2 {
        return Err(PlanError::TooFewElements { len: items.len() });
    }
    derange_blocks(items, 1, rng)
}

/// Permutes `items` so that no element lands in the block of `block_size`
/// consecutive positions it started in.
///
/// Requires `block_size > 0`, `2 * block_size <= len` and `len % block_size == 0`.
pub fn derange_chunks<T, R>(items: &[T], block_size: usize, rng: &mut R) -> Result<Vec<T>, PlanError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let len = items.len();
    if len < 2 {
        return Err(PlanError::TooFewElements { len });
    }
    if block_size == 0 || 2 * block_size > len || len % block_size != 0 {
        return Err(PlanError::InvalidChunkSize { len, block_size });
    }
    derange_blocks(items, block_size, rng)
}

fn derange_blocks<T, R>(items: &[T], block_size: usize, rng: &mut R) -> Result<Vec<T>, PlanError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let len = items.len();

    'attempt: for attempt in 1..=MAX_DERANGEMENT_ATTEMPTS {
        let mut free: Vec<usize> = (0..len).collect();
        let mut targets: Vec<Option<usize>> = vec![None; len];

        for (source, target) in targets.iter_mut().enumerate() {
            let block = source / block_size;
            let candidates: Vec<usize> = free
                .iter()
                .enumerate()
                .filter(|&(_, &slot)| slot / block_size != block)
                .map(|(pos, _)| pos)
                .collect();

            let Some(&pos) = candidates.choose(rng) else {
                debug!("Derangement attempt {attempt} hit a dead end at element {source}");
                continue 'attempt;
            };
            *target = Some(free.swap_remove(pos));
        }

        let mut placed: Vec<Option<T>> = vec![None; len];
        for (source, target) in targets.into_iter().enumerate() {
            if let Some(slot) = target {
                placed[slot] = Some(items[source].clone());
            }
        }
        return Ok(placed.into_iter().flatten().collect());
    }

    Err(PlanError::DerangementExhausted {
        len,
        block_size,
        retries: MAX_DERANGEMENT_ATTEMPTS,
    })
}
