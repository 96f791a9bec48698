//! Topic assignment: hands every presenter one real topic plus wrong topics,
//! none of which come from their own group or block.
//!
//! All size checks run before the first random draw.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use tracing::debug;

use crate::planning::derangement::{derange, derange_chunks};
use crate::planning::presentation::{Presentation, Presenter};
use crate::planning::PlanError;

pub const DEFAULT_NUM_WRONG_TOPICS: usize = 2;

/// Where the topics come from.
#[derive(Debug, Clone)]
pub enum TopicSource {
    /// One flat pool; presenter `i` owns positions `[i*m, (i+1)*m)`.
    Pool(Vec<String>),
    /// One group per presenter, in presenter order.
    Groups(Vec<Vec<String>>),
}

/// Assigns topics and wrong topics, attaches player records, and shuffles the
/// speaking order.
pub fn assign_topics<R>(
    presenters: &[Presenter],
    source: &TopicSource,
    num_wrong_topics: usize,
    rng: &mut R,
) -> Result<Vec<Presentation>, PlanError>
where
    R: Rng + ?Sized,
{
    if presenters.is_empty() {
        return Err(PlanError::NoPresenters);
    }
    let m = 1 + num_wrong_topics;

    let assigned: Vec<Vec<String>> = match source {
        TopicSource::Groups(groups) => {
            validate_groups(groups, presenters.len(), m)?;
            let shuffled = derange(groups, rng)?;
            shuffled
                .iter()
                .map(|group| {
                    index::sample(rng, group.len(), m)
                        .into_iter()
                        .map(|i| group[i].clone())
                        .collect()
                })
                .collect()
        }
        TopicSource::Pool(pool) => {
            validate_pool(pool, presenters.len(), m)?;
            let shuffled = derange_chunks(pool, m, rng)?;
            shuffled
                .chunks(m)
                .take(presenters.len())
                .map(|block| block.to_vec())
                .collect()
        }
    };

    let mut presentations: Vec<Presentation> = presenters
        .iter()
        .zip(assigned)
        .map(|(presenter, mut topics)| {
            let wrong_topics = topics.split_off(1);
            let topic = topics.remove(0);
            let mut presentation = Presentation::new(presenter.name.clone(), topic, wrong_topics);
            presentation.player = presenter.player.clone();
            presentation
        })
        .collect();

    presentations.shuffle(rng);
    debug!("Assigned topics to {} presenter(s)", presentations.len());
    Ok(presentations)
}

fn validate_groups(groups: &[Vec<String>], presenters: usize, m: usize) -> Result<(), PlanError> {
    if groups.len() != presenters {
        return Err(PlanError::GroupCountMismatch {
            groups: groups.len(),
            presenters,
        });
    }
    match groups.iter().position(|g| g.len() < m) {
        Some(index) => Err(PlanError::InsufficientTopics {
            index,
            found: groups[index].len(),
            required: m,
        }),
        None => Ok(()),
    }
}

fn validate_pool(pool: &[String], presenters: usize, m: usize) -> Result<(), PlanError> {
    let full_blocks = pool.len() / m;
    if pool.len() % m != 0 {
        return Err(PlanError::InsufficientTopics {
            index: full_blocks,
            found: pool.len() % m,
            required: m,
        });
    }
    if full_blocks < presenters {
        return Err(PlanError::InsufficientTopics {
            index: full_blocks,
            found: 0,
            required: m,
        });
    }
    Ok(())
}
