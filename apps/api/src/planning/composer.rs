//! Prompt composition: turns a presentation's topic, wrong topics and slide
//! style into the instruction text sent to the text generator.
//!
//! Order of the parts is fixed: structure, tone, wrong topics, slide style,
//! jokes, output format.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::planning::prompts::{template, PromptTemplate};
use crate::planning::topics::DEFAULT_NUM_WRONG_TOPICS;
use crate::planning::{Language, PlanError};

/// Bullets per wrong-topic slide that must carry made-up facts.
const WRONG_TOPIC_BULLETS: u32 = 2;

/// Deck-level settings shared by every presentation in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSettings {
    pub language: Language,
    pub num_slides: u32,
    pub num_bullets_min: u32,
    pub num_bullets_max: u32,
    pub num_wrong_topics: usize,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            language: Language::De,
            num_slides: 5,
            num_bullets_min: 4,
            num_bullets_max: 6,
            num_wrong_topics: DEFAULT_NUM_WRONG_TOPICS,
        }
    }
}

impl DeckSettings {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.num_slides == 0 {
            return Err(PlanError::InvalidSettings(
                "num_slides must be at least 1".to_string(),
            ));
        }
        if self.num_bullets_min == 0 || self.num_bullets_min > self.num_bullets_max {
            return Err(PlanError::InvalidSettings(format!(
                "invalid bullet range {}-{}",
                self.num_bullets_min, self.num_bullets_max
            )));
        }
        if self.num_wrong_topics > self.num_slides as usize {
            return Err(PlanError::InvalidSettings(format!(
                "{} wrong topics do not fit on {} slides",
                self.num_wrong_topics, self.num_slides
            )));
        }
        Ok(())
    }
}

/// Not enough slides in the deck for a requested slide selection.
#[derive(Debug, Error, PartialEq)]
#[error("cannot pick {requested} slide(s) from {start}..={num_slides}")]
pub struct NotEnoughSlides {
    pub requested: usize,
    pub start: u32,
    pub num_slides: u32,
}

/// Uniform slide number in `start..=num_slides`.
pub fn random_slide_number<R>(rng: &mut R, start: u32, num_slides: u32) -> Result<u32, NotEnoughSlides>
where
    R: Rng + ?Sized,
{
    let start = start.max(1);
    if start > num_slides {
        return Err(NotEnoughSlides {
            requested: 1,
            start,
            num_slides,
        });
    }
    Ok(rng.gen_range(start..=num_slides))
}

/// `k` distinct slide numbers from `1..=num_slides`, sorted ascending.
pub fn random_slide_numbers<R>(rng: &mut R, k: usize, num_slides: u32) -> Result<Vec<u32>, NotEnoughSlides>
where
    R: Rng + ?Sized,
{
    if k > num_slides as usize {
        return Err(NotEnoughSlides {
            requested: k,
            start: 1,
            num_slides,
        });
    }
    let mut numbers: Vec<u32> = index::sample(rng, num_slides as usize, k)
        .into_iter()
        .map(|i| i as u32 + 1)
        .collect();
    numbers.sort_unstable();
    Ok(numbers)
}

fn noun(forms: (&'static str, &'static str), count: usize) -> &'static str {
    if count == 1 {
        forms.0
    } else {
        forms.1
    }
}

/// "slide 3", "slides 2 and 4", "slides 1, 2 and 4".
pub fn enumerate_slides(language: Language, numbers: &[u32]) -> String {
    let t = template(language);
    let listed = match numbers {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(u32::to_string).collect();
            format!("{} {} {last}", init.join(", "), t.and)
        }
    };
    format!("{} {listed}", noun(t.slide, numbers.len()))
}

fn bullet_range(t: &PromptTemplate, settings: &DeckSettings) -> String {
    let range = if settings.num_bullets_min == settings.num_bullets_max {
        settings.num_bullets_min.to_string()
    } else {
        format!("{}-{}", settings.num_bullets_min, settings.num_bullets_max)
    };
    let count = if settings.num_bullets_max == 1 { 1 } else { 2 };
    format!("{range} {}", noun(t.bullet, count))
}

/// Wrong-topic instruction with freshly drawn slide numbers, paired with the
/// wrong topics in their original order.
fn wrong_topics_instruction<R>(
    t: &PromptTemplate,
    language: Language,
    wrong_topics: &[String],
    num_slides: u32,
    rng: &mut R,
) -> Result<String, PlanError>
where
    R: Rng + ?Sized,
{
    let numbers = random_slide_numbers(rng, wrong_topics.len(), num_slides)
        .map_err(|e| PlanError::InvalidSettings(e.to_string()))?;

    let pairs = numbers
        .iter()
        .zip(wrong_topics)
        .map(|(n, topic)| format!("{} {n}: \"{topic}\"", t.slide.0))
        .collect::<Vec<_>>()
        .join(", ");
    let sentence = if wrong_topics.len() == 1 {
        t.wrong_topics_one
    } else {
        t.wrong_topics_many
    };
    let bullets = format!(
        "{WRONG_TOPIC_BULLETS} {}",
        noun(t.bullet, WRONG_TOPIC_BULLETS as usize)
    );

    Ok(sentence
        .replace("{slides}", &enumerate_slides(language, &numbers))
        .replace("{bullets}", &bullets)
        .replace("{pairs}", &pairs))
}

/// Composes the full prompt for one presentation.
pub fn compose_prompt<R>(
    topic: &str,
    wrong_topics: &[String],
    slide_style: Option<&str>,
    settings: &DeckSettings,
    rng: &mut R,
) -> Result<String, PlanError>
where
    R: Rng + ?Sized,
{
    let t = template(settings.language);
    let slides = format!(
        "{} {}",
        settings.num_slides,
        noun(t.slide, settings.num_slides as usize)
    );

    let mut parts = vec![
        // Topic last so user text is never scanned for placeholders.
        t.structure
            .replace("{slides}", &slides)
            .replace("{bullets}", &bullet_range(t, settings))
            .replace("{topic}", topic),
        t.tone.to_string(),
    ];
    if !wrong_topics.is_empty() {
        parts.push(wrong_topics_instruction(
            t,
            settings.language,
            wrong_topics,
            settings.num_slides,
            rng,
        )?);
    }
    if let Some(style) = slide_style {
        parts.push(style.to_string());
    }
    parts.push(t.jokes.to_string());
    parts.push(t.format.to_string());

    Ok(parts.join("\n"))
}
