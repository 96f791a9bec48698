//! Batch planning: runs topic assignment, style selection and prompt
//! composition for one batch with a single random source.
//!
//! Flow: validate settings → assign_topics → drop non-speakers →
//!       select style flags → resolve + route flags → compose prompts →
//!       distribute deck templates.

use rand::RngCore;
use tracing::{debug, info, warn};

use crate::planning::composer::{compose_prompt, DeckSettings};
use crate::planning::presentation::{Presentation, Presenter};
use crate::planning::sampler::sample_minimal_repetitions;
use crate::planning::style_flags::{
    select_flags, FlagTarget, ResolveError, StyleFlag, SLIDE_STYLE_FLAGS, SPEAKER_STYLE_FLAGS,
};
use crate::planning::topics::{assign_topics, TopicSource};
use crate::planning::{Language, PlanError};

/// Everything a batch is planned from, apart from deck settings and the RNG.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub presenters: Vec<Presenter>,
    pub topics: TopicSource,
    /// Deck template names to spread over the batch; may be empty.
    pub deck_templates: Vec<String>,
}

/// Plans every presentation of a batch. Fails as a whole; there is no
/// partially planned batch.
pub fn plan_batch(
    input: &BatchInput,
    settings: &DeckSettings,
    rng: &mut dyn RngCore,
) -> Result<Vec<Presentation>, PlanError> {
    settings.validate()?;
    ensure_language(SLIDE_STYLE_FLAGS, settings.language)?;
    ensure_language(SPEAKER_STYLE_FLAGS, settings.language)?;

    let mut presentations = assign_topics(
        &input.presenters,
        &input.topics,
        settings.num_wrong_topics,
        rng,
    )?;

    let assigned = presentations.len();
    presentations.retain(Presentation::is_speaker);
    if presentations.len() < assigned {
        info!(
            "Dropped {} non-speaking player(s) after topic assignment",
            assigned - presentations.len()
        );
    }

    let count = presentations.len();
    let slide_flags = select_flags(SLIDE_STYLE_FLAGS, count, rng)?;
    let speaker_flags = select_flags(SPEAKER_STYLE_FLAGS, count, rng)?;

    for ((presentation, slide_flag), speaker_flag) in presentations
        .iter_mut()
        .zip(slide_flags)
        .zip(speaker_flags)
    {
        presentation.slide_style_flag = Some(slide_flag);
        presentation.speaker_style_flag = Some(speaker_flag);

        // Prompt-targeted text from either catalogue.
        let mut prompt_texts = Vec::new();
        for flag in [slide_flag, speaker_flag] {
            prompt_texts.extend(apply_style_flag(presentation, flag, settings, rng)?);
        }
        let prompt_style = (!prompt_texts.is_empty()).then(|| prompt_texts.join("\n"));

        let prompt = compose_prompt(
            &presentation.topic,
            &presentation.wrong_topics,
            prompt_style.as_deref(),
            settings,
            rng,
        )?;
        presentation.prompt = Some(prompt);
    }

    if !input.deck_templates.is_empty() {
        let templates = sample_minimal_repetitions(&input.deck_templates, count, rng)?;
        for (presentation, template) in presentations.iter_mut().zip(templates) {
            presentation.deck_template = Some(template);
        }
    }

    info!(
        "Planned {count} presentation(s) in '{}' ({} slides, {} wrong topic(s) each)",
        settings.language, settings.num_slides, settings.num_wrong_topics
    );
    Ok(presentations)
}

/// Fails unless every flag of `catalogue` has text for `language`.
pub fn ensure_language(catalogue: &[StyleFlag], language: Language) -> Result<(), PlanError> {
    match catalogue
        .iter()
        .find(|flag| !flag.texts.iter().any(|(lang, _)| *lang == language))
    {
        Some(flag) => Err(PlanError::MissingFlagLanguage {
            flag: flag.name,
            language,
        }),
        None => Ok(()),
    }
}

/// Resolves a flag and routes its text by target. Returns the text when it
/// belongs in the prompt.
///
/// A malformed resolution only loses this flag's effect; a missing language
/// aborts the batch.
fn apply_style_flag(
    presentation: &mut Presentation,
    flag: &StyleFlag,
    settings: &DeckSettings,
    rng: &mut dyn RngCore,
) -> Result<Option<String>, PlanError> {
    let text = match flag.resolve(settings.language, rng, settings) {
        Ok(text) => text,
        Err(err @ ResolveError::Malformed { .. }) => {
            warn!("Dropping style flag for {}: {err}", presentation.speaker);
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    debug!("{} gets {} ({:?})", presentation.speaker, flag.name, flag.target);

    match flag.target {
        FlagTarget::Prompt => Ok(Some(text)),
        FlagTarget::ImageQuery => {
            presentation.image_query_suffix = Some(text);
            Ok(None)
        }
        FlagTarget::Speaker => {
            presentation.speaker_instruction = Some(text);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::planning::presentation::PlayerRef;
    use crate::planning::style_flags::LocalizedText;

    fn groups_input(names: &[&str], group_size: usize) -> BatchInput {
        BatchInput {
            presenters: names.iter().map(|n| Presenter::named(*n)).collect(),
            topics: TopicSource::Groups(
                names
                    .iter()
                    .map(|n| (1..=group_size).map(|i| format!("{n}-topic-{i}")).collect())
                    .collect(),
            ),
            deck_templates: vec![],
        }
    }

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("P{i:02}")).collect()
    }

    #[test]
    fn test_every_presentation_gets_a_prompt_and_flags() {
        let owned = names(5);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let mut rng = StdRng::seed_from_u64(17);

        let presentations =
            plan_batch(&groups_input(&refs, 3), &DeckSettings::default(), &mut rng).unwrap();

        assert_eq!(presentations.len(), 5);
        for p in &presentations {
            let prompt = p.prompt.as_deref().unwrap();
            assert!(prompt.contains(&p.topic));
            assert!(p.wrong_topics.iter().all(|t| prompt.contains(t.as_str())));
            assert!(p.slide_style_flag.is_some());
            assert!(p.speaker_style_flag.is_some());
            assert!(p.speaker_instruction.is_some());
        }
    }

    #[test]
    fn test_flags_are_routed_by_target() {
        let owned = names(12);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let settings = DeckSettings {
            language: Language::En,
            ..DeckSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(99);

        let presentations = plan_batch(&groups_input(&refs, 3), &settings, &mut rng).unwrap();

        for p in &presentations {
            let prompt = p.prompt.as_deref().unwrap();
            let slide_flag = p.slide_style_flag.unwrap();
            match slide_flag.target {
                FlagTarget::ImageQuery => {
                    assert_eq!(p.image_query_suffix.as_deref(), Some("meme"));
                    assert!(!prompt.contains("meme"));
                }
                _ => assert!(p.image_query_suffix.is_none()),
            }
            if let Some((_, LocalizedText::Literal(text))) = slide_flag
                .texts
                .iter()
                .find(|(lang, _)| *lang == Language::En)
            {
                if slide_flag.target == FlagTarget::Prompt {
                    assert!(prompt.contains(text), "{} missing from prompt", slide_flag.name);
                }
            }
            let instruction = p.speaker_instruction.as_deref().unwrap();
            assert!(!prompt.contains(instruction), "speaker text leaked into prompt");
        }
    }

    #[test]
    fn test_style_flags_spread_over_large_batch() {
        let owned = names(14);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let mut rng = StdRng::seed_from_u64(4);
        let presentations =
            plan_batch(&groups_input(&refs, 3), &DeckSettings::default(), &mut rng).unwrap();

        let floor = presentations.len() / SLIDE_STYLE_FLAGS.len();
        for flag in SLIDE_STYLE_FLAGS {
            let uses = presentations
                .iter()
                .filter(|p| p.slide_style_flag.map(|f| f.name) == Some(flag.name))
                .count();
            assert!(uses >= floor, "{} used {uses} times", flag.name);
        }
    }

    #[test]
    fn test_malformed_flag_is_dropped_not_fatal() {
        // Two slides are too few for KARAOKE, which starts at slide 3.
        let owned = names(12);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let settings = DeckSettings {
            num_slides: 2,
            num_wrong_topics: 1,
            ..DeckSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(8);

        let presentations = plan_batch(&groups_input(&refs, 2), &settings, &mut rng).unwrap();

        let karaoke: Vec<&Presentation> = presentations
            .iter()
            .filter(|p| p.slide_style_flag.map(|f| f.name) == Some("KARAOKE"))
            .collect();
        assert!(!karaoke.is_empty());
        for p in karaoke {
            // structure, tone, wrong topic, jokes, format, but no style line
            assert_eq!(p.prompt.as_deref().unwrap().lines().count(), 5);
        }
    }

    #[test]
    fn test_seeded_batches_are_reproducible() {
        let input = groups_input(&["A", "B", "C", "D"], 4);
        let settings = DeckSettings::default();

        let first = plan_batch(&input, &settings, &mut StdRng::seed_from_u64(123)).unwrap();
        let second = plan_batch(&input, &settings, &mut StdRng::seed_from_u64(123)).unwrap();

        let summary = |ps: &[Presentation]| -> Vec<(String, String, Vec<String>, Option<String>)> {
            ps.iter()
                .map(|p| (p.speaker.clone(), p.topic.clone(), p.wrong_topics.clone(), p.prompt.clone()))
                .collect()
        };
        assert_eq!(summary(&first), summary(&second));
    }

    #[test]
    fn test_non_speakers_are_dropped_after_assignment() {
        let mut input = groups_input(&["A", "B", "C"], 3);
        input.presenters[1].player = Some(PlayerRef {
            id: "b".into(),
            session_id: None,
            is_speaker: false,
        });
        let mut rng = StdRng::seed_from_u64(2);

        let presentations = plan_batch(&input, &DeckSettings::default(), &mut rng).unwrap();

        assert_eq!(presentations.len(), 2);
        assert!(presentations.iter().all(|p| p.speaker != "B"));
        // B's topics still took part in the assignment.
        let mut owners: Vec<&str> = presentations.iter().map(|p| &p.topic[..1]).collect();
        owners.sort();
        owners.dedup();
        assert_eq!(owners.len(), 2);
    }

    #[test]
    fn test_deck_templates_are_spread() {
        let mut input = groups_input(&["A", "B", "C", "D"], 3);
        input.deck_templates = vec!["dark.pptx".into(), "light.pptx".into()];
        let mut rng = StdRng::seed_from_u64(31);

        let presentations = plan_batch(&input, &DeckSettings::default(), &mut rng).unwrap();

        let dark = presentations
            .iter()
            .filter(|p| p.deck_template.as_deref() == Some("dark.pptx"))
            .count();
        assert_eq!(dark, 2);
    }

    #[test]
    fn test_invalid_settings_abort_before_assignment() {
        use crate::planning::test_support::CountingRng;

        let settings = DeckSettings {
            num_bullets_min: 0,
            ..DeckSettings::default()
        };
        let mut rng = CountingRng::new(0);
        let err = plan_batch(&groups_input(&["A", "B"], 3), &settings, &mut rng).unwrap_err();
        assert!(matches!(err, PlanError::InvalidSettings(_)));
        assert_eq!(rng.draws, 0);
    }

    #[test]
    fn test_catalogue_language_check() {
        static ONLY_GERMAN: [StyleFlag; 1] = [StyleFlag {
            name: "ONLY_GERMAN",
            target: FlagTarget::Prompt,
            texts: &[(Language::De, LocalizedText::Literal("Nur Deutsch."))],
        }];
        assert!(ensure_language(&ONLY_GERMAN, Language::De).is_ok());
        assert!(matches!(
            ensure_language(&ONLY_GERMAN, Language::En),
            Err(PlanError::MissingFlagLanguage {
                flag: "ONLY_GERMAN",
                language: Language::En
            })
        ));
        assert!(ensure_language(SLIDE_STYLE_FLAGS, Language::En).is_ok());
        assert!(ensure_language(SPEAKER_STYLE_FLAGS, Language::De).is_ok());
    }
}
