//! Style flags: localized directives that change a deck's prompt, its image
//! queries, or what the presenter is told to do on stage.
//!
//! Each flag carries an explicit `FlagTarget`; consumers only look at the
//! targets they handle. Text is either a literal or a generator that draws
//! from the batch RNG at resolution time.

use std::fmt;

use rand::seq::{index, SliceRandom};
use rand::RngCore;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::planning::composer::{random_slide_number, random_slide_numbers, DeckSettings, NotEnoughSlides};
use crate::planning::sampler::sample_minimal_repetitions;
use crate::planning::{Language, PlanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagTarget {
    /// Injected into the text-generation prompt.
    Prompt,
    /// Appended to image-search queries.
    ImageQuery,
    /// Shown to the presenter only.
    Speaker,
}

pub type FlagTextFn = fn(&mut dyn RngCore, &DeckSettings) -> Result<String, NotEnoughSlides>;

#[derive(Clone, Copy)]
pub enum LocalizedText {
    Literal(&'static str),
    Generator(FlagTextFn),
}

impl fmt::Debug for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizedText::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            LocalizedText::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

#[derive(Debug)]
pub struct StyleFlag {
    pub name: &'static str,
    pub target: FlagTarget,
    pub texts: &'static [(Language, LocalizedText)],
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Style flag '{flag}' has no text for language '{language}'")]
    MissingLanguage {
        flag: &'static str,
        language: Language,
    },

    #[error("Style flag '{flag}' could not be resolved: {reason}")]
    Malformed { flag: &'static str, reason: String },
}

impl From<ResolveError> for PlanError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MissingLanguage { flag, language } => {
                PlanError::MissingFlagLanguage { flag, language }
            }
            ResolveError::Malformed { flag, reason } => {
                PlanError::InvalidSettings(format!("style flag '{flag}': {reason}"))
            }
        }
    }
}

impl StyleFlag {
    /// Produces the flag's text for `language`, running its generator if it has one.
    pub fn resolve(
        &self,
        language: Language,
        rng: &mut dyn RngCore,
        settings: &DeckSettings,
    ) -> Result<String, ResolveError> {
        let text = self
            .texts
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(_, text)| text)
            .ok_or(ResolveError::MissingLanguage {
                flag: self.name,
                language,
            })?;

        let resolved = match text {
            LocalizedText::Literal(s) => s.to_string(),
            LocalizedText::Generator(generate) => {
                generate(rng, settings).map_err(|e| ResolveError::Malformed {
                    flag: self.name,
                    reason: e.to_string(),
                })?
            }
        };

        if resolved.trim().is_empty() {
            return Err(ResolveError::Malformed {
                flag: self.name,
                reason: "resolved to empty text".to_string(),
            });
        }
        Ok(resolved)
    }
}

impl Serialize for StyleFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StyleFlag", 2)?;
        state.serialize_field("name", self.name)?;
        state.serialize_field("target", &self.target)?;
        state.end()
    }
}

/// Draws one flag per presentation, spreading the catalogue evenly.
pub fn select_flags(
    catalogue: &'static [StyleFlag],
    k: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<&'static StyleFlag>, PlanError> {
    let population: Vec<&'static StyleFlag> = catalogue.iter().collect();
    sample_minimal_repetitions(&population, k, rng)
}

// ────────────────────────────────────────────────────────────────────────────
// Generators
// ────────────────────────────────────────────────────────────────────────────

const FOREIGN_LANGUAGES: &[&str] = &["nl", "sv", "es", "tr", "sk", "ja"];
const FOREIGN_LANGUAGE_SLIDES: usize = 2;
const FOREIGN_LANGUAGE_BULLETS: u32 = 2;
/// First slide that may be replaced by lyrics; title slides stay intact.
const KARAOKE_FIRST_SLIDE: u32 = 3;

fn foreign_language_slides(
    rng: &mut dyn RngCore,
    settings: &DeckSettings,
) -> Result<Vec<(u32, &'static str)>, NotEnoughSlides> {
    let slides = random_slide_numbers(rng, FOREIGN_LANGUAGE_SLIDES, settings.num_slides)?;
    let languages = index::sample(rng, FOREIGN_LANGUAGES.len(), FOREIGN_LANGUAGE_SLIDES)
        .into_iter()
        .map(|i| FOREIGN_LANGUAGES[i]);
    Ok(slides.into_iter().zip(languages).collect())
}

fn foreign_language_en(rng: &mut dyn RngCore, settings: &DeckSettings) -> Result<String, NotEnoughSlides> {
    let mut sentences: Vec<String> = foreign_language_slides(rng, settings)?
        .into_iter()
        .map(|(slide, lang)| {
            format!(
                "On slide {slide}, write {FOREIGN_LANGUAGE_BULLETS} of the bullet points in the language with ISO code '{lang}'."
            )
        })
        .collect();
    sentences.push("Use the latin alphabet only.".to_string());
    Ok(sentences.join(" "))
}

fn foreign_language_de(rng: &mut dyn RngCore, settings: &DeckSettings) -> Result<String, NotEnoughSlides> {
    let mut sentences: Vec<String> = foreign_language_slides(rng, settings)?
        .into_iter()
        .map(|(slide, lang)| {
            format!(
                "Schreibe auf Folie {slide} bitte {FOREIGN_LANGUAGE_BULLETS} der Stichpunkte in der Sprache mit dem ISO-Code '{lang}'."
            )
        })
        .collect();
    sentences.push("Benutze nur das lateinische Alphabet.".to_string());
    Ok(sentences.join(" "))
}

fn karaoke_en(rng: &mut dyn RngCore, settings: &DeckSettings) -> Result<String, NotEnoughSlides> {
    let slide = random_slide_number(rng, KARAOKE_FIRST_SLIDE, settings.num_slides)?;
    Ok(format!(
        "Replace the bullet points of slide {slide} by a few lines of lyrics of a very famous song that is good to sing along to."
    ))
}

fn karaoke_de(rng: &mut dyn RngCore, settings: &DeckSettings) -> Result<String, NotEnoughSlides> {
    let slide = random_slide_number(rng, KARAOKE_FIRST_SLIDE, settings.num_slides)?;
    Ok(format!(
        "Ersetze die Stichpunkte von Folie {slide} durch ein paar Zeilen eines sehr bekannten Songs, zu dem man gut mitsingen kann."
    ))
}

const ROLES_EN: &[&str] = &[
    "super hero",
    "time traveller born 200 years ago",
    "beauty influencer",
    "news announcer",
];

const ROLES_DE: &[&str] = &[
    "Superheld*in",
    "Zeitreisende*r von vor 200 Jahren",
    "Beauty-Influencer*in",
    "Nachrichtensprecher*in",
];

fn roleplay_en(rng: &mut dyn RngCore, _settings: &DeckSettings) -> Result<String, NotEnoughSlides> {
    let role = ROLES_EN.choose(rng).copied().unwrap_or("news announcer");
    Ok(format!("Role play: Act like a {role}."))
}

fn roleplay_de(rng: &mut dyn RngCore, _settings: &DeckSettings) -> Result<String, NotEnoughSlides> {
    let role = ROLES_DE.choose(rng).copied().unwrap_or("Nachrichtensprecher*in");
    Ok(format!("Rollenspiel: Du bist ein*e {role}."))
}

// ────────────────────────────────────────────────────────────────────────────
// Catalogue
// ────────────────────────────────────────────────────────────────────────────

pub static SLIDE_STYLE_FLAGS: &[StyleFlag] = &[
    StyleFlag {
        name: "TECHNICAL",
        target: FlagTarget::Prompt,
        texts: &[
            (
                Language::De,
                LocalizedText::Literal(
                    "Verwende bitte viele Fachbegriffe, die das Publikum eventuell nicht versteht.",
                ),
            ),
            (
                Language::En,
                LocalizedText::Literal(
                    "Please make the presentation use many technical terms that the audience might not understand.",
                ),
            ),
        ],
    },
    StyleFlag {
        name: "FOREIGN_LANGUAGE",
        target: FlagTarget::Prompt,
        texts: &[
            (Language::De, LocalizedText::Generator(foreign_language_de)),
            (Language::En, LocalizedText::Generator(foreign_language_en)),
        ],
    },
    StyleFlag {
        name: "POETIC",
        target: FlagTarget::Prompt,
        texts: &[
            (
                Language::De,
                LocalizedText::Literal("Ab Folie 2, versuche dass die Stichpunkte Paarreime bilden."),
            ),
            (
                Language::En,
                LocalizedText::Literal(
                    "Beginning on slide 2, try to make the bullet points rhyme (adjacent rhymes).",
                ),
            ),
        ],
    },
    StyleFlag {
        name: "EXCESSIVE_INDENTS",
        target: FlagTarget::Prompt,
        texts: &[
            (
                Language::De,
                LocalizedText::Literal(
                    "Rücke die Stichpunkte unnötig ein, bis zu 4 Level. Die Gruppierung soll keinen Sinn ergeben und optisch keinem wiederkehrenden Muster folgen.",
                ),
            ),
            (
                Language::En,
                LocalizedText::Literal(
                    "Please indent the bullet points excessively, up to 4 levels. The grouping and indent level should not make any sense.",
                ),
            ),
        ],
    },
    StyleFlag {
        name: "KARAOKE",
        target: FlagTarget::Prompt,
        texts: &[
            (Language::De, LocalizedText::Generator(karaoke_de)),
            (Language::En, LocalizedText::Generator(karaoke_en)),
        ],
    },
    StyleFlag {
        name: "MEMES",
        target: FlagTarget::ImageQuery,
        texts: &[
            (Language::De, LocalizedText::Literal("meme")),
            (Language::En, LocalizedText::Literal("meme")),
        ],
    },
];

pub static SPEAKER_STYLE_FLAGS: &[StyleFlag] = &[
    StyleFlag {
        name: "IMITATION",
        target: FlagTarget::Speaker,
        texts: &[
            (
                Language::De,
                LocalizedText::Literal(
                    "Fange ab Folie 2 an, beim Reden einen Promi deiner Wahl zu imitieren.",
                ),
            ),
            (
                Language::En,
                LocalizedText::Literal(
                    "Starting on slide 2, try to imitate a celebrity of your choice while talking.",
                ),
            ),
        ],
    },
    StyleFlag {
        name: "ROLEPLAY",
        target: FlagTarget::Speaker,
        texts: &[
            (Language::De, LocalizedText::Generator(roleplay_de)),
            (Language::En, LocalizedText::Generator(roleplay_en)),
        ],
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    static GERMAN_ONLY: StyleFlag = StyleFlag {
        name: "GERMAN_ONLY",
        target: FlagTarget::Prompt,
        texts: &[(Language::De, LocalizedText::Literal("Nur auf Deutsch."))],
    };

    #[test]
    fn test_every_catalogue_flag_resolves_in_every_language() {
        let mut rng = StdRng::seed_from_u64(11);
        let settings = DeckSettings::default();
        for flag in SLIDE_STYLE_FLAGS.iter().chain(SPEAKER_STYLE_FLAGS) {
            for language in [Language::De, Language::En] {
                let text = flag.resolve(language, &mut rng, &settings).unwrap();
                assert!(!text.is_empty(), "{} ({language})", flag.name);
            }
        }
    }

    #[test]
    fn test_missing_language_fails_loudly() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = GERMAN_ONLY
            .resolve(Language::En, &mut rng, &DeckSettings::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MissingLanguage {
                flag: "GERMAN_ONLY",
                language: Language::En
            }
        ));
        assert!(matches!(
            PlanError::from(err),
            PlanError::MissingFlagLanguage { .. }
        ));
    }

    #[test]
    fn test_karaoke_on_short_deck_is_malformed() {
        let mut rng = StdRng::seed_from_u64(0);
        let settings = DeckSettings {
            num_slides: 2,
            num_wrong_topics: 1,
            ..DeckSettings::default()
        };
        let karaoke = SLIDE_STYLE_FLAGS.iter().find(|f| f.name == "KARAOKE").unwrap();
        let err = karaoke.resolve(Language::De, &mut rng, &settings).unwrap_err();
        assert!(matches!(err, ResolveError::Malformed { flag: "KARAOKE", .. }));
    }

    #[test]
    fn test_karaoke_picks_a_late_slide() {
        let karaoke = SLIDE_STYLE_FLAGS.iter().find(|f| f.name == "KARAOKE").unwrap();
        let settings = DeckSettings::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = karaoke.resolve(Language::En, &mut rng, &settings).unwrap();
            assert!(
                ["slide 3 ", "slide 4 ", "slide 5 "].iter().any(|s| text.contains(s)),
                "{text}"
            );
        }
    }

    #[test]
    fn test_foreign_language_names_two_distinct_slides() {
        let flag = SLIDE_STYLE_FLAGS
            .iter()
            .find(|f| f.name == "FOREIGN_LANGUAGE")
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let text = flag
            .resolve(Language::En, &mut rng, &DeckSettings::default())
            .unwrap();
        assert_eq!(text.matches("On slide").count(), 2);
        assert!(text.ends_with("Use the latin alphabet only."));
    }

    #[test]
    fn test_selection_covers_catalogue_evenly() {
        let mut rng = StdRng::seed_from_u64(21);
        let k = 3 * SLIDE_STYLE_FLAGS.len() + 2;
        let selected = select_flags(SLIDE_STYLE_FLAGS, k, &mut rng).unwrap();
        assert_eq!(selected.len(), k);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for flag in &selected {
            *counts.entry(flag.name).or_insert(0) += 1;
        }
        for flag in SLIDE_STYLE_FLAGS {
            assert!(counts.get(flag.name).copied().unwrap_or(0) >= 3, "{}", flag.name);
        }
    }

    #[test]
    fn test_speaker_catalogue_targets_speaker_only() {
        assert!(SPEAKER_STYLE_FLAGS
            .iter()
            .all(|f| f.target == FlagTarget::Speaker));
        assert!(SLIDE_STYLE_FLAGS
            .iter()
            .all(|f| f.target != FlagTarget::Speaker));
    }

    #[test]
    fn test_flag_serializes_name_and_target() {
        let json = serde_json::to_value(&SLIDE_STYLE_FLAGS[5]).unwrap();
        assert_eq!(json["name"], "MEMES");
        assert_eq!(json["target"], "image_query");
    }
}
