//! Speaker instruction pool: extra on-stage instructions requested from the
//! text generator and mixed with the flag-derived instruction of each deck.

use rand::RngCore;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::planning::presentation::Presentation;
use crate::planning::prompts::{instruction_pool_prompt, template};
use crate::planning::sampler::sample_minimal_repetitions;
use crate::planning::{Language, PlanError};

/// Pool instructions offered to each presenter, on top of the flag instruction.
pub const POOL_INSTRUCTIONS_PER_PRESENTER: usize = 2;
const POOL_ATTEMPTS: u32 = 3;

/// How many ideas to ask for so the pool has some slack beyond `k` per presenter.
pub fn pool_request_size(per_presenter: usize, presenters: usize) -> usize {
    ((per_presenter as f64 + 0.5) * presenters as f64).ceil() as usize
}

/// Validates a generator reply: a JSON list of strings, or an object wrapping
/// one, with a length within 75%–125% of `requested`.
pub fn parse_instruction_pool(text: &str, requested: usize) -> Result<Vec<String>, String> {
    let value: Value =
        serde_json::from_str(strip_json_fences(text)).map_err(|e| format!("invalid JSON: {e}"))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((_, Value::Array(items))) => items,
            _ => return Err("object does not wrap a list".to_string()),
        },
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => return Err(format!("expected a list, got {other}")),
    };

    let len = items.len() as f64;
    if len < 0.75 * requested as f64 || len > 1.25 * requested as f64 {
        return Err(format!("got {} instruction(s), requested {requested}", items.len()));
    }

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            other => Err(format!("not an instruction string: {other}")),
        })
        .collect()
}

/// Asks the generator for instruction ideas. Returns `None` when no usable
/// pool could be obtained; callers keep the flag instructions in that case.
pub async fn request_instruction_pool(
    generator: &dyn TextGenerator,
    language: Language,
    presenters: usize,
) -> Option<Vec<String>> {
    let requested = pool_request_size(POOL_INSTRUCTIONS_PER_PRESENTER, presenters);
    let prompt = instruction_pool_prompt(language).replace("{count}", &requested.to_string());

    for attempt in 1..=POOL_ATTEMPTS {
        let reply = match generator.generate_text(&prompt, JSON_ONLY_SYSTEM).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Instruction pool request failed: {e}");
                return None;
            }
        };
        match parse_instruction_pool(&reply, requested) {
            Ok(pool) => {
                info!("Received {} instructions (requested {requested})", pool.len());
                return Some(pool);
            }
            Err(reason) => warn!(
                "Instruction pool reply malformed ({reason}), attempt {attempt}/{POOL_ATTEMPTS}"
            ),
        }
    }
    None
}

/// Gives every presentation `per_presenter` pool instructions plus its own
/// flag instruction, joined as alternatives ("... [OR] ...").
pub fn merge_speaker_instructions(
    presentations: &mut [Presentation],
    pool: &[String],
    per_presenter: usize,
    language: Language,
    rng: &mut dyn RngCore,
) -> Result<(), PlanError> {
    if per_presenter == 0 || presentations.is_empty() {
        return Ok(());
    }
    let sample = sample_minimal_repetitions(pool, per_presenter * presentations.len(), rng)?;
    let separator = format!(" [{}] ", template(language).or);

    for (presentation, choices) in presentations.iter_mut().zip(sample.chunks(per_presenter)) {
        let mut choices = choices.to_vec();
        choices.extend(presentation.speaker_instruction.take());
        presentation.speaker_instruction = Some(choices.join(&separator));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::llm_client::LlmError;

    /// Replays canned replies in order.
    struct Scripted {
        replies: Mutex<Vec<String>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate_text(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            self.replies.lock().unwrap().pop().ok_or(LlmError::EmptyContent)
        }
    }

    fn ideas(n: usize) -> String {
        let list: Vec<String> = (0..n).map(|i| format!("Idea {i}")).collect();
        serde_json::to_string(&list).unwrap()
    }

    #[test]
    fn test_request_size_has_slack() {
        assert_eq!(pool_request_size(2, 4), 10);
        assert_eq!(pool_request_size(2, 3), 8);
    }

    #[test]
    fn test_parse_plain_list() {
        let pool = parse_instruction_pool(&ideas(10), 10).unwrap();
        assert_eq!(pool.len(), 10);
        assert_eq!(pool[0], "Idea 0");
    }

    #[test]
    fn test_parse_wrapped_and_fenced_list() {
        let text = format!("```json\n{{\"instructions\": {}}}\n```", ideas(9));
        assert_eq!(parse_instruction_pool(&text, 10).unwrap().len(), 9);
    }

    #[test]
    fn test_parse_rejects_wrong_count_and_non_strings() {
        assert!(parse_instruction_pool(&ideas(5), 10).is_err());
        assert!(parse_instruction_pool(&ideas(13), 10).is_err());
        assert!(parse_instruction_pool("[1, 2, 3, 4]", 4).is_err());
        assert!(parse_instruction_pool("\"just text\"", 1).is_err());
        assert!(parse_instruction_pool("not json", 1).is_err());
    }

    #[tokio::test]
    async fn test_request_retries_malformed_replies() {
        let good = ideas(10);
        let generator = Scripted::new(&["nope", "[1, 2]", good.as_str()]);
        let pool = request_instruction_pool(&generator, Language::De, 4).await;
        assert_eq!(pool.map(|p| p.len()), Some(10));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_request_gives_up_after_three_attempts() {
        let good = ideas(10);
        let generator = Scripted::new(&["nope", "nope", "nope", good.as_str()]);
        assert!(request_instruction_pool(&generator, Language::En, 4).await.is_none());
        assert_eq!(generator.calls(), 3);
    }

    #[test]
    fn test_merge_appends_flag_instruction_last() {
        let mut presentations: Vec<Presentation> = (0..3)
            .map(|i| {
                let mut p = Presentation::new(format!("S{i}"), "T".into(), vec![]);
                p.speaker_instruction = Some(format!("Flag {i}"));
                p
            })
            .collect();
        let pool: Vec<String> = (0..4).map(|i| format!("Pool {i}")).collect();
        let mut rng = StdRng::seed_from_u64(6);

        merge_speaker_instructions(&mut presentations, &pool, 2, Language::De, &mut rng).unwrap();

        for (i, p) in presentations.iter().enumerate() {
            let text = p.speaker_instruction.as_deref().unwrap();
            let parts: Vec<&str> = text.split(" [ODER] ").collect();
            assert_eq!(parts.len(), 3, "{text}");
            assert!(parts[..2].iter().all(|s| s.starts_with("Pool ")));
            assert_eq!(parts[2], format!("Flag {i}"));
        }
    }

    #[test]
    fn test_merge_without_flag_instruction() {
        let mut presentations = vec![Presentation::new("S".into(), "T".into(), vec![])];
        let pool = vec!["Whisper".to_string()];
        let mut rng = StdRng::seed_from_u64(0);
        merge_speaker_instructions(&mut presentations, &pool, 2, Language::En, &mut rng).unwrap();
        assert_eq!(
            presentations[0].speaker_instruction.as_deref(),
            Some("Whisper [OR] Whisper")
        );
    }
}
