use std::collections::HashSet;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::OUTLINE_SYSTEM;
use crate::planning::composer::DeckSettings;
use crate::planning::instructions::{
    merge_speaker_instructions, request_instruction_pool, POOL_INSTRUCTIONS_PER_PRESENTER,
};
use crate::planning::planner::{plan_batch, BatchInput};
use crate::planning::presentation::{PlayerRef, Presentation, Presenter};
use crate::planning::style_flags::{StyleFlag, SLIDE_STYLE_FLAGS, SPEAKER_STYLE_FLAGS};
use crate::planning::topics::TopicSource;
use crate::planning::Language;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PresenterRequest {
    pub name: String,
    pub player_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_speaker: bool,
    /// This presenter's own topics. Ignored when the batch has a `topic_pool`.
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanBatchRequest {
    pub presenters: Vec<PresenterRequest>,
    pub topic_pool: Option<Vec<String>>,
    pub language: Option<String>,
    pub num_slides: Option<u32>,
    pub num_bullets_min: Option<u32>,
    pub num_bullets_max: Option<u32>,
    pub num_wrong_topics: Option<usize>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub deck_templates: Vec<String>,
    #[serde(default)]
    pub speaker_instruction_ideas: bool,
    #[serde(default)]
    pub generate_outlines: bool,
}

#[derive(Debug, Serialize)]
pub struct PlanBatchResponse {
    pub batch_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub language: Language,
    /// Replaying the request with this seed reproduces the plan.
    pub seed: u64,
    pub presentations: Vec<Presentation>,
}

#[derive(Debug, Serialize)]
pub struct StyleFlagCatalogue {
    pub slide: &'static [StyleFlag],
    pub speaker: &'static [StyleFlag],
}

/// Applies request overrides on top of the configured defaults.
fn deck_settings(req: &PlanBatchRequest, defaults: &DeckSettings) -> Result<DeckSettings, AppError> {
    let language = match req.language.as_deref() {
        Some(code) => code.parse::<Language>()?,
        None => defaults.language,
    };
    Ok(DeckSettings {
        language,
        num_slides: req.num_slides.unwrap_or(defaults.num_slides),
        num_bullets_min: req.num_bullets_min.unwrap_or(defaults.num_bullets_min),
        num_bullets_max: req.num_bullets_max.unwrap_or(defaults.num_bullets_max),
        num_wrong_topics: req.num_wrong_topics.unwrap_or(defaults.num_wrong_topics),
    })
}

fn batch_input(req: &PlanBatchRequest) -> Result<BatchInput, AppError> {
    let mut seen = HashSet::new();
    let mut presenters = Vec::with_capacity(req.presenters.len());

    for p in &req.presenters {
        let name = p.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Presenter names must not be empty".into()));
        }
        if !seen.insert(name) {
            return Err(AppError::Validation(format!("Duplicate presenter '{name}'")));
        }
        let player = match &p.player_id {
            Some(id) => Some(PlayerRef {
                id: id.clone(),
                session_id: p.session_id.clone(),
                is_speaker: p.is_speaker,
            }),
            None if !p.is_speaker => {
                return Err(AppError::Validation(format!(
                    "Non-speaking presenter '{name}' needs a player_id"
                )))
            }
            None => None,
        };
        let mut presenter = Presenter::named(name);
        presenter.player = player;
        presenters.push(presenter);
    }

    let topics = match &req.topic_pool {
        Some(pool) => TopicSource::Pool(pool.clone()),
        None => TopicSource::Groups(req.presenters.iter().map(|p| p.topics.clone()).collect()),
    };

    Ok(BatchInput {
        presenters,
        topics,
        deck_templates: req.deck_templates.clone(),
    })
}

/// POST /api/v1/batches
pub async fn handle_plan_batch(
    State(state): State<AppState>,
    Json(req): Json<PlanBatchRequest>,
) -> Result<Json<PlanBatchResponse>, AppError> {
    let settings = deck_settings(&req, &state.config.deck_defaults)?;
    let input = batch_input(&req)?;

    if req.generate_outlines && state.text_generator.is_none() {
        return Err(AppError::Validation(
            "Outline generation requires ANTHROPIC_API_KEY to be configured".into(),
        ));
    }

    let seed = req
        .seed
        .or(state.config.planner_seed)
        .unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut presentations = plan_batch(&input, &settings, &mut rng)?;

    if req.speaker_instruction_ideas && !presentations.is_empty() {
        match &state.text_generator {
            Some(generator) => {
                let pool =
                    request_instruction_pool(generator.as_ref(), settings.language, presentations.len())
                        .await;
                match pool {
                    Some(pool) => merge_speaker_instructions(
                        &mut presentations,
                        &pool,
                        POOL_INSTRUCTIONS_PER_PRESENTER,
                        settings.language,
                        &mut rng,
                    )?,
                    None => warn!("Keeping style flag instructions only"),
                }
            }
            None => warn!("Speaker instruction ideas skipped: no text generator configured"),
        }
    }

    if let (true, Some(generator)) = (req.generate_outlines, &state.text_generator) {
        for presentation in presentations.iter_mut() {
            if let Some(prompt) = &presentation.prompt {
                let outline = generator.generate_text(prompt, OUTLINE_SYSTEM).await?;
                presentation.outline_markdown = Some(outline);
            }
        }
    }

    let batch_id = Uuid::new_v4();
    info!(
        "Batch {batch_id} planned: {} presentation(s), seed {seed}",
        presentations.len()
    );

    Ok(Json(PlanBatchResponse {
        batch_id,
        created_at: Utc::now(),
        language: settings.language,
        seed,
        presentations,
    }))
}

/// GET /api/v1/style-flags
pub async fn handle_list_style_flags() -> Json<StyleFlagCatalogue> {
    Json(StyleFlagCatalogue {
        slide: SLIDE_STYLE_FLAGS,
        speaker: SPEAKER_STYLE_FLAGS,
    })
}
