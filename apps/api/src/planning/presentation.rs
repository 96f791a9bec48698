use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::planning::style_flags::StyleFlag;

fn default_true() -> bool {
    true
}

/// External player record as delivered by the game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: String,
    pub session_id: Option<String>,
    /// Non-speakers contribute topics but do not present.
    #[serde(default = "default_true")]
    pub is_speaker: bool,
}

/// One entry of the presenter list, in the order topics were submitted.
#[derive(Debug, Clone)]
pub struct Presenter {
    pub name: String,
    pub player: Option<PlayerRef>,
}

impl Presenter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            player: None,
        }
    }
}

/// The planned deck of one presenter.
///
/// Built by topic assignment, filled in by style selection and prompt
/// composition, then handed read-only to the text generator.
#[derive(Debug, Clone, Serialize)]
pub struct Presentation {
    pub id: Uuid,
    pub speaker: String,
    pub topic: String,
    pub wrong_topics: Vec<String>,
    pub player: Option<PlayerRef>,
    pub slide_style_flag: Option<&'static StyleFlag>,
    pub speaker_style_flag: Option<&'static StyleFlag>,
    pub speaker_instruction: Option<String>,
    pub prompt: Option<String>,
    pub image_query_suffix: Option<String>,
    pub deck_template: Option<String>,
    pub outline_markdown: Option<String>,
}

impl Presentation {
    pub fn new(speaker: String, topic: String, wrong_topics: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            topic,
            wrong_topics,
            player: None,
            slide_style_flag: None,
            speaker_style_flag: None,
            speaker_instruction: None,
            prompt: None,
            image_query_suffix: None,
            deck_template: None,
            outline_markdown: None,
        }
    }

    pub fn is_speaker(&self) -> bool {
        self.player.as_ref().map_or(true, |p| p.is_speaker)
    }
}
