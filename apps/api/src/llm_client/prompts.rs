// System prompts sent alongside generation requests.
// User-facing prompt text lives in `planning::prompts`.

/// System prompt for slide outline generation.
pub const OUTLINE_SYSTEM: &str = "You write short, funny slide outlines for a PowerPoint \
    karaoke game. Follow the requested format exactly and answer in the language of the request.";

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
