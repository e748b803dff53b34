use serde::Deserialize;

const AFFIRMATIVE_ANSWERS: [&str; 8] = ["yes", "y", "true", "1", "si", "sí", "daily", "on"];

/// Reads a free-text answer to "¿Querés recibir actualizaciones diarias?".
///
/// Anything that is not an explicit affirmative answer counts as a no.
pub fn parse_wants_daily_updates(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();

    AFFIRMATIVE_ANSWERS.contains(&normalized.as_str())
}

/// The subscription form posts the select value as text, API clients send a boolean.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum DailyUpdatesAnswer {
    Flag(bool),
    Text(String),
}

impl DailyUpdatesAnswer {
    pub fn wants_daily_updates(&self) -> bool {
        match self {
            DailyUpdatesAnswer::Flag(flag) => *flag,
            DailyUpdatesAnswer::Text(text) => parse_wants_daily_updates(text),
        }
    }
}

impl Default for DailyUpdatesAnswer {
    fn default() -> Self {
        DailyUpdatesAnswer::Flag(false)
    }
}
