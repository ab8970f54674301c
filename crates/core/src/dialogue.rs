use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NluError;
use crate::models::Suggestion;
use crate::trip::TripData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    #[serde(alias = "idle", alias = "start", alias = "greeting")]
    MainMenu,
    AwaitingResort,
    AwaitingDate,
    AwaitingDuration,
    ConfirmingTrip,
    CreatingTrip,
    TripCreated,
    ViewingTrips,
    Error,
}

impl DialogueState {
    /// States in which the controller is still collecting trip slots.
    pub fn is_collecting(self) -> bool {
        matches!(
            self,
            Self::AwaitingResort | Self::AwaitingDate | Self::AwaitingDuration
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Everything one conversation carries between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueContext {
    #[serde(default)]
    pub state: DialogueState,
    #[serde(default)]
    pub trip: TripData,
    #[serde(default)]
    pub history: Vec<TurnRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<NluError>,
}

impl DialogueContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the main menu with an empty accumulator. History is kept.
    pub fn reset(&mut self) {
        self.state = DialogueState::MainMenu;
        self.trip = TripData::default();
        self.last_error = None;
    }

    pub fn record_turn(&mut self, text: &str, at: DateTime<Utc>, limit: usize) {
        self.history.push(TurnRecord {
            text: text.to_string(),
            at,
        });
        if self.history.len() > limit {
            let overflow = self.history.len() - limit;
            self.history.drain(..overflow);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonOption {
    pub id: String,
    pub label: String,
    /// Text the host sends back as the next turn when the button is pressed.
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub message: String,
    pub state: DialogueState,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub buttons: Vec<ButtonOption>,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl DialogueResponse {
    pub fn new(state: DialogueState, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            state,
            suggestions: Vec::new(),
            buttons: Vec::new(),
            requires_confirmation: false,
            payload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_aliases_deserialize_to_main_menu() {
        for alias in ["\"idle\"", "\"start\"", "\"greeting\"", "\"main_menu\""] {
            let state: DialogueState = serde_json::from_str(alias).unwrap();
            assert_eq!(state, DialogueState::MainMenu);
        }
        assert!(serde_json::from_str::<DialogueState>("\"somewhere\"").is_err());
    }

    #[test]
    fn history_is_capped() {
        let mut context = DialogueContext::new();
        let at = Utc::now();
        for turn in 0..5 {
            context.record_turn(&turn.to_string(), at, 3);
        }
        let texts = context
            .history
            .iter()
            .map(|record| record.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["2", "3", "4"]);
    }
}
