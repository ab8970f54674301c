mod party;
mod residue;

use std::sync::Arc;

use chrono::NaiveDate;
use snowtrip_catalog::{CatalogIndex, EntityMatcher, MatchResult};
use snowtrip_core::{
    detect_action, detect_visibility, normalize_text, Action, Confidence, Intent, Slot, SlotSet, Suggestion,
    TemporalParser,
};
use tracing::debug;

pub use party::extract_party_size;
pub use residue::resort_residue;

const KEYWORD_ACTION_CONFIDENCE: f64 = 0.9;
const INFERRED_ACTION_CONFIDENCE: f64 = 0.7;

/// Turns one utterance into an [`Intent`].
pub trait IntentClassifier: Send + Sync {
    /// Action plus every slot found in the text.
    fn classify(&self, text: &str) -> Intent;

    /// Slots only, for turns that answer a prompt. The action is always
    /// `CreateTrip` since the conversation is already building a trip.
    fn classify_slots(&self, text: &str) -> Intent;

    /// Most popular entities, for prompts that have nothing to suggest from.
    fn popular(&self, limit: usize) -> Vec<Suggestion>;

    fn today(&self) -> NaiveDate;
}

/// Keyword and dictionary classifier over one catalog snapshot.
#[derive(Debug, Clone)]
pub struct RuleIntentClassifier {
    matcher: EntityMatcher,
    parser: TemporalParser,
}

impl RuleIntentClassifier {
    pub fn new(index: Arc<CatalogIndex>, today: NaiveDate) -> Self {
        Self {
            matcher: EntityMatcher::new(index),
            parser: TemporalParser::new(today),
        }
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.matcher = self.matcher.with_suggestion_limit(limit);
        self
    }

    pub fn matcher(&self) -> &EntityMatcher {
        &self.matcher
    }

    pub fn parser(&self) -> &TemporalParser {
        &self.parser
    }

    fn extract(&self, text: &str) -> Intent {
        let text = normalize_text(text);
        let mut intent = Intent::new(Action::Unknown);

        let range = self.parser.extract_dates(&text);
        intent.start_date = range.start;
        intent.end_date = range.end;
        intent.duration_days = self.parser.extract_duration(&text).or_else(|| {
            let (start, end) = (range.start?, range.end?);
            u32::try_from((end.date - start.date).num_days() + 1)
                .ok()
                .filter(|days| *days > 0)
        });
        intent.visibility = detect_visibility(&text);
        intent.party_size = extract_party_size(&text);

        let residue = resort_residue(&text, &self.parser);
        match self.find_resort(&text, &residue) {
            Some(result) if !result.is_ambiguous() => {
                intent.resort_query = Some(result.matched_text.clone());
                intent.resort = Some(result.to_resolved());
            }
            Some(result) => {
                intent.resort_query = Some(if residue.is_empty() {
                    result.matched_text.clone()
                } else {
                    residue.clone()
                });
                intent.suggestions = if result.candidates.len() > 1 {
                    result.candidate_suggestions()
                } else {
                    self.matcher
                        .suggestions(&residue, self.matcher.suggestion_limit())
                };
                // A guess is never filled in; the user has to pick.
                intent.missing.insert(Slot::Resort);
            }
            None if !residue.is_empty() => {
                let suggestions = self
                    .matcher
                    .suggestions(&residue, self.matcher.suggestion_limit());
                if !suggestions.is_empty() {
                    intent.resort_query = Some(residue.clone());
                    intent.suggestions = suggestions;
                }
            }
            None => {}
        }

        debug!(
            residue = %residue,
            resort = intent.resort.as_ref().map(|resort| resort.id.as_str()),
            start = ?intent.start_date.map(|parsed| parsed.date),
            end = ?intent.end_date.map(|parsed| parsed.date),
            duration = ?intent.duration_days,
            "slots extracted"
        );
        intent
    }

    /// The residue as a whole, then the longest mention in the full text,
    /// then each residue token. A confident hit beats an ambiguous one.
    fn find_resort(&self, text: &str, residue: &str) -> Option<MatchResult> {
        let mut best: Option<MatchResult> = None;
        let mut consider = |candidate: Option<MatchResult>| -> bool {
            if let Some(candidate) = candidate {
                let better = best
                    .as_ref()
                    .map_or(true, |current| candidate.confidence > current.confidence);
                if better {
                    best = Some(candidate);
                }
            }
            best.as_ref().is_some_and(|result| !result.is_ambiguous())
        };

        if !residue.is_empty() && consider(self.matcher.match_query(residue)) {
            return best;
        }
        if consider(self.matcher.find_in_text(text)) {
            return best;
        }
        for token in residue.split_whitespace() {
            if token != residue && consider(self.matcher.match_query(token)) {
                break;
            }
        }
        best
    }
}

fn missing_for_trip(intent: &Intent) -> SlotSet {
    let mut missing = intent.missing;
    if intent.resort.is_none() {
        missing.insert(Slot::Resort);
    }
    if intent.start_date.is_none() {
        missing.insert(Slot::StartDate);
    }
    if intent.end_date.is_none() && intent.duration_days.is_none() {
        missing.insert(Slot::Duration);
    }
    missing
}

/// Mean of the resolved slot confidences, averaged with the action's.
fn overall_confidence(intent: &Intent, action_confidence: f64) -> Confidence {
    let slots = intent
        .resort
        .iter()
        .map(|resort| resort.confidence)
        .chain(intent.start_date.iter().map(|parsed| parsed.confidence))
        .chain(intent.end_date.iter().map(|parsed| parsed.confidence))
        .collect::<Vec<_>>();
    match Confidence::mean(&slots) {
        Some(mean) => Confidence::new((mean.value() + action_confidence) / 2.0),
        None => Confidence::new(action_confidence),
    }
}

impl IntentClassifier for RuleIntentClassifier {
    fn classify(&self, text: &str) -> Intent {
        let mut intent = self.extract(text);

        let (action, action_confidence) = match detect_action(&normalize_text(text)) {
            Some(action) => (action, KEYWORD_ACTION_CONFIDENCE),
            None if intent.resort.is_some() || intent.missing.contains(Slot::Resort) => {
                (Action::CreateTrip, INFERRED_ACTION_CONFIDENCE)
            }
            None => (Action::Unknown, 0.0),
        };
        intent.action = action;

        if action == Action::CreateTrip {
            intent.missing = missing_for_trip(&intent);
        }
        intent.confidence = overall_confidence(&intent, action_confidence);
        intent
    }

    fn classify_slots(&self, text: &str) -> Intent {
        let mut intent = self.extract(text);
        intent.action = Action::CreateTrip;
        intent.missing = missing_for_trip(&intent);
        intent.confidence = overall_confidence(&intent, 0.0);
        intent
    }

    fn popular(&self, limit: usize) -> Vec<Suggestion> {
        self.matcher.popular(limit)
    }

    fn today(&self) -> NaiveDate {
        self.parser.today()
    }
}
