//! The slot-filling state machine.
//!
//! `transition` is pure given a classifier: it never touches the trip store.
//! Store work is requested through [`Effect`] and finished by the agent with
//! one of the `complete_*` functions.

use snowtrip_core::replies;
use snowtrip_core::text::parse_count;
use snowtrip_core::{
    check_user_confirmation, is_abort, is_restart, normalize_text, Action, Confirmation,
    DialogueContext, DialogueResponse, DialogueState, Intent, NewTrip, NluError, Slot,
    SlotUpdate, TripData, TripRecord,
};
use snowtrip_nlu::IntentClassifier;

const POPULAR_LIMIT: usize = 5;
const DELETE_PREFIX: &str = "delete_trip:";
const MAX_DURATION_DAYS: u32 = 90;

/// Store work a turn asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreateTrip(NewTrip),
    LoadTrips { deleting: bool },
    DeleteTrip(String),
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub context: DialogueContext,
    pub response: DialogueResponse,
    pub effect: Option<Effect>,
}

impl TurnOutcome {
    /// The response decides the next state.
    fn new(mut context: DialogueContext, response: DialogueResponse, effect: Option<Effect>) -> Self {
        context.state = response.state;
        Self {
            context,
            response,
            effect,
        }
    }

    fn reply(context: DialogueContext, response: DialogueResponse) -> Self {
        Self::new(context, response, None)
    }
}

pub fn transition(
    mut context: DialogueContext,
    input: &str,
    classifier: &dyn IntentClassifier,
) -> TurnOutcome {
    let text = normalize_text(input);
    if context.state != DialogueState::Error {
        context.last_error = None;
    }

    match context.state {
        DialogueState::MainMenu | DialogueState::TripCreated | DialogueState::ViewingTrips => {
            menu_turn(context, &text, classifier)
        }
        DialogueState::AwaitingResort
        | DialogueState::AwaitingDate
        | DialogueState::AwaitingDuration => collecting_turn(context, &text, classifier),
        DialogueState::ConfirmingTrip => confirming_turn(context, &text, classifier),
        DialogueState::CreatingTrip => TurnOutcome::reply(context, replies::still_creating()),
        DialogueState::Error => error_turn(context, &text),
    }
}

fn menu_turn(
    mut context: DialogueContext,
    text: &str,
    classifier: &dyn IntentClassifier,
) -> TurnOutcome {
    if context.state == DialogueState::ViewingTrips {
        if let Some(trip_id) = text.strip_prefix(DELETE_PREFIX).map(str::trim) {
            if !trip_id.is_empty() {
                let effect = Effect::DeleteTrip(trip_id.to_string());
                return TurnOutcome::new(context, replies::loading_trips(true), Some(effect));
            }
        }
    }
    if text.is_empty() || is_restart(text) {
        context.reset();
        return TurnOutcome::reply(context, replies::main_menu());
    }

    let intent = classifier.classify(text);
    match intent.action {
        Action::DeleteTrip => TurnOutcome::new(
            context,
            replies::loading_trips(true),
            Some(Effect::LoadTrips { deleting: true }),
        ),
        Action::ViewTrips => TurnOutcome::new(
            context,
            replies::loading_trips(false),
            Some(Effect::LoadTrips { deleting: false }),
        ),
        Action::CreateTrip => {
            // Leftovers from a finished conversation never leak into a new trip.
            context.trip = TripData::default();
            advance(context, intent, classifier)
        }
        Action::Unknown if intent.has_any_slot() => {
            context.trip = TripData::default();
            advance(context, intent, classifier)
        }
        Action::Chat | Action::Unknown => TurnOutcome::reply(context, replies::chat(intent.suggestions)),
    }
}

fn collecting_turn(
    mut context: DialogueContext,
    text: &str,
    classifier: &dyn IntentClassifier,
) -> TurnOutcome {
    let state = context.state;
    if is_restart(text) {
        context.reset();
        return TurnOutcome::reply(context, replies::main_menu());
    }
    if is_abort(text) {
        context.reset();
        return TurnOutcome::reply(context, replies::cancelled());
    }
    if text.is_empty() {
        return TurnOutcome::reply(context.clone(), prompt_for(&context.trip, classifier));
    }

    let mut intent = classifier.classify_slots(text);
    if state == DialogueState::AwaitingDuration {
        read_duration_answer(&mut intent, &context.trip, text);
    }

    if !intent.has_any_slot() && intent.suggestions.is_empty() {
        return match state {
            DialogueState::AwaitingResort => {
                let query = intent.resort_query.unwrap_or_else(|| text.to_string());
                context.last_error = Some(NluError::EntityNotFound {
                    query: query.clone(),
                    suggestions: Vec::new(),
                });
                TurnOutcome::reply(context, replies::clarify_resort(&query, Vec::new()))
            }
            _ => {
                context.last_error = Some(NluError::UnparsableTemporalExpression {
                    input: text.to_string(),
                });
                TurnOutcome::reply(context, replies::date_format_help(state))
            }
        };
    }

    advance(context, intent, classifier)
}

/// While asking for the length of a stay, a lone date is the return date and
/// a bare number is a day count.
fn read_duration_answer(intent: &mut Intent, trip: &TripData, text: &str) {
    if intent.end_date.is_none() && intent.duration_days.is_none() && trip.start_date.is_some() {
        if let Some(date) = intent.start_date.take() {
            intent.end_date = Some(date);
        }
    }
    if !intent.has_schedule() {
        intent.duration_days = parse_count(text).filter(|days| (1..=MAX_DURATION_DAYS).contains(days));
    }
}

fn confirming_turn(
    mut context: DialogueContext,
    text: &str,
    classifier: &dyn IntentClassifier,
) -> TurnOutcome {
    if is_restart(text) {
        context.reset();
        return TurnOutcome::reply(context, replies::main_menu());
    }

    match check_user_confirmation(text) {
        Confirmation::Confirm => match NewTrip::try_from(&context.trip) {
            Ok(trip) => {
                let response = replies::creating_trip(&trip);
                TurnOutcome::new(context, response, Some(Effect::CreateTrip(trip)))
            }
            Err(err) => {
                context.last_error = Some(err);
                let response = prompt_for(&context.trip, classifier);
                TurnOutcome::reply(context, response)
            }
        },
        Confirmation::Cancel => {
            // "不對，改成7天" corrects the trip instead of dropping it.
            let intent = classifier.classify_slots(text);
            if !is_abort(text) && intent.has_any_slot() {
                return advance(context, intent, classifier);
            }
            context.reset();
            TurnOutcome::reply(context, replies::cancelled())
        }
        Confirmation::Unclear => {
            let intent = classifier.classify_slots(text);
            if intent.has_any_slot() || !intent.suggestions.is_empty() {
                advance(context, intent, classifier)
            } else {
                let response = replies::unclear_confirmation(&context.trip);
                TurnOutcome::reply(context, response)
            }
        }
    }
}

fn error_turn(mut context: DialogueContext, text: &str) -> TurnOutcome {
    if is_restart(text) {
        context.reset();
        TurnOutcome::reply(context, replies::main_menu())
    } else {
        TurnOutcome::reply(context, replies::still_in_error())
    }
}

/// Folds the turn's slots into the accumulator and picks the next prompt.
fn advance(
    mut context: DialogueContext,
    intent: Intent,
    classifier: &dyn IntentClassifier,
) -> TurnOutcome {
    let current = context.state;
    let update = SlotUpdate::from_intent(&intent);
    let dates_given = update.has_schedule();
    let outcome = context.trip.merge(update);

    let unresolved = intent.resort.is_none() && !intent.suggestions.is_empty();
    if unresolved && (context.trip.resort.is_none() || !dates_given) {
        let query = intent.resort_query.clone().unwrap_or_default();
        context.last_error = Some(if intent.missing.contains(Slot::Resort) {
            NluError::AmbiguousMatch {
                query: query.clone(),
                candidates: intent.suggestions.clone(),
            }
        } else {
            NluError::EntityNotFound {
                query: query.clone(),
                suggestions: intent.suggestions.clone(),
            }
        });
        let response = if context.trip.resort.is_none() {
            replies::clarify_resort(&query, intent.suggestions)
        } else {
            replies::clarify_resort_in(stay_in(current, &context.trip), &query, intent.suggestions)
        };
        return TurnOutcome::reply(context, response);
    }

    let response = if outcome.range_rejected {
        replies::range_rejected(next_state(&context.trip))
    } else {
        match (&outcome.previous_resort, &context.trip.resort) {
            (Some(previous), Some(current)) if !dates_given => {
                replies::resort_changed(previous, current)
            }
            _ => prompt_for(&context.trip, classifier),
        }
    };
    TurnOutcome::reply(context, response)
}

/// Menu states hand over to slot collection; collecting states stay put.
fn stay_in(current: DialogueState, trip: &TripData) -> DialogueState {
    match current {
        DialogueState::AwaitingResort
        | DialogueState::AwaitingDate
        | DialogueState::AwaitingDuration
        | DialogueState::ConfirmingTrip => current,
        _ => next_state(trip),
    }
}

fn next_state(trip: &TripData) -> DialogueState {
    let missing = trip.missing();
    if missing.contains(Slot::Resort) {
        DialogueState::AwaitingResort
    } else if missing.contains(Slot::StartDate) {
        DialogueState::AwaitingDate
    } else if missing.contains(Slot::Duration) {
        DialogueState::AwaitingDuration
    } else {
        DialogueState::ConfirmingTrip
    }
}

fn prompt_for(trip: &TripData, classifier: &dyn IntentClassifier) -> DialogueResponse {
    match (next_state(trip), &trip.resort) {
        (DialogueState::AwaitingResort, _) | (_, None) => {
            replies::ask_resort(classifier.popular(POPULAR_LIMIT))
        }
        (DialogueState::AwaitingDate, Some(resort)) => replies::ask_date(resort),
        (DialogueState::AwaitingDuration, Some(_)) => replies::ask_duration(trip),
        (_, Some(_)) => replies::confirm_trip(trip),
    }
}

/// Finishes a `CreateTrip` effect. Either way the accumulator is emptied; a
/// failure keeps the store's message verbatim for the user.
pub fn complete_creation(
    mut context: DialogueContext,
    result: Result<TripRecord, String>,
) -> TurnOutcome {
    context.trip = TripData::default();
    match result {
        Ok(record) => {
            context.last_error = None;
            TurnOutcome::reply(context, replies::trip_created(&record))
        }
        Err(message) => {
            let response = replies::error(&message);
            context.last_error = Some(NluError::DownstreamCreationFailure { message });
            TurnOutcome::reply(context, response)
        }
    }
}

pub fn complete_listing(
    context: DialogueContext,
    result: Result<Vec<TripRecord>, String>,
    deleting: bool,
) -> TurnOutcome {
    let response = match result {
        Ok(trips) => replies::viewing_trips(&trips, deleting),
        Err(message) => replies::trips_unavailable(&message),
    };
    TurnOutcome::reply(context, response)
}

pub fn complete_deletion(
    context: DialogueContext,
    removed: Result<bool, String>,
    remaining: Result<Vec<TripRecord>, String>,
) -> TurnOutcome {
    let response = match (removed, remaining) {
        (Ok(removed), Ok(trips)) => replies::trip_deleted(removed, &trips),
        (Err(message), _) | (_, Err(message)) => replies::trips_unavailable(&message),
    };
    TurnOutcome::reply(context, response)
}
