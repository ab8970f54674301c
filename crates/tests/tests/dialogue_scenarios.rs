use chrono::{NaiveDate, TimeDelta};
use snowtrip_core::replies::{CANCEL_REPLY, CONFIRM_REPLY, RESTART_REPLY};
use snowtrip_core::{DialogueContext, DialogueState, NluError, TripData};
use snowtrip_dialogue::{Effect, TurnOutcome};
use snowtrip_tests::Harness;

async fn converse(harness: &Harness, turns: &[&str]) -> TurnOutcome {
    let mut context = DialogueContext::new();
    let mut last = None;
    for turn in turns {
        let outcome = harness.agent.handle_turn(context, turn).await;
        context = outcome.context.clone();
        last = Some(outcome);
    }
    last.expect("at least one turn")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn step_by_step_booking() {
    let harness = Harness::default();

    let outcome = converse(&harness, &["規劃滑雪行程"]).await;
    assert_eq!(outcome.context.state, DialogueState::AwaitingResort);
    assert!(!outcome.response.suggestions.is_empty());

    let outcome = converse(
        &harness,
        &["規劃滑雪行程", "Niseko", "12月28日", "五天", CONFIRM_REPLY],
    )
    .await;
    assert_eq!(outcome.context.state, DialogueState::TripCreated);
    assert!(matches!(outcome.effect, Some(Effect::CreateTrip(_))));

    let trips = harness.agent.list_trips().await.unwrap();
    assert_eq!(trips.len(), 1);
    let record = &trips[0];
    assert_eq!(record.resort_id, "niseko");
    assert_eq!(record.start_date, date(2025, 12, 28));
    assert_eq!(record.end_date, date(2026, 1, 1));
    assert_eq!(record.duration_days, 5);
}

#[tokio::test]
async fn one_shot_request_reaches_confirmation() {
    let harness = Harness::default();
    let outcome = converse(&harness, &["野沢 3月20-25日 3人 公開"]).await;
    let trip = &outcome.context.trip;
    assert_eq!(outcome.context.state, DialogueState::ConfirmingTrip);
    assert_eq!(trip.resort.as_ref().unwrap().id, "nozawa");
    assert_eq!(trip.start_date, Some(date(2026, 3, 20)));
    assert_eq!(trip.duration_days, Some(6));
    assert_eq!(trip.party_size, Some(3));
    assert!(outcome.response.message.contains("公開設定：公開"));
}

#[tokio::test]
async fn cancel_at_confirmation_forgets_the_trip() {
    let harness = Harness::default();
    let outcome = converse(&harness, &["野澤 3月20-25日", CANCEL_REPLY]).await;
    assert_eq!(outcome.context.state, DialogueState::MainMenu);
    assert_eq!(outcome.context.trip, TripData::default());
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn corrections_during_confirmation_are_merged() {
    let harness = Harness::default();
    let outcome = converse(&harness, &["野澤 3月20-25日", "改成7天"]).await;
    assert_eq!(outcome.context.state, DialogueState::ConfirmingTrip);
    assert_eq!(outcome.context.trip.duration_days, Some(7));
    assert_eq!(outcome.context.trip.end_date, Some(date(2026, 3, 26)));
    assert_eq!(outcome.context.trip.start_date, Some(date(2026, 3, 20)));
}

#[tokio::test]
async fn failed_creation_requires_restart() {
    let harness = Harness::default();
    harness.store.fail_creations(Some("resort fully booked"));

    let outcome = converse(&harness, &["野澤 3月20-25日", CONFIRM_REPLY]).await;
    assert_eq!(outcome.context.state, DialogueState::Error);
    assert_eq!(
        outcome.context.last_error,
        Some(NluError::DownstreamCreationFailure {
            message: "resort fully booked".to_string()
        })
    );
    assert!(outcome
        .response
        .buttons
        .iter()
        .any(|button| button.action == RESTART_REPLY));

    let outcome = converse(
        &harness,
        &["野澤 3月20-25日", CONFIRM_REPLY, "再試一次", RESTART_REPLY],
    )
    .await;
    assert_eq!(outcome.context.state, DialogueState::MainMenu);
    assert!(outcome.context.last_error.is_none());
    assert_eq!(harness.metrics.snapshot().trip_creation_failures_total, 2);
}

#[tokio::test]
async fn relative_dates_follow_the_clock() {
    let harness = Harness::default();
    let before = converse(&harness, &["苗場 明天 3天"]).await;
    assert_eq!(before.context.trip.start_date, Some(date(2025, 11, 16)));

    harness.clock.advance(TimeDelta::days(30));
    let after = converse(&harness, &["苗場 明天 3天"]).await;
    assert_eq!(after.context.trip.start_date, Some(date(2025, 12, 16)));
    assert_eq!(after.context.trip.end_date, Some(date(2025, 12, 18)));
}

#[tokio::test]
async fn history_is_kept_across_reset() {
    let harness = Harness::default();
    let outcome = converse(&harness, &["二世谷", "算了", "你好"]).await;
    assert_eq!(outcome.context.state, DialogueState::MainMenu);
    let texts = outcome
        .context
        .history
        .iter()
        .map(|turn| turn.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["二世谷", "算了", "你好"]);
}

#[tokio::test]
async fn switching_resort_before_dates_forgets_the_stay_length() {
    let harness = Harness::default();
    let outcome = converse(&harness, &["二世谷 5天", "留壽都"]).await;
    assert_eq!(outcome.context.state, DialogueState::AwaitingDate);
    assert_eq!(outcome.context.trip.resort.as_ref().unwrap().id, "rusutsu");
    assert_eq!(outcome.context.trip.duration_days, None);
    assert_eq!(outcome.context.trip.end_date, None);
}

#[tokio::test]
async fn refusal_at_confirmation_creates_nothing() {
    let harness = Harness::default();
    let outcome = converse(&harness, &["野澤 3月20-25日", "不可以"]).await;
    assert_eq!(outcome.context.state, DialogueState::MainMenu);
    assert!(outcome.effect.is_none());
    assert!(harness.store.is_empty());
}
