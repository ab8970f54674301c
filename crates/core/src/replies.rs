use chrono::NaiveDate;
use serde_json::json;

use crate::dialogue::{ButtonOption, DialogueResponse, DialogueState};
use crate::models::{EntityRef, Suggestion};
use crate::trip::{NewTrip, TripData, TripRecord};

pub const CONFIRM_REPLY: &str = "確定";
pub const CANCEL_REPLY: &str = "取消";
pub const RESTART_REPLY: &str = "重新開始";
pub const VIEW_REPLY: &str = "查看我的行程";
pub const CREATE_REPLY: &str = "規劃滑雪行程";

pub fn main_menu() -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::MainMenu,
        "嗨！想去哪裡滑雪？直接告訴我雪場和日期就可以，例如「野澤 3月20-25日」。",
    );
    response.buttons = menu_buttons();
    response
}

pub fn chat(suggestions: Vec<Suggestion>) -> DialogueResponse {
    let message = if suggestions.is_empty() {
        "我可以幫你規劃滑雪行程或查看已建立的行程，要從哪一個開始？"
    } else {
        "你是想去這些雪場嗎？點一下就能開始規劃。"
    };
    let mut response = DialogueResponse::new(DialogueState::MainMenu, message);
    response.buttons = if suggestions.is_empty() {
        menu_buttons()
    } else {
        suggestion_buttons(&suggestions)
    };
    response.suggestions = suggestions;
    response
}

pub fn ask_resort(suggestions: Vec<Suggestion>) -> DialogueResponse {
    let message = if suggestions.is_empty() {
        "想去哪個雪場呢？"
    } else {
        "想去哪個雪場呢？這些是熱門選擇："
    };
    with_chips(DialogueState::AwaitingResort, message, suggestions)
}

/// The user named something, but not one resort unambiguously.
pub fn clarify_resort(query: &str, suggestions: Vec<Suggestion>) -> DialogueResponse {
    let message = if suggestions.is_empty() {
        format!("找不到「{query}」這個雪場，可以換個說法再試一次嗎？")
    } else {
        format!("「{query}」可能是下面其中一個雪場，是哪一個呢？")
    };
    with_chips(DialogueState::AwaitingResort, message, suggestions)
}

/// Same as `clarify_resort` but the conversation stays where it was.
pub fn clarify_resort_in(
    state: DialogueState,
    query: &str,
    suggestions: Vec<Suggestion>,
) -> DialogueResponse {
    let mut response = clarify_resort(query, suggestions);
    response.state = state;
    response
}

pub fn ask_date(resort: &EntityRef) -> DialogueResponse {
    DialogueResponse::new(
        DialogueState::AwaitingDate,
        format!(
            "{}，好選擇！打算什麼時候出發？可以輸入「12/20-25」、「1月5日」或「下週五」。",
            resort.name
        ),
    )
}

pub fn resort_changed(previous: &EntityRef, current: &EntityRef) -> DialogueResponse {
    DialogueResponse::new(
        DialogueState::AwaitingDate,
        format!(
            "已經從{}改成{}，原本的日期清掉了。這次打算什麼時候出發？",
            previous.name, current.name
        ),
    )
}

pub fn date_format_help(state: DialogueState) -> DialogueResponse {
    DialogueResponse::new(
        state,
        "看不懂這個日期耶。可以試試「12/20」、「12月20日」、「12/20-25」或「下週五」這類寫法。",
    )
}

pub fn range_rejected(state: DialogueState) -> DialogueResponse {
    DialogueResponse::new(state, "回程日期比出發日期還早，請再確認一次日期。")
}

pub fn ask_duration(trip: &TripData) -> DialogueResponse {
    let start = trip
        .start_date
        .map(format_date)
        .unwrap_or_else(|| "出發日".to_string());
    let mut response = DialogueResponse::new(
        DialogueState::AwaitingDuration,
        format!("{start} 出發，預計玩幾天？也可以直接告訴我回程日期。"),
    );
    response.buttons = [3, 5, 7]
        .into_iter()
        .map(|days| button(&format!("days_{days}"), &format!("{days}天"), &format!("{days}天")))
        .collect();
    response
}

pub fn confirm_trip(trip: &TripData) -> DialogueResponse {
    let mut response = DialogueResponse::new(DialogueState::ConfirmingTrip, trip_summary(trip));
    response.requires_confirmation = true;
    response.buttons = vec![
        button("confirm", "確定建立", CONFIRM_REPLY),
        button("cancel", "取消", CANCEL_REPLY),
    ];
    response.payload = serde_json::to_value(trip).ok();
    response
}

pub fn creating_trip(trip: &NewTrip) -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::CreatingTrip,
        format!("正在建立{}的行程…", trip.resort.name),
    );
    response.payload = serde_json::to_value(trip).ok();
    response
}

pub fn trip_created(record: &TripRecord) -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::TripCreated,
        format!(
            "行程建立好了！{} {} 到 {}，共 {} 天。",
            record.resort_name,
            format_date(record.start_date),
            format_date(record.end_date),
            record.duration_days
        ),
    );
    response.buttons = menu_buttons();
    response.payload = serde_json::to_value(record).ok();
    response
}

pub fn still_creating() -> DialogueResponse {
    DialogueResponse::new(DialogueState::CreatingTrip, "行程還在建立中，請稍候…")
}

pub fn cancelled() -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::MainMenu,
        "好的，已取消這個行程。還想去哪裡滑雪嗎？",
    );
    response.buttons = menu_buttons();
    response
}

pub fn unclear_confirmation(trip: &TripData) -> DialogueResponse {
    let mut response = confirm_trip(trip);
    response.message = format!("要建立這個行程嗎？請回覆「確定」或「取消」。\n{}", response.message);
    response
}

pub fn loading_trips(deleting: bool) -> DialogueResponse {
    let message = if deleting {
        "要刪除哪一個行程呢？"
    } else {
        "正在讀取你的行程…"
    };
    DialogueResponse::new(DialogueState::ViewingTrips, message)
}

pub fn viewing_trips(trips: &[TripRecord], deleting: bool) -> DialogueResponse {
    if trips.is_empty() {
        let mut response = DialogueResponse::new(
            DialogueState::ViewingTrips,
            "目前還沒有任何行程，要現在規劃一個嗎？",
        );
        response.buttons = vec![button("create_trip", CREATE_REPLY, CREATE_REPLY)];
        return response;
    }

    let lines = trips
        .iter()
        .enumerate()
        .map(|(index, trip)| {
            format!(
                "{}. {} {} ~ {}（{}天，{}）",
                index + 1,
                trip.resort_name,
                format_date(trip.start_date),
                format_date(trip.end_date),
                trip.duration_days,
                trip.visibility.label()
            )
        })
        .collect::<Vec<_>>();
    let heading = if deleting {
        "要刪除哪一個行程呢？"
    } else {
        "你的行程："
    };

    let mut response = DialogueResponse::new(
        DialogueState::ViewingTrips,
        format!("{heading}\n{}", lines.join("\n")),
    );
    response.buttons = trips
        .iter()
        .map(|trip| {
            button(
                &format!("delete:{}", trip.trip_id),
                &format!("刪除 {}", trip.resort_name),
                &format!("delete_trip:{}", trip.trip_id),
            )
        })
        .collect();
    response.payload = Some(json!({ "trips": trips }));
    response
}

/// Result of a delete button, followed by the remaining trips.
pub fn trip_deleted(removed: bool, remaining: &[TripRecord]) -> DialogueResponse {
    let mut response = viewing_trips(remaining, false);
    let notice = if removed {
        "已刪除行程。"
    } else {
        "找不到這個行程，可能已經刪除了。"
    };
    response.message = format!("{notice}\n{}", response.message);
    response
}

pub fn trips_unavailable(message: &str) -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::ViewingTrips,
        format!("暫時讀不到行程：{message}"),
    );
    response.buttons = menu_buttons();
    response
}

/// `Error` always carries a restart button.
pub fn error(message: &str) -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::Error,
        format!("建立行程時發生問題：{message}"),
    );
    response.buttons = vec![button("restart", RESTART_REPLY, RESTART_REPLY)];
    response
}

pub fn still_in_error() -> DialogueResponse {
    let mut response = DialogueResponse::new(
        DialogueState::Error,
        "剛剛出了點問題，請按「重新開始」再試一次。",
    );
    response.buttons = vec![button("restart", RESTART_REPLY, RESTART_REPLY)];
    response
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

fn trip_summary(trip: &TripData) -> String {
    let mut lines = vec!["請確認行程：".to_string()];
    if let Some(resort) = &trip.resort {
        lines.push(format!("雪場：{}", resort.name));
    }
    if let (Some(start), Some(end)) = (trip.start_date, trip.end_date) {
        lines.push(format!("日期：{} ~ {}", format_date(start), format_date(end)));
    }
    if let Some(days) = trip.duration_days {
        lines.push(format!("天數：{days} 天"));
    }
    if let Some(size) = trip.party_size {
        lines.push(format!("人數：{size} 人"));
    }
    if let Some(visibility) = trip.visibility {
        lines.push(format!("公開設定：{}", visibility.label()));
    }
    lines.join("\n")
}

fn with_chips(
    state: DialogueState,
    message: impl Into<String>,
    suggestions: Vec<Suggestion>,
) -> DialogueResponse {
    let mut response = DialogueResponse::new(state, message);
    response.buttons = suggestion_buttons(&suggestions);
    response.suggestions = suggestions;
    response
}

fn suggestion_buttons(suggestions: &[Suggestion]) -> Vec<ButtonOption> {
    suggestions
        .iter()
        .map(|suggestion| button(&suggestion.entity_id, &suggestion.name, &suggestion.name))
        .collect()
}

fn menu_buttons() -> Vec<ButtonOption> {
    vec![
        button("create_trip", CREATE_REPLY, CREATE_REPLY),
        button("view_trips", VIEW_REPLY, VIEW_REPLY),
    ]
}

fn button(id: &str, label: &str, action: &str) -> ButtonOption {
    ButtonOption {
        id: id.to_string(),
        label: label.to_string(),
        action: action.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Visibility;

    #[test]
    fn error_always_offers_restart() {
        let response = error("store offline");
        assert_eq!(response.state, DialogueState::Error);
        assert!(response.message.contains("store offline"));
        assert!(response.buttons.iter().any(|b| b.action == RESTART_REPLY));
    }

    #[test]
    fn confirmation_lists_slots() {
        let trip = TripData {
            resort: Some(EntityRef {
                id: "nozawa".to_string(),
                name: "野澤溫泉".to_string(),
            }),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 20),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 25),
            duration_days: Some(6),
            visibility: Some(Visibility::Friends),
            party_size: None,
        };
        let response = confirm_trip(&trip);
        assert!(response.requires_confirmation);
        assert!(response.message.contains("野澤溫泉"));
        assert!(response.message.contains("2026/03/20 ~ 2026/03/25"));
        assert!(response.message.contains("好友可見"));
        assert_eq!(response.payload.unwrap()["duration_days"], 6);
    }
}
