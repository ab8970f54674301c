use serde::{Deserialize, Serialize};

use crate::models::{Action, Visibility};
use crate::text::{contains_any, contains_keyword};

pub const DELETE_KEYWORDS: &[&str] = &[
    "刪除",
    "删除",
    "取消行程",
    "移除行程",
    "不去了",
    "不去",
    "delete",
    "remove trip",
    "cancel trip",
    "cancel my trip",
    "not going",
];

pub const VIEW_KEYWORDS: &[&str] = &[
    "查看",
    "我的行程",
    "行程列表",
    "看行程",
    "有哪些行程",
    "列出",
    "view",
    "my trips",
    "list trips",
    "show trips",
    "show my trips",
];

pub const CREATE_KEYWORDS: &[&str] = &[
    "新增",
    "建立",
    "創建",
    "创建",
    "規劃",
    "规划",
    "計劃",
    "计划",
    "安排",
    "想去",
    "要去",
    "去滑雪",
    "滑雪",
    "plan",
    "create",
    "new trip",
    "add trip",
    "go to",
    "going to",
];

pub const CHAT_KEYWORDS: &[&str] = &[
    "你好",
    "您好",
    "哈囉",
    "嗨",
    "謝謝",
    "谢谢",
    "幫助",
    "帮助",
    "怎麼用",
    "hello",
    "hi",
    "hey",
    "thanks",
    "thank you",
    "help",
];

/// Keyword sets in the order they are tried; the first hit wins.
///
/// Deletion goes first so "not going" never reads as a create request.
pub const ACTION_KEYWORDS: &[(Action, &[&str])] = &[
    (Action::DeleteTrip, DELETE_KEYWORDS),
    (Action::ViewTrips, VIEW_KEYWORDS),
    (Action::CreateTrip, CREATE_KEYWORDS),
    (Action::Chat, CHAT_KEYWORDS),
];

pub const CONFIRM_KEYWORDS: &[&str] = &[
    "確定", "确定", "確認", "确认", "沒問題", "没问题", "可以", "好的", "好", "是", "對", "对", "yes",
    "yep", "ok", "okay", "confirm", "sure", "y",
];

pub const CANCEL_KEYWORDS: &[&str] = &[
    "取消", "不要", "算了", "不用", "不對", "不对", "不可以", "不行", "不好", "不確認", "不确认",
    "否", "no", "nope", "not ok", "cancel", "n",
];

/// Put directly in front of a confirm keyword these turn it into a refusal.
const NEGATION_PREFIXES: &[&str] = &["不", "沒", "没", "別", "别"];
const NEGATION_WORDS: &[&str] = &["not", "don't", "dont", "never"];

/// Negated confirmations that would otherwise contain a confirm keyword.
const UNCLEAR_KEYWORDS: &[&str] = &["不確定", "不确定", "不知道", "not sure", "maybe"];

const ABORT_KEYWORDS: &[&str] = &["取消", "算了", "不用了", "cancel", "quit", "never mind"];

const RESTART_KEYWORDS: &[&str] = &[
    "重新開始",
    "重新开始",
    "重來",
    "重来",
    "主選單",
    "主选单",
    "restart",
    "start over",
    "menu",
];

const PUBLIC_KEYWORDS: &[&str] = &["公開", "公开", "public"];
const FRIENDS_KEYWORDS: &[&str] = &["好友", "朋友可見", "朋友可见", "friends only", "friends"];
const PRIVATE_KEYWORDS: &[&str] = &["私人", "私密", "不公開", "不公开", "private"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Confirm,
    Cancel,
    Unclear,
}

pub fn detect_action(text: &str) -> Option<Action> {
    ACTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(text, keywords))
        .map(|(action, _)| *action)
}

/// Single-character keywords ("y", "n", "好") only count when they are the
/// whole reply; longer keywords count anywhere in it.
pub fn check_user_confirmation(text: &str) -> Confirmation {
    let trimmed = text.trim().to_lowercase();
    if trimmed.is_empty() || contains_any(&trimmed, UNCLEAR_KEYWORDS) {
        return Confirmation::Unclear;
    }

    if negates_confirmation(&trimmed) || matches_reply(&trimmed, CANCEL_KEYWORDS) {
        Confirmation::Cancel
    } else if matches_reply(&trimmed, CONFIRM_KEYWORDS) {
        Confirmation::Confirm
    } else {
        Confirmation::Unclear
    }
}

pub fn is_abort(text: &str) -> bool {
    contains_any(text, ABORT_KEYWORDS)
}

pub fn is_restart(text: &str) -> bool {
    contains_any(text, RESTART_KEYWORDS)
}

pub fn detect_visibility(text: &str) -> Option<Visibility> {
    if contains_any(text, PRIVATE_KEYWORDS) {
        Some(Visibility::Private)
    } else if contains_any(text, FRIENDS_KEYWORDS) {
        Some(Visibility::Friends)
    } else if contains_any(text, PUBLIC_KEYWORDS) {
        Some(Visibility::Public)
    } else {
        None
    }
}

/// Every keyword from every action set, longest first, for stripping an
/// utterance down to the part that might name a resort.
pub fn all_action_keywords() -> Vec<&'static str> {
    let mut keywords = ACTION_KEYWORDS
        .iter()
        .flat_map(|(_, keywords)| keywords.iter().copied())
        .collect::<Vec<_>>();
    keywords.sort_by_key(|keyword| std::cmp::Reverse(keyword.chars().count()));
    keywords
}

fn negates_confirmation(trimmed: &str) -> bool {
    CONFIRM_KEYWORDS.iter().any(|keyword| {
        if keyword.is_ascii() {
            NEGATION_WORDS
                .iter()
                .any(|negation| contains_keyword(trimmed, &format!("{negation} {keyword}")))
        } else {
            NEGATION_PREFIXES
                .iter()
                .any(|prefix| trimmed.contains(&format!("{prefix}{keyword}")))
        }
    })
}

fn matches_reply(trimmed: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.chars().count() == 1 {
            trimmed == *keyword
        } else {
            contains_keyword(trimmed, keyword)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_wins_over_create() {
        assert_eq!(detect_action("我不去白馬了"), Some(Action::DeleteTrip));
        assert_eq!(detect_action("I'm not going to niseko"), Some(Action::DeleteTrip));
    }

    #[test]
    fn classifies_each_action() {
        assert_eq!(detect_action("查看我的行程"), Some(Action::ViewTrips));
        assert_eq!(detect_action("我想去二世谷"), Some(Action::CreateTrip));
        assert_eq!(detect_action("你好"), Some(Action::Chat));
        assert_eq!(detect_action("二世谷"), None);
    }

    #[test]
    fn ascii_chat_keyword_does_not_fire_inside_words() {
        assert_eq!(detect_action("shiga kogen"), None);
    }

    #[test]
    fn single_character_replies_need_exact_match() {
        assert_eq!(check_user_confirmation("y"), Confirmation::Confirm);
        assert_eq!(check_user_confirmation(" Y "), Confirmation::Confirm);
        assert_eq!(check_user_confirmation("n"), Confirmation::Cancel);
        assert_eq!(
            check_user_confirmation("nice and sunny in niseko"),
            Confirmation::Unclear
        );
        assert_eq!(check_user_confirmation("好"), Confirmation::Confirm);
        assert_eq!(check_user_confirmation("好像怪怪的"), Confirmation::Unclear);
    }

    #[test]
    fn multi_character_keywords_match_by_containment() {
        assert_eq!(check_user_confirmation("確定"), Confirmation::Confirm);
        assert_eq!(check_user_confirmation("好，確定沒問題"), Confirmation::Confirm);
        assert_eq!(check_user_confirmation("取消"), Confirmation::Cancel);
        assert_eq!(check_user_confirmation("還是算了吧"), Confirmation::Cancel);
        assert_eq!(check_user_confirmation("我不確定"), Confirmation::Unclear);
    }

    #[test]
    fn negated_confirmations_are_refusals() {
        for reply in ["不可以", "不確認", "not ok", "不是", "沒確認", "別確定", "don't confirm", "不行"] {
            assert_eq!(check_user_confirmation(reply), Confirmation::Cancel, "{reply}");
        }
        assert_eq!(check_user_confirmation("沒問題"), Confirmation::Confirm);
        assert_eq!(check_user_confirmation("ok"), Confirmation::Confirm);
    }

    #[test]
    fn detects_visibility() {
        assert_eq!(detect_visibility("設成私人行程"), Some(Visibility::Private));
        assert_eq!(detect_visibility("公開給大家"), Some(Visibility::Public));
        assert_eq!(detect_visibility("只給好友看"), Some(Visibility::Friends));
        assert_eq!(detect_visibility("二世谷"), None);
    }
}
