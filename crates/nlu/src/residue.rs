//! Reduces an utterance to the part that might name a resort.

use once_cell::sync::Lazy;
use regex::Regex;
use snowtrip_core::intent::all_action_keywords;
use snowtrip_core::TemporalParser;

use crate::party::strip_party_size;

const CJK_FILLERS: &[&str] = &[
    "幫我", "帮我", "我們", "我们", "一起", "打算", "可能", "大概", "好像", "行程", "出發", "出发",
    "回來", "回来", "請", "请", "我", "想", "要", "去", "到", "在", "的", "了", "吧", "啊", "呢",
    "嗎", "吗", "玩", "跟", "和", "一下", "，", "。", "！", "？", "、",
];

const ASCII_FILLERS: &[&str] = &[
    "i", "i'd", "i'm", "we", "we're", "want", "would", "like", "to", "a", "an", "the", "trip",
    "go", "going", "ski", "skiing", "snowboard", "at", "in", "on", "for", "please", "let's", "me",
    "my", "some", "and", "with",
];

static CJK_STRIP: Lazy<Regex> = Lazy::new(|| {
    let mut words = all_action_keywords()
        .into_iter()
        .filter(|keyword| !keyword.is_ascii())
        .chain(CJK_FILLERS.iter().copied())
        .collect::<Vec<_>>();
    words.sort_by_key(|word| std::cmp::Reverse(word.chars().count()));
    let alternation = words
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("keyword alternation is a valid pattern")
});

static ASCII_STRIP: Lazy<Regex> = Lazy::new(|| {
    let mut words = all_action_keywords()
        .into_iter()
        .filter(|keyword| keyword.is_ascii())
        .chain(ASCII_FILLERS.iter().copied())
        .collect::<Vec<_>>();
    words.sort_by_key(|word| std::cmp::Reverse(word.len()));
    let alternation = words
        .iter()
        .map(|word| regex::escape(word).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(?:^|\b)(?:{alternation})(?:\b|$)"))
        .expect("keyword alternation is a valid pattern")
});

/// Dates, durations, party size, action keywords and filler words removed;
/// whatever remains is a candidate resort query.
pub fn resort_residue(text: &str, parser: &TemporalParser) -> String {
    let without_time = parser.strip_temporal(text);
    let without_party = strip_party_size(&without_time);
    let without_ascii = ASCII_STRIP.replace_all(&without_party, " ");
    let without_cjk = CJK_STRIP.replace_all(&without_ascii, " ");
    without_cjk.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn parser() -> TemporalParser {
        TemporalParser::new(NaiveDate::from_ymd_opt(2025, 11, 15).unwrap())
    }

    #[test]
    fn strips_everything_but_the_place() {
        let p = parser();
        assert_eq!(resort_residue("我想去二世谷滑雪 12/20 5天 3人", &p), "二世谷");
        assert_eq!(resort_residue("野澤 3月20-25日", &p), "野澤");
        assert_eq!(resort_residue("plan a trip to Nozawa Onsen please", &p), "Nozawa Onsen");
        assert_eq!(resort_residue("12/20-25", &p), "");
    }

    #[test]
    fn ascii_fillers_only_match_whole_words() {
        assert_eq!(resort_residue("Tomamu", &parser()), "Tomamu");
        assert_eq!(resort_residue("Appi", &parser()), "Appi");
    }
}
