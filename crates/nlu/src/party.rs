use once_cell::sync::Lazy;
use regex::Regex;
use snowtrip_core::text::parse_count;

static SOLO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)一個人|一个人|自己去|自己|\bsolo\b|\bby myself\b|\balone\b").expect("valid party pattern"));

static COUNT_CJK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}|[一二兩两三四五六七八九十]{1,3})\s*(?:個|个)?\s*(?:人|位)")
        .expect("valid party pattern")
});

static COUNT_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:people|persons|pax|guests|of us)\b").expect("valid party pattern")
});

const MAX_PARTY: u32 = 50;

/// Number of travellers mentioned in the text, if any.
pub fn extract_party_size(text: &str) -> Option<u32> {
    let counted = COUNT_CJK
        .captures(text)
        .or_else(|| COUNT_EN.captures(text))
        .and_then(|caps| parse_count(caps.get(1)?.as_str()))
        .filter(|size| (1..=MAX_PARTY).contains(size));
    counted.or_else(|| SOLO.is_match(text).then_some(1))
}

pub fn strip_party_size(text: &str) -> String {
    let text = COUNT_CJK.replace_all(text, " ");
    let text = COUNT_EN.replace_all(&text, " ");
    SOLO.replace_all(&text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_party_sizes() {
        assert_eq!(extract_party_size("我們3人"), Some(3));
        assert_eq!(extract_party_size("兩個人去"), Some(2));
        assert_eq!(extract_party_size("4 people"), Some(4));
        assert_eq!(extract_party_size("一個人"), Some(1));
        assert_eq!(extract_party_size("我自己去"), Some(1));
        assert_eq!(extract_party_size("五位"), Some(5));
        assert_eq!(extract_party_size("二世谷 5天"), None);
    }

    #[test]
    fn strips_party_mentions() {
        assert_eq!(strip_party_size("二世谷 3人").trim(), "二世谷");
    }
}
