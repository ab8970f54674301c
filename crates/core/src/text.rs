use unicode_segmentation::UnicodeSegmentation;

/// Collapses whitespace runs and folds full-width ASCII into half-width.
pub fn normalize_text(input: &str) -> String {
    input
        .chars()
        .map(fold_full_width)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn fold_full_width(ch: char) -> char {
    match ch {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFEE0).unwrap_or(ch),
        _ => ch,
    }
}

/// Keyword containment: CJK keywords match as substrings, ASCII keywords
/// only on word boundaries so "no" never fires inside "nozawa".
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }

    let lower = haystack.to_lowercase();
    let keyword = keyword.to_lowercase();

    if !keyword.is_ascii() {
        return lower.contains(&keyword);
    }

    let words = lower.unicode_words().collect::<Vec<_>>();
    let needle = keyword.unicode_words().collect::<Vec<_>>();
    if needle.is_empty() {
        return false;
    }

    words
        .windows(needle.len())
        .any(|window| window.iter().zip(needle.iter()).all(|(a, b)| a == b))
}

pub fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| contains_keyword(haystack, keyword))
}

/// Parses `一`..`三十`-style numerals (and `兩`). Returns `None` for anything else.
pub fn parse_cjk_numeral(input: &str) -> Option<u32> {
    let digit = |ch: char| -> Option<u32> {
        match ch {
            '零' | '〇' => Some(0),
            '一' => Some(1),
            '二' | '兩' | '两' => Some(2),
            '三' => Some(3),
            '四' => Some(4),
            '五' => Some(5),
            '六' => Some(6),
            '七' => Some(7),
            '八' => Some(8),
            '九' => Some(9),
            _ => None,
        }
    };

    let chars = input.trim().chars().collect::<Vec<_>>();
    match chars.as_slice() {
        [] => None,
        ['十'] => Some(10),
        ['十', ones] => digit(*ones).map(|d| 10 + d),
        [tens, '十'] => digit(*tens).map(|d| d * 10),
        [tens, '十', ones] => Some(digit(*tens)? * 10 + digit(*ones)?),
        [single] => digit(*single),
        _ => None,
    }
}

/// Arabic digits or CJK numerals.
pub fn parse_count(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    trimmed
        .parse::<u32>()
        .ok()
        .or_else(|| parse_cjk_numeral(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_full_width_digits() {
        assert_eq!(normalize_text("１２／２０　　５天"), "12/20 5天");
    }

    #[test]
    fn ascii_keywords_need_word_boundaries() {
        assert!(contains_keyword("No thanks", "no"));
        assert!(!contains_keyword("nozawa please", "no"));
        assert!(contains_keyword("show my trips", "my trips"));
        assert!(contains_keyword("我想刪除行程", "刪除"));
    }

    #[test]
    fn parses_cjk_numerals() {
        assert_eq!(parse_cjk_numeral("三"), Some(3));
        assert_eq!(parse_cjk_numeral("兩"), Some(2));
        assert_eq!(parse_cjk_numeral("十"), Some(10));
        assert_eq!(parse_cjk_numeral("十五"), Some(15));
        assert_eq!(parse_cjk_numeral("二十"), Some(20));
        assert_eq!(parse_cjk_numeral("三十"), Some(30));
        assert_eq!(parse_cjk_numeral("二十五"), Some(25));
        assert_eq!(parse_cjk_numeral("天"), None);
    }
}
