//! String similarity used by the fuzzy stage and the suggestion ranker.
//!
//! Both operate on normalized keys (see [`crate::index::normalize_key`]).

/// Normalized Levenshtein similarity in `[0, 1]`, counted in chars so CJK
/// keys are not penalized for their UTF-8 width.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    strsim::normalized_levenshtein(a, b).clamp(0.0, 1.0)
}

/// Share of the longer key covered by the shorter one when one contains the
/// other; `None` otherwise.
pub fn containment_overlap(query: &str, key: &str) -> Option<f64> {
    if query.is_empty() || key.is_empty() {
        return None;
    }
    let (short, long) = if query.chars().count() <= key.chars().count() {
        (query, key)
    } else {
        (key, query)
    };
    if !long.contains(short) {
        return None;
    }
    Some(short.chars().count() as f64 / long.chars().count() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_typo_in_a_short_name_stays_above_threshold() {
        assert!(similarity("nisekoo", "niseko") >= 0.8);
        assert!(similarity("rusutu", "rusutsu") >= 0.8);
        assert!(similarity("naeba", "zao") < 0.5);
    }

    #[test]
    fn cjk_similarity_counts_chars() {
        assert!((similarity("二世谷", "二世古") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_is_symmetric_in_containment() {
        assert_eq!(containment_overlap("白馬", "白馬八方尾根"), Some(2.0 / 6.0));
        assert_eq!(containment_overlap("我想去二世谷", "二世谷"), Some(0.5));
        assert_eq!(containment_overlap("苗場", "二世谷"), None);
    }
}
