//! Date, date-range and stay-duration extraction from chat text.
//!
//! Every grammar is an ordered table of `(name, regex, extractor)` templates.
//! Order is significant: the first template that yields a valid value wins.

use std::ops::Range;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::{Confidence, DateRange, ParsedDate};
use crate::text::{parse_count, parse_cjk_numeral};

const YEAR_QUALIFIED: Confidence = Confidence::EXACT;
const MONTH_DAY: f64 = 0.9;
const RELATIVE: f64 = 0.8;

const STAY_VERBS: &[&str] = &["待", "住", "停留", "玩", "stay"];

type DateExtractor = fn(&TemporalParser, &Captures<'_>) -> Option<ParsedDate>;
type RangeExtractor = fn(&TemporalParser, &Captures<'_>, &str) -> Option<(NaiveDate, NaiveDate)>;
type DurationExtractor = fn(&Captures<'_>, &str) -> Option<u32>;

pub struct DateTemplate {
    pub name: &'static str,
    regex: Regex,
    extract: DateExtractor,
}

pub struct RangeTemplate {
    pub name: &'static str,
    regex: Regex,
    extract: RangeExtractor,
}

pub struct DurationTemplate {
    pub name: &'static str,
    regex: Regex,
    extract: DurationExtractor,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("temporal patterns are valid")
}

const RANGE_SEP: &str = r"\s*(?:到|至|~|～|-|–|—)\s*";
const WEEK_UNIT: &str = r"(?:週|周|星期|禮拜|礼拜)";
const CJK_COUNT: &str = r"[一二兩两三四五六七八九十]{1,3}";

pub static ABSOLUTE_TEMPLATES: Lazy<Vec<DateTemplate>> = Lazy::new(|| {
    vec![
        DateTemplate {
            name: "year_month_day_cjk",
            regex: compile(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*[日號号]?"),
            extract: |_, caps| ymd(caps, 1, 2, 3),
        },
        DateTemplate {
            name: "year_month_day_numeric",
            regex: compile(r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})"),
            extract: |_, caps| ymd(caps, 1, 2, 3),
        },
        DateTemplate {
            name: "month_day_cjk",
            regex: compile(r"(\d{1,2})\s*月\s*(\d{1,2})\s*[日號号]?"),
            extract: |parser, caps| parser.month_day(caps, 1, 2),
        },
        DateTemplate {
            name: "month_day_slash",
            regex: compile(r"(\d{1,2})/(\d{1,2})"),
            extract: |parser, caps| parser.month_day(caps, 1, 2),
        },
        DateTemplate {
            name: "month_day_dash",
            regex: compile(r"(\d{1,2})-(\d{1,2})"),
            extract: |parser, caps| parser.month_day(caps, 1, 2),
        },
        DateTemplate {
            name: "month_name_day",
            regex: compile(
                r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b",
            ),
            extract: |parser, caps| {
                let month = month_from_name(caps.get(1)?.as_str())?;
                let day = caps.get(2)?.as_str().parse().ok()?;
                parser.season_date(month, day)
            },
        },
    ]
});

pub static RELATIVE_TEMPLATES: Lazy<Vec<DateTemplate>> = Lazy::new(|| {
    vec![
        DateTemplate {
            name: "days_later_cjk",
            regex: compile(&format!(r"(\d{{1,3}}|{CJK_COUNT})\s*天\s*(?:之)?[後后]")),
            extract: |parser, caps| {
                let days = parse_count(caps.get(1)?.as_str())?;
                parser.relative(parser.today + Duration::days(i64::from(days)))
            },
        },
        DateTemplate {
            name: "days_later_en",
            regex: compile(r"(?i)\b(?:in\s+(\d{1,3})\s+days?|(\d{1,3})\s+days?\s+from\s+now)\b"),
            extract: |parser, caps| {
                let days = first_group(caps, &[1, 2])?.parse::<i64>().ok()?;
                parser.relative(parser.today + Duration::days(days))
            },
        },
        DateTemplate {
            name: "weeks_later_cjk",
            regex: compile(&format!(
                r"(\d{{1,2}}|{CJK_COUNT})\s*(?:個|个)?\s*{WEEK_UNIT}\s*(?:之)?[後后]"
            )),
            extract: |parser, caps| {
                let weeks = parse_count(caps.get(1)?.as_str())?;
                parser.relative(parser.today + Duration::weeks(i64::from(weeks)))
            },
        },
        DateTemplate {
            name: "weeks_later_en",
            regex: compile(
                r"(?i)\b(?:in\s+(\d{1,2})\s+weeks?|(\d{1,2})\s+weeks?\s+from\s+now)\b",
            ),
            extract: |parser, caps| {
                let weeks = first_group(caps, &[1, 2])?.parse::<i64>().ok()?;
                parser.relative(parser.today + Duration::weeks(weeks))
            },
        },
        DateTemplate {
            name: "day_after_that",
            regex: compile(r"大[後后]天"),
            extract: |parser, _| parser.relative(parser.today + Duration::days(3)),
        },
        DateTemplate {
            name: "day_after_tomorrow",
            regex: compile(r"[後后]天|(?i:day\s+after\s+tomorrow)"),
            extract: |parser, _| parser.relative(parser.today + Duration::days(2)),
        },
        DateTemplate {
            name: "tomorrow",
            regex: compile(r"明天|明日|(?i:tomorrow)"),
            extract: |parser, _| parser.relative(parser.today + Duration::days(1)),
        },
        DateTemplate {
            name: "today",
            regex: compile(r"今天|今日|(?i:today)"),
            extract: |parser, _| parser.relative(parser.today),
        },
        DateTemplate {
            name: "next_weekday_cjk",
            regex: compile(&format!(r"下(?:個|个)?{WEEK_UNIT}\s*([一二三四五六日天])")),
            extract: |parser, caps| {
                let weekday = weekday_from_cjk(caps.get(1)?.as_str())?;
                parser.relative(parser.next_week(weekday))
            },
        },
        DateTemplate {
            name: "next_weekday_en",
            regex: compile(r"(?i)\bnext\s+(mon|tue|wed|thu|fri|sat|sun)[a-z]*\b"),
            extract: |parser, caps| {
                let weekday = weekday_from_en(caps.get(1)?.as_str())?;
                parser.relative(parser.next_week(weekday))
            },
        },
        DateTemplate {
            name: "this_weekday_cjk",
            regex: compile(&format!(r"(?:這|这|本)(?:個|个)?{WEEK_UNIT}\s*([一二三四五六日天])")),
            extract: |parser, caps| {
                let weekday = weekday_from_cjk(caps.get(1)?.as_str())?;
                parser.relative(parser.this_week(weekday))
            },
        },
        DateTemplate {
            name: "this_weekday_en",
            regex: compile(r"(?i)\bthis\s+(mon|tue|wed|thu|fri|sat|sun)[a-z]*\b"),
            extract: |parser, caps| {
                let weekday = weekday_from_en(caps.get(1)?.as_str())?;
                parser.relative(parser.this_week(weekday))
            },
        },
        DateTemplate {
            name: "bare_weekday_cjk",
            regex: compile(&format!(r"{WEEK_UNIT}([一二三四五六日天])")),
            extract: |parser, caps| {
                let weekday = weekday_from_cjk(caps.get(1)?.as_str())?;
                parser.relative(parser.next_occurrence(weekday))
            },
        },
        DateTemplate {
            name: "bare_weekday_en",
            regex: compile(
                r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            ),
            extract: |parser, caps| {
                let weekday = weekday_from_en(caps.get(1)?.as_str())?;
                parser.relative(parser.next_occurrence(weekday))
            },
        },
        DateTemplate {
            name: "next_month",
            regex: compile(r"下(?:個|个)?月|(?i:next\s+month)"),
            extract: |parser, _| {
                let date = parser.today.checked_add_months(Months::new(1))?;
                parser.relative(date)
            },
        },
    ]
});

pub static RANGE_TEMPLATES: Lazy<Vec<RangeTemplate>> = Lazy::new(|| {
    vec![
        RangeTemplate {
            name: "same_month",
            regex: compile(&format!(
                r"(\d{{1,2}})\s*月\s*(\d{{1,2}})\s*[日號号]?{RANGE_SEP}(\d{{1,2}})\s*[日號号]?"
            )),
            extract: |parser, caps, text| {
                if continues_as_date(text, caps) {
                    return None;
                }
                let month = capture_u32(caps, 1)?;
                let start = parser.season_day(month, capture_u32(caps, 2)?)?;
                let end = parser.season_day(month, capture_u32(caps, 3)?)?;
                Some((start, end))
            },
        },
        RangeTemplate {
            name: "cross_month",
            regex: compile(&format!(
                r"(\d{{1,2}})\s*[-/月]\s*(\d{{1,2}})\s*[日號号]?{RANGE_SEP}(\d{{1,2}})\s*[-/月]\s*(\d{{1,2}})\s*[日號号]?"
            )),
            extract: |parser, caps, _| {
                let start = parser.season_day(capture_u32(caps, 1)?, capture_u32(caps, 2)?)?;
                let end = parser.season_day(capture_u32(caps, 3)?, capture_u32(caps, 4)?)?;
                Some((start, end))
            },
        },
        RangeTemplate {
            name: "slash_range",
            regex: compile(&format!(
                r"(\d{{1,2}})/(\d{{1,2}}){RANGE_SEP}(?:(\d{{1,2}})/)?(\d{{1,2}})"
            )),
            extract: |parser, caps, text| {
                if continues_as_date(text, caps) {
                    return None;
                }
                let start_month = capture_u32(caps, 1)?;
                let end_month = capture_u32(caps, 3).unwrap_or(start_month);
                let start = parser.season_day(start_month, capture_u32(caps, 2)?)?;
                let end = parser.season_day(end_month, capture_u32(caps, 4)?)?;
                Some((start, end))
            },
        },
        RangeTemplate {
            name: "bare_day",
            regex: compile(&format!(
                r"(\d{{1,2}})\s*[日號号]?{RANGE_SEP}(\d{{1,2}})\s*[日號号]"
            )),
            extract: |parser, caps, text| {
                let month = month_mentioned_elsewhere(text, caps)?;
                let start = parser.season_day(month, capture_u32(caps, 1)?)?;
                let end = parser.season_day(month, capture_u32(caps, 2)?)?;
                Some((start, end))
            },
        },
    ]
});

pub static DURATION_TEMPLATES: Lazy<Vec<DurationTemplate>> = Lazy::new(|| {
    vec![
        DurationTemplate {
            name: "day_count",
            regex: compile(r"(?i)(\d{1,3})\s*(?:天|日|days?\b)"),
            extract: |caps, _| capture_u32(caps, 1).filter(|days| (1..=90).contains(days)),
        },
        DurationTemplate {
            name: "stay_verb_count",
            regex: compile(
                r"(?i)(?:待|住|停留|玩|stay(?:ing)?(?:\s+for)?)\s*(\d{1,3})\s*(?:天|日|days?\b)",
            ),
            extract: |caps, _| capture_u32(caps, 1).filter(|days| (1..=90).contains(days)),
        },
        DurationTemplate {
            name: "cjk_day_count",
            regex: compile(&format!(r"({CJK_COUNT})\s*(?:天|日)")),
            extract: |caps, _| {
                parse_cjk_numeral(caps.get(1)?.as_str()).filter(|days| (1..=90).contains(days))
            },
        },
        DurationTemplate {
            name: "week_count",
            regex: compile(&format!(
                r"(?i)(\d{{1,2}}|[一二兩两三四])\s*(?:(?:個|个)?\s*{WEEK_UNIT}|weeks?\b)"
            )),
            extract: |caps, text| {
                let whole = caps.get(0)?;
                let next = text[whole.end()..].chars().next();
                if matches!(next, Some('一' | '二' | '三' | '四' | '五' | '六' | '日' | '天' | '末')) {
                    return None;
                }
                parse_count(caps.get(1)?.as_str())
                    .map(|weeks| weeks * 7)
                    .filter(|days| (1..=90).contains(days))
            },
        },
        DurationTemplate {
            name: "bare_number_with_stay_verb",
            regex: compile(r"(\d{1,2})"),
            extract: |caps, text| {
                let lower = text.to_lowercase();
                if !STAY_VERBS.iter().any(|verb| lower.contains(verb)) {
                    return None;
                }
                let whole = caps.get(0)?;
                let next = text[whole.end()..].trim_start().chars().next();
                if matches!(next, Some('人' | '位' | '個' | '个')) {
                    return None;
                }
                capture_u32(caps, 1).filter(|days| (1..=30).contains(days))
            },
        },
    ]
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateHit {
    pub date: ParsedDate,
    pub span: (usize, usize),
}

/// Parses dates relative to a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct TemporalParser {
    today: NaiveDate,
}

impl TemporalParser {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Ski-season year for a bare month: Nov/Dec stay in this year, Jan–Apr
    /// roll into next year only while the season has already started.
    /// May–Oct are kept in the current year as a rough default.
    pub fn infer_season_year(&self, month: u32) -> i32 {
        let year = self.today.year();
        match month {
            11 | 12 => year,
            1..=4 if self.today.month() >= 11 => year + 1,
            _ => year,
        }
    }

    pub fn parse_date(&self, text: &str) -> Option<ParsedDate> {
        self.absolute_hits(text)
            .first()
            .map(|hit| hit.date)
            .or_else(|| self.parse_relative(text))
    }

    pub fn parse_relative(&self, text: &str) -> Option<ParsedDate> {
        self.relative_hit(text).map(|hit| hit.date)
    }

    pub fn extract_dates(&self, text: &str) -> DateRange {
        if let Some((_, start, end)) = self.range_hit(text) {
            let confidence = Confidence::new(MONTH_DAY);
            return DateRange {
                start: Some(ParsedDate::new(start, confidence)),
                end: Some(ParsedDate::new(roll_forward(start, end), confidence)),
            };
        }

        let hits = self.absolute_hits(text);
        if let Some(first) = hits.first() {
            let end = hits.get(1).map(|second| {
                ParsedDate::new(
                    roll_forward(first.date.date, second.date.date),
                    second.date.confidence,
                )
            });
            return DateRange {
                start: Some(first.date),
                end,
            };
        }

        DateRange {
            start: self.parse_relative(text),
            end: None,
        }
    }

    pub fn extract_duration(&self, text: &str) -> Option<u32> {
        let stripped = self.strip_dates(text);
        DURATION_TEMPLATES.iter().find_map(|template| {
            template
                .regex
                .captures_iter(&stripped)
                .find_map(|caps| (template.extract)(&caps, &stripped))
        })
    }

    /// Removes every date, range and relative offset so numerals inside them
    /// are not read as day counts.
    pub fn strip_dates(&self, text: &str) -> String {
        let mut spans = Vec::new();
        if let Some((span, _, _)) = self.range_hit(text) {
            spans.push(span);
        }
        spans.extend(
            self.absolute_hits(text)
                .into_iter()
                .map(|hit| hit.span.0..hit.span.1),
        );
        for template in RELATIVE_TEMPLATES.iter() {
            for caps in template.regex.captures_iter(text) {
                if let Some(whole) = caps.get(0) {
                    spans.push(whole.range());
                }
            }
        }
        blank_spans(text, &spans)
    }

    /// Like `strip_dates` but also removes stay durations.
    pub fn strip_temporal(&self, text: &str) -> String {
        let stripped = self.strip_dates(text);
        let mut spans = Vec::new();
        for template in DURATION_TEMPLATES
            .iter()
            .filter(|template| template.name != "bare_number_with_stay_verb")
        {
            for caps in template.regex.captures_iter(&stripped) {
                if let Some(whole) = caps.get(0) {
                    spans.push(whole.range());
                }
            }
        }
        blank_spans(&stripped, &spans)
    }

    /// Non-overlapping absolute dates in text order.
    pub fn absolute_hits(&self, text: &str) -> Vec<DateHit> {
        let mut hits: Vec<DateHit> = Vec::new();
        for template in ABSOLUTE_TEMPLATES.iter() {
            for caps in template.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if !digit_bounded(text, whole.start(), whole.end()) {
                    continue;
                }
                let overlaps = hits
                    .iter()
                    .any(|hit| whole.start() < hit.span.1 && hit.span.0 < whole.end());
                if overlaps {
                    continue;
                }
                if let Some(date) = (template.extract)(self, &caps) {
                    hits.push(DateHit {
                        date,
                        span: (whole.start(), whole.end()),
                    });
                }
            }
        }
        hits.sort_by_key(|hit| hit.span.0);
        hits
    }

    fn relative_hit(&self, text: &str) -> Option<DateHit> {
        RELATIVE_TEMPLATES.iter().find_map(|template| {
            template.regex.captures_iter(text).find_map(|caps| {
                let whole = caps.get(0)?;
                (template.extract)(self, &caps).map(|date| DateHit {
                    date,
                    span: (whole.start(), whole.end()),
                })
            })
        })
    }

    fn range_hit(&self, text: &str) -> Option<(Range<usize>, NaiveDate, NaiveDate)> {
        RANGE_TEMPLATES.iter().find_map(|template| {
            template.regex.captures_iter(text).find_map(|caps| {
                let whole = caps.get(0)?;
                if !digit_bounded(text, whole.start(), whole.end()) {
                    return None;
                }
                (template.extract)(self, &caps, text)
                    .map(|(start, end)| (whole.range(), start, end))
            })
        })
    }

    fn month_day(&self, caps: &Captures<'_>, month: usize, day: usize) -> Option<ParsedDate> {
        self.season_date(capture_u32(caps, month)?, capture_u32(caps, day)?)
    }

    fn season_date(&self, month: u32, day: u32) -> Option<ParsedDate> {
        self.season_day(month, day)
            .map(|date| ParsedDate::new(date, Confidence::new(MONTH_DAY)))
    }

    fn season_day(&self, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.infer_season_year(month), month, day)
    }

    fn relative(&self, date: NaiveDate) -> Option<ParsedDate> {
        Some(ParsedDate::new(date, Confidence::new(RELATIVE)))
    }

    fn monday_of_this_week(&self) -> NaiveDate {
        self.today - Duration::days(i64::from(self.today.weekday().num_days_from_monday()))
    }

    fn next_week(&self, weekday: Weekday) -> NaiveDate {
        self.monday_of_this_week()
            + Duration::days(7 + i64::from(weekday.num_days_from_monday()))
    }

    fn this_week(&self, weekday: Weekday) -> NaiveDate {
        let date =
            self.monday_of_this_week() + Duration::days(i64::from(weekday.num_days_from_monday()));
        if date < self.today {
            date + Duration::days(7)
        } else {
            date
        }
    }

    fn next_occurrence(&self, weekday: Weekday) -> NaiveDate {
        let today = i64::from(self.today.weekday().num_days_from_monday());
        let target = i64::from(weekday.num_days_from_monday());
        let ahead = (target - today).rem_euclid(7);
        self.today + Duration::days(if ahead == 0 { 7 } else { ahead })
    }
}

fn ymd(caps: &Captures<'_>, year: usize, month: usize, day: usize) -> Option<ParsedDate> {
    let year = caps.get(year)?.as_str().parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, capture_u32(caps, month)?, capture_u32(caps, day)?)?;
    Some(ParsedDate::new(date, YEAR_QUALIFIED))
}

fn capture_u32(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn first_group<'t>(caps: &Captures<'t>, indexes: &[usize]) -> Option<&'t str> {
    indexes
        .iter()
        .find_map(|index| caps.get(*index).map(|m| m.as_str()))
}

/// End dates before the start belong to the following season.
fn roll_forward(start: NaiveDate, end: NaiveDate) -> NaiveDate {
    if end >= start {
        return end;
    }
    end.with_year(end.year() + 1).unwrap_or(end)
}

/// A match must not be cut out of a longer run of digits.
fn digit_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|ch| ch.is_ascii_digit()) && !after.is_some_and(|ch| ch.is_ascii_digit())
}

/// True when the right-hand side of a range actually starts another month/day
/// pair, e.g. the `1` of `12月30到1月2日`.
fn continues_as_date(text: &str, caps: &Captures<'_>) -> bool {
    let Some(whole) = caps.get(0) else {
        return false;
    };
    matches!(
        text[whole.end()..].trim_start().chars().next(),
        Some('月' | '/' | '-')
    )
}

fn month_mentioned_elsewhere(text: &str, caps: &Captures<'_>) -> Option<u32> {
    static MONTH: Lazy<Regex> = Lazy::new(|| compile(r"(\d{1,2})\s*月"));
    let whole = caps.get(0)?;
    MONTH
        .captures_iter(text)
        .filter(|month| {
            month
                .get(0)
                .is_some_and(|m| m.end() <= whole.start() || m.start() >= whole.end())
        })
        .find_map(|month| capture_u32(&month, 1).filter(|value| (1..=12).contains(value)))
}

fn blank_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, ch) in text.char_indices() {
        if spans.iter().any(|span| span.contains(&index)) {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}

fn weekday_from_cjk(value: &str) -> Option<Weekday> {
    match value {
        "一" => Some(Weekday::Mon),
        "二" => Some(Weekday::Tue),
        "三" => Some(Weekday::Wed),
        "四" => Some(Weekday::Thu),
        "五" => Some(Weekday::Fri),
        "六" => Some(Weekday::Sat),
        "日" | "天" => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_from_en(value: &str) -> Option<Weekday> {
    match value.get(..3)?.to_lowercase().as_str() {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_from_name(value: &str) -> Option<u32> {
    let month = match value.get(..3)?.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Thursday in the middle of the early season.
    fn parser() -> TemporalParser {
        TemporalParser::new(date(2025, 11, 20))
    }

    #[test]
    fn season_year_inference() {
        let early = parser();
        assert_eq!(early.infer_season_year(12), 2025);
        assert_eq!(early.infer_season_year(2), 2026);
        assert_eq!(early.infer_season_year(7), 2025);

        let late = TemporalParser::new(date(2026, 2, 1));
        assert_eq!(late.infer_season_year(3), 2026);
        assert_eq!(late.infer_season_year(12), 2026);
    }

    #[test]
    fn absolute_dates() {
        let p = parser();
        assert_eq!(p.parse_date("2026年1月5日出發").unwrap().date, date(2026, 1, 5));
        assert_eq!(p.parse_date("2026-01-05").unwrap().confidence, Confidence::EXACT);
        assert_eq!(p.parse_date("12月24號").unwrap().date, date(2025, 12, 24));
        assert_eq!(p.parse_date("1/3").unwrap().date, date(2026, 1, 3));
        assert_eq!(p.parse_date("Dec 28").unwrap().date, date(2025, 12, 28));
        assert!(p.parse_date("2/30").is_none());
    }

    #[test]
    fn relative_dates() {
        let p = parser();
        assert_eq!(p.parse_date("今天").unwrap().date, date(2025, 11, 20));
        assert_eq!(p.parse_date("明天出發").unwrap().date, date(2025, 11, 21));
        assert_eq!(p.parse_date("後天").unwrap().date, date(2025, 11, 22));
        assert_eq!(p.parse_date("大後天").unwrap().date, date(2025, 11, 23));
        assert_eq!(p.parse_date("day after tomorrow").unwrap().date, date(2025, 11, 22));
        assert_eq!(p.parse_date("下週五").unwrap().date, date(2025, 11, 28));
        assert_eq!(p.parse_date("這週六").unwrap().date, date(2025, 11, 22));
        assert_eq!(p.parse_date("這週一").unwrap().date, date(2025, 11, 24));
        assert_eq!(p.parse_date("星期四").unwrap().date, date(2025, 11, 27));
        assert_eq!(p.parse_date("next monday").unwrap().date, date(2025, 11, 24));
        assert_eq!(p.parse_date("3天後").unwrap().date, date(2025, 11, 23));
        assert_eq!(p.parse_date("in 10 days").unwrap().date, date(2025, 11, 30));
        assert_eq!(p.parse_date("2週後").unwrap().date, date(2025, 12, 4));
        assert_eq!(p.parse_date("下個月").unwrap().date, date(2025, 12, 20));
        assert_eq!(p.parse_date("明天").unwrap().confidence.value(), RELATIVE);
    }

    #[test]
    fn same_month_range() {
        let range = parser().extract_dates("12月11到20日");
        let start = range.start.unwrap().date;
        let end = range.end.unwrap().date;
        assert_eq!((start.month(), start.day()), (12, 11));
        assert_eq!((end.month(), end.day()), (12, 20));
        assert_eq!(start.year(), 2025);
        assert_eq!(end.year(), 2025);
    }

    #[test]
    fn same_month_range_with_dash() {
        let range = parser().extract_dates("野澤 3月20-25日");
        assert_eq!(range.start.unwrap().date, date(2026, 3, 20));
        assert_eq!(range.end.unwrap().date, date(2026, 3, 25));
    }

    #[test]
    fn cross_month_range_infers_each_side() {
        let range = parser().extract_dates("12-30到1月2日");
        assert_eq!(range.start.unwrap().date, date(2025, 12, 30));
        assert_eq!(range.end.unwrap().date, date(2026, 1, 2));

        let range = parser().extract_dates("12月30日到1月2日");
        assert_eq!(range.start.unwrap().date, date(2025, 12, 30));
        assert_eq!(range.end.unwrap().date, date(2026, 1, 2));
    }

    #[test]
    fn slash_range() {
        let range = parser().extract_dates("12/20-25");
        assert_eq!(range.start.unwrap().date, date(2025, 12, 20));
        assert_eq!(range.end.unwrap().date, date(2025, 12, 25));
    }

    #[test]
    fn bare_day_range_borrows_month() {
        let range = parser().extract_dates("12月的11號到15號");
        assert_eq!(range.start.unwrap().date, date(2025, 12, 11));
        assert_eq!(range.end.unwrap().date, date(2025, 12, 15));
        assert!(parser().extract_dates("11號到15號").is_empty());
    }

    #[test]
    fn two_absolute_dates_become_start_and_end() {
        let range = parser().extract_dates("12/28出發 1/3回來");
        assert_eq!(range.start.unwrap().date, date(2025, 12, 28));
        assert_eq!(range.end.unwrap().date, date(2026, 1, 3));
    }

    #[test]
    fn relative_date_only_fills_start() {
        let range = parser().extract_dates("下週五出發");
        assert_eq!(range.start.unwrap().date, date(2025, 11, 28));
        assert!(range.end.is_none());
    }

    #[test]
    fn duration_ignores_date_numerals() {
        assert_eq!(parser().extract_duration("12/20 5天"), Some(5));
        assert_eq!(parser().extract_duration("12月20日出發玩三天"), Some(3));
    }

    #[test]
    fn duration_templates() {
        let p = parser();
        assert_eq!(p.extract_duration("5天4夜"), Some(5));
        assert_eq!(p.extract_duration("住4"), Some(4));
        assert_eq!(p.extract_duration("一週"), Some(7));
        assert_eq!(p.extract_duration("2 weeks"), Some(14));
        assert_eq!(p.extract_duration("大概待 6 左右"), Some(6));
        assert_eq!(p.extract_duration("stay for 3 days"), Some(3));
    }

    #[test]
    fn duration_rejects_noise() {
        let p = parser();
        assert_eq!(p.extract_duration("3天後出發"), None);
        assert_eq!(p.extract_duration("下週五"), None);
        assert_eq!(p.extract_duration("住 45"), None);
        assert_eq!(p.extract_duration("待60"), None);
        assert_eq!(p.extract_duration("待 30"), Some(30));
        assert_eq!(p.extract_duration("住45天"), Some(45));
        assert_eq!(p.extract_duration("我們 45 個人"), None);
        assert_eq!(p.extract_duration("想待久一點 45"), None);
    }
}
