use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    ZhTw,
    En,
    Ja,
}

impl Locale {
    pub fn from_optional_str(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "zh" || v == "zh-tw" || v == "zh-hant" || v == "chinese" => {
                Some(Self::ZhTw)
            }
            Some(v) if v == "en" || v == "en-us" || v == "english" => Some(Self::En),
            Some(v) if v == "ja" || v == "ja-jp" || v == "japanese" => Some(Self::Ja),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::ZhTw => "zh-tw",
            Self::En => "en",
            Self::Ja => "ja",
        }
    }
}

/// A resort as published by the catalog source. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: String,
    pub names: BTreeMap<Locale, String>,
    /// Most specific first; earlier aliases rank higher in suggestions.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Romanizations and transliterations, e.g. `niseko` or `新雪谷`.
    #[serde(default)]
    pub phonetics: Vec<String>,
    pub region: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

impl NamedEntity {
    pub fn name(&self, locale: Locale) -> Option<&str> {
        self.names.get(&locale).map(String::as_str)
    }

    pub fn display_name(&self) -> &str {
        self.name(Locale::ZhTw)
            .or_else(|| self.name(Locale::En))
            .or_else(|| self.names.values().next().map(String::as_str))
            .unwrap_or(self.id.as_str())
    }

    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id.clone(),
            name: self.display_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroupMembership {
    Region(String),
    Area(String),
    Ids(Vec<String>),
}

impl GroupMembership {
    pub fn contains(&self, entity: &NamedEntity) -> bool {
        match self {
            Self::Region(region) => entity.region.eq_ignore_ascii_case(region),
            Self::Area(area) => entity
                .area
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(area)),
            Self::Ids(ids) => ids.iter().any(|id| id == &entity.id),
        }
    }
}

/// Regional cluster addressed by an area name such as 白馬 or 北海道.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub membership: GroupMembership,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub entities: Vec<NamedEntity>,
    #[serde(default)]
    pub groups: Vec<EntityGroup>,
}

/// Match confidence, always clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub const EXACT: Self = Self(1.0);
    pub const HIGH: Self = Self(0.8);
    pub const LOW: Self = Self(0.5);
    pub const NONE: Self = Self(0.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::NONE;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn tier(self) -> ConfidenceTier {
        if self.0 >= Self::EXACT.0 {
            ConfidenceTier::Exact
        } else if self.0 >= Self::HIGH.0 {
            ConfidenceTier::High
        } else if self.0 >= Self::LOW.0 {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::Unresolved
        }
    }

    /// Whether a slot may be filled from this confidence without asking the user.
    pub fn is_confident(self) -> bool {
        self.0 >= Self::HIGH.0
    }

    pub fn mean(values: &[Confidence]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let total = values.iter().map(|c| c.0).sum::<f64>();
        Some(Self::new(total / values.len() as f64))
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Exact,
    High,
    Low,
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "locale", rename_all = "snake_case")]
pub enum MatchField {
    Phonetic,
    Name(Locale),
    Alias,
    Group,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub entity_id: String,
    pub name: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResort {
    pub id: String,
    pub name: String,
    pub confidence: Confidence,
    pub matched_text: String,
}

impl ResolvedResort {
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub confidence: Confidence,
}

impl ParsedDate {
    pub fn new(date: NaiveDate, confidence: Confidence) -> Self {
        Self { date, confidence }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<ParsedDate>,
    pub end: Option<ParsedDate>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    CreateTrip,
    ViewTrips,
    DeleteTrip,
    Chat,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Friends,
    Private,
}

impl Visibility {
    pub fn label(self) -> &'static str {
        match self {
            Self::Public => "公開",
            Self::Friends => "好友可見",
            Self::Private => "私人",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Resort,
    StartDate,
    EndDate,
    /// Stands for "end date or duration" when reported as missing.
    Duration,
    Visibility,
    PartySize,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::Resort,
        Slot::StartDate,
        Slot::EndDate,
        Slot::Duration,
        Slot::Visibility,
        Slot::PartySize,
    ];

    fn bit(self) -> u8 {
        match self {
            Slot::Resort => 1 << 0,
            Slot::StartDate => 1 << 1,
            Slot::EndDate => 1 << 2,
            Slot::Duration => 1 << 3,
            Slot::Visibility => 1 << 4,
            Slot::PartySize => 1 << 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Resort => "resort",
            Slot::StartDate => "start_date",
            Slot::EndDate => "end_date",
            Slot::Duration => "duration",
            Slot::Visibility => "visibility",
            Slot::PartySize => "party_size",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotSet(u8);

impl SlotSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, slot: Slot) {
        self.0 |= slot.bit();
    }

    pub fn remove(&mut self, slot: Slot) {
        self.0 &= !slot.bit();
    }

    pub fn contains(self, slot: Slot) -> bool {
        self.0 & slot.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Slot> {
        Slot::ALL.into_iter().filter(move |slot| self.contains(*slot))
    }
}

impl FromIterator<Slot> for SlotSet {
    fn from_iter<I: IntoIterator<Item = Slot>>(iter: I) -> Self {
        let mut set = Self::empty();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

impl Serialize for SlotSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for SlotSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = Vec::<Slot>::deserialize(deserializer)?;
        Ok(slots.into_iter().collect())
    }
}

/// One classified utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub resort: Option<ResolvedResort>,
    /// Text span the resort was looked up with, kept for error reporting.
    pub resort_query: Option<String>,
    pub start_date: Option<ParsedDate>,
    pub end_date: Option<ParsedDate>,
    pub duration_days: Option<u32>,
    pub visibility: Option<Visibility>,
    pub party_size: Option<u32>,
    pub confidence: Confidence,
    pub missing: SlotSet,
    pub suggestions: Vec<Suggestion>,
}

impl Intent {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            resort: None,
            resort_query: None,
            start_date: None,
            end_date: None,
            duration_days: None,
            visibility: None,
            party_size: None,
            confidence: Confidence::NONE,
            missing: SlotSet::empty(),
            suggestions: Vec::new(),
        }
    }

    pub fn has_schedule(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some() || self.duration_days.is_some()
    }

    pub fn has_any_slot(&self) -> bool {
        self.resort.is_some()
            || self.has_schedule()
            || self.visibility.is_some()
            || self.party_size.is_some()
    }
}
