use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;
use std::sync::Arc;

use snowtrip_core::text::fold_full_width;
use snowtrip_core::{Confidence, MatchField, NamedEntity, NluError, ResolvedResort, Suggestion};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::index::{normalize_key, CatalogIndex, KeyKind};
use crate::similarity::{containment_overlap, similarity};

const FUZZY_ACCEPT: f64 = 0.7;
const FUZZY_NEAR_EXACT: f64 = 0.95;
const FUZZY_SCALE: f64 = 0.75;
const SUGGESTION_FUZZY_FLOOR: f64 = 0.5;
const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub entity: Arc<NamedEntity>,
    pub confidence: Confidence,
    pub field: MatchField,
    pub matched_text: String,
    /// Every entity the matched key points at when it is ambiguous.
    pub candidates: Vec<Arc<NamedEntity>>,
}

impl MatchResult {
    fn single(entity: &Arc<NamedEntity>, confidence: Confidence, field: MatchField, text: &str) -> Self {
        Self {
            entity: Arc::clone(entity),
            confidence,
            field,
            matched_text: text.to_string(),
            candidates: Vec::new(),
        }
    }

    fn ambiguous(members: &[Arc<NamedEntity>], field: MatchField, text: &str) -> Option<Self> {
        let first = members.first()?;
        Some(Self {
            entity: Arc::clone(first),
            confidence: Confidence::LOW,
            field,
            matched_text: text.to_string(),
            candidates: members.to_vec(),
        })
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.confidence.is_confident()
    }

    pub fn to_resolved(&self) -> ResolvedResort {
        ResolvedResort {
            id: self.entity.id.clone(),
            name: self.entity.display_name().to_string(),
            confidence: self.confidence,
            matched_text: self.matched_text.clone(),
        }
    }

    pub fn candidate_suggestions(&self) -> Vec<Suggestion> {
        self.candidates
            .iter()
            .map(|entity| suggestion(entity, self.confidence))
            .collect()
    }
}

/// Resolves free text against one catalog snapshot.
#[derive(Debug, Clone)]
pub struct EntityMatcher {
    index: Arc<CatalogIndex>,
    suggestion_limit: usize,
}

impl EntityMatcher {
    pub fn new(index: Arc<CatalogIndex>) -> Self {
        Self {
            index,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit.max(1);
        self
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    pub fn suggestion_limit(&self) -> usize {
        self.suggestion_limit
    }

    /// Phonetic, name, alias, group, then fuzzy. The first stage with a hit
    /// decides the result.
    pub fn match_query(&self, query: &str) -> Option<MatchResult> {
        let key = normalize_key(query);
        if key.is_empty() {
            return None;
        }

        let stages: [(&str, fn(&Self, &str, &str) -> Option<MatchResult>); 5] = [
            ("phonetic", Self::match_phonetic),
            ("name", Self::match_name),
            ("alias", Self::match_alias),
            ("group", Self::match_group),
            ("fuzzy", Self::match_fuzzy),
        ];

        stages.iter().find_map(|(stage, run)| {
            let result = run(self, &key, query)?;
            debug!(
                stage,
                query,
                entity_id = %result.entity.id,
                confidence = %result.confidence,
                "entity match"
            );
            Some(result)
        })
    }

    fn match_phonetic(&self, key: &str, query: &str) -> Option<MatchResult> {
        match self.index.by_phonetic(key) {
            [] => None,
            [only] => Some(MatchResult::single(only, Confidence::EXACT, MatchField::Phonetic, query)),
            many => MatchResult::ambiguous(many, MatchField::Phonetic, query),
        }
    }

    fn match_name(&self, key: &str, query: &str) -> Option<MatchResult> {
        let hit = self.index.by_name(key).first()?;
        Some(MatchResult::single(
            &hit.entity,
            Confidence::EXACT,
            MatchField::Name(hit.locale),
            query,
        ))
    }

    fn match_alias(&self, key: &str, query: &str) -> Option<MatchResult> {
        let hit = self.index.by_alias(key).first()?;
        Some(MatchResult::single(&hit.entity, Confidence::HIGH, MatchField::Alias, query))
    }

    fn match_group(&self, key: &str, query: &str) -> Option<MatchResult> {
        let group = self.index.by_group_keyword(key)?;
        match group.members.as_slice() {
            [] => None,
            [only] => Some(MatchResult::single(only, Confidence::EXACT, MatchField::Group, query)),
            many => MatchResult::ambiguous(many, MatchField::Group, query),
        }
    }

    fn match_fuzzy(&self, key: &str, query: &str) -> Option<MatchResult> {
        if key.chars().count() < 2 {
            return None;
        }

        let (score, best) = self
            .index
            .fuzzy_keys()
            .iter()
            .map(|candidate| (similarity(key, &candidate.key), candidate))
            .max_by(|(a_score, a), (b_score, b)| {
                a_score
                    .partial_cmp(b_score)
                    .unwrap_or(Ordering::Equal)
                    .then(a.entity.priority.cmp(&b.entity.priority))
            })?;

        if score < FUZZY_ACCEPT {
            return None;
        }
        let confidence = if score >= FUZZY_NEAR_EXACT {
            Confidence::HIGH
        } else {
            Confidence::new(score * FUZZY_SCALE)
        };
        Some(MatchResult::single(&best.entity, confidence, MatchField::Fuzzy, query))
    }

    /// Ranked candidates for chips and error payloads.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        let key = normalize_key(query);
        if key.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(Arc<NamedEntity>, f64)> = Vec::new();

        for entity in self.index.by_phonetic(&key) {
            scored.push((Arc::clone(entity), Confidence::HIGH.value()));
        }

        if let Some(group) = self.index.by_group_keyword(&key) {
            for entity in &group.members {
                scored.push((Arc::clone(entity), 0.7));
            }
        }

        for candidate in self.index.fuzzy_keys() {
            if let Some(overlap) = containment_overlap(&key, &candidate.key) {
                let score = 0.5 + 0.3 * overlap - 0.02 * candidate.position as f64;
                scored.push((Arc::clone(&candidate.entity), score));
            }
        }

        if scored.is_empty() {
            for candidate in self.index.fuzzy_keys() {
                let score = similarity(&key, &candidate.key);
                if score >= SUGGESTION_FUZZY_FLOOR {
                    scored.push((Arc::clone(&candidate.entity), score * FUZZY_SCALE));
                }
            }
        }

        rank(scored, limit)
    }

    /// `match_query` mapped into the error taxonomy.
    pub fn resolve(&self, query: &str) -> Result<MatchResult, NluError> {
        match self.match_query(query) {
            None => Err(NluError::EntityNotFound {
                query: query.to_string(),
                suggestions: self.suggestions(query, self.suggestion_limit),
            }),
            Some(result) if result.is_ambiguous() => {
                let candidates = if result.candidates.len() > 1 {
                    result.candidate_suggestions()
                } else {
                    self.suggestions(query, self.suggestion_limit)
                };
                Err(NluError::AmbiguousMatch {
                    query: query.to_string(),
                    candidates,
                })
            }
            Some(result) => Ok(result),
        }
    }

    /// Longest catalog key mentioned anywhere in a longer utterance.
    ///
    /// ASCII keys must line up with whole words (up to three, joined), CJK
    /// keys match as substrings of the normalized text.
    pub fn find_in_text(&self, text: &str) -> Option<MatchResult> {
        let normalized = normalize_key(text);
        if normalized.is_empty() {
            return None;
        }
        let folded = text.chars().map(fold_full_width).collect::<String>();
        let words = folded
            .unicode_words()
            .map(normalize_key)
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>();
        let mut ascii_spans = HashSet::new();
        for width in 1..=3 {
            for window in words.windows(width) {
                ascii_spans.insert(window.concat());
            }
        }

        let best = self
            .index
            .surface_keys()
            .iter()
            .filter(|surface| {
                if surface.key.is_ascii() {
                    ascii_spans.contains(&surface.key)
                } else {
                    normalized.contains(&surface.key)
                }
            })
            .max_by_key(|surface| {
                let priority = surface.targets.first().map_or(i32::MIN, |entity| entity.priority);
                (surface.key.chars().count(), surface.kind, priority)
            })?;

        let result = match (surface_kind(best.kind), best.targets.as_slice()) {
            (Mention::Name, [only]) => {
                MatchResult::single(only, Confidence::EXACT, best.field, &best.key)
            }
            (Mention::Keyed, [only]) => {
                MatchResult::single(only, Confidence::HIGH, best.field, &best.key)
            }
            (Mention::Group, [only]) => {
                MatchResult::single(only, Confidence::EXACT, best.field, &best.key)
            }
            (_, many) => MatchResult::ambiguous(many, best.field, &best.key)?,
        };
        debug!(
            entity_id = %result.entity.id,
            confidence = %result.confidence,
            key = %best.key,
            "entity mention in text"
        );
        Some(result)
    }

    /// Highest-priority entities, for prompts that have nothing to go on.
    pub fn popular(&self, limit: usize) -> Vec<Suggestion> {
        self.index
            .entities()
            .iter()
            .take(limit)
            .map(|entity| suggestion(entity, Confidence::LOW))
            .collect()
    }
}

enum Mention {
    Name,
    Keyed,
    Group,
}

fn surface_kind(kind: KeyKind) -> Mention {
    match kind {
        KeyKind::Name => Mention::Name,
        KeyKind::Alias | KeyKind::Phonetic => Mention::Keyed,
        KeyKind::Group => Mention::Group,
    }
}

fn suggestion(entity: &NamedEntity, confidence: Confidence) -> Suggestion {
    Suggestion {
        entity_id: entity.id.clone(),
        name: entity.display_name().to_string(),
        confidence,
    }
}

/// Best score per entity, then confidence and priority descending.
fn rank(scored: Vec<(Arc<NamedEntity>, f64)>, limit: usize) -> Vec<Suggestion> {
    let mut best: Vec<(Arc<NamedEntity>, f64)> = Vec::new();
    for (entity, score) in scored {
        match best.iter_mut().find(|(seen, _)| seen.id == entity.id) {
            Some((_, existing)) if *existing >= score => {}
            Some((_, existing)) => *existing = score,
            None => best.push((entity, score)),
        }
    }

    best.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| Reverse(a.priority).cmp(&Reverse(b.priority)))
            .then_with(|| a.id.cmp(&b.id))
    });

    best.into_iter()
        .take(limit)
        .map(|(entity, score)| suggestion(&entity, Confidence::new(score)))
        .collect()
}
