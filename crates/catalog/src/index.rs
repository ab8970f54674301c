use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use snowtrip_core::text::fold_full_width;
use snowtrip_core::{CatalogData, Locale, MatchField, NamedEntity};
use tracing::warn;

/// Lowercase, fold full-width ASCII, drop whitespace and punctuation.
///
/// `Hakuba Happo-one`, `ｈａｋｕｂａ　ｈａｐｐｏ` and `hakuba・happo one` all
/// collapse to the same key.
pub fn normalize_key(input: &str) -> String {
    input
        .chars()
        .map(fold_full_width)
        .flat_map(char::to_lowercase)
        .filter(|ch| ch.is_alphanumeric())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyKind {
    Group,
    Phonetic,
    Alias,
    Name,
}

/// One searchable surface form with every entity it points at, highest
/// priority first.
#[derive(Debug, Clone)]
pub struct SurfaceKey {
    pub key: String,
    pub kind: KeyKind,
    pub field: MatchField,
    pub targets: Vec<Arc<NamedEntity>>,
}

#[derive(Debug, Clone)]
pub struct NameHit {
    pub entity: Arc<NamedEntity>,
    pub locale: Locale,
}

#[derive(Debug, Clone)]
pub struct AliasHit {
    pub entity: Arc<NamedEntity>,
    /// Index in the entity's alias list; earlier aliases are more specific.
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct IndexedGroup {
    pub id: String,
    pub name: String,
    pub members: Vec<Arc<NamedEntity>>,
}

#[derive(Debug, Clone)]
pub struct FuzzyKey {
    pub key: String,
    pub entity: Arc<NamedEntity>,
    pub field: MatchField,
    pub position: usize,
}

/// Immutable lookup tables over one catalog load.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    entities: Vec<Arc<NamedEntity>>,
    by_id: HashMap<String, Arc<NamedEntity>>,
    by_name: HashMap<String, Vec<NameHit>>,
    by_alias: HashMap<String, Vec<AliasHit>>,
    by_phonetic: HashMap<String, Vec<Arc<NamedEntity>>>,
    by_group_keyword: HashMap<String, Arc<IndexedGroup>>,
    groups: Vec<Arc<IndexedGroup>>,
    surface_keys: Vec<SurfaceKey>,
    fuzzy_keys: Vec<FuzzyKey>,
}

impl CatalogIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(data: CatalogData) -> Self {
        let mut index = Self::default();

        for entity in data.entities {
            if index.by_id.contains_key(&entity.id) {
                warn!(entity_id = %entity.id, "duplicate entity id in catalog, keeping the first");
                continue;
            }
            let entity = Arc::new(entity);
            index.by_id.insert(entity.id.clone(), Arc::clone(&entity));
            index.entities.push(entity);
        }
        index
            .entities
            .sort_by_key(|entity| (Reverse(entity.priority), entity.id.clone()));

        for entity in &index.entities {
            for (locale, name) in &entity.names {
                let key = normalize_key(name);
                if key.is_empty() {
                    continue;
                }
                let hits = index.by_name.entry(key.clone()).or_default();
                if !hits.iter().any(|hit| hit.entity.id == entity.id) {
                    hits.push(NameHit {
                        entity: Arc::clone(entity),
                        locale: *locale,
                    });
                    index.fuzzy_keys.push(FuzzyKey {
                        key,
                        entity: Arc::clone(entity),
                        field: MatchField::Name(*locale),
                        position: 0,
                    });
                }
            }

            for (position, alias) in entity.aliases.iter().enumerate() {
                let key = normalize_key(alias);
                if key.is_empty() {
                    continue;
                }
                let hits = index.by_alias.entry(key.clone()).or_default();
                if !hits.iter().any(|hit| hit.entity.id == entity.id) {
                    hits.push(AliasHit {
                        entity: Arc::clone(entity),
                        position,
                    });
                    index.fuzzy_keys.push(FuzzyKey {
                        key,
                        entity: Arc::clone(entity),
                        field: MatchField::Alias,
                        position,
                    });
                }
            }

            for phonetic in &entity.phonetics {
                let key = normalize_key(phonetic);
                if key.is_empty() {
                    continue;
                }
                let hits = index.by_phonetic.entry(key.clone()).or_default();
                if !hits.iter().any(|hit| hit.id == entity.id) {
                    hits.push(Arc::clone(entity));
                    index.fuzzy_keys.push(FuzzyKey {
                        key,
                        entity: Arc::clone(entity),
                        field: MatchField::Phonetic,
                        position: 0,
                    });
                }
            }
        }

        // Entities were inserted in priority order, so every list above is
        // already ranked; aliases additionally prefer earlier positions.
        for hits in index.by_alias.values_mut() {
            hits.sort_by_key(|hit| (Reverse(hit.entity.priority), hit.position));
        }

        for group in data.groups {
            let members = index
                .entities
                .iter()
                .filter(|entity| group.membership.contains(entity))
                .cloned()
                .collect::<Vec<_>>();
            if members.is_empty() {
                warn!(group_id = %group.id, "catalog group has no members");
            }
            let indexed = Arc::new(IndexedGroup {
                id: group.id,
                name: group.name.clone(),
                members,
            });
            for keyword in group.keywords.iter().chain(std::iter::once(&group.name)) {
                let key = normalize_key(keyword);
                if !key.is_empty() {
                    index
                        .by_group_keyword
                        .entry(key)
                        .or_insert_with(|| Arc::clone(&indexed));
                }
            }
            index.groups.push(indexed);
        }

        index.surface_keys = index.collect_surface_keys();
        index
    }

    fn collect_surface_keys(&self) -> Vec<SurfaceKey> {
        let mut keys = Vec::new();
        for (key, hits) in &self.by_name {
            if let Some(first) = hits.first() {
                keys.push(SurfaceKey {
                    key: key.clone(),
                    kind: KeyKind::Name,
                    field: MatchField::Name(first.locale),
                    targets: hits.iter().map(|hit| Arc::clone(&hit.entity)).collect(),
                });
            }
        }
        for (key, hits) in &self.by_alias {
            keys.push(SurfaceKey {
                key: key.clone(),
                kind: KeyKind::Alias,
                field: MatchField::Alias,
                targets: hits.iter().map(|hit| Arc::clone(&hit.entity)).collect(),
            });
        }
        for (key, hits) in &self.by_phonetic {
            keys.push(SurfaceKey {
                key: key.clone(),
                kind: KeyKind::Phonetic,
                field: MatchField::Phonetic,
                targets: hits.clone(),
            });
        }
        for (key, group) in &self.by_group_keyword {
            if group.members.is_empty() {
                continue;
            }
            keys.push(SurfaceKey {
                key: key.clone(),
                kind: KeyKind::Group,
                field: MatchField::Group,
                targets: group.members.clone(),
            });
        }
        keys.sort_by(|a, b| a.key.cmp(&b.key).then(b.kind.cmp(&a.kind)));
        keys
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<NamedEntity>> {
        self.by_id.get(id)
    }

    /// Every entity, highest priority first.
    pub fn entities(&self) -> &[Arc<NamedEntity>] {
        &self.entities
    }

    pub fn groups(&self) -> &[Arc<IndexedGroup>] {
        &self.groups
    }

    pub fn by_name(&self, key: &str) -> &[NameHit] {
        self.by_name.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn by_alias(&self, key: &str) -> &[AliasHit] {
        self.by_alias.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn by_phonetic(&self, key: &str) -> &[Arc<NamedEntity>] {
        self.by_phonetic.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn by_group_keyword(&self, key: &str) -> Option<&Arc<IndexedGroup>> {
        self.by_group_keyword.get(key)
    }

    pub fn surface_keys(&self) -> &[SurfaceKey] {
        &self.surface_keys
    }

    pub fn fuzzy_keys(&self) -> &[FuzzyKey] {
        &self.fuzzy_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_catalog;

    #[test]
    fn normalization_strips_punctuation_and_width() {
        assert_eq!(normalize_key("Hakuba Happo-one"), "hakubahappoone");
        assert_eq!(normalize_key("ｈａｋｕｂａ　ｈａｐｐｏ・ONE"), "hakubahappoone");
        assert_eq!(normalize_key("Gala Yuzawa's"), "galayuzawas");
        assert_eq!(normalize_key("野沢·温泉"), "野沢温泉");
    }

    #[test]
    fn builds_every_map() {
        let index = CatalogIndex::build(builtin_catalog());
        assert!(index.get("niseko").is_some());
        assert_eq!(index.by_name("二世谷")[0].entity.id, "niseko");
        assert_eq!(index.by_alias("野澤")[0].entity.id, "nozawa");
        assert!(index.by_phonetic("hakuba").len() > 1);

        let hakuba = index.by_group_keyword("白馬").unwrap();
        let priorities = hakuba
            .members
            .iter()
            .map(|entity| entity.priority)
            .collect::<Vec<_>>();
        let mut sorted = priorities.clone();
        sorted.sort_by_key(|priority| Reverse(*priority));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn duplicate_ids_keep_the_first_entity() {
        let mut data = builtin_catalog();
        let mut copy = data.entities[0].clone();
        copy.names.clear();
        data.entities.push(copy);
        let index = CatalogIndex::build(data);
        assert_eq!(index.len(), builtin_catalog().entities.len());
    }
}
