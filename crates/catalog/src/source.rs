use std::path::{Path, PathBuf};

use snowtrip_core::{CatalogData, EntityGroup, NamedEntity};
use walkdir::WalkDir;

use crate::builtin::builtin_catalog;
use crate::{CatalogError, CatalogSource};

/// Serves a fixed catalog; the builtin resort list by default.
#[derive(Debug, Clone)]
pub struct StaticCatalogSource {
    data: CatalogData,
}

impl StaticCatalogSource {
    pub fn new(data: CatalogData) -> Self {
        Self { data }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_catalog())
    }
}

impl Default for StaticCatalogSource {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CatalogSource for StaticCatalogSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self) -> Result<CatalogData, CatalogError> {
        Ok(self.data.clone())
    }
}

/// Reads every `*.json` file below a directory.
///
/// A file may hold a full catalog object (`{"entities": [...], "groups": [...]}`),
/// a bare array of entities, or a single entity.
#[derive(Debug, Clone)]
pub struct JsonDirCatalogSource {
    root: PathBuf,
}

impl JsonDirCatalogSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Entities(Vec<NamedEntity>),
    Entity(Box<NamedEntity>),
    Catalog {
        #[serde(default)]
        entities: Vec<NamedEntity>,
        #[serde(default)]
        groups: Vec<EntityGroup>,
    },
}

impl CatalogSource for JsonDirCatalogSource {
    fn name(&self) -> &str {
        "json_dir"
    }

    fn fetch(&self) -> Result<CatalogData, CatalogError> {
        if !self.root.is_dir() {
            return Err(CatalogError::MissingDirectory(self.root.clone()));
        }

        let mut paths = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("json"))
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>();
        paths.sort();

        let mut data = CatalogData::default();
        for path in &paths {
            match read_file(path)? {
                CatalogFile::Catalog { entities, groups } => {
                    data.entities.extend(entities);
                    data.groups.extend(groups);
                }
                CatalogFile::Entities(entities) => data.entities.extend(entities),
                CatalogFile::Entity(entity) => data.entities.push(*entity),
            }
        }

        if data.entities.is_empty() {
            return Err(CatalogError::Empty(self.root.clone()));
        }
        Ok(data)
    }
}

fn read_file(path: &Path) -> Result<CatalogFile, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snowtrip-catalog-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_mixed_file_shapes() {
        let dir = scratch_dir("mixed");
        std::fs::write(
            dir.join("a.json"),
            r#"{"entities":[{"id":"niseko","names":{"zh-tw":"二世谷","en":"Niseko"},"region":"hokkaido","priority":10}],
               "groups":[{"id":"hokkaido","name":"北海道","keywords":[],"membership":{"kind":"region","value":"hokkaido"}}]}"#,
        )
        .unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(
            dir.join("nested/b.json"),
            r#"{"id":"furano","names":{"zh-tw":"富良野","en":"Furano"},"region":"hokkaido"}"#,
        )
        .unwrap();
        std::fs::write(dir.join("notes.md"), "ignored").unwrap();

        let data = JsonDirCatalogSource::new(&dir).fetch().unwrap();
        assert_eq!(data.entities.len(), 2);
        assert_eq!(data.groups.len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn broken_json_is_a_parse_error() {
        let dir = scratch_dir("broken");
        std::fs::write(dir.join("bad.json"), "{ not json").unwrap();
        let err = JsonDirCatalogSource::new(&dir).fetch().unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_is_reported() {
        let err = JsonDirCatalogSource::new("/definitely/not/here").fetch().unwrap_err();
        assert!(matches!(err, CatalogError::MissingDirectory(_)));
    }
}
