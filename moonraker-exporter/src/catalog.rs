/**
 * OBJECT CATALOG - Operator-declared list of printer objects to monitor
 *
 * ROLE : Reads the catalog document (`objects:` list of `{name, type}`) and
 * validates it. The order of declarations drives the order of emitted samples.
 *
 * FORMAT :
 * ```yaml
 * objects:
 *   - name: extruder
 *     type: Extruder
 *   - name: heater_bed
 *     type: HeaterBed
 *   - name: temperature_fan chamber
 *     type: TemperatureFan
 * ```
 */

use crate::config::ConfigError;
use crate::state::{new_state, snapshot, swap, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Semantic type of a catalog object. Selects the decoded shape and the metrics derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    Extruder,
    HeaterBed,
    Fan,
    TemperatureFan,
    PrintStats,
    /// Any tag not listed above, kept verbatim for diagnostics.
    Unknown(String),
}

impl TypeTag {
    /// Case-sensitive match against the known tag names.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Extruder" => TypeTag::Extruder,
            "HeaterBed" => TypeTag::HeaterBed,
            "Fan" => TypeTag::Fan,
            "TemperatureFan" => TypeTag::TemperatureFan,
            "PrintStats" => TypeTag::PrintStats,
            other => TypeTag::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Extruder => "Extruder",
            TypeTag::HeaterBed => "HeaterBed",
            TypeTag::Fan => "Fan",
            TypeTag::TemperatureFan => "TemperatureFan",
            TypeTag::PrintStats => "PrintStats",
            TypeTag::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TypeTag::Unknown(_))
    }
}

impl From<String> for TypeTag {
    fn from(raw: String) -> Self {
        TypeTag::parse(&raw)
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
}

impl ObjectDeclaration {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self { name: name.into(), type_tag }
    }
}

/// Validated, ordered list of object declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    objects: Vec<ObjectDeclaration>,
}

impl Catalog {
    pub fn new(objects: Vec<ObjectDeclaration>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for (index, decl) in objects.iter().enumerate() {
            if decl.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { index });
            }
            if !seen.insert(decl.name.as_str()) {
                return Err(ConfigError::DuplicateObject(decl.name.clone()));
            }
        }
        Ok(Self { objects })
    }

    /// Parses a catalog document. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            warn!("catalog {} is empty, no object will be queried", path.display());
            return Ok(Self::default());
        }
        let raw: Catalog = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(raw.objects)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let catalog = Self::parse(&text, path)?;
        for decl in catalog.iter().filter(|d| !d.type_tag.is_known()) {
            warn!(object = %decl.name, type_tag = decl.type_tag.as_str(), "unrecognized object type, it will not be exported");
        }
        Ok(catalog)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectDeclaration> {
        self.objects.iter()
    }

    /// Object names in declaration order, as sent to the status query.
    pub fn names(&self) -> Vec<String> {
        self.objects.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Catalog file plus the current in-memory snapshot.
///
/// With reload disabled the snapshot loaded at startup is served forever. With reload
/// enabled every `current()` call re-reads the file and swaps the snapshot; a failed
/// reload keeps the previous snapshot.
#[derive(Clone)]
pub struct CatalogSource {
    path: PathBuf,
    reload: bool,
    current: Shared<Catalog>,
}

impl CatalogSource {
    /// Loads the catalog once. Failure here is fatal for the process.
    pub async fn open(path: impl Into<PathBuf>, reload: bool) -> Result<Self, ConfigError> {
        let path = path.into();
        let catalog = Catalog::load(&path).await?;
        info!("loaded {} objects from {}", catalog.len(), path.display());
        Ok(Self { path, reload, current: new_state(catalog) })
    }

    /// Fixed in-memory catalog, never reloaded.
    pub fn fixed(catalog: Catalog) -> Self {
        Self { path: PathBuf::new(), reload: false, current: new_state(catalog) }
    }

    pub async fn current(&self) -> Arc<Catalog> {
        if self.reload {
            self.refresh().await;
        }
        snapshot(&self.current)
    }

    pub async fn refresh(&self) {
        match Catalog::load(&self.path).await {
            Ok(catalog) => {
                debug!("reloaded {} objects from {}", catalog.len(), self.path.display());
                swap(&self.current, catalog);
            }
            Err(e) => warn!("catalog reload failed, keeping previous catalog: {e}"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<Catalog, ConfigError> {
        Catalog::parse(text, Path::new("objects.yaml"))
    }

    #[test]
    fn test_parse_preserves_order() {
        let catalog = parse(
            "objects:\n  - name: heater_bed\n    type: HeaterBed\n  - name: extruder\n    type: Extruder\n  - name: fan\n    type: Fan\n",
        )
        .unwrap();
        assert_eq!(catalog.names(), vec!["heater_bed", "extruder", "fan"]);
        assert_eq!(catalog.iter().nth(1).unwrap().type_tag, TypeTag::Extruder);
    }

    #[test]
    fn test_type_tags_are_case_sensitive() {
        assert_eq!(TypeTag::parse("TemperatureFan"), TypeTag::TemperatureFan);
        assert_eq!(TypeTag::parse("PrintStats"), TypeTag::PrintStats);
        assert_eq!(TypeTag::parse("extruder"), TypeTag::Unknown("extruder".into()));
        assert_eq!(TypeTag::parse("LaserDiode").as_str(), "LaserDiode");
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let catalog = parse("objects:\n  - name: laser\n    type: LaserDiode\n").unwrap();
        let decl = catalog.iter().next().unwrap();
        assert_eq!(decl.type_tag, TypeTag::Unknown("LaserDiode".into()));
        assert!(!decl.type_tag.is_known());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(parse("objects: 12\n"), Err(ConfigError::Parse { .. })));
        assert!(matches!(parse("objects:\n  - type: Fan\n"), Err(ConfigError::Parse { .. })));
        assert!(matches!(parse("hosts: {}\n"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let err = parse("objects:\n  - {name: fan, type: Fan}\n  - {name: fan, type: Fan}\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateObject(name) if name == "fan"));

        let err = parse("objects:\n  - {name: fan, type: Fan}\n  - {name: ' ', type: Fan}\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName { index: 1 }));
    }

    #[test]
    fn test_empty_document_is_empty_catalog() {
        assert!(parse("  \n").unwrap().is_empty());
        assert!(parse("objects: []\n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/objects.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[tokio::test]
    async fn test_source_reload_keeps_previous_on_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "objects:\n  - name: extruder\n    type: Extruder").unwrap();
        let source = CatalogSource::open(file.path(), true).await.unwrap();
        assert_eq!(source.current().await.names(), vec!["extruder"]);

        std::fs::write(file.path(), "objects:\n  - name: fan\n    type: Fan\n").unwrap();
        assert_eq!(source.current().await.names(), vec!["fan"]);

        std::fs::write(file.path(), "objects: [[[").unwrap();
        assert_eq!(source.current().await.names(), vec!["fan"]);
    }

    #[tokio::test]
    async fn test_source_without_reload_is_cached() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "objects:\n  - name: extruder\n    type: Extruder\n").unwrap();
        let source = CatalogSource::open(file.path(), false).await.unwrap();

        std::fs::write(file.path(), "objects: []\n").unwrap();
        assert_eq!(source.current().await.len(), 1);
    }
}
