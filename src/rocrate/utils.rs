//! Research area mapping: ROHub display names to canonical identifiers
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::rocrate::errors::{Error, Result};

const BUNDLED_RESEARCH_AREAS: &str = include_str!("../../resources/research_areas.tsv");

/// Display name -> canonical identifier, sorted by display name.
pub type ResearchAreaMapping = BTreeMap<String, String>;

/// Where a converter reads its research area mapping from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResearchAreaSource {
    #[default]
    Bundled,
    File(PathBuf),
}

impl ResearchAreaSource {
    pub fn load(&self) -> Result<ResearchAreaMapping> {
        match self {
            Self::Bundled => get_research_area_mapping(),
            Self::File(path) => load_research_area_mapping(path),
        }
    }
}

impl From<Option<PathBuf>> for ResearchAreaSource {
    fn from(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Bundled, Self::File)
    }
}

/// Mapping shipped with the tool.
pub fn get_research_area_mapping() -> Result<ResearchAreaMapping> {
    parse_research_area_mapping(BUNDLED_RESEARCH_AREAS)
}

pub fn load_research_area_mapping(path: &Path) -> Result<ResearchAreaMapping> {
    let text = std::fs::read_to_string(path).map_err(|_| Error::file_not_found(path))?;
    let mapping = parse_research_area_mapping(&text)?;
    tracing::debug!(path = %path.display(), areas = mapping.len(), "loaded research areas");
    Ok(mapping)
}

/// Parse `name<TAB>identifier` lines. The identifier is everything after the
/// first tab and must be an absolute IRI. Blank lines are skipped.
pub fn parse_research_area_mapping(text: &str) -> Result<ResearchAreaMapping> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut mapping = ResearchAreaMapping::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        if record.len() < 2 {
            return Err(Error::mapping(line, "expected a tab between name and identifier"));
        }

        let name = record[0].trim();
        let identifier = record.iter().skip(1).collect::<Vec<_>>().join("\t");
        let identifier = identifier.trim();
        if name.is_empty() || identifier.is_empty() {
            return Err(Error::mapping(line, "name and identifier must not be empty"));
        }
        if let Err(e) = Url::parse(identifier) {
            return Err(Error::mapping(line, format!("{identifier}: {e}")));
        }
        if mapping.insert(name.to_string(), identifier.to_string()).is_some() {
            return Err(Error::mapping(line, format!("duplicate research area {name}")));
        }
    }
    Ok(mapping)
}
