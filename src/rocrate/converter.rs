//! Preparing a crate for import into ROHub
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rocrate::convert::convert_crate_to_jsonld;
use crate::rocrate::errors::{Error, Result};
use crate::rocrate::package::RoCrate;
use crate::rocrate::utils::{ResearchAreaMapping, ResearchAreaSource};
use crate::rocrate::validate::{CHECKLIST, ValidationError, checklist_entry};

/// Shortest `name` ROHub accepts.
pub const ROHUB_NAME_MINLENGTH: usize = 5;
/// Root dataset attribute holding the research area.
pub const STUDY_SUBJECT: &str = "studySubject";

/// A loaded crate together with the ROHub research areas it is checked against.
#[derive(Debug)]
pub struct CrateConverter {
    filename: Option<PathBuf>,
    rocrate: RoCrate,
    research_areas: ResearchAreaMapping,
    research_area_source: ResearchAreaSource,
}

impl CrateConverter {
    /// Load the crate at `filename` (directory or zip), or start an empty
    /// crate, checked against the bundled research areas.
    pub fn new(filename: Option<&Path>) -> Result<Self> {
        Self::with_source(filename, ResearchAreaSource::Bundled)
    }

    pub fn with_source(filename: Option<&Path>, source: ResearchAreaSource) -> Result<Self> {
        let rocrate = Self::load(filename)?;
        let mut converter = Self::from_crate(rocrate, source)?;
        converter.filename = filename.map(Path::to_path_buf);
        Ok(converter)
    }

    /// Wrap an already loaded crate.
    pub fn from_crate(rocrate: RoCrate, source: ResearchAreaSource) -> Result<Self> {
        let research_areas = source.load()?;
        Ok(Self {
            filename: None,
            rocrate,
            research_areas,
            research_area_source: source,
        })
    }

    pub fn load(filename: Option<&Path>) -> Result<RoCrate> {
        match filename {
            Some(path) => RoCrate::open(path),
            None => RoCrate::new(),
        }
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn rocrate(&self) -> &RoCrate {
        &self.rocrate
    }

    pub fn rocrate_mut(&mut self) -> &mut RoCrate {
        &mut self.rocrate
    }

    pub fn set_crate(&mut self, rocrate: RoCrate) {
        self.rocrate = rocrate;
    }

    pub fn research_areas(&self) -> &ResearchAreaMapping {
        &self.research_areas
    }

    /// Replace the research areas without touching the configured source.
    pub fn set_research_areas(&mut self, research_areas: ResearchAreaMapping) {
        self.research_areas = research_areas;
    }

    pub fn reload_research_areas(&mut self) -> Result<()> {
        self.research_areas = self.research_area_source.load()?;
        Ok(())
    }

    /// Every unmet requirement, sorted by field name.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors: Vec<_> = CHECKLIST
            .iter()
            .filter_map(|entry| {
                (entry.check)(self).map(|message| ValidationError {
                    field: entry.field,
                    message,
                })
            })
            .collect();
        errors.sort();
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Set a checklist field by name.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        let entry = checklist_entry(field)
            .ok_or_else(|| Error::conversion(format!("Unknown field \"{field}\"")))?;
        (entry.set)(self, value)?;
        tracing::info!(field, "updated crate field");
        Ok(())
    }

    pub fn check_name(&self) -> Option<String> {
        let Some(name) = self.rocrate.root_dataset().text("name") else {
            return Some(format!(
                "must be set and be at least {ROHUB_NAME_MINLENGTH} characters long"
            ));
        };
        if name.chars().count() < ROHUB_NAME_MINLENGTH {
            return Some(format!("must be at least {ROHUB_NAME_MINLENGTH} characters long"));
        }
        None
    }

    pub fn set_name(&mut self, name: impl ToString) -> Result<()> {
        let name = name.to_string();
        if name.chars().count() < ROHUB_NAME_MINLENGTH {
            return Err(Error::conversion(format!(
                "\"name\" must be at least {ROHUB_NAME_MINLENGTH} characters long"
            )));
        }
        self.rocrate.root_dataset_mut().set("name", name);
        Ok(())
    }

    pub fn check_description(&self) -> Option<String> {
        match self.rocrate.root_dataset().text("description") {
            Some(_) => None,
            None => Some("must be set".to_string()),
        }
    }

    pub fn set_description(&mut self, description: impl ToString) -> Result<()> {
        self.rocrate
            .root_dataset_mut()
            .set("description", description.to_string());
        Ok(())
    }

    /// Presence only: a `studySubject` outside the known research areas passes.
    pub fn check_research_area(&self) -> Option<String> {
        match self.rocrate.root_dataset().text(STUDY_SUBJECT) {
            Some(_) => None,
            None => Some("must be set".to_string()),
        }
    }

    /// Set `studySubject` to the identifier of a known research area.
    pub fn set_research_area(&mut self, research_area: impl ToString) -> Result<()> {
        let research_area = research_area.to_string();
        let Some(link) = self.research_areas.get(&research_area) else {
            return Err(Error::conversion(format!(
                "Research area not supported by rohub: {research_area}"
            )));
        };
        let link = json!({ "@id": link });
        self.rocrate.root_dataset_mut().set(STUDY_SUBJECT, link);
        Ok(())
    }

    pub fn write_directory(&self, filename: impl AsRef<Path>) -> Result<()> {
        let filename = filename.as_ref();
        if has_suffix(filename, ".zip") {
            return Err(Error::conversion(
                "Will not write to a directory ending with \".zip\"",
            ));
        }
        self.rocrate.write(filename)
    }

    pub fn write_zipfile(&self, filename: impl AsRef<Path>) -> Result<()> {
        let filename = filename.as_ref();
        if !has_suffix(filename, ".zip") {
            return Err(Error::conversion(
                "Will not write a zip to a filename not ending with \".zip\"",
            ));
        }
        self.rocrate.write_zip(filename)
    }

    pub fn write_jsonld(&self, filename: impl AsRef<Path>) -> Result<()> {
        let filename = filename.as_ref();
        if !has_suffix(filename, ".json") {
            return Err(Error::conversion(
                "Will not write JSON-LD to a filename not ending with \".json\"",
            ));
        }
        let text = convert_crate_to_jsonld(&self.rocrate)?;
        fs::write(filename, text)?;
        tracing::debug!(path = %filename.display(), "wrote JSON-LD document");
        Ok(())
    }

    /// Write in the format the destination suffix asks for.
    pub fn write(&self, filename: impl AsRef<Path>) -> Result<()> {
        let filename = filename.as_ref();
        if has_suffix(filename, ".json") {
            self.write_jsonld(filename)
        } else if has_suffix(filename, ".zip") {
            self.write_zipfile(filename)
        } else {
            self.write_directory(filename)
        }
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_string_lossy().ends_with(suffix)
}
