//! The ROHub checklist and crate validation
use std::fmt;
use std::path::Path;

use crate::rocrate::converter::CrateConverter;
use crate::rocrate::errors::Result;

/// One required field: how to check it and how to set it.
pub struct ChecklistEntry {
    pub field: &'static str,
    pub check: fn(&CrateConverter) -> Option<String>,
    pub set: fn(&mut CrateConverter, &str) -> Result<()>,
}

/// Fields ROHub requires, in checking order.
pub static CHECKLIST: [ChecklistEntry; 3] = [
    ChecklistEntry {
        field: "name",
        check: CrateConverter::check_name,
        set: |converter, value| converter.set_name(value),
    },
    ChecklistEntry {
        field: "description",
        check: CrateConverter::check_description,
        set: |converter, value| converter.set_description(value),
    },
    ChecklistEntry {
        field: "research_area",
        check: CrateConverter::check_research_area,
        set: |converter, value| converter.set_research_area(value),
    },
];

pub fn checklist_entry(field: &str) -> Option<&'static ChecklistEntry> {
    CHECKLIST.iter().find(|entry| entry.field == field)
}

/// A failed check. Orders by field, then message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\": {}", self.field, self.message)
    }
}

/// Validate a crate directory or zip against the bundled research areas
pub fn validate_file(file_path: &Path) -> Result<Vec<ValidationError>> {
    let converter = CrateConverter::new(Some(file_path))?;
    Ok(converter.validate())
}
