//! Prepare RO-Crates for import into ROHub.
//!
//! A crate is a directory, or a zip of one, holding `ro-crate-metadata.json`.
//! [`CrateConverter`] checks the root dataset against the fields ROHub
//! requires, fills them in, and writes the crate back out as a directory, a
//! zip archive or a flat JSON-LD document.
//!
//! ```no_run
//! use rocrate2rohub::CrateConverter;
//! use std::path::Path;
//!
//! let mut converter = CrateConverter::new(Some(Path::new("my-crate"))).unwrap();
//! for error in converter.validate() {
//!     eprintln!("{error}");
//! }
//! converter.set_research_area("Biology").unwrap();
//! converter.write_zipfile("my-crate.zip").unwrap();
//! ```

pub mod rocrate;

pub use rocrate::convert::{
    convert_crate_to_jsonld, convert_jsonld_file_to_crate, convert_jsonld_to_crate,
};
pub use rocrate::converter::{CrateConverter, ROHUB_NAME_MINLENGTH};
pub use rocrate::errors::{Error, Result};
pub use rocrate::package::RoCrate;
pub use rocrate::utils::{ResearchAreaMapping, ResearchAreaSource, get_research_area_mapping};
pub use rocrate::validate::{CHECKLIST, ValidationError, validate_file};
