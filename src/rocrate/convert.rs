//! Conversion between packaged crates and flat JSON-LD documents
//!
//! Both directions stage through a scratch directory so the manifest text is
//! always the one the package writer produces and the package reader accepts.
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use tempfile::TempDir;

use crate::rocrate::core::METADATA_FILE;
use crate::rocrate::errors::{Error, Result};
use crate::rocrate::graph::Graph;
use crate::rocrate::package::RoCrate;

const STAGED_CRATE: &str = "RO-crate";

/// Build a crate from a JSON-LD document.
pub fn convert_jsonld_to_crate<R: Read>(reader: R) -> Result<RoCrate> {
    let graph = Graph::parse(reader)?;
    let text = graph.to_manifest()?.to_json_string()?;

    let staging = TempDir::new()?;
    fs::write(staging.path().join(METADATA_FILE), text)?;
    let rocrate = RoCrate::open(staging.path())?.detach();
    tracing::debug!(nodes = graph.len(), "converted JSON-LD document to crate");
    Ok(rocrate)
}

pub fn convert_jsonld_file_to_crate(path: impl AsRef<Path>) -> Result<RoCrate> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| Error::file_not_found(path))?;
    convert_jsonld_to_crate(BufReader::new(file))
}

/// The manifest text of `rocrate`, exactly as the package writer emits it.
pub fn convert_crate_to_jsonld(rocrate: &RoCrate) -> Result<String> {
    let staging = TempDir::new()?;
    let path = staging.path().join(STAGED_CRATE);
    rocrate.write(&path)?;

    let manifest = path.join(METADATA_FILE);
    fs::read_to_string(&manifest).map_err(|_| Error::file_not_found(&manifest))
}
