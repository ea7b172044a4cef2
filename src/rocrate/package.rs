//! Crates on disk: opening and writing directories and zip archives
use chrono::Utc;
use path_clean::PathClean;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::rocrate::core::{Entity, METADATA_FILE, Manifest};
use crate::rocrate::errors::{Error, Result};

/// A loaded crate: its manifest plus the directory its payload files live in.
#[derive(Debug)]
pub struct RoCrate {
    manifest: Manifest,
    root: usize,
    source: Option<PathBuf>,
    // Extracted zip contents, removed on drop.
    staging: Option<TempDir>,
}

struct PayloadEntry {
    path: PathBuf,
    relative: PathBuf,
    is_dir: bool,
}

impl RoCrate {
    /// An empty crate holding only the descriptor and a root dataset.
    pub fn new() -> Result<Self> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        Self::from_manifest(Manifest::empty(&today)?)
    }

    /// A crate without payload files.
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        let root = manifest.root_index()?;
        Ok(Self {
            manifest,
            root,
            source: None,
            staging: None,
        })
    }

    /// Open a crate directory or a zipped crate.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::open_directory(path)
        } else if path.is_file() {
            Self::open_zip(path)
        } else {
            Err(Error::file_not_found(path))
        }
    }

    fn open_directory(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(METADATA_FILE);
        let text =
            fs::read_to_string(&manifest_path).map_err(|_| Error::file_not_found(&manifest_path))?;
        let mut rocrate = Self::from_manifest(Manifest::parse(&text)?)?;
        rocrate.source = Some(dir.to_path_buf());
        tracing::debug!(
            path = %dir.display(),
            entities = rocrate.manifest.graph.len(),
            "opened crate directory"
        );
        Ok(rocrate)
    }

    fn open_zip(path: &Path) -> Result<Self> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let staging = tempfile::tempdir()?;
        archive.extract(staging.path())?;
        tracing::debug!(path = %path.display(), files = archive.len(), "extracted zipped crate");

        let root = crate_root(staging.path()).ok_or_else(|| {
            Error::invalid_format(format!("{} does not contain {METADATA_FILE}", path.display()))
        })?;
        let mut rocrate = Self::open_directory(&root)?;
        rocrate.staging = Some(staging);
        Ok(rocrate)
    }

    /// Forget the payload directory; later writes only produce the manifest.
    pub fn detach(mut self) -> Self {
        self.source = None;
        self.staging = None;
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn root_dataset(&self) -> &Entity {
        &self.manifest.graph[self.root]
    }

    pub fn root_dataset_mut(&mut self) -> &mut Entity {
        &mut self.manifest.graph[self.root]
    }

    /// Write the crate as a directory, copying payload files from the source.
    pub fn write(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;

        let payload = self.payload(&[dest])?;
        for entry in &payload {
            let target = dest.join(&entry.relative);
            if entry.is_dir {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&entry.path, &target)?;
            }
        }
        let mut manifest = NamedTempFile::new_in(dest)?;
        manifest.write_all(self.manifest.to_json_string()?.as_bytes())?;
        manifest.persist(dest.join(METADATA_FILE)).map_err(|e| e.error)?;

        tracing::debug!(path = %dest.display(), files = payload.len(), "wrote crate directory");
        Ok(())
    }

    /// Write the crate as a zip archive with the manifest at its top level.
    ///
    /// The archive is built next to `dest` and renamed over it once complete,
    /// so an existing file at `dest` survives a failed write.
    pub fn write_zip(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        let parent = match dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let staged = NamedTempFile::new_in(parent)?;
        let payload = self.payload(&[dest, staged.path()])?;

        let mut zip = ZipWriter::new(staged);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in &payload {
            let name = zip_name(&entry.relative);
            if entry.is_dir {
                zip.add_directory(name, options)?;
            } else {
                zip.start_file(name, options)?;
                std::io::copy(&mut File::open(&entry.path)?, &mut zip)?;
            }
        }
        zip.start_file(METADATA_FILE, options)?;
        zip.write_all(self.manifest.to_json_string()?.as_bytes())?;
        zip.finish()?.persist(dest).map_err(|e| e.error)?;

        tracing::debug!(path = %dest.display(), files = payload.len(), "wrote zipped crate");
        Ok(())
    }

    /// Payload files and folders to carry over, skipping the manifest and
    /// every path in `exclude`. Empty when the source itself is excluded.
    fn payload(&self, exclude: &[&Path]) -> Result<Vec<PayloadEntry>> {
        let Some(source) = &self.source else {
            return Ok(Vec::new());
        };
        let source = source.canonicalize()?;
        let exclude = exclude
            .iter()
            .map(|path| resolve(path))
            .collect::<Result<Vec<_>>>()?;
        if exclude.contains(&source) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut walker = WalkDir::new(&source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            let file_type = entry.file_type();
            if exclude.iter().any(|path| path == entry.path()) {
                if file_type.is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }
            if file_type.is_symlink() {
                tracing::warn!(path = %entry.path().display(), "skipping symlink in crate payload");
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&source) else {
                continue;
            };
            if relative == Path::new(METADATA_FILE) {
                continue;
            }
            entries.push(PayloadEntry {
                path: entry.path().to_path_buf(),
                relative: relative.clean(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(entries)
    }
}

/// Absolute form of `path`, which may not exist yet.
fn resolve(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }
    let parent = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent.canonicalize()?,
        None => std::env::current_dir()?,
    };
    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}

/// Directory holding the manifest: `dir` itself or its only subfolder.
fn crate_root(dir: &Path) -> Option<PathBuf> {
    if dir.join(METADATA_FILE).is_file() {
        return Some(dir.to_path_buf());
    }
    let mut children = fs::read_dir(dir).ok()?.filter_map(|entry| entry.ok());
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    let path = only.path();
    path.join(METADATA_FILE).is_file().then_some(path)
}

fn zip_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
