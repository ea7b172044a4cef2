//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Prep a crate for import to rohub
///
/// A CRATE is a directory of files containing at least the file
/// "ro-crate-metadata.json". The directory may be zipped, or the metadata
/// may be given on its own as a JSON-LD document ending in ".json".
#[derive(Parser)]
#[command(name = "rocrate2rohub")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Read research areas from this TSV file instead of the bundled list
    #[arg(long, global = true, value_name = "FILE", env = "ROCRATE2ROHUB_RESEARCH_AREAS")]
    pub research_areas: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the crate
    Check {
        /// Crate, as a zip-file or directory
        #[arg(value_name = "CRATE")]
        rocrate: PathBuf,

        /// Be more verbose, explicitly state if the crate is valid
        #[arg(short, long)]
        verbose: bool,
    },

    /// Fix the crate by adding missing info
    Fix {
        /// Crate, as a zip-file or directory
        #[arg(value_name = "CRATE")]
        rocrate: PathBuf,

        #[command(flatten)]
        fields: FieldArgs,

        /// Output to a specific zip-file or directory. Default: same as CRATE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List valid research areas
    #[command(name = "list_research_areas")]
    ListResearchAreas,
}

/// Values for the checklist fields.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    /// Set name
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Set description
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Set research_area
    #[arg(short = 'r', long = "research_area")]
    pub research_area: Option<String>,
}

impl FieldArgs {
    pub fn value(&self, field: &str) -> Option<&str> {
        let value = match field {
            "name" => &self.name,
            "description" => &self.description,
            "research_area" => &self.research_area,
            _ => return None,
        };
        value.as_deref().filter(|value| !value.is_empty())
    }
}
