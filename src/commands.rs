//! Subcommand implementations. Each returns the process exit status.

use anyhow::Context;
use std::io::{self, Write};
use std::path::Path;

use rocrate2rohub::{
    CHECKLIST, CrateConverter, ResearchAreaMapping, ResearchAreaSource,
    convert_jsonld_file_to_crate,
};

use crate::cli::{Cli, Commands, FieldArgs};

pub fn run(cli: Cli) -> anyhow::Result<u8> {
    let source = ResearchAreaSource::from(cli.research_areas);
    match cli.command {
        Commands::Check { rocrate, verbose } => {
            let converter = get_converter(&rocrate, source)?;
            check(&converter, verbose, &mut io::stderr().lock())
        }
        Commands::Fix {
            rocrate,
            fields,
            output,
        } => {
            let mut converter = get_converter(&rocrate, source)?;
            let output = output.unwrap_or_else(|| rocrate.clone());
            fix(&mut converter, &fields, &output)
        }
        Commands::ListResearchAreas => {
            let mapping = source.load().context("loading research areas")?;
            list_research_areas(&mapping, &mut io::stdout().lock())
        }
    }
}

/// Open a crate directory, zip or JSON-LD document.
pub fn get_converter(path: &Path, source: ResearchAreaSource) -> anyhow::Result<CrateConverter> {
    let converter = if path.to_string_lossy().ends_with(".json") {
        let rocrate = convert_jsonld_file_to_crate(path)
            .with_context(|| format!("converting {}", path.display()))?;
        CrateConverter::from_crate(rocrate, source)?
    } else {
        CrateConverter::with_source(Some(path), source)
            .with_context(|| format!("loading {}", path.display()))?
    };
    Ok(converter)
}

pub fn check(converter: &CrateConverter, verbose: bool, err: &mut impl Write) -> anyhow::Result<u8> {
    let errors = converter.validate();
    if errors.is_empty() {
        if verbose {
            writeln!(err, "Crate is sufficient for import to rohub")?;
        }
        return Ok(0);
    }

    if verbose {
        writeln!(err, "Crate is invalid, see following list of problems:\n")?;
    }
    let spacer = if verbose { "* " } else { "" };
    for error in &errors {
        writeln!(err, "{spacer}{error}")?;
    }
    Ok(1)
}

pub fn fix(converter: &mut CrateConverter, fields: &FieldArgs, output: &Path) -> anyhow::Result<u8> {
    for entry in CHECKLIST.iter() {
        if let Some(value) = fields.value(entry.field) {
            converter.set_field(entry.field, value)?;
        }
    }
    converter
        .write(output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(0)
}

pub fn list_research_areas(mapping: &ResearchAreaMapping, out: &mut impl Write) -> anyhow::Result<u8> {
    for area in mapping.keys() {
        writeln!(out, "{area}")?;
    }
    Ok(0)
}
