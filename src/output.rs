//! Output formatting: pretty JSON files and coloured terminal results

use crate::query::QueryResults;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Serialize as tab-indented JSON
pub fn write_json_to<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let mut serializer = serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"\t"));
    value
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    Ok(())
}

/// Write tab-indented JSON to a file, replacing it
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_json_to(&mut writer, value)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Word counts with empty locations left out
pub fn nonzero_counts(counts: &BTreeMap<String, usize>) -> BTreeMap<&str, usize> {
    counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(location, count)| (location.as_str(), *count))
        .collect()
}

/// Print results grouped under their query key
pub fn print_results(results: &QueryResults, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_results(&mut stdout, results)
}

pub fn write_results<W: WriteColor>(out: &mut W, results: &QueryResults) -> io::Result<()> {
    for (i, (key, found)) in results.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }

        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(out, "{}", key)?;
        out.reset()?;
        writeln!(out, " ({} results)", found.len())?;

        for result in found {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "  {:.8}", result.score)?;
            out.reset()?;
            writeln!(out, "  {:>6}  {}", result.count, result.location)?;
        }
    }
    Ok(())
}
