//! Rendering and writing classification results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use classyfire::{Compound, RowClassification};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

/// Renders one compound as pretty JSON, or as its summary line when `short`.
pub(crate) fn render_compound(compound: &Compound, short: bool) -> Result<String> {
    if short {
        return Ok(compound.short_summary());
    }
    serde_json::to_string_pretty(&compound.to_value()).context("failed to serialize compound")
}

/// Renders table results as a JSON array of `column -> compound` objects.
///
/// With `short`, prints one `row column: summary` line per compound instead.
pub(crate) fn render_rows(rows: &[RowClassification], short: bool) -> Result<String> {
    if short {
        let lines: Vec<String> = rows
            .iter()
            .enumerate()
            .flat_map(|(index, row)| {
                row.iter().map(move |(column, compound)| {
                    format!("{} {column}: {}", index + 1, compound.short_summary())
                })
            })
            .collect();
        return Ok(lines.join("\n"));
    }
    serde_json::to_string_pretty(rows).context("failed to serialize table results")
}

/// Compression extensions that cannot be written; only gzip is supported.
const UNSUPPORTED_COMPRESSION: [&str; 3] = ["bz2", "xz", "lzma"];

/// Rejects output paths whose extension asks for a compression other than gzip.
pub(crate) fn check_output_path(path: &Path) -> Result<()> {
    if let Some(ext) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        && UNSUPPORTED_COMPRESSION.contains(&ext.as_str())
    {
        bail!(
            "cannot write '{}': .{ext} compression is not supported.\n  \
             Use a .gz path for compressed output or a plain .json path.",
            path.display()
        );
    }
    Ok(())
}

/// Writes `rendered` to `path`, gzip-compressed when the path ends in `.gz`,
/// or to stdout when no path is given.
pub(crate) fn write_output(rendered: &str, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        println!("{rendered}");
        return Ok(());
    };
    check_output_path(path)?;

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let compressed = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if compressed {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder
            .write_all(rendered.as_bytes())
            .and_then(|()| encoder.finish())
            .and_then(|mut writer| writer.flush())
            .with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        let mut writer = BufWriter::new(file);
        writer
            .write_all(rendered.as_bytes())
            .and_then(|()| writer.flush())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(path = %path.display(), compressed, "wrote classification output");
    Ok(())
}
