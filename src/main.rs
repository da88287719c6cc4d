//! CLI entry point for the classyfire tool.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use classyfire::batch::{is_table_path, separator_for_path};
use classyfire::{ClassyFireClient, PubChemConverter, is_valid_inchikey};
use tracing::{debug, info};

mod cli;
mod output;

use cli::Args;

/// What the positional argument turned out to be.
#[derive(Debug, PartialEq, Eq)]
enum InputKind {
    Inchikey,
    Table,
    Smiles,
}

/// InChIKeys win; then an existing table file; anything else is tried as SMILES.
fn detect_input(input: &str) -> Result<InputKind> {
    if is_valid_inchikey(input) {
        return Ok(InputKind::Inchikey);
    }
    let path = Path::new(input);
    if is_table_path(path) {
        if path.is_file() {
            return Ok(InputKind::Table);
        }
        bail!(
            "'{input}' looks like a table file but does not exist.\n  \
             Pass an InChIKey, a SMILES string, or the path to an existing CSV/TSV/SSV file."
        );
    }
    Ok(InputKind::Smiles)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    if let Some(path) = &args.output {
        output::check_output_path(path)?;
    }

    let mut client =
        ClassyFireClient::new(args.client_config()).context("failed to create ClassyFire client")?;

    if let Some(converter_url) = &args.converter_url {
        let converter =
            PubChemConverter::with_base_url(converter_url, Duration::from_secs(args.timeout))
                .context("failed to create SMILES converter")?;
        client = client.with_converter(Arc::new(converter));
    }

    let rendered = match detect_input(&args.input)? {
        InputKind::Inchikey => {
            info!(inchikey = %args.input, "Classifying InChIKey");
            let compound = client.classify_inchikey(&args.input).await?;
            output::render_compound(&compound, args.short)?
        }
        InputKind::Smiles => {
            info!(smiles = %args.input, "Classifying SMILES");
            let compound = client.classify_smiles(&args.input).await?;
            output::render_compound(&compound, args.short)?
        }
        InputKind::Table => {
            let path = Path::new(&args.input);
            let separator = separator_for_path(path, args.separator);
            info!(path = %path.display(), header = !args.no_header, "Classifying table");
            let rows = client
                .classify_csv(path, separator, !args.no_header)?
                .try_collect()
                .await?;
            info!(rows = rows.len(), "Table classified");
            output::render_rows(&rows, args.short)?
        }
    };

    output::write_output(&rendered, args.output.as_deref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_detect_input_inchikey_with_and_without_prefix() {
        assert_eq!(
            detect_input("BSYNRYMUTXBXSQ-UHFFFAOYSA-N").unwrap(),
            InputKind::Inchikey
        );
        assert_eq!(
            detect_input("InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N").unwrap(),
            InputKind::Inchikey
        );
    }

    #[test]
    fn test_detect_input_existing_table() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "smiles").unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(detect_input(path).unwrap(), InputKind::Table);
    }

    #[test]
    fn test_detect_input_missing_table_is_error() {
        let err = detect_input("/nonexistent/compounds.csv").unwrap_err();
        assert!(
            err.to_string().contains("does not exist"),
            "Unexpected: {err}"
        );
    }

    #[test]
    fn test_detect_input_falls_back_to_smiles() {
        assert_eq!(
            detect_input("CC(=O)OC1=CC=CC=C1C(O)=O").unwrap(),
            InputKind::Smiles
        );
    }
}
