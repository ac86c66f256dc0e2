//! Normalization of QUAST assembly statistics.
//!
//! QUAST's `transposed_report.tsv` has one tab-delimited row per assembly
//! with metric names as the header. Only the first assembly is read.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::bail;
use anyhow::Context;
use tracing::info;

use crate::models::qc::QuastQcResult;
use crate::models::QcMethodIndex;

/// Columns a QUAST report must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Total length", "Largest contig", "# contigs", "N50", "GC (%)"];

fn field<'a>(row: &'a HashMap<&str, &str>, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty() && *value != "-")
}

fn optional<T>(row: &HashMap<&str, &str>, column: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    field(row, column)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("invalid value for {:?}: {:?}", column, value))
        })
        .transpose()
}

fn required<T>(row: &HashMap<&str, &str>, column: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(row, column)?.with_context(|| format!("no value for {:?} in QUAST report", column))
}

/// Parses a QUAST report from any reader.
pub fn parse_quast<R>(reader: R) -> anyhow::Result<QcMethodIndex>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| "reading QUAST header")?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "unexpected QUAST header, missing columns: {}",
            missing.join(", ")
        );
    }

    let record = match reader.records().next() {
        Some(record) => record.with_context(|| "reading QUAST report row")?,
        None => bail!("QUAST report has no data rows"),
    };

    let row: HashMap<&str, &str> = headers.iter().map(str::trim).zip(record.iter()).collect();

    Ok(QcMethodIndex::Quast(QuastQcResult {
        total_length: required(&row, "Total length")?,
        reference_length: optional(&row, "Reference length")?,
        largest_contig: required(&row, "Largest contig")?,
        n_contigs: required(&row, "# contigs")?,
        n50: required(&row, "N50")?,
        assembly_gc: required(&row, "GC (%)")?,
        reference_gc: optional(&row, "Reference GC (%)")?,
        duplication_ratio: optional(&row, "Duplication ratio")?,
    }))
}

/// Parses a QUAST report file.
pub fn parse_quast_results<P>(src: P) -> anyhow::Result<QcMethodIndex>
where
    P: AsRef<Path>,
{
    let path = src.as_ref();
    info!("Parsing tsv file: {}", path.display());

    let file =
        File::open(path).with_context(|| format!("opening QUAST report: {}", path.display()))?;
    parse_quast(file).with_context(|| format!("in {}", path.display()))
}
