//! Normalization of ShigaPass serotype predictions.
//!
//! ShigaPass writes one semicolon-delimited row per sample. `prpr` is always
//! run on a single sample, so only the first row is read.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use tracing::info;

use crate::models::typing::TypingResultShiga;
use crate::models::MethodIndex;

/// Columns every ShigaPass summary carries.
pub const SHIGAPASS_COLUMNS: [&str; 10] = [
    "Name",
    "rfb",
    "rfb_hits,(%)",
    "MLST",
    "fliC",
    "CRISPR",
    "ipaH",
    "Predicted_Serotype",
    "Predicted_FlexSerotype",
    "Comments",
];

/// Values ShigaPass writes when nothing was determined.
const MISSING_VALUES: [&str; 3] = ["", "ND", "none"];

lazy_static! {
    /// The first percentage in a free text field.
    static ref PERCENTAGE: Regex = Regex::new(r"([0-9.]+)%").unwrap();
}

/// Pulls the leading percentage out of a free text field such as
/// `95.3% (123/129)`. Returns `0.0` if there is no percentage.
pub fn extract_percentage(rfb_hits: &str) -> f64 {
    PERCENTAGE
        .captures(rfb_hits)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

fn normalize(value: &str) -> Option<String> {
    let value = value.trim();
    match MISSING_VALUES.contains(&value) {
        true => None,
        false => Some(value.to_string()),
    }
}

/// Parses a ShigaPass summary from any reader.
pub fn parse_shigapass<R>(reader: R) -> anyhow::Result<MethodIndex>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| "reading ShigaPass header")?
        .clone();

    let missing: Vec<&str> = SHIGAPASS_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "unexpected ShigaPass header, missing columns: {}",
            missing.join(", ")
        );
    }

    let record = match reader.records().next() {
        Some(record) => record.with_context(|| "reading ShigaPass result row")?,
        None => bail!("ShigaPass result has no data rows"),
    };

    let row: HashMap<&str, Option<String>> = headers
        .iter()
        .map(str::trim)
        .zip(record.iter().map(normalize))
        .collect();
    let get = |column: &str| row.get(column).cloned().flatten();

    if let Some(name) = get("Name") {
        debug!("Parsing ShigaPass result for sample {}.", name);
    }

    let rfb_hits = get("rfb_hits,(%)")
        .map(|hits| extract_percentage(&hits))
        .unwrap_or(0.0);

    Ok(MethodIndex::shigapass(TypingResultShiga {
        rfb: get("rfb"),
        rfb_hits: Some(rfb_hits),
        mlst: get("MLST"),
        flic: get("fliC"),
        crispr: get("CRISPR"),
        ipah: get("ipaH"),
        predicted_serotype: get("Predicted_Serotype"),
        predicted_flex_serotype: get("Predicted_FlexSerotype"),
        comments: get("Comments"),
    }))
}

/// Parses a ShigaPass summary file.
pub fn parse_shigapass_pred<P>(src: P) -> anyhow::Result<MethodIndex>
where
    P: AsRef<Path>,
{
    let path = src.as_ref();
    info!("Parsing ShigaPass prediction: {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("opening ShigaPass result: {}", path.display()))?;
    parse_shigapass(file)
}
