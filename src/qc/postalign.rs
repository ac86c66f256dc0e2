//! Conversion of the flat post-alignment metrics document into a
//! [`PostAlignQcResult`].
//!
//! The document is the one written by `prpr postalignqc --raw`: counts are
//! numbers, but the Picard values are passed through as the strings Picard
//! printed. Both forms are accepted for every field.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use serde_json::Map;
use serde_json::Value;
use tracing::info;

use super::alignment::AlignmentQc;
use super::runner::ToolRunner;
use crate::models::qc::CaptureQcResult;
use crate::models::qc::PostAlignQcResult;
use crate::models::QcMethodIndex;

/// Values Picard writes when a metric cannot be computed.
const MISSING_VALUES: [&str; 2] = ["", "?"];

fn as_number(key: &str, value: &Value) -> anyhow::Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .with_context(|| format!("{} is not representable as a float: {}", key, n)),
        Value::String(s) => {
            let s = s.trim();
            if MISSING_VALUES.contains(&s) {
                return Ok(None);
            }

            s.parse::<f64>()
                .map(Some)
                .with_context(|| format!("invalid number for {}: {:?}", key, s))
        }
        other => bail!("expected a number for {}, found: {}", key, other),
    }
}

fn optional_number(doc: &Map<String, Value>, key: &str) -> anyhow::Result<Option<f64>> {
    match doc.get(key) {
        Some(value) => as_number(key, value),
        None => Ok(None),
    }
}

fn required_number(doc: &Map<String, Value>, key: &str) -> anyhow::Result<f64> {
    optional_number(doc, key)?.with_context(|| format!("missing required field: {}", key))
}

fn optional_count(doc: &Map<String, Value>, key: &str) -> anyhow::Result<Option<u64>> {
    let value = match doc.get(key) {
        Some(Value::Null) | None => return Ok(None),
        Some(value) => value,
    };

    if let Some(count) = value.as_u64() {
        return Ok(Some(count));
    }

    match value.as_str().map(str::trim) {
        Some(s) if MISSING_VALUES.contains(&s) => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("invalid count for {}: {:?}", key, s)),
        None => bail!("expected a non-negative integer for {}, found: {}", key, value),
    }
}

fn required_count(doc: &Map<String, Value>, key: &str) -> anyhow::Result<u64> {
    optional_count(doc, key)?.with_context(|| format!("missing required field: {}", key))
}

fn pct_above_x(doc: &Map<String, Value>) -> anyhow::Result<BTreeMap<u32, f64>> {
    let thresholds = match doc.get("pct_above_x") {
        Some(Value::Object(thresholds)) => thresholds,
        Some(other) => bail!("expected an object for pct_above_x, found: {}", other),
        None => bail!("missing required field: pct_above_x"),
    };

    let mut result = BTreeMap::new();
    for (threshold, value) in thresholds {
        let depth = threshold
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid depth threshold: {:?}", threshold))?;
        let pct = as_number("pct_above_x", value)?
            .with_context(|| format!("missing value for depth threshold {}", depth))?;
        result.insert(depth, pct);
    }

    Ok(result)
}

fn capture(doc: &Map<String, Value>) -> anyhow::Result<Option<CaptureQcResult>> {
    let pct_on_target = match optional_number(doc, "pct_on_target")? {
        Some(pct) => pct,
        None => return Ok(None),
    };

    Ok(Some(CaptureQcResult {
        pct_on_target,
        fold_enrichment: required_number(doc, "fold_enrichment")?,
        median_target_coverage: required_number(doc, "median_coverage")?,
        fold_80: optional_number(doc, "fold_80")?,
    }))
}

/// Converts a post-alignment metrics document into a [`QcMethodIndex`].
///
/// Insert size, its deviation and the mean coverage are truncated to whole
/// numbers.
pub fn parse_postalignqc_results(doc: &Value) -> anyhow::Result<QcMethodIndex> {
    info!("Parsing post-alignment QC metrics.");

    let doc = match doc {
        Value::Object(doc) => doc,
        other => bail!("expected a JSON object, found: {}", other),
    };

    let result = PostAlignQcResult {
        ins_size: optional_number(doc, "ins_size")?.map(|n| n as u64),
        ins_size_dev: optional_number(doc, "ins_size_dev")?.map(|n| n as u64),
        mean_cov: required_number(doc, "mean_cov")? as u64,
        pct_above_x: pct_above_x(doc)?,
        mapped_reads: required_count(doc, "mapped_reads")?,
        tot_reads: required_count(doc, "tot_reads")?,
        dup_reads: optional_count(doc, "dup_reads")?,
        dup_pct: optional_number(doc, "dup_pct")?,
        iqr_median: optional_number(doc, "iqr_median")?,
        quartile1: required_number(doc, "quartile1")?,
        median: required_number(doc, "median")?,
        quartile3: required_number(doc, "quartile3")?,
        capture: capture(doc)?,
    };

    Ok(QcMethodIndex::Postalignqc(result))
}

/// Reads a post-alignment metrics document from disk and converts it.
pub fn read_postalignqc<P>(src: P) -> anyhow::Result<QcMethodIndex>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();
    info!("Reading post-alignment QC metrics: {}", src.display());

    let file = File::open(src).with_context(|| format!("opening {}", src.display()))?;
    let doc: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing JSON in {}", src.display()))?;

    parse_postalignqc_results(&doc).with_context(|| format!("in {}", src.display()))
}

/// Runs the alignment QC and converts its metrics.
pub fn parse_alignment_results<R>(qc: &AlignmentQc<R>) -> anyhow::Result<QcMethodIndex>
where
    R: ToolRunner,
{
    info!("Parsing bam file: {}", qc.bam().display());

    let metrics = qc.run()?;
    let doc = serde_json::to_value(&metrics).context("serializing alignment metrics")?;
    parse_postalignqc_results(&doc)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::qc::alignment::tests::scratch_bam;
    use crate::qc::alignment::tests::FakeRunner;

    fn postalign(index: QcMethodIndex) -> PostAlignQcResult {
        match index {
            QcMethodIndex::Postalignqc(result) => result,
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    fn document() -> Value {
        json!({
            "sample_id": "s1",
            "tot_reads": 1000,
            "mapped_reads": 900,
            "dup_reads": 50,
            "dup_pct": 0.0556,
            "mean_cov": 47.9,
            "quartile1": 30.0,
            "median": 45.0,
            "quartile3": 60.0,
            "iqr_median": 0.6667,
            "pct_above_x": {"1": 99.5, "10": 97.0, "30": 80.25},
            "ins_size": "312.7",
            "ins_size_dev": "55.9"
        })
    }

    #[test]
    fn test_parse_postalignqc_results() {
        let result = postalign(parse_postalignqc_results(&document()).unwrap());

        assert_eq!(result.ins_size, Some(312));
        assert_eq!(result.ins_size_dev, Some(55));
        assert_eq!(result.mean_cov, 47);
        assert_eq!(result.tot_reads, 1000);
        assert_eq!(result.mapped_reads, 900);
        assert_eq!(result.dup_reads, Some(50));
        assert_eq!(result.median, 45.0);
        assert_eq!(result.iqr_median, Some(0.6667));
        assert_eq!(result.pct_above_x[&30], 80.25);
        assert_eq!(result.pct_above_x.len(), 3);
        assert_eq!(result.capture, None);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let mut doc = document();
        doc["tot_reads"] = json!("1000");
        doc["median"] = json!("45");
        doc["pct_above_x"]["1"] = json!("99.5");

        let result = postalign(parse_postalignqc_results(&doc).unwrap());
        assert_eq!(result.tot_reads, 1000);
        assert_eq!(result.median, 45.0);
        assert_eq!(result.pct_above_x[&1], 99.5);
    }

    #[test]
    fn test_single_end_metrics_have_no_insert_size() {
        let mut doc = document();
        let fields = doc.as_object_mut().unwrap();
        fields.remove("ins_size");
        fields.remove("ins_size_dev");
        fields.insert(String::from("iqr_median"), Value::Null);

        let result = postalign(parse_postalignqc_results(&doc).unwrap());
        assert_eq!(result.ins_size, None);
        assert_eq!(result.ins_size_dev, None);
        assert_eq!(result.iqr_median, None);
    }

    #[test]
    fn test_capture_metrics() {
        let mut doc = document();
        doc["pct_on_target"] = json!("0.91");
        doc["fold_enrichment"] = json!("88.2");
        doc["median_coverage"] = json!("35");
        doc["fold_80"] = json!("?");

        let capture = postalign(parse_postalignqc_results(&doc).unwrap())
            .capture
            .unwrap();
        assert_eq!(
            capture,
            CaptureQcResult {
                pct_on_target: 0.91,
                fold_enrichment: 88.2,
                median_target_coverage: 35.0,
                fold_80: None,
            }
        );

        doc.as_object_mut().unwrap().remove("fold_enrichment");
        assert!(parse_postalignqc_results(&doc).is_err());
    }

    #[test]
    fn test_invalid_documents() {
        let mut doc = document();
        doc.as_object_mut().unwrap().remove("mean_cov");
        let err = parse_postalignqc_results(&doc).unwrap_err().to_string();
        assert!(err.contains("mean_cov"));

        let mut doc = document();
        doc["mapped_reads"] = json!("many");
        assert!(parse_postalignqc_results(&doc).is_err());

        let mut doc = document();
        doc["tot_reads"] = json!(-1);
        assert!(parse_postalignqc_results(&doc).is_err());

        let mut doc = document();
        doc["pct_above_x"] = json!({"deep": 1.0});
        assert!(parse_postalignqc_results(&doc).is_err());

        assert!(parse_postalignqc_results(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_read_postalignqc() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qc.json");
        std::fs::write(&path, document().to_string()).unwrap();

        let result = postalign(read_postalignqc(&path).unwrap());
        assert_eq!(result.mapped_reads, 900);

        assert!(read_postalignqc(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_parse_alignment_results() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let runner = FakeRunner::new("99");

        let qc = AlignmentQc::new("s1", &bam, "ref.fasta", &runner);
        let result = postalign(parse_alignment_results(&qc).unwrap());

        assert_eq!(result.tot_reads, 400);
        assert_eq!(result.dup_reads, Some(20));
        assert_eq!(result.ins_size, Some(312));
        assert_eq!(result.ins_size_dev, Some(55));
        assert_eq!(result.mean_cov, 30);
        assert_eq!(result.pct_above_x.len(), 7);
    }
}
