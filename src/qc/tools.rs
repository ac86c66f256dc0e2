//! Command builders and output parsers for the external alignment tools.
//!
//! Every parser checks the labels or column names it relies on, so a change
//! in a tool's output format surfaces as an error instead of silently
//! reading the wrong field.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;

use super::runner::ToolCommand;
use crate::utils::histogram::Histogram;

/// Depth thresholds reported in `pct_above_x`.
pub const DEPTH_THRESHOLDS: [u32; 7] = [1, 10, 30, 100, 250, 500, 1000];

/// Marker line preceding the header of a Picard metrics table.
const PICARD_METRICS_MARKER: &str = "## METRICS CLASS";

//==================//
// Tool locations   //
//==================//

/// Where to find the external tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    /// The `samtools` executable.
    pub samtools: String,

    /// The `sambamba` executable.
    pub sambamba: String,

    /// The `java` executable used to run Picard.
    pub java: String,

    /// The Picard jar.
    pub picard_jar: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            samtools: String::from("samtools"),
            sambamba: String::from("sambamba"),
            java: String::from("java"),
            picard_jar: PathBuf::from("/usr/bin/picard.jar"),
        }
    }
}

impl ToolPaths {
    fn picard(&self, tool: &str) -> ToolCommand {
        ToolCommand::new(self.java.as_str())
            .arg("-jar")
            .path_arg(&self.picard_jar)
            .arg(tool)
    }

    /// Prints the first alignment record of `bam` without a header.
    pub fn first_record(&self, bam: &Path) -> ToolCommand {
        ToolCommand::new(self.samtools.as_str())
            .arg("head")
            .arg("-h")
            .arg("0")
            .arg("-n")
            .arg("1")
            .path_arg(bam)
    }

    /// Counts reads with `sambamba flagstat`.
    pub fn flagstat(&self, bam: &Path, cpus: Option<usize>) -> ToolCommand {
        ToolCommand::new(self.sambamba.as_str())
            .arg("flagstat")
            .threads(cpus)
            .path_arg(bam)
    }

    /// Writes `<bam>.bai`.
    pub fn index(&self, bam: &Path) -> ToolCommand {
        ToolCommand::new(self.sambamba.as_str())
            .arg("index")
            .path_arg(bam)
    }

    /// Writes per-base depth (zero depth positions included) to `dest`.
    pub fn depth(
        &self,
        bam: &Path,
        cpus: Option<usize>,
        targets: Option<&Path>,
        dest: &Path,
    ) -> ToolCommand {
        let mut command = ToolCommand::new(self.sambamba.as_str())
            .arg("depth")
            .arg("base")
            .arg("-c")
            .arg("0")
            .threads(cpus);

        if let Some(targets) = targets {
            command = command.arg("-L").path_arg(targets);
        }

        command.path_arg(bam).arg("-o").path_arg(dest)
    }

    /// Converts a BED file into a Picard interval list.
    pub fn bed_to_interval_list(&self, bed: &Path, dest: &Path, dict: &Path) -> ToolCommand {
        self.picard("BedToIntervalList")
            .arg("-I")
            .path_arg(bed)
            .arg("-O")
            .path_arg(dest)
            .arg("-SD")
            .path_arg(dict)
    }

    /// Collects hybrid-capture metrics.
    pub fn collect_hs_metrics(
        &self,
        bam: &Path,
        dest: &Path,
        reference: &Path,
        baits: &Path,
        targets: &Path,
    ) -> ToolCommand {
        self.picard("CollectHsMetrics")
            .arg("-I")
            .path_arg(bam)
            .arg("-O")
            .path_arg(dest)
            .arg("-R")
            .path_arg(reference)
            .arg("-BAIT_INTERVALS")
            .path_arg(baits)
            .arg("-TARGET_INTERVALS")
            .path_arg(targets)
    }

    /// Collects insert size metrics from the first million reads.
    pub fn collect_insert_size_metrics(&self, bam: &Path, dest: &Path, pdf: &Path) -> ToolCommand {
        self.picard("CollectInsertSizeMetrics")
            .arg("-I")
            .path_arg(bam)
            .arg("-O")
            .path_arg(dest)
            .arg("-H")
            .path_arg(pdf)
            .arg("-STOP_AFTER")
            .arg("1000000")
    }
}

//==================//
// samtools head    //
//==================//

/// Returns the FLAG of the first alignment record in SAM text, if any.
pub fn parse_first_record_flag(sam: &str) -> anyhow::Result<Option<u16>> {
    let record = match sam
        .lines()
        .find(|line| !line.is_empty() && !line.starts_with('@'))
    {
        Some(line) => line,
        None => return Ok(None),
    };

    let flag = record
        .split('\t')
        .nth(1)
        .with_context(|| format!("SAM record has no FLAG field: {}", record))?;

    let flag = flag
        .parse::<u16>()
        .with_context(|| format!("invalid SAM FLAG: {}", flag))?;

    Ok(Some(flag))
}

/// Whether a SAM FLAG marks the read as part of a pair.
pub fn is_paired(flag: u16) -> bool {
    flag & 0x1 == 0x1
}

//==================//
// sambamba flagstat//
//==================//

/// Read counts reported by `sambamba flagstat`. Only the QC-passed column is
/// kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagstatCounts {
    /// Total number of reads.
    pub total: u64,

    /// Reads marked as duplicates.
    pub duplicates: u64,

    /// Mapped reads.
    pub mapped: u64,
}

fn flagstat_count(lines: &[&str], index: usize, label: &str) -> anyhow::Result<u64> {
    let line = match lines.get(index) {
        Some(line) => line,
        None => bail!(
            "flagstat output has {} lines, expected {:?} on line {}",
            lines.len(),
            label,
            index + 1
        ),
    };

    let (_, description) = line
        .split_once(" + ")
        .with_context(|| format!("malformed flagstat line: {}", line))?;

    let description = description.split_whitespace().skip(1).collect::<Vec<_>>();
    if !description.join(" ").starts_with(label) {
        bail!(
            "expected {:?} on line {} of flagstat output, found: {}",
            label,
            index + 1,
            line
        );
    }

    let count = line.split_whitespace().next().unwrap_or_default();
    count
        .parse()
        .with_context(|| format!("invalid count on flagstat line: {}", line))
}

/// Parses the output of `sambamba flagstat`.
///
/// ```
/// use prpr::qc::tools::parse_flagstat;
///
/// let output = "\
/// 200 + 0 in total (QC-passed reads + QC-failed reads)
/// 0 + 0 secondary
/// 0 + 0 supplementary
/// 12 + 0 duplicates
/// 190 + 0 mapped (95.00%:N/A)
/// ";
/// let counts = parse_flagstat(output)?;
/// assert_eq!(counts.total, 200);
/// assert_eq!(counts.duplicates, 12);
/// assert_eq!(counts.mapped, 190);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_flagstat(output: &str) -> anyhow::Result<FlagstatCounts> {
    let lines = output.lines().collect::<Vec<_>>();

    Ok(FlagstatCounts {
        total: flagstat_count(&lines, 0, "in total")?,
        duplicates: flagstat_count(&lines, 3, "duplicates")?,
        mapped: flagstat_count(&lines, 4, "mapped")?,
    })
}

//==================//
// Picard metrics   //
//==================//

/// Reads the first row of a Picard metrics table, keyed by column name.
pub fn parse_picard_metrics(contents: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut lines = contents
        .lines()
        .skip_while(|line| !line.starts_with(PICARD_METRICS_MARKER));

    if lines.next().is_none() {
        bail!("no {:?} section in Picard metrics", PICARD_METRICS_MARKER);
    }

    let header = lines.next().context("Picard metrics table has no header")?;
    let values = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => bail!("Picard metrics table has no data row"),
    };

    Ok(header
        .split('\t')
        .map(String::from)
        .zip(values.split('\t').map(String::from))
        .collect())
}

fn picard_column(metrics: &HashMap<String, String>, column: &str) -> anyhow::Result<String> {
    metrics
        .get(column)
        .map(|value| value.trim().to_string())
        .with_context(|| format!("Picard metrics have no {} column", column))
}

/// The `CollectHsMetrics` values used downstream, as reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HsMetrics {
    /// `PCT_SELECTED_BASES`.
    pub pct_on_target: String,

    /// `FOLD_ENRICHMENT`.
    pub fold_enrichment: String,

    /// `MEDIAN_TARGET_COVERAGE`.
    pub median_coverage: String,

    /// `FOLD_80_BASE_PENALTY`. Picard writes `?` when it cannot be computed.
    pub fold_80: String,
}

impl HsMetrics {
    /// Parses the contents of a `CollectHsMetrics` output file.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let metrics = parse_picard_metrics(contents).context("parsing hybrid-capture metrics")?;

        Ok(HsMetrics {
            pct_on_target: picard_column(&metrics, "PCT_SELECTED_BASES")?,
            fold_enrichment: picard_column(&metrics, "FOLD_ENRICHMENT")?,
            median_coverage: picard_column(&metrics, "MEDIAN_TARGET_COVERAGE")?,
            fold_80: picard_column(&metrics, "FOLD_80_BASE_PENALTY")?,
        })
    }
}

/// The `CollectInsertSizeMetrics` values used downstream, as reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertSizeMetrics {
    /// `MEAN_INSERT_SIZE`.
    pub mean: String,

    /// `STANDARD_DEVIATION`.
    pub std_dev: String,
}

impl InsertSizeMetrics {
    /// Parses the contents of a `CollectInsertSizeMetrics` output file.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let metrics = parse_picard_metrics(contents).context("parsing insert size metrics")?;

        Ok(InsertSizeMetrics {
            mean: picard_column(&metrics, "MEAN_INSERT_SIZE")?,
            std_dev: picard_column(&metrics, "STANDARD_DEVIATION")?,
        })
    }
}

//==================//
// sambamba depth   //
//==================//

/// Statistics over the per-base depth of the covered positions.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSummary {
    /// Mean depth.
    pub mean_cov: f64,

    /// First quartile of the depth.
    pub quartile1: f64,

    /// Median depth.
    pub median: f64,

    /// Third quartile of the depth.
    pub quartile3: f64,

    /// `(quartile3 - quartile1) / median`. `None` if any of the three is zero.
    pub iqr_median: Option<f64>,

    /// Percent of positions with depth at or above each threshold.
    pub pct_above_x: BTreeMap<u32, f64>,
}

impl CoverageSummary {
    /// Summarizes a depth histogram (bin = depth, value = number of
    /// positions).
    pub fn from_histogram(histogram: &Histogram, thresholds: &[u32]) -> anyhow::Result<Self> {
        let positions = histogram.sum();
        if positions == 0 {
            bail!("depth histogram is empty");
        }

        let mean_cov = histogram.mean().context("computing mean depth")?;
        let quartile1 = histogram.first_quartile().context("computing quartile 1")?;
        let median = histogram.median().context("computing median depth")?;
        let quartile3 = histogram.third_quartile().context("computing quartile 3")?;

        let iqr_median = if quartile1 != 0.0 && median != 0.0 && quartile3 != 0.0 {
            Some((quartile3 - quartile1) / median)
        } else {
            None
        };

        let pct_above_x = thresholds
            .iter()
            .map(|&threshold| {
                let covered = histogram.count_from_top_until(threshold as usize);
                (threshold, 100.0 * (covered as f64 / positions as f64))
            })
            .collect();

        Ok(CoverageSummary {
            mean_cov,
            quartile1,
            median,
            quartile3,
            iqr_median,
            pct_above_x,
        })
    }
}

/// Reads the `COV` column of `sambamba depth base` output into a histogram.
pub fn parse_basecov<R>(reader: R) -> anyhow::Result<Histogram>
where
    R: BufRead,
{
    let mut lines = reader.lines();
    let mut cov_column = None;

    for line in lines.by_ref() {
        let line = line.context("reading depth file header")?;
        if line.trim().is_empty() {
            continue;
        }

        let header = line.trim_start_matches('#').trim_start();
        cov_column = Some(
            header
                .split('\t')
                .position(|column| column == "COV")
                .with_context(|| format!("no COV column in depth file header: {}", line))?,
        );
        break;
    }

    let cov_column = match cov_column {
        Some(i) => i,
        None => bail!("depth file is empty"),
    };

    let mut histogram = Histogram::default();
    for (i, line) in lines.enumerate() {
        let line = line.context("reading depth file")?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let depth = line
            .split('\t')
            .nth(cov_column)
            .with_context(|| format!("depth file line {} has no COV field", i + 2))?;
        let depth = depth
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid depth on line {}: {}", i + 2, depth))?;

        histogram.increment(depth);
    }

    if histogram.sum() == 0 {
        bail!("depth file has no positions");
    }

    Ok(histogram)
}
