//! Records describing assembly and alignment quality.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Software (or internal step) that produced a QC result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcSoftware {
    /// QUAST assembly statistics.
    Quast,

    /// Post-alignment statistics collected by [`crate::qc::alignment`].
    Postalignqc,
}

/// Assembly statistics from a QUAST report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuastQcResult {
    /// Total length of the assembly.
    pub total_length: u64,

    /// Length of the reference, when QUAST was given one.
    pub reference_length: Option<u64>,

    /// Length of the largest contig.
    pub largest_contig: u64,

    /// Number of contigs.
    pub n_contigs: u64,

    /// N50 of the assembly.
    pub n50: u64,

    /// GC content (percent) of the assembly.
    pub assembly_gc: f64,

    /// GC content (percent) of the reference.
    pub reference_gc: Option<f64>,

    /// Duplication ratio against the reference.
    pub duplication_ratio: Option<f64>,
}

/// Alignment statistics for one sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostAlignQcResult {
    /// Mean insert size. Only available for paired reads.
    pub ins_size: Option<u64>,

    /// Standard deviation of the insert size. Only available for paired reads.
    pub ins_size_dev: Option<u64>,

    /// Mean per-base depth, truncated.
    pub mean_cov: u64,

    /// Percent of positions with at least the keyed depth.
    pub pct_above_x: BTreeMap<u32, f64>,

    /// Number of mapped reads.
    pub mapped_reads: u64,

    /// Total number of reads.
    pub tot_reads: u64,

    /// Number of reads marked as duplicates.
    pub dup_reads: Option<u64>,

    /// Fraction of mapped reads that are duplicates.
    pub dup_pct: Option<f64>,

    /// Interquartile range of the depth divided by the median depth.
    pub iqr_median: Option<f64>,

    /// First quartile of the depth.
    pub quartile1: f64,

    /// Median depth.
    pub median: f64,

    /// Third quartile of the depth.
    pub quartile3: f64,

    /// Hybrid-capture metrics, when bait and target regions were given.
    #[serde(default)]
    pub capture: Option<CaptureQcResult>,
}

/// Hybrid-capture statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureQcResult {
    /// Fraction of aligned bases on or near a bait.
    pub pct_on_target: f64,

    /// Fold enrichment of target bases.
    pub fold_enrichment: f64,

    /// Median depth over the targets.
    pub median_target_coverage: f64,

    /// Fold 80 base penalty.
    pub fold_80: Option<f64>,
}
