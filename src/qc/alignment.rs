//! Post-alignment QC: drives `samtools`, `sambamba` and Picard over one
//! alignment file and folds their outputs into [`AlignmentQcMetrics`].

use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use num_format::Locale;
use num_format::ToFormattedString;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use super::runner::run_checked;
use super::runner::ToolRunner;
use super::tools::is_paired;
use super::tools::parse_basecov;
use super::tools::parse_first_record_flag;
use super::tools::parse_flagstat;
use super::tools::CoverageSummary;
use super::tools::HsMetrics;
use super::tools::InsertSizeMetrics;
use super::tools::ToolPaths;
use super::tools::DEPTH_THRESHOLDS;
use crate::utils::display::PercentageFormat;
use crate::utils::pathbuf::AppendExtension;

/// The flat metrics document produced by [`AlignmentQc::run`].
///
/// Picard values are kept exactly as Picard reported them; they are
/// converted to numbers by [`crate::qc::postalign::parse_postalignqc_results`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentQcMetrics {
    /// Sample the alignment belongs to.
    pub sample_id: String,

    /// Total number of reads.
    pub tot_reads: u64,

    /// Mapped reads.
    pub mapped_reads: u64,

    /// Reads marked as duplicates.
    pub dup_reads: u64,

    /// Duplicates as a fraction of mapped reads.
    pub dup_pct: f64,

    /// Mean per-base depth.
    pub mean_cov: f64,

    /// First quartile of the depth.
    pub quartile1: f64,

    /// Median depth.
    pub median: f64,

    /// Third quartile of the depth.
    pub quartile3: f64,

    /// `(quartile3 - quartile1) / median`.
    pub iqr_median: Option<f64>,

    /// Percent of positions at or above each depth threshold.
    pub pct_above_x: BTreeMap<u32, f64>,

    /// Mean insert size (paired reads only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ins_size: Option<String>,

    /// Insert size standard deviation (paired reads only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ins_size_dev: Option<String>,

    /// Fraction of bases on target (capture only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct_on_target: Option<String>,

    /// Fold enrichment (capture only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_enrichment: Option<String>,

    /// Median target coverage (capture only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_coverage: Option<String>,

    /// Fold 80 base penalty (capture only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_80: Option<String>,
}

/// QC of a single alignment file.
pub struct AlignmentQc<R> {
    sample_id: String,
    bam: PathBuf,
    reference: PathBuf,
    cpus: Option<usize>,
    targets: Option<PathBuf>,
    baits: Option<PathBuf>,
    tools: ToolPaths,
    runner: R,
}

impl<R> AlignmentQc<R>
where
    R: ToolRunner,
{
    /// Creates a new [`AlignmentQc`] with default tool locations, no CPU hint
    /// and no capture regions.
    pub fn new<S, P, Q>(sample_id: S, bam: P, reference: Q, runner: R) -> Self
    where
        S: Into<String>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        AlignmentQc {
            sample_id: sample_id.into(),
            bam: bam.into(),
            reference: reference.into(),
            cpus: None,
            targets: None,
            baits: None,
            tools: ToolPaths::default(),
            runner,
        }
    }

    /// Sets the thread count passed to the tools. Zero means no hint.
    pub fn with_cpus(mut self, cpus: Option<usize>) -> Self {
        self.cpus = cpus.filter(|&n| n > 0);
        self
    }

    /// Sets the target and bait regions (BED).
    pub fn with_regions(mut self, targets: Option<PathBuf>, baits: Option<PathBuf>) -> Self {
        self.targets = targets;
        self.baits = baits;
        self
    }

    /// Overrides the tool locations.
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// The sample id.
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    /// The alignment file.
    pub fn bam(&self) -> &Path {
        &self.bam
    }

    /// Whether the first record of the alignment is part of a pair.
    pub fn is_paired(&self) -> anyhow::Result<bool> {
        let output = run_checked(&self.runner, &self.tools.first_record(&self.bam))?;

        match parse_first_record_flag(&output.stdout)? {
            Some(flag) => Ok(is_paired(flag)),
            None => bail!("no alignment records in {}", self.bam.display()),
        }
    }

    fn sequence_dictionary(&self) -> PathBuf {
        if self.reference.extension().map_or(false, |ext| ext == "dict") {
            self.reference.clone()
        } else {
            self.reference.clone().append_extension("dict")
        }
    }

    fn interval_list(&self, bed: &Path, dict: &Path) -> anyhow::Result<PathBuf> {
        let interval_list = bed.to_path_buf().append_extension("interval_list");

        if interval_list.exists() {
            info!("Using existing interval list: {}", interval_list.display());
        } else {
            let command = self.tools.bed_to_interval_list(bed, &interval_list, dict);
            run_checked(&self.runner, &command)?;
        }

        Ok(interval_list)
    }

    fn hs_metrics(&self, targets: &Path, baits: &Path) -> anyhow::Result<HsMetrics> {
        info!("Calculating HS-metrics...");

        let dict = self.sequence_dictionary();
        let target_intervals = self.interval_list(targets, &dict)?;
        let bait_intervals = self.interval_list(baits, &dict)?;

        let dest = self.bam.clone().append_extension("hsmetrics");
        let command = self.tools.collect_hs_metrics(
            &self.bam,
            &dest,
            &self.reference,
            &bait_intervals,
            &target_intervals,
        );
        run_checked(&self.runner, &command)?;

        let contents = fs::read_to_string(&dest)
            .with_context(|| format!("reading hybrid-capture metrics: {}", dest.display()))?;
        HsMetrics::parse(&contents)
    }

    fn insert_size_metrics(&self) -> anyhow::Result<InsertSizeMetrics> {
        info!("Collecting insert sizes...");

        let dest = self.bam.clone().append_extension("inssize");
        let pdf = self.bam.clone().append_extension("ins.pdf");
        let command = self
            .tools
            .collect_insert_size_metrics(&self.bam, &dest, &pdf);
        run_checked(&self.runner, &command)?;

        let contents = fs::read_to_string(&dest)
            .with_context(|| format!("reading insert size metrics: {}", dest.display()))?;
        let metrics = InsertSizeMetrics::parse(&contents)?;

        remove_artifact(&dest);
        remove_artifact(&pdf);

        Ok(metrics)
    }

    fn coverage(&self) -> anyhow::Result<CoverageSummary> {
        let bai = self.bam.clone().append_extension("bai");
        if !bai.exists() {
            info!("Indexing bam file: {}", bai.display());
            run_checked(&self.runner, &self.tools.index(&self.bam))?;
        }

        info!("Collecting depth stats...");
        let mut dest = self.bam.clone().into_os_string();
        dest.push("_postalnQC.basecov.bed");
        let dest = PathBuf::from(dest);

        let command = self
            .tools
            .depth(&self.bam, self.cpus, self.targets.as_deref(), &dest);
        run_checked(&self.runner, &command)?;

        let file = fs::File::open(&dest)
            .with_context(|| format!("opening depth file: {}", dest.display()))?;
        let histogram = parse_basecov(BufReader::new(file))
            .with_context(|| format!("parsing depth file: {}", dest.display()))?;
        remove_artifact(&dest);

        CoverageSummary::from_histogram(&histogram, &DEPTH_THRESHOLDS)
    }

    /// Runs every QC step and collects the results.
    pub fn run(&self) -> anyhow::Result<AlignmentQcMetrics> {
        let paired = self.is_paired()?;
        info!(
            "{} contains {} reads.",
            self.bam.display(),
            if paired { "paired" } else { "single-end" }
        );

        let hs_metrics = match (&self.targets, &self.baits) {
            (Some(targets), Some(baits)) => Some(self.hs_metrics(targets, baits)?),
            (None, Some(_)) => {
                warn!("Bait regions were given without target regions. Skipping HS-metrics.");
                None
            }
            _ => None,
        };

        info!("Collecting basic stats...");
        let flagstat = run_checked(&self.runner, &self.tools.flagstat(&self.bam, self.cpus))?;
        let counts = parse_flagstat(&flagstat.stdout).context("parsing flagstat output")?;

        info!(
            "Total reads: {}, mapped: {} ({}), duplicates: {}.",
            counts.total.to_formatted_string(&Locale::en),
            counts.mapped.to_formatted_string(&Locale::en),
            PercentageFormat(counts.mapped, counts.total),
            counts.duplicates.to_formatted_string(&Locale::en),
        );

        let insert_size = if paired {
            Some(self.insert_size_metrics()?)
        } else {
            None
        };

        let coverage = self.coverage()?;

        let dup_pct = if counts.mapped == 0 {
            0.0
        } else {
            counts.duplicates as f64 / counts.mapped as f64
        };

        let (ins_size, ins_size_dev) = match insert_size {
            Some(metrics) => (Some(metrics.mean), Some(metrics.std_dev)),
            None => (None, None),
        };

        let (pct_on_target, fold_enrichment, median_coverage, fold_80) = match hs_metrics {
            Some(metrics) => (
                Some(metrics.pct_on_target),
                Some(metrics.fold_enrichment),
                Some(metrics.median_coverage),
                Some(metrics.fold_80),
            ),
            None => (None, None, None, None),
        };

        Ok(AlignmentQcMetrics {
            sample_id: self.sample_id.clone(),
            tot_reads: counts.total,
            mapped_reads: counts.mapped,
            dup_reads: counts.duplicates,
            dup_pct,
            mean_cov: coverage.mean_cov,
            quartile1: coverage.quartile1,
            median: coverage.median,
            quartile3: coverage.quartile3,
            iqr_median: coverage.iqr_median,
            pct_above_x: coverage.pct_above_x,
            ins_size,
            ins_size_dev,
            pct_on_target,
            fold_enrichment,
            median_coverage,
            fold_80,
        })
    }
}

fn remove_artifact(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!("Could not remove {}: {}", path.display(), err);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::qc::runner::ToolCommand;
    use crate::qc::runner::ToolOutput;

    const FLAGSTAT: &str = "\
400 + 0 in total (QC-passed reads + QC-failed reads)
0 + 0 secondary
0 + 0 supplementary
20 + 0 duplicates
380 + 0 mapped (95.00%:N/A)
";

    const HS_METRICS: &str = "\
## METRICS CLASS\tpicard.analysis.directed.HsMetrics
BAIT_SET\tPCT_SELECTED_BASES\tFOLD_ENRICHMENT\tMEDIAN_TARGET_COVERAGE\tFOLD_80_BASE_PENALTY
baits\t0.91\t88.2\t35\t?
";

    const INSERT_SIZE: &str = "\
## METRICS CLASS\tpicard.analysis.InsertSizeMetrics
MEDIAN_INSERT_SIZE\tMEAN_INSERT_SIZE\tSTANDARD_DEVIATION
300\t312.7\t55.9
";

    const BASECOV: &str = "\
REF\tPOS\tCOV\tSAMPLE
chr\t0\t10\ts
chr\t1\t20\ts
chr\t2\t30\ts
chr\t3\t40\ts
chr\t4\t50\ts
";

    /// Answers tool invocations from canned output, writing the files a tool
    /// would write, and records every command it was given.
    pub(crate) struct FakeRunner {
        pub(crate) flag: &'static str,
        pub(crate) fail: Option<&'static str>,
        pub(crate) commands: RefCell<Vec<ToolCommand>>,
    }

    impl FakeRunner {
        pub(crate) fn new(flag: &'static str) -> Self {
            FakeRunner {
                flag,
                fail: None,
                commands: RefCell::new(Vec::new()),
            }
        }

        fn subcommand(command: &ToolCommand) -> String {
            match command.program.as_str() {
                "java" => command.args[2].clone(),
                _ => command.args[0].clone(),
            }
        }

        pub(crate) fn subcommands(&self) -> Vec<String> {
            self.commands.borrow().iter().map(Self::subcommand).collect()
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, command: &ToolCommand) -> anyhow::Result<ToolOutput> {
            self.commands.borrow_mut().push(command.clone());
            let subcommand = Self::subcommand(command);

            if self.fail == Some(subcommand.as_str()) {
                return Ok(ToolOutput {
                    status: Some(2),
                    stdout: String::new(),
                    stderr: format!("{} failed", subcommand),
                });
            }

            let write = |flag: &str, contents: &str| {
                let dest = command.value_of(flag).unwrap();
                fs::write(dest, contents).unwrap();
            };

            let stdout = match subcommand.as_str() {
                "head" => match self.flag {
                    "" => String::new(),
                    flag => format!("r1\t{}\tchr\t1\t60\t4M\t*\t0\t0\tACGT\tIIII\n", flag),
                },
                "flagstat" => String::from(FLAGSTAT),
                "index" => {
                    let bam = command.args.last().unwrap();
                    fs::write(format!("{}.bai", bam), "").unwrap();
                    String::new()
                }
                "depth" => {
                    write("-o", BASECOV);
                    String::new()
                }
                "BedToIntervalList" => {
                    write("-O", "@HD\n");
                    String::new()
                }
                "CollectHsMetrics" => {
                    write("-O", HS_METRICS);
                    String::new()
                }
                "CollectInsertSizeMetrics" => {
                    write("-O", INSERT_SIZE);
                    write("-H", "%PDF");
                    String::new()
                }
                other => panic!("unexpected tool invocation: {}", other),
            };

            Ok(ToolOutput::success(stdout))
        }
    }

    pub(crate) fn scratch_bam(dir: &Path) -> PathBuf {
        let bam = dir.join("sample.bam");
        fs::write(&bam, "").unwrap();
        bam
    }

    #[test]
    fn test_paired_run() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let runner = FakeRunner::new("99");

        let qc = AlignmentQc::new("s1", &bam, dir.path().join("ref.fasta"), &runner);
        let metrics = qc.run().unwrap();

        assert_eq!(
            runner.subcommands(),
            vec!["head", "flagstat", "CollectInsertSizeMetrics", "index", "depth"]
        );

        assert_eq!(metrics.sample_id, "s1");
        assert_eq!(metrics.tot_reads, 400);
        assert_eq!(metrics.mapped_reads, 380);
        assert_eq!(metrics.dup_reads, 20);
        assert!((metrics.dup_pct - 20.0 / 380.0).abs() < 1e-12);
        assert_eq!(metrics.ins_size.as_deref(), Some("312.7"));
        assert_eq!(metrics.ins_size_dev.as_deref(), Some("55.9"));
        assert_eq!(metrics.pct_on_target, None);
        assert_eq!(metrics.mean_cov, 30.0);
        assert_eq!(metrics.quartile1, 20.0);
        assert_eq!(metrics.median, 30.0);
        assert_eq!(metrics.quartile3, 40.0);
        assert_eq!(metrics.iqr_median, Some(20.0 / 30.0));
        assert_eq!(metrics.pct_above_x[&30], 60.0);

        // Intermediate artifacts are cleaned up; the index stays.
        assert!(!bam.clone().append_extension("inssize").exists());
        assert!(!bam.clone().append_extension("ins.pdf").exists());
        assert!(!dir.path().join("sample.bam_postalnQC.basecov.bed").exists());
        assert!(bam.clone().append_extension("bai").exists());
    }

    #[test]
    fn test_single_end_run_with_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        fs::write(bam.clone().append_extension("bai"), "").unwrap();
        let runner = FakeRunner::new("0");

        let metrics = AlignmentQc::new("s1", &bam, "ref.fasta", &runner)
            .with_cpus(Some(4))
            .run()
            .unwrap();

        assert_eq!(runner.subcommands(), vec!["head", "flagstat", "depth"]);
        assert_eq!(metrics.ins_size, None);
        assert_eq!(metrics.ins_size_dev, None);

        let commands = runner.commands.borrow();
        assert_eq!(commands[1].value_of("-t"), Some("4"));
        assert_eq!(commands[2].value_of("-t"), Some("4"));
        assert_eq!(commands[2].value_of("-L"), None);
    }

    #[test]
    fn test_zero_cpus_means_no_thread_hint() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let runner = FakeRunner::new("0");

        AlignmentQc::new("s1", &bam, "ref.fasta", &runner)
            .with_cpus(Some(0))
            .run()
            .unwrap();

        assert!(runner
            .commands
            .borrow()
            .iter()
            .all(|command| command.value_of("-t").is_none()));
    }

    #[test]
    fn test_capture_run() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let targets = dir.path().join("targets.bed");
        let baits = dir.path().join("baits.bed");
        fs::write(baits.clone().append_extension("interval_list"), "").unwrap();
        let runner = FakeRunner::new("0");

        let metrics = AlignmentQc::new("s1", &bam, dir.path().join("ref.fasta"), &runner)
            .with_regions(Some(targets.clone()), Some(baits.clone()))
            .run()
            .unwrap();

        assert_eq!(
            runner.subcommands(),
            vec![
                "head",
                "BedToIntervalList",
                "CollectHsMetrics",
                "flagstat",
                "index",
                "depth"
            ]
        );

        let commands = runner.commands.borrow();
        let dict = dir.path().join("ref.fasta.dict");
        assert_eq!(commands[1].value_of("-SD"), Some(dict.to_str().unwrap()));
        assert_eq!(
            commands[2].value_of("-BAIT_INTERVALS"),
            Some(dir.path().join("baits.bed.interval_list").to_str().unwrap())
        );
        assert_eq!(commands[5].value_of("-L"), Some(targets.to_str().unwrap()));

        assert_eq!(metrics.pct_on_target.as_deref(), Some("0.91"));
        assert_eq!(metrics.fold_enrichment.as_deref(), Some("88.2"));
        assert_eq!(metrics.median_coverage.as_deref(), Some("35"));
        assert_eq!(metrics.fold_80.as_deref(), Some("?"));
    }

    #[test]
    fn test_baits_without_targets_skip_capture_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let runner = FakeRunner::new("0");

        let metrics = AlignmentQc::new("s1", &bam, "ref.fasta", &runner)
            .with_regions(None, Some(dir.path().join("baits.bed")))
            .run()
            .unwrap();

        assert_eq!(runner.subcommands(), vec!["head", "flagstat", "index", "depth"]);
        assert_eq!(runner.commands.borrow()[3].value_of("-L"), None);
        assert_eq!(metrics.pct_on_target, None);
        assert_eq!(metrics.fold_80, None);
    }

    #[test]
    fn test_targets_without_baits_restrict_depth_only() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let targets = dir.path().join("targets.bed");
        let runner = FakeRunner::new("0");

        let metrics = AlignmentQc::new("s1", &bam, "ref.fasta", &runner)
            .with_regions(Some(targets.clone()), None)
            .run()
            .unwrap();

        assert_eq!(runner.subcommands(), vec!["head", "flagstat", "index", "depth"]);
        assert_eq!(
            runner.commands.borrow()[3].value_of("-L"),
            Some(targets.to_str().unwrap())
        );
        assert_eq!(metrics.pct_on_target, None);
        assert_eq!(metrics.median_coverage, None);
    }

    #[test]
    fn test_dict_reference_is_used_as_is() {
        let qc = AlignmentQc::new("s1", "s.bam", "ref.dict", FakeRunner::new("0"));
        assert_eq!(qc.sequence_dictionary(), PathBuf::from("ref.dict"));

        let qc = AlignmentQc::new("s1", "s.bam", "ref.fa", FakeRunner::new("0"));
        assert_eq!(qc.sequence_dictionary(), PathBuf::from("ref.fa.dict"));
    }

    #[test]
    fn test_tool_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let mut runner = FakeRunner::new("0");
        runner.fail = Some("flagstat");

        let err = AlignmentQc::new("s1", &bam, "ref.fasta", &runner)
            .run()
            .unwrap_err()
            .to_string();
        assert!(err.contains("flagstat failed"));
        assert_eq!(runner.subcommands(), vec!["head", "flagstat"]);
    }

    #[test]
    fn test_empty_alignment_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bam = scratch_bam(dir.path());
        let runner = FakeRunner::new("");

        let qc = AlignmentQc::new("s1", &bam, "ref.fasta", &runner);
        assert!(qc.is_paired().is_err());
        assert!(qc.run().is_err());
    }
}
