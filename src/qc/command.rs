//! Functionality relating to the QC subcommands: `prpr quast`,
//! `prpr postalignqc` and `prpr parse-postalignqc`.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use super::alignment::AlignmentQc;
use super::postalign;
use super::quast;
use super::runner::SystemRunner;
use super::tools::ToolPaths;
use crate::utils::output;

/// Clap arguments for the `prpr quast` subcommand.
#[derive(Args)]
pub struct QuastArgs {
    /// QUAST transposed report (tab delimited).
    #[arg(value_name = "TSV")]
    src: PathBuf,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Main function for the `prpr quast` subcommand.
pub fn quast(args: QuastArgs) -> anyhow::Result<()> {
    info!("Starting quast subcommand.");

    let result = quast::parse_quast_results(&args.src)?;
    output::write_json(&result, args.output.as_deref())
}

/// Locations of the external tools used by `prpr postalignqc`.
#[derive(Args)]
pub struct ToolArgs {
    /// samtools executable.
    #[arg(long, value_name = "PATH", default_value = "samtools")]
    samtools: String,

    /// sambamba executable.
    #[arg(long, value_name = "PATH", default_value = "sambamba")]
    sambamba: String,

    /// java executable used to run Picard.
    #[arg(long, value_name = "PATH", default_value = "java")]
    java: String,

    /// Picard jar.
    #[arg(long, value_name = "PATH", default_value = "/usr/bin/picard.jar")]
    picard_jar: PathBuf,
}

impl From<ToolArgs> for ToolPaths {
    fn from(args: ToolArgs) -> Self {
        ToolPaths {
            samtools: args.samtools,
            sambamba: args.sambamba,
            java: args.java,
            picard_jar: args.picard_jar,
        }
    }
}

/// Clap arguments for the `prpr postalignqc` subcommand.
#[derive(Args)]
pub struct PostAlignQcArgs {
    /// Alignment file (BAM).
    #[arg(value_name = "BAM")]
    src: PathBuf,

    /// Sample id.
    #[arg(short, long)]
    sample_id: String,

    /// Reference genome (FASTA) or its sequence dictionary.
    #[arg(short, long, value_name = "FASTA")]
    reference: PathBuf,

    /// Target regions (BED). Restricts the depth statistics.
    #[arg(short, long, value_name = "BED")]
    targets: Option<PathBuf>,

    /// Bait regions (BED). Together with `--targets`, enables hybrid-capture
    /// metrics.
    #[arg(short, long, value_name = "BED")]
    baits: Option<PathBuf>,

    /// Number of threads the tools may use.
    #[arg(short, long)]
    cpus: Option<usize>,

    /// Write the flat metrics document instead of the typed result.
    #[arg(long)]
    raw: bool,

    #[command(flatten)]
    tools: ToolArgs,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Main function for the `prpr postalignqc` subcommand.
pub fn postalignqc(args: PostAlignQcArgs) -> anyhow::Result<()> {
    info!("Starting postalignqc subcommand.");

    let qc = AlignmentQc::new(args.sample_id, args.src, args.reference, SystemRunner)
        .with_cpus(args.cpus)
        .with_regions(args.targets, args.baits)
        .with_tools(args.tools.into());

    if args.raw {
        let metrics = qc.run()?;
        output::write_json(&metrics, args.output.as_deref())
    } else {
        let result = postalign::parse_alignment_results(&qc)?;
        output::write_json(&result, args.output.as_deref())
    }
}

/// Clap arguments for the `prpr parse-postalignqc` subcommand.
#[derive(Args)]
pub struct ParsePostAlignQcArgs {
    /// Flat post-alignment metrics (JSON), as written by
    /// `prpr postalignqc --raw`.
    #[arg(value_name = "JSON")]
    src: PathBuf,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Main function for the `prpr parse-postalignqc` subcommand.
pub fn parse_postalignqc(args: ParsePostAlignQcArgs) -> anyhow::Result<()> {
    info!("Starting parse-postalignqc subcommand.");

    let result = postalign::read_postalignqc(&args.src)?;
    output::write_json(&result, args.output.as_deref())
}
