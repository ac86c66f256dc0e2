//! Functionality relating to the `prpr resfinder` subcommand itself.

use std::path::PathBuf;

use clap::Args;
use clap::ValueEnum;
use tracing::info;

use crate::models::phenotype::ElementType;
use crate::phenotype::resfinder;
use crate::utils::output;

/// Resistance categories ResFinder predictions can be split into.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ResistanceCategory {
    /// Antimicrobial resistance.
    Amr,

    /// Stress response (biocides and heat).
    Stress,
}

impl From<ResistanceCategory> for ElementType {
    fn from(category: ResistanceCategory) -> Self {
        match category {
            ResistanceCategory::Amr => ElementType::Amr,
            ResistanceCategory::Stress => ElementType::Stress,
        }
    }
}

/// Clap arguments for the `prpr resfinder` subcommand.
#[derive(Args)]
pub struct ResfinderArgs {
    /// ResFinder JSON result.
    #[arg(value_name = "JSON")]
    src: PathBuf,

    /// Resistance category to report.
    #[arg(short, long, value_enum, default_value = "amr")]
    category: ResistanceCategory,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Main function for the `prpr resfinder` subcommand.
pub fn resfinder(args: ResfinderArgs) -> anyhow::Result<()> {
    info!("Starting resfinder subcommand.");

    let prediction = resfinder::read_resfinder_output(&args.src)?;
    let result = resfinder::parse_resfinder_amr_pred(&prediction, args.category.into())?;

    output::write_json(&result, args.output.as_deref())
}
