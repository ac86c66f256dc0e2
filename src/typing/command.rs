//! Functionality relating to the `prpr shigapass` subcommand itself.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::typing::shigapass;
use crate::utils::output;

/// Clap arguments for the `prpr shigapass` subcommand.
#[derive(Args)]
pub struct ShigapassArgs {
    /// ShigaPass summary (semicolon delimited).
    #[arg(value_name = "CSV")]
    src: PathBuf,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Main function for the `prpr shigapass` subcommand.
pub fn shigapass(args: ShigapassArgs) -> anyhow::Result<()> {
    info!("Starting shigapass subcommand.");

    let result = shigapass::parse_shigapass_pred(&args.src)?;
    output::write_json(&result, args.output.as_deref())
}
