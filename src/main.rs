use clap::Parser;
use clap::Subcommand;
use git_testament::git_testament;
use git_testament::render_testament;

use prpr::phenotype::command::ResfinderArgs;
use prpr::qc::command::ParsePostAlignQcArgs;
use prpr::qc::command::PostAlignQcArgs;
use prpr::qc::command::QuastArgs;
use prpr::typing::command::ShigapassArgs;

git_testament!(TESTAMENT);

#[derive(Parser)]
#[command(author, about, version = render_testament!(TESTAMENT), propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only errors are printed to the stderr stream.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// All available information, including debug information, is printed to
    /// stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalizes a ResFinder prediction.
    Resfinder(ResfinderArgs),

    /// Normalizes a ShigaPass serotype prediction.
    Shigapass(ShigapassArgs),

    /// Normalizes QUAST assembly statistics.
    Quast(QuastArgs),

    /// Collects QC metrics from an alignment file.
    Postalignqc(PostAlignQcArgs),

    /// Normalizes a flat post-alignment QC metrics document.
    ParsePostalignqc(ParsePostAlignQcArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut level = tracing::Level::INFO;
    if cli.quiet {
        level = tracing::Level::ERROR;
    } else if cli.verbose {
        level = tracing::Level::DEBUG;
    }

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Resfinder(args) => prpr::phenotype::command::resfinder(args),
        Commands::Shigapass(args) => prpr::typing::command::shigapass(args),
        Commands::Quast(args) => prpr::qc::command::quast(args),
        Commands::Postalignqc(args) => prpr::qc::command::postalignqc(args),
        Commands::ParsePostalignqc(args) => prpr::qc::command::parse_postalignqc(args),
    }
}
