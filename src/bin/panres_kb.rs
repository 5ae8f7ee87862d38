use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use panres_kb::app;
use panres_kb::config::ConfigLoader;
use panres_kb::domain::ExportColumn;
use panres_kb::error::PanResError;

#[derive(Parser)]
#[command(name = "panres-kb")]
#[command(about = "Builds the PanRes antimicrobial-resistance knowledge base from its source databases")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Build the knowledge base and write a snapshot")]
    Build(BuildArgs),
    #[command(about = "Export a snapshot as a flattened gene table or Turtle")]
    Export(ExportArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Path to the build config; defaults to panres-kb.json in the
    /// current directory.
    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = "panres-kb.snapshot.json")]
    snapshot: Utf8PathBuf,

    /// Also write the knowledge base as Turtle.
    #[arg(long)]
    turtle: Option<Utf8PathBuf>,

    /// Drop taxonomy nodes no gene annotation references.
    #[arg(long)]
    prune: bool,

    /// Print the build summary as JSON to stdout.
    #[arg(long)]
    summary: bool,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, default_value = "panres-kb.snapshot.json")]
    snapshot: Utf8PathBuf,

    #[arg(short, long)]
    output: Utf8PathBuf,

    #[arg(long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Columns for the CSV export; ignored for Turtle.
    #[arg(short, long, value_enum, num_args = 1..)]
    columns: Option<Vec<ExportColumn>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ExportFormat {
    Csv,
    Turtle,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<PanResError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PanResError) -> u8 {
    match error {
        PanResError::MissingConfig
        | PanResError::InputNotFound(_)
        | PanResError::SnapshotNotFound(_) => 2,
        PanResError::MalformedTable { .. }
        | PanResError::MissingSheet(_)
        | PanResError::MissingColumn { .. }
        | PanResError::SnapshotParse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build(args) => {
            let mut config = ConfigLoader::resolve(args.config.as_deref())?;
            if args.prune {
                config.prune = true;
            }
            let summary = app::build(&config, &args.snapshot, args.turtle.as_deref())?;
            if args.summary {
                let rendered = serde_json::to_string_pretty(&summary)
                    .map_err(|err| PanResError::Filesystem(err.to_string()))?;
                println!("{rendered}");
            }
            Ok(())
        }
        Commands::Export(args) => match args.format {
            ExportFormat::Csv => {
                let columns = args
                    .columns
                    .unwrap_or_else(app::default_export_columns);
                app::export_csv(&args.snapshot, &args.output, &columns)?;
                Ok(())
            }
            ExportFormat::Turtle => {
                app::export_turtle(&args.snapshot, &args.output)?;
                Ok(())
            }
        },
    }
}
