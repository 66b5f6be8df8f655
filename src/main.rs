use clap::{Parser, Subcommand};
use dgw_pipeline::cli::{self, RunPaths};
use dgw_pipeline::config::Settings;
use dgw_pipeline::core::header::DEFAULT_MAX_SCAN;
use dgw_pipeline::error::DgwResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dgw")]
#[command(about = "Convert legacy HR spreadsheets to DGW templates and validate them")]
#[command(long_about = "DGW pipeline - legacy HR spreadsheets → DGW template layout

Legacy workbooks are mapped column by column into DGW templates (header on
row 6, data from row 7), then every transformed sheet is checked against the
shared rule registry plus the built-in rules of its record type.

COMMANDS:
  transform     - Legacy files → <name>_DGW_ready.xlsx
  validate      - Check transformed files, write failure reports
  run           - transform, then validate
  clean         - Empty the failures and previews folders
  detect-header - Show where column labels start in a legacy sheet
  sheets        - List the data sheets of a workbook

CONFIGURATION:
  dgw.yaml in the working directory (or --config) sets folders, config
  files, the row layout and report options. Every key has a default.

EXAMPLES:
  dgw run                                  # Full pipeline with dgw.yaml
  dgw transform --input legacy/            # Override the incoming folder
  dgw validate --fail-on-errors            # Non-zero exit on any failure
  dgw detect-header Hire_Batch1.xlsx --sheet Hire")]
#[command(version)]
struct Cli {
    /// Settings file (default: ./dgw.yaml when present)
    #[arg(short, long, global = true, env = "DGW_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Folder overrides shared by the pipeline commands
#[derive(clap::Args)]
struct PathArgs {
    /// Folder of legacy .xlsx files
    #[arg(long)]
    input: Option<PathBuf>,

    /// Folder of DGW templates
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Folder for transformed workbooks
    #[arg(long)]
    curated: Option<PathBuf>,

    /// Folder for failure CSVs, previews and summaries
    #[arg(long)]
    outputs: Option<PathBuf>,
}

impl PathArgs {
    fn resolve(self, settings: &Settings) -> RunPaths {
        let defaults = RunPaths::from_settings(settings);
        RunPaths {
            incoming: self.input.unwrap_or(defaults.incoming),
            templates: self.templates.unwrap_or(defaults.templates),
            curated: self.curated.unwrap_or(defaults.curated),
            outputs: self.outputs.unwrap_or(defaults.outputs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Transform legacy workbooks into DGW templates.

Each legacy file picks a mapping (mapping_<kind>.yaml, by filename keyword)
and a template (by keyword family, name prefix, or the only template
available). Data sheets are copied row by row into the template's sheet of
the same name, starting at the data start row. Files without a mapping or
template are skipped and reported; the batch always continues.")]
    /// Transform legacy workbooks into DGW templates
    Transform {
        #[command(flatten)]
        paths: PathArgs,
    },

    #[command(long_about = "Validate transformed DGW workbooks.

Every data sheet is read with its header on the template header row and
checked against the rule file plus record-type rules (HireStack,
PersonalContactInfo). Columns are found through the alias file; rules whose
column is absent are skipped. Writes one failures CSV per failing sheet and
validation_summary.json.")]
    /// Validate transformed DGW workbooks
    Validate {
        #[command(flatten)]
        paths: PathArgs,

        /// Exit with an error when any sheet fails or errors
        #[arg(long)]
        fail_on_errors: bool,
    },

    /// Run transform, then validate
    Run {
        #[command(flatten)]
        paths: PathArgs,

        /// Exit with an error when any sheet fails or errors
        #[arg(long)]
        fail_on_errors: bool,
    },

    /// Delete generated failure and preview files
    Clean {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Show the detected header row of a legacy sheet
    DetectHeader {
        /// Path to a legacy .xlsx file
        file: PathBuf,

        /// Sheet to inspect (default: first data sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Number of rows scanned
        #[arg(long, default_value_t = DEFAULT_MAX_SCAN)]
        rows: usize,
    },

    /// List the data sheets of a workbook
    Sheets {
        /// Path to an .xlsx file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "dgw=debug,dgw_pipeline=debug"
    } else {
        "dgw=info,dgw_pipeline=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> DgwResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Transform { paths } => {
            cli::transform(&settings, &paths.resolve(&settings))?;
            Ok(())
        }

        Commands::Validate {
            paths,
            fail_on_errors,
        } => {
            cli::validate(&settings, &paths.resolve(&settings), fail_on_errors)?;
            Ok(())
        }

        Commands::Run {
            paths,
            fail_on_errors,
        } => cli::run(&settings, &paths.resolve(&settings), fail_on_errors),

        Commands::Clean { paths } => cli::clean(&paths.resolve(&settings)),

        Commands::DetectHeader { file, sheet, rows } => {
            cli::detect_header(&file, sheet, rows, &settings.layout)?;
            Ok(())
        }

        Commands::Sheets { file } => {
            cli::sheets(&file, &settings.layout)?;
            Ok(())
        }
    }
}
