// groupsmith CLI - reconcile directory exports into group catalogs and scripts

mod columns;
mod exit_codes;
mod run;
mod scripts;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exit_codes::{EXIT_INPUT, EXIT_INVALID_CONFIG, EXIT_OUTPUT, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "groupsmith")]
#[command(about = "Reconcile directory exports into dynamic group catalogs and an access model")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). GROUPSMITH_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the tables named in a config, run the engine and write artifacts
    #[command(after_help = "\
Examples:
  groupsmith run contoso.groupsmith.toml
  groupsmith run contoso.groupsmith.toml --output-dir build/
  groupsmith run contoso.groupsmith.toml --json > result.json
  groupsmith run contoso.groupsmith.toml --strict --no-scripts")]
    Run {
        /// Path to the .groupsmith.toml config file
        config: PathBuf,

        /// Write artifacts here instead of [output].dir
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full run result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Skip the PowerShell scripts
        #[arg(long)]
        no_scripts: bool,

        /// Exit 6 when a configured attribute or priority column could not be found
        #[arg(long)]
        strict: bool,
    },

    /// Parse and validate a config without loading any tables
    #[command(after_help = "\
Examples:
  groupsmith validate contoso.groupsmith.toml")]
    Validate {
        /// Path to the .groupsmith.toml config file
        config: PathBuf,
    },

    /// Show how a table's headers resolve to attributes and access columns
    #[command(after_help = "\
Examples:
  groupsmith columns BLS-USERS.xlsx
  groupsmith columns 'IT Master Priority List.xlsx' --sheet Apps
  groupsmith columns users.csv --config contoso.groupsmith.toml --json")]
    Columns {
        /// Table file (csv, tsv, xlsx, xls, xlsb, ods)
        file: PathBuf,

        /// Worksheet name (default: the sheet with the most rows)
        #[arg(long)]
        sheet: Option<String>,

        /// Take aliases and access keywords from this config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON to stdout instead of a human listing
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GROUPSMITH_COMMIT"), ")",
        "\nengine:  groupsmith-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("GROUPSMITH_TARGET"),
    )
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("GROUPSMITH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            output_dir,
            json,
            no_scripts,
            strict,
        } => run::cmd_run(config, output_dir, json, no_scripts, strict),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Columns {
            file,
            sheet,
            config,
            json,
        } => columns::cmd_columns(file, sheet, config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    pub fn input(err: groupsmith_io::IoError) -> Self {
        let hint = match &err {
            groupsmith_io::IoError::SheetNotFound { .. } => {
                Some("sheet names are case-sensitive; omit the sheet to use the largest one".to_string())
            }
            groupsmith_io::IoError::UnsupportedFormat { .. } => {
                Some("save the table as csv, tsv, xlsx, xls, xlsb or ods".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_INPUT, message: err.to_string(), hint }
    }

    pub fn output(err: groupsmith_io::IoError) -> Self {
        Self::new(EXIT_OUTPUT, err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
