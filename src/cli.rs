//! The command line interface for the cost model.
use crate::input::load_analysis;
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_results};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the cost model.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where a run writes its cashflow, summary and NPV tables
#[derive(Args, Default)]
pub struct RunOpts {
    /// Folder for the result tables [default: bevcost_results/<analysis name>]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Replace results left in the folder by an earlier run
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Cost every cell and scenario of an analysis and write the result tables.
    Run {
        /// Folder holding analysis.toml and equipment.toml.
        analysis_dir: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// List, extract or run the bundled demo fleets.
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Check an analysis folder for input errors without costing it.
    Validate {
        /// Folder holding analysis.toml and equipment.toml.
        analysis_dir: PathBuf,
    },
    /// Find or create the user settings file.
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { analysis_dir, opts } => handle_run_command(&analysis_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { analysis_dir } => handle_validate_command(&analysis_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    analysis_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(analysis_path)?;
        &pathbuf
    };

    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwrite = create_output_directory(output_path, allow_overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(settings.log_level.as_deref(), Some(output_path))
        .context("Failed to initialise logging.")?;

    let analysis = load_analysis(analysis_path).context("Failed to load analysis.")?;
    info!("Loaded analysis from {}", analysis_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let results = analysis.run()?;
    write_results(output_path, &results)?;
    info!("Analysis complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(analysis_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    load_analysis(analysis_path).context("Failed to validate analysis.")?;
    info!("Analysis validation successful!");

    Ok(())
}
