//! The bundled demo fleets (`bevcost example ...`).
//!
//! Each demo is a complete analysis folder compiled into the binary, so new users can cost a
//! fleet before writing any input of their own.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Demo analysis folders, one per subdirectory
static EXAMPLES_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// Commands for the bundled demo fleets
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// Print the names of the demo fleets.
    List,
    /// Describe the cells and scenarios in a demo fleet.
    Info {
        /// Demo name, as printed by `example list`.
        name: String,
    },
    /// Copy a demo's analysis.toml and equipment files into a folder you can edit.
    Extract {
        /// Demo name, as printed by `example list`.
        name: String,
        /// Folder to create. Defaults to the demo name in the current directory.
        new_path: Option<PathBuf>,
    },
    /// Cost a demo fleet and write its result tables.
    Run {
        /// Demo name, as printed by `example list`.
        name: String,
        /// Output options, as for `bevcost run`
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Run the chosen `example` command
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_example_extract_command(&name, dest.as_deref())?,
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// Names of the demo fleets, in folder order
pub fn example_names() -> impl Iterator<Item = &'static str> {
    EXAMPLES_DIR
        .dirs()
        .filter_map(|dir| dir.path().file_name()?.to_str())
}

fn handle_example_list_command() {
    for name in example_names() {
        println!("{name}");
    }
}

/// Print a demo's README
fn handle_example_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = EXAMPLES_DIR
        .get_file(path)
        .context("Example not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")?;

    println!("{readme}");

    Ok(())
}

fn handle_example_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_example(name, dest)
}

/// Write the input files of demo `name` into a new folder at `new_path`.
///
/// Fails if the folder already exists, so an edited analysis is never overwritten.
pub fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = EXAMPLES_DIR.get_dir(name).context("Example not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    fs::create_dir(new_path)?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::Dir(dir) => {
                bail!(
                    "Demo analyses must be flat folders: {}",
                    dir.path().display()
                )
            }
            DirEntry::File(f) => {
                let file_name = f
                    .path()
                    .file_name()
                    .context("Example file has no name")?;
                fs::write(new_path.join(file_name), f.contents())?;
            }
        }
    }

    Ok(())
}

/// Cost demo `name` from a temporary copy of its folder
pub fn handle_example_run_command(
    name: &str,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let analysis_path = temp_dir.path().join(name);
    extract_example(name, &analysis_path)?;

    // Results go under bevcost_results/<demo name> unless the user chose a folder
    let default_output_dir;
    let opts = if opts.output_dir.is_some() {
        opts
    } else {
        default_output_dir = RunOpts {
            output_dir: Some(["bevcost_results", name].iter().collect()),
            overwrite: opts.overwrite,
        };
        &default_output_dir
    };

    handle_run_command(&analysis_path, opts, settings)
}
