//! `bevcost settings ...`: find, create or preview the user settings file.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result, ensure};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Commands for the user settings file
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Create settings.toml with every setting at its default (commented out)
    Init,
    /// Print where bevcost looks for settings.toml
    Path,
    /// Print the text `settings init` would write
    DumpDefault,
}

impl SettingsSubcommands {
    /// Run the chosen `settings` command
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Init => handle_init_command()?,
            Self::Path => handle_path_command(),
            Self::DumpDefault => handle_dump_default_command()?,
        }

        Ok(())
    }
}

/// Create a default settings file at `file_path`. An existing file is left alone and reported as
/// an error.
fn write_default_settings_file(file_path: &Path) -> Result<()> {
    ensure!(
        !file_path.exists(),
        "Settings file already exists: {}",
        file_path.display()
    );

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }

    fs::write(file_path, Settings::default_file_contents()?)?;

    Ok(())
}

fn handle_init_command() -> Result<()> {
    let file_path = get_settings_file_path();
    write_default_settings_file(&file_path)?;
    println!("Created settings file: {}", file_path.display());

    Ok(())
}

fn handle_path_command() {
    println!("{}", get_settings_file_path().display());
}

fn handle_dump_default_command() -> Result<()> {
    print!("{}", Settings::default_file_contents()?);

    Ok(())
}
