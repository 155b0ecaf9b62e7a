//! User preferences for `bevcost`, read from `settings.toml` in the user's config directory.
//!
//! Settings only change how runs behave (log level, overwriting results). Everything that affects
//! the costs themselves lives in the analysis folder.
use crate::get_bevcost_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# bevcost user settings
# These apply to every analysis you run. Uncomment a line to change its value.
";

/// Location of `settings.toml`
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_bevcost_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Preferences applied to every `run`, `validate` and `example run`
#[derive(Debug, DocumentedFields, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// How much detail to log while costing an analysis (off, error, warn, info, debug or trace)
    #[serde(default)]
    pub log_level: Option<String>,
    /// Replace the results of an earlier run without needing --overwrite
    #[serde(default)]
    pub overwrite: bool,
}

impl Settings {
    /// Load the user's settings, using defaults when there is no settings file.
    ///
    /// A settings file which exists but is not valid TOML is an error.
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// Text for a new `settings.toml`: each setting at its default, commented out, under its
    /// description
    pub fn default_file_contents() -> Result<String> {
        let settings = Settings {
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            overwrite: false,
        };
        let settings_raw =
            toml::to_string(&settings).context("Could not convert settings to TOML")?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.lines() {
            if let Some(last) = line.find('=') {
                let field = line[..last].trim();
                let docs = Settings::get_field_docs(field)
                    .ok()
                    .with_context(|| format!("Missing doc comment for setting {field}"))?;
                for line in docs.lines() {
                    write!(&mut out, "\n# # {}\n", line.trim())?;
                }

                writeln!(&mut out, "# {}", line.trim())?;
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"").unwrap();
        }

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: Some("warn".to_string()),
                overwrite: false
            }
        );
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents().unwrap();
        assert!(contents.contains("# log_level = \"info\""));
        assert!(contents.contains("# overwrite = false"));

        // Every setting is commented out, so the file parses to the defaults
        let settings: Settings = toml::from_str(&contents).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
