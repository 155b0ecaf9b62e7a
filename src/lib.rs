//! Total cost of ownership modelling for battery-electric mining fleets.
//!
//! An analysis is made up of cost cells (vehicle fleets, infrastructure, workforce and digital
//! solutions) which are extended over a shared timeline, summarised by year and discounted to
//! net present values.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod analysis;
pub mod cashflow;
pub mod cell;
pub mod cli;
pub mod cost;
pub mod extension;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod maintenance;
pub mod output;
pub mod prices;
pub mod schedule;
pub mod settings;
pub mod summary;
pub mod timeline;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program.
///
/// Falls back to the current directory if the platform has no config folder.
pub fn get_bevcost_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        return PathBuf::new();
    };
    config_dir.push("bevcost");

    config_dir
}
