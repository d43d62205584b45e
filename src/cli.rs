use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::default_config_path;

#[derive(Parser)]
#[command(name = "matexport")]
#[command(about = "Export material sidecars and referenced textures from an asset graph dump")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export materials (all of them unless --object is given) and what they reference
    Export {
        graph: PathBuf,
        #[arg(long = "object")]
        objects: Vec<String>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
        #[arg(long)]
        max_parent_depth: Option<usize>,
        #[arg(long)]
        no_props: bool,
    },
    /// Print the computed sidecar for one material without writing anything
    Inspect {
        graph: PathBuf,
        material: String,
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
    },
    /// Show the suffix category for texture names
    Classify { names: Vec<String> },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init {
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show {
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
    },
}
