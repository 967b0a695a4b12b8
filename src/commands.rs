//! CLI command definitions
//!
//! Defines the clap commands for tns-debug.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::Platform;

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the installed NativeScript CLI can be used
    Check {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the app without a debugger and stream its output
    Run {
        /// Target platform
        #[arg(value_enum)]
        platform: Platform,

        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Run on an emulator/simulator
        #[arg(long)]
        emulator: bool,

        /// Sync all files, including node_modules
        #[arg(long)]
        sync_all_files: bool,

        /// Extra arguments passed to tns
        #[arg(last = true)]
        tns_args: Vec<String>,
    },

    /// Start a debug session and print its endpoint
    Debug {
        /// Target platform
        #[arg(value_enum)]
        platform: Platform,

        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Attach to an already running app instead of launching it
        #[arg(long)]
        attach: bool,

        /// Debug on an emulator/simulator
        #[arg(long)]
        emulator: bool,

        /// Sync all files, including node_modules
        #[arg(long)]
        sync_all_files: bool,

        /// Extra arguments passed to tns
        #[arg(last = true)]
        tns_args: Vec<String>,
    },

    /// Map a device script URL to a local file
    #[command(name = "map-path")]
    MapPath {
        /// Target platform
        #[arg(value_enum)]
        platform: Platform,

        /// Script URL as reported by the device
        url: String,

        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Print the debug target list for an address and port
    Targets {
        /// Address the inspector is reachable on
        address: String,

        /// Inspector port
        port: u16,
    },

    /// Show where logs are written
    Logs,
}
