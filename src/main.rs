//! tns-debug - starts NativeScript apps under the debugger
//!
//! Drives the NativeScript CLI (`tns`) to launch or attach a debug session
//! and reports the endpoint a debugger front end should connect to.

use clap::Parser;
use tns_debug::cli;
use tns_debug::commands::Commands;
use tns_debug::common::logging;

#[derive(Parser)]
#[command(name = "tns-debug", about = "Debug bridge for NativeScript apps")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sessions get a log file as well; one-shot commands only log to stderr
    let _guard = match cli.command {
        Commands::Run { .. } | Commands::Debug { .. } => {
            logging::init_with_file().map(|(_, guard)| guard)
        }
        _ => {
            logging::init_cli();
            None
        }
    };

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
