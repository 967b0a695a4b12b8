//! CLI command handling
//!
//! Runs each command against the library and formats its output. Anything
//! meant for other programs (endpoints, targets, JSON) goes to stdout; tns
//! output relayed during a debug session goes to stderr.

use std::path::PathBuf;

use colored::Colorize;
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::error::ErrorReport;
use crate::common::{logging, Result};
use crate::mapping::{PathTransformer, TargetDiscovery};
use crate::project::{
    create_project, readiness, DebugEndpoint, DebugOptions, DebugRequest, LaunchOptions,
    ProjectSettings,
};
use crate::tns::{CliCompatibility, CliVersionInfo, OutputEvent};

/// Where relayed tns output is printed
#[derive(Debug, Clone, Copy)]
enum Sink {
    Stdout,
    Stderr,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    let config = Config::load()?;

    match command {
        Commands::Check { json } => {
            let info = cli_version(&config).await?;

            if json {
                let report = json!({
                    "cli": info,
                    "error": info.check().err().as_ref().map(ErrorReport::from),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_version_info(info);
            }

            info.check()
        }

        Commands::Run {
            platform,
            project,
            emulator,
            sync_all_files,
            tns_args,
        } => {
            cli_version(&config).await?.check()?;

            let root = project_root(project)?;
            let opts = LaunchOptions {
                emulator,
                sync_all_files,
                tns_args,
            };

            let mut project = create_project(platform, &root, ProjectSettings::from_config(&config));
            let printer = print_output(project.output().subscribe(), Sink::Stdout);

            let mut process = project.run(&opts).await?;
            let relay = match process.take_events() {
                Some(events) => readiness::relay(events, project.output().clone()),
                None => tokio::spawn(async { None }),
            };

            let code = tokio::select! {
                code = relay => code.unwrap_or(None),
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping tns");
                    process.kill();
                    process.wait().await
                }
            };

            drop(process);
            drop(project);
            let _ = printer.await;

            report_exit(code);
            Ok(())
        }

        Commands::Debug {
            platform,
            project,
            attach,
            emulator,
            sync_all_files,
            tns_args,
        } => {
            cli_version(&config).await?.check()?;

            let root = project_root(project)?;
            let opts = DebugOptions {
                request: if attach {
                    DebugRequest::Attach
                } else {
                    DebugRequest::Launch
                },
                launch: LaunchOptions {
                    emulator,
                    sync_all_files,
                    tns_args,
                },
            };

            let mut project = create_project(platform, &root, ProjectSettings::from_config(&config));
            let printer = print_output(project.output().subscribe(), Sink::Stderr);

            let endpoint = project.debug(&opts).await?;
            print_endpoint(&endpoint)?;

            if let Some(process) = project.debug_process() {
                eprintln!("{}", "Debug session running. Press Ctrl-C to stop.".dimmed());

                let code = tokio::select! {
                    code = process.wait() => code,
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping debug session");
                        process.kill();
                        process.wait().await
                    }
                };
                report_exit(code);
            }

            drop(project);
            let _ = printer.await;
            Ok(())
        }

        Commands::MapPath {
            platform,
            url,
            project,
        } => {
            let root = project_root(project)?;
            let transformer = PathTransformer::new(platform);

            if let Some(path) = transformer.target_url_to_client_path(&root, &url) {
                println!("{}", path);
            }

            Ok(())
        }

        Commands::Targets { address, port } => {
            let targets = TargetDiscovery::new().get_all_targets(&address, port);
            println!("{}", serde_json::to_string_pretty(&targets)?);
            Ok(())
        }

        Commands::Logs => {
            match logging::log_file_path() {
                Some(path) => {
                    println!("{}", path.display());
                    if !path.exists() {
                        eprintln!("{}", "(no log written yet)".dimmed());
                    }
                }
                None => eprintln!("Could not determine the log directory"),
            }
            Ok(())
        }
    }
}

/// Probe the configured tns once per process
async fn cli_version(config: &Config) -> Result<&'static CliVersionInfo> {
    let program = config.toolchain_program();
    let minimum = config.min_cli_version()?;
    Ok(CliVersionInfo::cached(&program, minimum, config.timeouts.version_query()).await)
}

fn project_root(project: Option<PathBuf>) -> Result<PathBuf> {
    let root = match project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    Ok(root.canonicalize().unwrap_or(root))
}

/// Print relayed tns output until every sender is gone
fn print_output(mut rx: broadcast::Receiver<OutputEvent>, sink: Sink) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(OutputEvent::Log(line)) => match sink {
                    Sink::Stdout => println!("{}", line),
                    Sink::Stderr => eprintln!("{}", line),
                },
                Ok(OutputEvent::Error(line)) => eprintln!("{}", line.red()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Output printer fell behind, lines dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_version_info(info: &CliVersionInfo) {
    let installed = info
        .installed
        .map(|v| v.to_string())
        .unwrap_or_else(|| "not found".to_string());

    match info.compatibility {
        CliCompatibility::Compatible => {
            println!("{} NativeScript CLI {}", "✓".green(), installed);
        }
        CliCompatibility::TooOld => {
            println!(
                "{} NativeScript CLI {} (minimum {})",
                "✗".red(),
                installed,
                info.minimum
            );
        }
        CliCompatibility::NotInstalled => {
            println!("{} NativeScript CLI {}", "✗".red(), installed);
        }
    }
}

fn print_endpoint(endpoint: &DebugEndpoint) -> Result<()> {
    let report = match endpoint {
        DebugEndpoint::Socket { .. } => json!({ "endpoint": endpoint }),
        DebugEndpoint::Tcp { host, port } => json!({
            "endpoint": endpoint,
            "targets": TargetDiscovery::new().get_all_targets(host, *port),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn report_exit(code: Option<i32>) {
    match code {
        Some(0) => tracing::debug!("tns exited cleanly"),
        Some(code) => eprintln!("{}", format!("tns exited with code {}", code).yellow()),
        None => eprintln!("{}", "tns was terminated by a signal".yellow()),
    }
}
