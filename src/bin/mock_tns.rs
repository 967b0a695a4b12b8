//! Mock NativeScript CLI for integration testing
//!
//! Mimics the output of `tns --version`, `tns run` and `tns debug` closely
//! enough for the readiness matchers, without needing a device or SDK.
//!
//! Extra flags steer the behaviour:
//! - `--mock-fail`: write to stderr and exit with code 3
//! - `--mock-silent`: never print a readiness line
//! - `--mock-linger-ms N`: stay alive N ms after the last line (default 200)
//! - `--mock-port N`: port reported by `--get-port` (default 40001)
//! - `--mock-no-port`: `--get-port` exits with code 2 without a port

use std::io::Write;
use std::thread;
use std::time::Duration;

const DEFAULT_LINGER_MS: u64 = 200;
const DEFAULT_PORT: u16 = 40001;
const SOCKET_PATH: &str = "/tmp/mock-tns-inspector.sock";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let has = |flag: &str| args.iter().any(|a| a == flag);
    let value = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse::<u64>().ok())
    };

    if has("--version") {
        println!("{}", std::env::var("MOCK_TNS_VERSION").unwrap_or_else(|_| "3.1.0".into()));
        return;
    }

    let linger = Duration::from_millis(value("--mock-linger-ms").unwrap_or(DEFAULT_LINGER_MS));

    if has("--mock-fail") {
        println!("Searching for devices...");
        eprintln!("Cannot find connected devices.");
        std::process::exit(3);
    }

    let subcommand = args.first().map(String::as_str).unwrap_or_default();
    let platform = args.get(1).map(String::as_str).unwrap_or_default();

    match (subcommand, platform) {
        ("run", _) => {
            println!("Executing before-prepare hook");
            println!("Project successfully built.");
            eprintln!("Warning: mock device is slow");
            println!("JS: app started");
        }
        ("debug", "ios") => {
            println!("Project successfully prepared");
            if !has("--mock-silent") {
                println!("Setting up debugger proxy...");
                println!("socket-file-location: {}", SOCKET_PATH);
            }
        }
        ("debug", "android") if has("--get-port") => {
            println!("Searching for devices...");
            if has("--mock-no-port") {
                eprintln!("Unable to forward the debug port.");
                std::process::exit(2);
            }
            if !has("--mock-silent") {
                let port = value("--mock-port").unwrap_or(u64::from(DEFAULT_PORT));
                println!("NativeScript debugger is listening on debug port: {}", port);
            }
        }
        ("debug", "android") => {
            println!("Project successfully built.");
            if !has("--mock-silent") {
                println!("# NativeScript Debugger started #");
            }
        }
        _ => {
            eprintln!("Unknown command: {}", args.join(" "));
            std::process::exit(127);
        }
    }

    let _ = std::io::stdout().flush();
    thread::sleep(linger);
}
