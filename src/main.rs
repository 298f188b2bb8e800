//! FlowDriver CLI Entry Point
//!
//! Drives runs against a directory-backed state store, and plays the
//! external actor that submits payloads, supplies input or stops a run.
//!
//! # Usage
//!
//! ```bash
//! # Store a graph payload for a run
//! flowdriver submit run-1 payload.json
//!
//! # Drive the run (blocks while it waits for input)
//! flowdriver execute run-1 workflow-1 chat-1 user-1
//!
//! # From another shell: supply input, stop, or check progress
//! flowdriver input run-1 '{"node_1": "42"}'
//! flowdriver stop run-1
//! flowdriver status run-1
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use log::info;

use flowdriver::config::{DriverConfig, CONFIG_PATH};
use flowdriver::execution::{Dispatcher, Driver};
use flowdriver::logging::setup_logging;
use flowdriver::store::{FileStore, RunStore, StateStore};
use flowdriver::workflow::{ScriptedEngineFactory, WorkflowStatus};
use flowdriver::{APP_NAME, VERSION};

/// Default state store directory.
const DEFAULT_STORE_DIR: &str = ".flowdriver";

#[derive(Debug, PartialEq)]
enum Command {
    Execute {
        run_id: String,
        workflow_id: String,
        chat_id: String,
        user_id: String,
    },
    Submit {
        run_id: String,
        payload_path: PathBuf,
    },
    Input {
        run_id: String,
        value: String,
    },
    Stop {
        run_id: String,
    },
    Status {
        run_id: String,
    },
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    command: Command,
    store_dir: PathBuf,
    config_path: Option<PathBuf>,
    verbose: bool,
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: flowdriver [OPTIONS] <COMMAND> <ARGS>...");
    println!();
    println!("Commands:");
    println!("  execute <RUN_ID> <WORKFLOW_ID> <CHAT_ID> <USER_ID>  Drive a run to completion");
    println!("  submit <RUN_ID> <PAYLOAD_FILE>                     Store a run's graph payload");
    println!("  input <RUN_ID> <JSON>                              Supply input to a paused run");
    println!("  stop <RUN_ID>                                      Ask a paused run to stop");
    println!("  status <RUN_ID>                                    Show a run's status");
    println!();
    println!("Options:");
    println!("  --store DIR        State store directory (default: {})", DEFAULT_STORE_DIR);
    println!("  --config FILE      Driver config file (default: {})", CONFIG_PATH.display());
    println!("  --verbose          Enable debug logging");
    println!("  --help             Show this help message");
    println!("  --version          Show version information");
}

fn expect_args(name: &str, args: &[String], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!(
            "'{}' takes {} argument(s), got {}",
            name,
            count,
            args.len()
        ));
    }
    Ok(())
}

fn parse_command(positional: &[String]) -> Result<Command, String> {
    let Some((name, rest)) = positional.split_first() else {
        return Err("No command given".to_string());
    };

    match name.as_str() {
        "execute" => {
            expect_args(name, rest, 4)?;
            Ok(Command::Execute {
                run_id: rest[0].clone(),
                workflow_id: rest[1].clone(),
                chat_id: rest[2].clone(),
                user_id: rest[3].clone(),
            })
        }
        "submit" => {
            expect_args(name, rest, 2)?;
            Ok(Command::Submit {
                run_id: rest[0].clone(),
                payload_path: PathBuf::from(&rest[1]),
            })
        }
        "input" => {
            expect_args(name, rest, 2)?;
            Ok(Command::Input {
                run_id: rest[0].clone(),
                value: rest[1].clone(),
            })
        }
        "stop" => {
            expect_args(name, rest, 1)?;
            Ok(Command::Stop {
                run_id: rest[0].clone(),
            })
        }
        "status" => {
            expect_args(name, rest, 1)?;
            Ok(Command::Status {
                run_id: rest[0].clone(),
            })
        }
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut store_dir = PathBuf::from(DEFAULT_STORE_DIR);
    let mut config_path = None;
    let mut verbose = false;
    let mut positional = Vec::new();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            "--store" => {
                i += 1;
                if i >= args.len() {
                    return Err("--store requires a directory argument".to_string());
                }
                store_dir = PathBuf::from(&args[i]);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a path argument".to_string());
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => positional.push(arg.clone()),
        }
        i += 1;
    }

    Ok(Config {
        command: parse_command(&positional)?,
        store_dir,
        config_path,
        verbose,
    })
}

fn colored_status(status: WorkflowStatus) -> colored::ColoredString {
    match status {
        WorkflowStatus::Running => status.as_str().cyan(),
        WorkflowStatus::Input => status.as_str().yellow(),
        WorkflowStatus::Success => status.as_str().green().bold(),
        WorkflowStatus::Failed => status.as_str().red().bold(),
    }
}

fn print_status(store: &RunStore) -> Result<(), Box<dyn std::error::Error>> {
    match store.get_status()? {
        Some(record) => {
            println!("{}: {}", store.unique_id(), colored_status(record.status));
            if !record.reason.is_empty() {
                println!("  reason:  {}", record.reason);
            }
            println!("  updated: {}", record.updated_at.to_rfc3339());
        }
        None => println!("{}: {}", store.unique_id(), "unknown".dimmed()),
    }
    Ok(())
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    let backend: Arc<dyn StateStore> = Arc::new(FileStore::open(&config.store_dir)?);

    match config.command {
        Command::Execute {
            run_id,
            workflow_id,
            chat_id,
            user_id,
        } => {
            let driver_config = match &config.config_path {
                Some(path) => DriverConfig::load(path)?,
                None => DriverConfig::load_default()?,
            };
            info!("{} v{} using store {}", APP_NAME, VERSION, config.store_dir.display());

            let driver = Driver::new(
                Arc::clone(&backend),
                Arc::new(ScriptedEngineFactory::new()),
                driver_config,
            );
            Dispatcher::new(driver).execute(&run_id, &workflow_id, &chat_id, &user_id);
            print_status(&RunStore::new(run_id, backend))?;
        }
        Command::Submit {
            run_id,
            payload_path,
        } => {
            let content = fs::read_to_string(&payload_path).map_err(|e| {
                format!("Failed to read payload '{}': {}", payload_path.display(), e)
            })?;
            let payload: serde_json::Value = serde_json::from_str(&content)?;
            RunStore::new(run_id.as_str(), backend).set_graph_payload(&payload)?;
            println!("Stored graph payload for {}", run_id);
        }
        Command::Input { run_id, value } => {
            // Bare words are taken as a JSON string
            let input = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            RunStore::new(run_id.as_str(), backend).set_pending_input(&input)?;
            println!("Queued input for {}", run_id);
        }
        Command::Stop { run_id } => {
            RunStore::new(run_id.as_str(), backend).request_stop()?;
            println!("Stop requested for {}", run_id);
        }
        Command::Status { run_id } => {
            print_status(&RunStore::new(run_id, backend))?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
