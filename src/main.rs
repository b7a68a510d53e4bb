//! Chorewarrior - Flatastic chores for taskwarrior
//!
//! Main entry point for the chorewarrior CLI.

use chorewarrior::config::{validate_config_result, ChoreWarriorConfig};
use chorewarrior::integrations::{FlatasticIssue, FlatasticService, Issue, IssueService};
use chorewarrior::taskwarrior::{uda_config_lines, TaskRecord};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::process;

/// Chorewarrior - pull Flatastic chores into taskwarrior
#[derive(Parser, Debug)]
#[command(name = "chorewarrior")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/chorewarrior/config.yaml)
    #[arg(short, long, env = "CHOREWARRIOR_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch chores and print them as taskwarrior import JSON
    Pull {
        /// Print one indented JSON array instead of one task per line
        #[arg(long)]
        pretty: bool,
    },

    /// Print the UDA declarations to add to your taskrc
    Udas,

    /// Check the configuration file without contacting Flatastic
    Validate,
}

fn main() {
    if let Err(e) = chorewarrior::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> chorewarrior::Result<()> {
    // UDA declarations are static and need no config
    if let Commands::Udas = cli.command {
        for line in uda_config_lines("Flatastic", FlatasticIssue::udas()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    validate_config_result(&config)?;

    match cli.command {
        Commands::Validate => {
            println!("Configuration OK");
            Ok(())
        }
        Commands::Pull { pretty } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let tasks = runtime.block_on(pull(&config))?;
            print_tasks(&tasks, pretty)
        }
        Commands::Udas => Ok(()),
    }
}

fn load_config(path: Option<&str>) -> chorewarrior::Result<ChoreWarriorConfig> {
    match path {
        Some(path) => ChoreWarriorConfig::load(path),
        None => match ChoreWarriorConfig::load_default() {
            Err(chorewarrior::ChoreSyncError::Config(msg)) if msg.contains("Config file not found") => {
                Err(chorewarrior::ChoreSyncError::Config(format!(
                    "{}\n\nCreate it with at least:\n  \
                     flatastic:\n    \
                     email: you@example.com\n    \
                     password: \"@env:FLATASTIC_PASSWORD\"",
                    msg
                )))
            }
            other => other,
        },
    }
}

async fn pull(config: &ChoreWarriorConfig) -> chorewarrior::Result<Vec<TaskRecord>> {
    let service = FlatasticService::connect(&config.flatastic).await?;

    let mut tasks = Vec::new();
    for issue in service.produce_issues().await? {
        tasks.push(issue?.to_taskwarrior());
    }

    tracing::info!(service = service.name(), count = tasks.len(), "Pull complete");
    Ok(tasks)
}

fn print_tasks(tasks: &[TaskRecord], pretty: bool) -> chorewarrior::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if pretty {
        serde_json::to_writer_pretty(&mut out, tasks)?;
        writeln!(out)?;
    } else {
        for task in tasks {
            serde_json::to_writer(&mut out, task)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
