//! Pledge - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pledge::demo::{self, Scenario};
use pledge::util::config::{self, RuntimeConfig};
use pledge::util::logger;
use pledge::{NAME, VERSION};
use std::path::PathBuf;

/// Deferred cells with chainable continuations
#[derive(Parser, Debug)]
#[command(name = "pledge")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a walkthrough scenario and print what its handlers observed
    Demo {
        /// Scenario to run
        #[arg(value_enum, value_name = "SCENARIO")]
        scenario: Scenario,

        /// Trace every cell transition
        #[arg(long)]
        trace: bool,

        /// Runtime configuration file (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print the transcript as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        eprintln!("Pledge version: {}", VERSION);
        eprintln!("Host: {}", std::env::consts::OS);
    }

    match args.command {
        Commands::Demo {
            scenario,
            trace,
            config: path,
            json,
        } => {
            let mut runtime = match &path {
                Some(file) => config::load_config(file)
                    .with_context(|| format!("Failed to load config: {}", file.display()))?,
                None => RuntimeConfig::from_env().context("Invalid environment configuration")?,
            };
            if trace {
                runtime.trace.transitions = true;
            }

            logger::init_for(&runtime);
            config::install(runtime);

            let lines = demo::run(scenario);
            if json {
                let text = serde_json::to_string_pretty(&lines).context("Failed to encode transcript")?;
                println!("{}", text);
            } else {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
