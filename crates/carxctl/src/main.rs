//! Car Expert Control - CLI for the Car Expert assistant
//!
//! Runs the rule engine in-process. With no subcommand it starts the chat REPL.

use anyhow::{Context, Result};
use carx_common::{CarxConfig, Language};
use carxctl::commands::{self, ScheduleTarget};
use carxctl::output::{print_error, print_response, to_json};
use carxctl::repl;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("CARX_VERSION");

#[derive(Parser)]
#[command(name = "carxctl")]
#[command(about = "Car Expert - bilingual car maintenance assistant", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Config file (default: $CARX_CONFIG or /etc/carx/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output language for structured commands (en, ar)
    #[arg(long, global = true, default_value = "en")]
    lang: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Ask a single question
    Ask {
        /// The question, in English or Arabic
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Look up a fault in the diagnostic table
    Diagnose {
        #[arg(long, default_value = "engine")]
        system: String,
        #[arg(long)]
        symptom: String,
        #[arg(long)]
        sub_symptom: String,
    },

    /// Estimate a repair cost
    Estimate {
        /// oil_change, brake_service, timing_belt
        repair_type: String,
        #[arg(long, default_value = "standard")]
        quality: String,
        #[arg(long, default_value = "standard")]
        shop: String,
        #[arg(long)]
        emergency: bool,
    },

    /// Project the next service(s)
    Schedule {
        /// Current odometer reading in km
        #[arg(long)]
        mileage: u64,
        /// Single service type; all services when omitted
        #[arg(long)]
        service: Option<String>,
        /// Vehicle make, decides the category
        #[arg(long)]
        make: Option<String>,
        #[arg(long, default_value = "economy")]
        category: String,
        #[arg(long, default_value = "normal")]
        condition: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(CarxConfig::default_path);
    let config = CarxConfig::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let lang = Language::parse(&cli.lang).unwrap_or_default();

    let output = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => return repl::run(&config, VERSION).await,
        Commands::Ask { text } => {
            let response = commands::ask(&config, &text.join(" ")).await;
            if cli.json {
                println!("{}", to_json(&response)?);
            } else {
                print_response(&response);
            }
            return Ok(());
        }
        Commands::Diagnose {
            system,
            symptom,
            sub_symptom,
        } => commands::diagnose(&system, &symptom, &sub_symptom, lang, cli.json),
        Commands::Estimate {
            repair_type,
            quality,
            shop,
            emergency,
        } => commands::estimate(
            &config,
            &repair_type,
            &quality,
            &shop,
            emergency,
            lang,
            cli.json,
        ),
        Commands::Schedule {
            mileage,
            service,
            make,
            category,
            condition,
        } => {
            let target = ScheduleTarget {
                mileage,
                make: make.as_deref(),
                category: &category,
                condition: &condition,
            };
            commands::schedule(service.as_deref(), &target, lang, cli.json)
        }
    };

    match output {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
