//! `powermon`: render an energy/power monitor card from host state dumps.
//!
//! ```bash
//! # Render the kitchen tree from a state dump
//! powermon --states states.json --room sensor.energy_power_monitor_kitchen_power render
//!
//! # Same, configured from layered TOML files
//! powermon -c powermon.toml -c local.toml render --format json
//!
//! # List rooms the editor would offer
//! powermon -c powermon.toml rooms
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use powermon::Card;
use powermon::CardEditor;
use powermon::CardEvent;
use powermon::CardOption;
use powermon::CardView;
use powermon::Config;
use powermon::HostEvent;
use powermon::StateSnapshot;
use powermon::card::host_event_channel;
use powermon::config::format_diagnostics;
use powermon::state::EntityRegistry;
use powermon::state::FileRegistry;
use powermon::state::SnapshotRegistry;
use powermon::tree::PrettyPrint;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "powermon")]
#[command(about = "Derive energy/power monitor trees from smart-home state dumps")]
struct Cli {
    /// Config files, merged in order (first definition wins)
    #[arg(short, long = "config", value_name = "FILE", global = true)]
    configs: Vec<PathBuf>,

    /// JSON state dump, overriding host.states
    #[arg(long, global = true)]
    states: Option<PathBuf>,

    /// JSON entity registry dump, overriding host.registry
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Root room sensor, overriding card.room
    #[arg(long, global = true)]
    room: Option<String>,

    /// Switch off a display option (e.g. show_children); repeatable
    #[arg(long, value_name = "OPTION", value_parser = parse_option, global = true)]
    disable: Vec<CardOption>,

    /// Log at debug level regardless of config
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Render the card for the configured room
    Render {
        #[arg(long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// List the rooms the editor offers
    Rooms {
        #[arg(long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// Show the editor's option checkboxes
    Options,
}

fn parse_option(s: &str) -> Result<CardOption, String> {
    CardOption::from_str(s).map_err(|_| {
        let known: Vec<String> = CardOption::all().map(|o| o.to_string()).collect();
        format!("unknown option '{}', expected one of: {}", s, known.join(", "))
    })
}

fn init_logging(config: &Config, verbose: bool) {
    let targets = if verbose {
        Targets::new().with_default(LevelFilter::DEBUG)
    } else {
        config.logging.targets()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(targets)
        .init();
}

fn load_config(paths: &[PathBuf]) -> Option<Config> {
    if paths.is_empty() {
        return Some(Config::default());
    }

    match Config::from_files(paths) {
        Ok((config, diagnostics)) => {
            if !diagnostics.is_empty() {
                eprint!("{}", format_diagnostics(&diagnostics.0));
            }
            Some(config)
        }
        Err(diagnostics) => {
            eprint!("{}", format_diagnostics(&diagnostics.0));
            None
        }
    }
}

async fn load_snapshot(cli: &Cli, config: &Config) -> anyhow::Result<Arc<StateSnapshot>> {
    let Some(path) = cli.states.as_ref().or(config.host.states.as_ref()) else {
        bail!("No state dump given; pass --states or set host.states");
    };

    let snapshot = StateSnapshot::load(path)
        .await
        .with_context(|| format!("Failed to load states from {}", path.display()))?;
    info!("Loaded {} entity states from {}", snapshot.len(), path.display());
    Ok(Arc::new(snapshot))
}

/// Drive a card through its event loop and return the last view it rendered.
async fn render(config: &Config, snapshot: Arc<StateSnapshot>) -> anyhow::Result<CardView> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (host_tx, host_rx) = host_event_channel();

    let card = Card::new(config.card.clone(), events_tx);
    let handle = tokio::spawn(card.run(host_rx));

    host_tx
        .send(HostEvent::StatesUpdated(snapshot))
        .await
        .context("Card stopped before receiving states")?;
    drop(host_tx);
    handle.await.context("Card task failed")?;

    let mut view = None;
    while let Some(event) = events_rx.recv().await {
        if let CardEvent::Rendered { view: rendered } = event {
            view = Some(rendered);
        }
    }
    view.context("Card produced no view")
}

async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    if let Some(room) = &cli.room {
        config.card.room = Some(room.clone());
    }
    for option in &cli.disable {
        config.card.options.set(*option, false);
    }
    debug!("Effective card config: {:?}", config.card);

    match cli.command {
        Command::Render { format } => {
            let snapshot = load_snapshot(&cli, &config).await?;
            let view = render(&config, snapshot).await?;
            match format {
                OutputFormat::Text => print!("{}", view.to_pretty_string()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
            }
        }
        Command::Rooms { format } => {
            let snapshot = load_snapshot(&cli, &config).await?;
            let registry: Box<dyn EntityRegistry> =
                match cli.registry.as_ref().or(config.host.registry.as_ref()) {
                    Some(path) => Box::new(FileRegistry::new(path)),
                    None => Box::new(SnapshotRegistry::new(snapshot.clone())),
                };

            let (events_tx, _events_rx) = mpsc::unbounded_channel();
            let mut editor = CardEditor::new(config.card.clone(), events_tx);
            editor.refresh_rooms(registry.as_ref(), &snapshot).await;

            match format {
                OutputFormat::Text => {
                    for room in editor.rooms() {
                        let marker = if room.entity_id == editor.selected_room() {
                            "*"
                        } else {
                            " "
                        };
                        println!("{} {}\t{}", marker, room.entity_id, room.friendly_name);
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(editor.rooms())?),
            }
        }
        Command::Options => {
            let (events_tx, _events_rx) = mpsc::unbounded_channel();
            let editor = CardEditor::new(config.card.clone(), events_tx);
            for checkbox in editor.options() {
                let mark = if checkbox.checked { "x" } else { " " };
                println!("[{}] {} ({})", mark, checkbox.label, checkbox.option);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(&cli.configs) else {
        return ExitCode::FAILURE;
    };
    init_logging(&config, cli.verbose);

    info!("powermon starting");
    let result = run(cli, config).await;
    info!("powermon shutting down");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
