//! Binary entry point: load settings, open the SQLite store, then either run
//! the terminal UI or one of the headless subcommands.
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snippet_shelf::{
    load_settings, run_app, App, Clipboard, ListController, ListEvent, Settings, SqliteStore,
    SystemClipboard,
};

#[derive(Parser)]
#[command(
    name = "snippet-shelf",
    version,
    about = "Clipboard snippets grouped into replayable lists"
)]
struct Cli {
    /// Read settings from this file instead of ~/.snippet-shelf/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database to use.
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal UI (default).
    Tui,
    /// Print the lists of a category as JSON.
    Lists { category_id: i64 },
    /// Copy every step of a list to the clipboard at once.
    Copy {
        list_id: i64,
        #[arg(long)]
        separator: Option<String>,
    },
    /// Replay a list one step at a time without the UI.
    Play {
        list_id: i64,
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        settings.database_path = path;
    }

    let command = cli.command.unwrap_or(Command::Tui);
    init_tracing(&settings, matches!(command, Command::Tui))?;

    let store = SqliteStore::open(&settings.database_path)?;
    let mut controller = ListController::new(store, SystemClipboard::new());

    match command {
        Command::Tui => {
            let mut app = App::new(controller, &settings)?;
            run_app(&mut app)
        }
        Command::Lists { category_id } => {
            if controller.store().category(category_id)?.is_none() {
                bail!("category {category_id} not found");
            }
            let lists = controller.get_lists(category_id);
            let json = serde_json::to_string_pretty(&lists).context("failed to encode lists")?;
            println!("{json}");
            Ok(())
        }
        Command::Copy { list_id, separator } => {
            let separator = separator.unwrap_or_else(|| settings.copy_separator.clone());
            let message = controller.copy_all_list_items(list_id, &separator)?;
            println!("{message}");
            Ok(())
        }
        Command::Play { list_id, delay_ms } => {
            let delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| settings.step_delay());
            play(&mut controller, list_id, delay)
        }
    }
}

/// The terminal UI owns stdout, so it logs to a file; subcommands log to
/// stderr.
fn init_tracing(settings: &Settings, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        if let Some(parent) = settings.log_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)
            .with_context(|| format!("failed to open log file {}", settings.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Drive the replay timer from a plain sleep loop until the session ends.
fn play<C: Clipboard>(
    controller: &mut ListController<SqliteStore, C>,
    list_id: i64,
    delay: Duration,
) -> Result<()> {
    let events = controller.subscribe();
    controller.execute_list_sequentially(list_id, delay)?;

    loop {
        for event in events.try_iter() {
            match event {
                ListEvent::ExecutionStep { step, label } => println!("{step}. {label}"),
                ListEvent::ExecutionCompleted { .. } => println!("Ejecución completada"),
                _ => {}
            }
        }

        let Some(deadline) = controller.next_execution_deadline() else {
            break;
        };
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        controller.poll_execution(Instant::now());
    }
    Ok(())
}
