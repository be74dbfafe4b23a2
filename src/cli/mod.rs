pub mod entries;
pub mod export;
pub mod output;
pub mod pomodoro;
pub mod range;
pub mod report;
pub mod tags;
pub mod timer;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use entries::{process_add, process_delete, process_edit, process_list, AddCommand, EditCommand, ListCommand};
use export::{process_export, ExportCommand};
use pomodoro::{process_pomodoro, PomodoroCommand};
use report::{process_report, ReportCommand};
use tags::{process_tags, TagsCommand};
use timer::{process_pause, process_start, process_status, StartCommand, StatusCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    storage::state_store::{JsonFileStore, StateStore},
    tracker::Tracker,
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "tasktimer", version, long_about = None)]
#[command(about = "Task timer with daily/weekly totals, Pomodoro cycles and report exports", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start timing a task")]
    Start {
        #[command(flatten)]
        command: StartCommand,
    },
    #[command(about = "Stop the running task and save it as a session")]
    Pause {},
    #[command(about = "Show the running task with today's and this week's totals")]
    Status {
        #[command(flatten)]
        command: StatusCommand,
    },
    #[command(about = "Add a session by hand")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Change a saved session")]
    Edit {
        #[command(flatten)]
        command: EditCommand,
    },
    #[command(about = "Delete a saved session")]
    Delete {
        #[arg(help = "Id of the session or its unique prefix")]
        id: String,
    },
    #[command(about = "List sessions of a range, today by default")]
    List {
        #[command(flatten)]
        command: ListCommand,
    },
    #[command(about = "Time by task, tag and day for a range, today by default")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Export sessions of a range as csv, json, markdown or pdf")]
    Export {
        #[command(flatten)]
        command: ExportCommand,
    },
    #[command(about = "Pomodoro settings and focus/break cycles")]
    Pomodoro {
        #[command(subcommand)]
        command: PomodoroCommand,
    },
    #[command(about = "Tags and their display colors")]
    Tags {
        #[command(subcommand)]
        command: TagsCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;
    debug!("Using application directory {dir:?}");

    let store = JsonFileStore::new(dir.join("data"))?;

    match args.commands {
        Commands::Start { command } => process_start(&store, command).await,
        Commands::Pause {} => process_pause(&store).await,
        Commands::Status { command } => process_status(&store, command).await,
        Commands::Add { command } => process_add(&store, command).await,
        Commands::Edit { command } => process_edit(&store, command).await,
        Commands::Delete { id } => process_delete(&store, id).await,
        Commands::List { command } => process_list(&store, command).await,
        Commands::Report { command } => process_report(&store, command).await,
        Commands::Export { command } => process_export(&store, command).await,
        Commands::Pomodoro { command } => process_pomodoro(&store, command).await,
        Commands::Tags { command } => process_tags(&store, command).await,
    }
}

/// Every command works on a fresh snapshot of the persisted state.
async fn load_tracker(store: &impl StateStore) -> Tracker {
    Tracker::load(store, Box::new(DefaultClock)).await
}
