use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use task_tracker::config::{DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_TASKS_FILE};
use task_tracker::{Config, Outcome, TaskService, table};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "task-tracker")]
#[command(about = "Task Tracker CLI - add, update and list tasks kept in a local tasks.json")]
#[command(version)]
struct Cli {
    /// Task file (relative paths resolve against the current directory)
    #[arg(long = "file", env = "TASK_TRACKER_FILE", default_value = DEFAULT_TASKS_FILE, global = true)]
    tasks_path: PathBuf,

    /// Diagnostic log file, appended to
    #[arg(long, env = "TASK_TRACKER_LOG_FILE", default_value = DEFAULT_LOG_FILE, global = true)]
    log_file: PathBuf,

    /// Log filter, e.g. "debug" or "task_tracker=warn"
    #[arg(long, env = "TASK_TRACKER_LOG", default_value = DEFAULT_LOG_FILTER, global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task description
        task_name: String,
    },

    /// Update a task's description
    Update {
        /// Task ID
        id: String,
        /// New description
        description: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// Mark task as in-progress
    MarkInProgress {
        /// Task ID
        id: String,
    },

    /// Mark task as done
    MarkDone {
        /// Task ID
        id: String,
    },

    /// List all tasks
    List {
        /// Filter by status
        #[arg(value_parser = ["todo", "in-progress", "done"])]
        status: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::default()
        .with_tasks_path(&cli.tasks_path)
        .with_log_path(&cli.log_file)
        .with_log_filter(&cli.log_level);

    // The log is a side channel; carry on without it if it cannot be opened
    if let Err(e) = setup_logging(&config.log_path, &config.log_filter) {
        eprintln!("warning: logging disabled: {:#}", e);
    }

    let service = TaskService::from_config(&config);

    let outcome = match cli.command {
        Commands::Add { task_name } => service.add(&task_name)?,
        Commands::Update { id, description } => service.update(&id, &description)?,
        Commands::Delete { id } => service.delete(&id)?,
        Commands::MarkInProgress { id } => service.mark_in_progress(&id)?,
        Commands::MarkDone { id } => service.mark_done(&id)?,
        Commands::List { status } => service.list(status.as_deref())?,
    };

    match outcome {
        Outcome::Tasks(tasks) => print!("{}", table::render(&tasks, std::io::stdout().is_terminal())),
        other => println!("{}", other),
    }

    Ok(())
}

fn setup_logging(path: &Path, filter: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_new(filter).context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install log subscriber: {}", e))?;

    Ok(())
}
