//! Command-line shell over the reminder core.
//!
//! # Responsibility
//! - Manage tasks in the local database for manual testing.
//! - Run one tick, or both pollers until Ctrl-C, rendering to the terminal.
//! - Replay notification actions and snoozes by task id.

mod console;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::ConsoleSurface;
use duewatch_core::db::open_db;
use duewatch_core::{
    compute_overdue_count, default_log_level, init_logging_with_stderr, now_epoch_ms,
    ActionEvent, ActionOutcome, ActionService, Dispatcher, PollerDriver, ReminderConfig,
    ReminderTick, SnoozeService, SqliteHistoryRepository, SqliteTaskRepository, Task,
    TaskSource,
};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "duewatch", version, about = "Due-date reminders for tasks")]
struct Cli {
    /// SQLite database (defaults to DUEWATCH_DB_PATH or a temp-dir file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Write rolling logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Deadline: RFC 3339, or local `YYYY-MM-DDTHH:MM[:SS]`
        #[arg(long)]
        due: Option<String>,
    },
    /// List all tasks
    List,
    /// Run a single poller tick now
    Tick {
        /// Evaluate as the foreground poller instead of the background one
        #[arg(long)]
        foreground: bool,
    },
    /// Run both pollers until Ctrl-C
    Run,
    /// Apply a notification action (complete, snooze, open)
    Action {
        /// Action id, e.g. `complete-task` or `complete`
        action: String,
        /// Task UUID
        task_id: Uuid,
    },
    /// Snooze reminders for a task
    Snooze {
        /// Task UUID
        task_id: Uuid,
        /// Snooze window in minutes (default: DUEWATCH_SNOOZE_MINUTES or 10)
        #[arg(long)]
        minutes: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ReminderConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        init_file_logging(&log_dir)?;
    }

    match cli.cmd {
        Command::Add { title, due } => cmd_add(&config, title, due),
        Command::List => cmd_list(&config),
        Command::Tick { foreground } => cmd_tick(&config, foreground).await,
        Command::Run => cmd_run(&config).await,
        Command::Action { action, task_id } => cmd_action(&config, &action, task_id),
        Command::Snooze { task_id, minutes } => cmd_snooze(&config, task_id, minutes),
    }
}

fn init_file_logging(log_dir: &Path) -> anyhow::Result<()> {
    let absolute = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let dir = absolute
        .to_str()
        .context("log directory must be valid UTF-8")?;
    init_logging_with_stderr(default_log_level(), dir)?;
    Ok(())
}

fn cmd_add(config: &ReminderConfig, title: String, due: Option<String>) -> anyhow::Result<()> {
    let mut task = Task::new(title);
    if let Some(due) = due {
        task = task.with_due_text(due.trim());
        task.due_epoch_ms()?;
    }

    let conn = open_db(&config.db_path)?;
    let id = SqliteTaskRepository::try_new(&conn)?.create_task(&task)?;
    println!("{id}");
    Ok(())
}

fn cmd_list(config: &ReminderConfig) -> anyhow::Result<()> {
    let conn = open_db(&config.db_path)?;
    let tasks = SqliteTaskRepository::try_new(&conn)?.list_all_tasks()?;
    let now = now_epoch_ms();

    for task in &tasks {
        let status = if task.completed { "done" } else { "open" };
        let overdue = !task.completed
            && matches!(task.due_epoch_ms(), Ok(Some(due)) if due < now);
        println!(
            "{}  {:<4}  {:<25}  {}{}",
            task.id,
            status,
            task.due_date.as_deref().unwrap_or("-"),
            task.title,
            if overdue { "  (overdue)" } else { "" }
        );
    }
    println!(
        "{} task(s), {} overdue",
        tasks.len(),
        compute_overdue_count(&tasks, now)
    );
    Ok(())
}

async fn cmd_tick(config: &ReminderConfig, foreground: bool) -> anyhow::Result<()> {
    let surface = Arc::new(ConsoleSurface::new());
    let tick = if foreground {
        ReminderTick::foreground(&config.db_path, foreground_dispatcher(config, &surface))
    } else {
        ReminderTick::background(
            &config.db_path,
            Dispatcher::background(surface.clone()),
            surface.clone(),
        )
    };

    let report = tokio::task::spawn_blocking(move || tick.run_once(now_epoch_ms())).await??;
    println!(
        "{} tick: {} evaluated, {} fired, {} failed",
        report.context,
        report.evaluated,
        report.fired.len(),
        report.failed
    );
    Ok(())
}

async fn cmd_run(config: &ReminderConfig) -> anyhow::Result<()> {
    let surface = Arc::new(ConsoleSurface::new());
    let background = PollerDriver::new(
        ReminderTick::background(
            &config.db_path,
            Dispatcher::background(surface.clone()),
            surface.clone(),
        ),
        config.background_interval,
    );
    let foreground = PollerDriver::new(
        ReminderTick::foreground(&config.db_path, foreground_dispatcher(config, &surface)),
        config.foreground_interval,
    );

    let runtime = tokio::runtime::Handle::current();
    background.start(&runtime);
    foreground.start(&runtime);
    println!(
        "watching {} (background every {}, foreground every {}); Ctrl-C to stop",
        config.db_path.display(),
        format_interval(config.background_interval),
        format_interval(config.foreground_interval)
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("event=cli_shutdown module=cli status=ok reason=ctrl_c");

    foreground.stop();
    background.stop();
    Ok(())
}

fn cmd_action(config: &ReminderConfig, action: &str, task_id: Uuid) -> anyhow::Result<()> {
    let wire = match action.trim() {
        "" => bail!("action must not be empty"),
        "open" => None,
        other => Some(other),
    };

    let conn = open_db(&config.db_path)?;
    let service = ActionService::new(
        SqliteTaskRepository::try_new(&conn)?,
        SqliteHistoryRepository::new(&conn),
        config.snooze_duration_ms(),
    );
    let outcome = service.handle(
        ActionEvent::from_wire(wire, task_id),
        now_epoch_ms(),
        &ConsoleSurface::new(),
    )?;
    print_outcome(task_id, outcome);
    Ok(())
}

fn cmd_snooze(
    config: &ReminderConfig,
    task_id: Uuid,
    minutes: Option<u32>,
) -> anyhow::Result<()> {
    let duration_ms = match minutes {
        Some(0) => bail!("--minutes must be at least 1"),
        Some(minutes) => i64::from(minutes) * 60 * 1000,
        None => config.snooze_duration_ms(),
    };

    let conn = open_db(&config.db_path)?;
    let until_ms = SnoozeService::new(SqliteHistoryRepository::new(&conn))
        .snooze(task_id, now_epoch_ms(), duration_ms)
        .with_context(|| format!("cannot snooze task {task_id}"))?;
    print_outcome(task_id, ActionOutcome::Snoozed { until_ms });
    Ok(())
}

fn foreground_dispatcher(config: &ReminderConfig, surface: &Arc<ConsoleSurface>) -> Dispatcher {
    Dispatcher::foreground(surface.clone(), surface.clone(), surface.clone())
        .with_toast_dismiss_after(config.toast_dismiss_after)
}

fn print_outcome(task_id: Uuid, outcome: ActionOutcome) {
    match outcome {
        ActionOutcome::Completed { .. } => {}
        ActionOutcome::Snoozed { until_ms } => {
            let minutes = (until_ms - now_epoch_ms()).max(0) / 60_000;
            println!("task {task_id} snoozed for about {minutes} minute(s)");
        }
        ActionOutcome::Focused | ActionOutcome::Launched => {}
        ActionOutcome::TaskMissing => println!("task {task_id} no longer exists"),
    }
}

fn format_interval(interval: Duration) -> String {
    format!("{}s", interval.as_secs())
}
