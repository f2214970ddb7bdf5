use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::time::Duration;
use crate::board::{pointer_for_index, stacked_bounds, BoardController, DropOutcome};
use crate::cli::error::{confirm, user_error, validate_id, validate_index, validate_non_empty};
use crate::cli::output::{
    format_attachments_table, format_projects_table, format_stages_table, format_stats,
    format_task_detail, get_terminal_width,
};
use crate::config::Config;
use crate::db::DbConnection;
use crate::models::{normalize_description, normalize_project_title, Project, Stage, Task, TaskUpdate};
use crate::repo::{AttachmentRepo, ProjectRepo, StageRepo, TaskRepo};
use crate::seed::seed_sample_data;
use crate::store::SqliteStore;
use crate::utils::fuzzy::did_you_mean;
use anyhow::{Context, Result};

/// Card height used to lay out a column when a move is driven from the command line
const CARD_HEIGHT: f64 = 40.0;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard - stage/column task boards with drag-and-drop reordering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Project management commands
    Projects {
        #[command(subcommand)]
        subcommand: ProjectCommands,
    },
    /// Stage (column) management commands
    Stages {
        #[command(subcommand)]
        subcommand: StageCommands,
    },
    /// Add a task to the end of a stage
    Add {
        /// Project ID or title
        project: String,
        /// Task title
        #[arg(required = true, trailing_var_arg = true)]
        title: Vec<String>,
        /// Stage ID or name (defaults to the first stage)
        #[arg(long)]
        stage: Option<String>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Mark the task as done
        #[arg(long)]
        done: bool,
    },
    /// Edit a task
    Modify {
        /// Task ID
        task: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description (empty to clear)
        #[arg(long)]
        description: Option<String>,
        /// Move to the end of another stage (ID or name)
        #[arg(long)]
        stage: Option<String>,
        /// Mark as done
        #[arg(long, conflicts_with = "open")]
        done: bool,
        /// Mark as not done
        #[arg(long)]
        open: bool,
    },
    /// Delete a task and its attachments
    Delete {
        /// Task ID
        task: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show task details
    Show {
        /// Task ID
        task: String,
    },
    /// Show a project's board
    Board {
        /// Project ID or title
        project: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Drag a task to a position in a stage
    Move {
        /// Task ID
        task: String,
        /// Target stage ID or name
        #[arg(long)]
        stage: String,
        /// Zero-based position in the target stage (defaults to the end)
        #[arg(long)]
        index: Option<String>,
    },
    /// Task attachment metadata
    Attach {
        #[command(subcommand)]
        subcommand: AttachCommands,
    },
    /// Show project and task totals
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Create sample projects
    Seed,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a new project
    Add {
        /// Project title
        title: String,
        /// Project description
        #[arg(long)]
        description: Option<String>,
        /// Do not create the default "Not Started / In Progress / Done" stages
        #[arg(long)]
        no_default_stages: bool,
    },
    /// List projects
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Edit a project's title or description
    Modify {
        /// Project ID or title
        project: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description (empty to clear)
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project and its whole board
    Delete {
        /// Project ID or title
        project: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// Add a stage at the right end of a project's board
    Add {
        /// Project ID or title
        project: String,
        /// Stage name
        name: String,
    },
    /// List a project's stages
    List {
        /// Project ID or title
        project: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Rename a stage
    Rename {
        /// Stage ID
        stage: String,
        /// New name
        name: String,
    },
    /// Set a stage's column position
    Position {
        /// Stage ID
        stage: String,
        /// Column position
        position: i64,
    },
    /// Delete a stage and its tasks
    Delete {
        /// Stage ID
        stage: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum AttachCommands {
    /// Record an attachment for a task
    Add {
        /// Task ID
        task: String,
        /// File name
        file_name: String,
        /// Size in bytes
        #[arg(long)]
        size: i64,
        /// MIME type
        #[arg(long)]
        mime: Option<String>,
    },
    /// List a task's attachments
    List {
        /// Task ID
        task: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Remove an attachment
    Remove {
        /// Attachment ID
        attachment: String,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            if e.use_stderr() {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    let config = Config::load().context("Failed to load configuration")?;

    // Single cooperative event loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(handle_command(cli, config))
}

/// Connection and settings shared by the command handlers
struct Session {
    store: SqliteStore,
    persist_timeout: Duration,
}

impl Session {
    fn open(config: &Config) -> Result<Self> {
        let conn = DbConnection::connect_at(&config.data_location)
            .context("Failed to connect to database")?;
        Ok(Session {
            store: SqliteStore::new(conn),
            persist_timeout: config.persist_timeout,
        })
    }

    async fn board(&self, project_id: i64) -> Result<BoardController<SqliteStore>> {
        let controller = BoardController::load(self.store.clone(), project_id).await?;
        Ok(controller.with_persist_timeout(self.persist_timeout))
    }
}

async fn handle_command(cli: Cli, config: Config) -> Result<()> {
    let session = Session::open(&config)?;

    match cli.command {
        Commands::Projects { subcommand } => handle_projects(&session, subcommand),
        Commands::Stages { subcommand } => handle_stages(&session, subcommand),
        Commands::Add { project, title, stage, description, done } => {
            handle_task_add(&session, project, title.join(" "), stage, description, done).await
        }
        Commands::Modify { task, title, description, stage, done, open } => {
            let done = if done { Some(true) } else if open { Some(false) } else { None };
            handle_task_modify(&session, task, title, description, stage, done).await
        }
        Commands::Delete { task, yes } => handle_task_delete(&session, task, yes).await,
        Commands::Show { task } => handle_task_show(&session, task),
        Commands::Board { project, json } => handle_board(&session, project, json).await,
        Commands::Move { task, stage, index } => handle_move(&session, task, stage, index).await,
        Commands::Attach { subcommand } => handle_attach(&session, subcommand),
        Commands::Stats { json } => handle_stats(&session, json),
        Commands::Seed => handle_seed(&session),
    }
}

/// Resolve a project by ID or case-insensitive title
fn resolve_project(conn: &Connection, target: &str) -> Result<Project> {
    if let Ok(id) = target.trim().parse::<i64>() {
        return match ProjectRepo::get_by_id(conn, id)? {
            Some(project) => Ok(project),
            None => user_error(&format!("Project {} not found", id)),
        };
    }

    if let Some(project) = ProjectRepo::get_by_title(conn, target)? {
        return Ok(project);
    }

    let projects = ProjectRepo::list(conn)?;
    let titles: Vec<&str> = projects.iter().map(|p| p.title.as_str()).collect();
    user_error(&format!("Project '{}' not found.{}", target.trim(), did_you_mean(target, &titles)));
}

/// Resolve a stage of `project_id` by ID or case-insensitive name
fn resolve_stage(conn: &Connection, project_id: i64, target: &str) -> Result<Stage> {
    if let Ok(id) = target.trim().parse::<i64>() {
        return match StageRepo::get_by_id(conn, id)? {
            Some(stage) if stage.project_id == project_id => Ok(stage),
            _ => user_error(&format!("Stage {} not found in this project", id)),
        };
    }

    if let Some(stage) = StageRepo::find_by_name(conn, project_id, target)? {
        return Ok(stage);
    }

    let stages = StageRepo::list_for_project(conn, project_id)?;
    let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
    user_error(&format!("Stage '{}' not found.{}", target.trim(), did_you_mean(target, &names)));
}

/// Look up a stage by ID across all projects
fn require_stage(conn: &Connection, target: &str) -> Result<Stage> {
    let id = validate_id(target, "Stage").unwrap_or_else(|e| user_error(&e));
    match StageRepo::get_by_id(conn, id)? {
        Some(stage) => Ok(stage),
        None => user_error(&format!("Stage {} not found", id)),
    }
}

fn require_task(conn: &Connection, target: &str) -> Result<Task> {
    let id = validate_id(target, "Task").unwrap_or_else(|e| user_error(&e));
    match TaskRepo::get_by_id(conn, id)? {
        Some(task) => Ok(task),
        None => user_error(&format!("Task {} not found", id)),
    }
}

fn handle_projects(session: &Session, cmd: ProjectCommands) -> Result<()> {
    let conn = session.store.connection()?;

    match cmd {
        ProjectCommands::Add { title, description, no_default_stages } => {
            if let Err(e) = normalize_project_title(&title) {
                user_error(&e);
            }
            let project = if no_default_stages {
                ProjectRepo::create(&conn, &title, description.as_deref())?
            } else {
                ProjectRepo::create_with_default_stages(&conn, &title, description.as_deref())?
            };
            println!("Created project {}: {}", project.id, project.title);
            Ok(())
        }
        ProjectCommands::List { json } => {
            let summaries = ProjectRepo::list_with_counts(&conn).context("Failed to list projects")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print!("{}", format_projects_table(&summaries));
            }
            Ok(())
        }
        ProjectCommands::Modify { project, title, description } => {
            let project = resolve_project(&conn, &project)?;
            if title.is_none() && description.is_none() {
                user_error("No changes specified. Use --title or --description.");
            }
            if let Some(Err(e)) = title.as_deref().map(normalize_project_title) {
                user_error(&e);
            }
            let updated = ProjectRepo::update(&conn, project.id, title.as_deref(), description.as_deref())?;
            println!("Modified project {}: {}", updated.id, updated.title);
            Ok(())
        }
        ProjectCommands::Delete { project, yes } => {
            let project = resolve_project(&conn, &project)?;
            if !yes && !confirm(&format!("Delete project '{}' and its whole board?", project.title))? {
                println!("Cancelled.");
                return Ok(());
            }
            ProjectRepo::delete(&conn, project.id)?;
            println!("Deleted project {}: {}", project.id, project.title);
            Ok(())
        }
    }
}

fn handle_stages(session: &Session, cmd: StageCommands) -> Result<()> {
    let conn = session.store.connection()?;

    match cmd {
        StageCommands::Add { project, name } => {
            if let Err(e) = validate_non_empty(&name, "Stage name") {
                user_error(&e);
            }
            let project = resolve_project(&conn, &project)?;
            let stage = StageRepo::create(&conn, project.id, &name)?;
            println!("Created stage {}: {} (position {})", stage.id, stage.name, stage.position);
            Ok(())
        }
        StageCommands::List { project, json } => {
            let project = resolve_project(&conn, &project)?;
            let stages = StageRepo::list_for_project(&conn, project.id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stages)?);
                return Ok(());
            }
            let mut counts = Vec::with_capacity(stages.len());
            for stage in &stages {
                counts.push((stage.id, TaskRepo::count_in_stage(&conn, stage.id)?));
            }
            print!("{}", format_stages_table(&stages, &counts));
            Ok(())
        }
        StageCommands::Rename { stage, name } => {
            if let Err(e) = validate_non_empty(&name, "Stage name") {
                user_error(&e);
            }
            let stage = require_stage(&conn, &stage)?;
            StageRepo::rename(&conn, stage.id, &name)?;
            println!("Renamed stage {}: {} -> {}", stage.id, stage.name, name.trim());
            Ok(())
        }
        StageCommands::Position { stage, position } => {
            if position < 0 {
                user_error("Stage position cannot be negative");
            }
            let stage = require_stage(&conn, &stage)?;
            StageRepo::set_position(&conn, stage.id, position)?;
            println!("Stage {} ({}) moved to position {}", stage.id, stage.name, position);
            Ok(())
        }
        StageCommands::Delete { stage, yes } => {
            let stage = require_stage(&conn, &stage)?;
            let count = TaskRepo::count_in_stage(&conn, stage.id)?;
            if !yes && count > 0
                && !confirm(&format!("Delete stage '{}' and its {} task(s)?", stage.name, count))?
            {
                println!("Cancelled.");
                return Ok(());
            }
            StageRepo::delete(&conn, stage.id)?;
            println!("Deleted stage {}: {}", stage.id, stage.name);
            Ok(())
        }
    }
}

async fn handle_task_add(
    session: &Session,
    project: String,
    title: String,
    stage: Option<String>,
    description: Option<String>,
    done: bool,
) -> Result<()> {
    let (project, stage) = {
        let conn = session.store.connection()?;
        let project = resolve_project(&conn, &project)?;
        let stage = match stage {
            Some(target) => resolve_stage(&conn, project.id, &target)?,
            None => match StageRepo::list_for_project(&conn, project.id)?.into_iter().next() {
                Some(stage) => stage,
                None => user_error(&format!(
                    "Project '{}' has no stages. Create a stage to get started.",
                    project.title
                )),
            },
        };
        (project, stage)
    };

    let mut board = session.board(project.id).await?;
    let task = board
        .create_task(stage.id, &title, description.as_deref(), done)
        .await?;
    println!("Created task {}: {} ({}, position {})", task.id, task.title, stage.name, task.position);
    Ok(())
}

async fn handle_task_modify(
    session: &Session,
    task: String,
    title: Option<String>,
    description: Option<String>,
    stage: Option<String>,
    done: Option<bool>,
) -> Result<()> {
    let (task, stage_id) = {
        let conn = session.store.connection()?;
        let task = require_task(&conn, &task)?;
        let stage_id = match stage {
            Some(target) => Some(resolve_stage(&conn, task.project_id, &target)?.id),
            None => None,
        };
        (task, stage_id)
    };

    let update = TaskUpdate {
        title,
        description: description.map(|d| normalize_description(Some(&d))),
        stage_id,
        done,
    };
    if update.is_empty() {
        user_error("No changes specified. Use --title, --description, --stage, --done or --open.");
    }

    let mut board = session.board(task.project_id).await?;
    let updated = board.update_task(task.id, update).await?;
    println!("Modified task {}: {}", updated.id, updated.title);
    Ok(())
}

async fn handle_task_delete(session: &Session, task: String, yes: bool) -> Result<()> {
    let task = {
        let conn = session.store.connection()?;
        require_task(&conn, &task)?
    };
    if !yes && !confirm(&format!("Delete task {} '{}'?", task.id, task.title))? {
        println!("Cancelled.");
        return Ok(());
    }

    let mut board = session.board(task.project_id).await?;
    board.delete_task(task.id).await?;
    println!("Deleted task {}: {}", task.id, task.title);
    Ok(())
}

fn handle_task_show(session: &Session, task: String) -> Result<()> {
    let conn = session.store.connection()?;
    let task = require_task(&conn, &task)?;
    let stage = StageRepo::get_by_id(&conn, task.stage_id)?;
    let attachments = AttachmentRepo::list_for_task(&conn, task.id)?;
    print!("{}", format_task_detail(&task, stage.as_ref(), &attachments));
    Ok(())
}

async fn handle_board(session: &Session, project: String, json: bool) -> Result<()> {
    let project = {
        let conn = session.store.connection()?;
        resolve_project(&conn, &project)?
    };

    let board = session.board(project.id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&board.view())?);
    } else {
        println!("{}\n", project.title);
        print!("{}", board.render(get_terminal_width()));
    }
    Ok(())
}

/// Drive one full drag gesture: pick up the card, hover it over the target
/// slot, drop it on the stage, then let the board settle.
async fn handle_move(session: &Session, task: String, stage: String, index: Option<String>) -> Result<()> {
    let (task, stage) = {
        let conn = session.store.connection()?;
        let task = require_task(&conn, &task)?;
        let stage = resolve_stage(&conn, task.project_id, &stage)?;
        (task, stage)
    };
    let index = index.map(|i| validate_index(&i).unwrap_or_else(|e| user_error(&e)));

    let mut board = session.board(task.project_id).await?;
    if !board.drag_start(task.id) {
        user_error(&format!("Task {} cannot be dragged right now", task.id));
    }

    let column: Vec<i64> = board
        .order()
        .column(stage.id)
        .unwrap_or(&[])
        .iter()
        .copied()
        .filter(|id| *id != task.id)
        .collect();
    let slot = index.unwrap_or(column.len()).min(column.len());
    let cards = stacked_bounds(&column, CARD_HEIGHT);
    board.drag_over(stage.id, pointer_for_index(slot, CARD_HEIGHT), &cards);

    let outcome = board.drop_on(stage.id).await?;
    board.settle();

    let position = board
        .snapshot()
        .task(task.id)
        .map(|t| t.position)
        .unwrap_or(slot as i64);

    match outcome {
        DropOutcome::Unchanged => {
            println!("Task {} is already at position {} in {}", task.id, position, stage.name);
        }
        DropOutcome::Persisted { writes } => {
            println!(
                "Moved task {} to {} (position {}), {} placement(s) saved",
                task.id, stage.name, position, writes
            );
        }
        DropOutcome::Failed { message, .. } => {
            print!("{}", board.render(get_terminal_width()));
            user_error(&message);
        }
        DropOutcome::Ignored => {
            user_error(&format!("Move of task {} was ignored", task.id));
        }
    }
    Ok(())
}

fn handle_attach(session: &Session, cmd: AttachCommands) -> Result<()> {
    let conn = session.store.connection()?;

    match cmd {
        AttachCommands::Add { task, file_name, size, mime } => {
            let task = require_task(&conn, &task)?;
            if let Err(e) = validate_non_empty(&file_name, "File name") {
                user_error(&e);
            }
            if size < 0 {
                user_error("Attachment size cannot be negative");
            }
            let attachment = AttachmentRepo::add(&conn, task.id, &file_name, mime.as_deref(), size)?;
            println!(
                "Attached {} to task {} (id: {}, stored at {})",
                attachment.file_name, task.id, attachment.id, attachment.storage_path
            );
            Ok(())
        }
        AttachCommands::List { task, json } => {
            let task = require_task(&conn, &task)?;
            let attachments = AttachmentRepo::list_for_task(&conn, task.id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&attachments)?);
            } else {
                print!("{}", format_attachments_table(&attachments));
            }
            Ok(())
        }
        AttachCommands::Remove { attachment } => {
            let id = validate_id(&attachment, "Attachment").unwrap_or_else(|e| user_error(&e));
            let Some(attachment) = AttachmentRepo::get_by_id(&conn, id)? else {
                user_error(&format!("Attachment {} not found", id));
            };
            AttachmentRepo::delete(&conn, attachment.id)?;
            println!("Removed attachment {}: {}", attachment.id, attachment.file_name);
            Ok(())
        }
    }
}

fn handle_stats(session: &Session, json: bool) -> Result<()> {
    let conn = session.store.connection()?;
    let stats = ProjectRepo::stats(&conn).context("Failed to count projects and tasks")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", format_stats(&stats));
    }
    Ok(())
}

fn handle_seed(session: &Session) -> Result<()> {
    let conn = session.store.connection()?;
    let summary = seed_sample_data(&conn).context("Failed to seed sample data")?;
    println!(
        "Created {} sample project(s) with {} task(s)",
        summary.projects_created, summary.tasks_created
    );
    if summary.projects_skipped > 0 {
        println!("Skipped {} project(s) that already exist", summary.projects_skipped);
    }
    Ok(())
}
