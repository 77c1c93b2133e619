#![cfg_attr(test, allow(clippy::expect_used, clippy::panic))]

use std::io::{self, Write};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use nexus_api_client::{ApiClient, TaskPriority, TaskStatus, UpdateTaskRequest};
use nexus_app_state::{
    AppSession, ChatConversation, ChatSessions, FileStorage, KanbanBoard, SettingsStorage,
    TaskDraft, UnavailableStorage, compose_task, default_settings, memory, probe_snapshot,
    resolve_active_board, user_facing_message,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Elara Nexus operator CLI")]
pub struct NexusCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change the persisted API connection settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Show the authenticated operator
    Me,
    /// Backend liveness probe
    Health,
    /// Backend readiness probe with heartbeat time
    Ready,
    /// Agent runtime status
    AgentStatus,
    /// Kanban boards
    #[command(subcommand)]
    Boards(BoardsCommand),
    /// Tasks on the active board
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Chat sessions and messages
    #[command(subcommand)]
    Chat(ChatCommand),
    /// Memory documents and search
    #[command(subcommand)]
    Memory(MemoryCommand),
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Restore the default base URL and token
    Reset,
}

#[derive(Subcommand)]
pub enum BoardsCommand {
    List,
    Create { name: String },
    Show { board_id: String },
    Rename { board_id: String, name: String },
}

#[derive(Args)]
pub struct TaskFields {
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value_t = TaskPriority::P2)]
    pub priority: TaskPriority,
}

#[derive(Subcommand)]
pub enum TasksCommand {
    /// List tasks; defaults to the active board
    List {
        #[arg(long)]
        board: Option<String>,
    },
    /// Add a task to the todo lane of the active board
    Create {
        title: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    Update {
        task_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
    },
    /// Move a task to the lane for a status (backlog, todo, in_progress, ...)
    Move { task_id: String, status: TaskStatus },
    History { task_id: String },
    /// Quick-add into the todo lane, falling back to backlog
    Compose {
        title: String,
        #[command(flatten)]
        fields: TaskFields,
    },
}

#[derive(Subcommand)]
pub enum ChatCommand {
    Sessions,
    /// Start the next numbered session
    New,
    /// Send a message; without --session the primary session is created
    Send {
        message: String,
        #[arg(long)]
        session: Option<String>,
    },
    Messages { session_id: String },
}

#[derive(Subcommand)]
pub enum MemoryCommand {
    Ingest { title: String, content: String },
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    Show { document_id: String },
}

pub fn run() -> anyhow::Result<()> {
    let cli = NexusCli::parse();
    let config = CliConfig::from_env().context("Invalid environment configuration")?;
    init_tracing(&config.log_filter);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(execute(cli.command, &config))
}

/// Message printed for a failed command: the first error in the chain with
/// an operator-facing message, else the whole chain joined by `: `.
#[must_use]
pub fn failure_message(error: &anyhow::Error) -> String {
    error
        .chain()
        .map(|cause| user_facing_message(cause, ""))
        .find(|message| !message.is_empty())
        .unwrap_or_else(|| format!("{error:#}"))
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn open_storage(config: &CliConfig) -> Box<dyn SettingsStorage> {
    if config.storage_disabled {
        tracing::debug!("settings storage disabled");
        Box::new(UnavailableStorage)
    } else {
        Box::new(FileStorage::new(config.settings_dir.clone()))
    }
}

async fn execute(command: Commands, config: &CliConfig) -> anyhow::Result<()> {
    let mut session = AppSession::load(open_storage(config));
    let effective = config.effective_settings(session.settings());
    let client = ApiClient::new(effective.client_config());
    match command {
        Commands::Settings(command) => run_settings(command, &mut session),
        Commands::Me => emit(&client.get_me().await.context("Failed to load operator")?),
        Commands::Health => emit(&client.health().await.context("Health check failed")?),
        Commands::Ready => emit(&probe_snapshot(&client).await),
        Commands::AgentStatus => emit(
            &client
                .agent_status()
                .await
                .context("Failed to load agent status")?,
        ),
        Commands::Boards(command) => run_boards(command, &client).await,
        Commands::Tasks(command) => run_tasks(command, &client).await,
        Commands::Chat(command) => run_chat(command, &client).await,
        Commands::Memory(command) => run_memory(command, &client).await,
    }
}

fn run_settings<S: SettingsStorage>(
    command: SettingsCommand,
    session: &mut AppSession<S>,
) -> anyhow::Result<()> {
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Set { base_url, token } => {
            let mut next = session.settings().clone();
            if let Some(base_url) = base_url {
                next.api_base_url = base_url;
            }
            if let Some(token) = token {
                next.api_token = token;
            }
            session
                .save_app_settings(next)
                .context("Failed to save settings")?;
        }
        SettingsCommand::Reset => {
            session
                .save_app_settings(default_settings())
                .context("Failed to save settings")?;
        }
    }
    emit(session.settings())
}

async fn run_boards(command: BoardsCommand, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        BoardsCommand::List => emit(&client.list_boards().await.context("Failed to load boards")?),
        BoardsCommand::Create { name } => emit(
            &client
                .create_board(&name)
                .await
                .context("Failed to create board")?,
        ),
        BoardsCommand::Show { board_id } => emit(
            &client
                .get_board(&board_id)
                .await
                .context("Failed to load board")?,
        ),
        BoardsCommand::Rename { board_id, name } => emit(
            &client
                .rename_board(&board_id, &name)
                .await
                .context("Failed to rename board")?,
        ),
    }
}

async fn run_tasks(command: TasksCommand, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        TasksCommand::List { board } => {
            let board_id = match board {
                Some(board_id) => board_id,
                None => {
                    resolve_active_board(client)
                        .await
                        .context("Failed to load board")?
                        .id
                }
            };
            emit(
                &client
                    .list_tasks(&board_id)
                    .await
                    .context("Failed to load tasks")?,
            )
        }
        TasksCommand::Create { title, fields } => {
            let mut kanban = KanbanBoard::load(client)
                .await
                .context("Failed to load board")?;
            let created = kanban
                .add_task(client, draft(title, fields))
                .await
                .context("Failed to create task")?;
            match created {
                Some(task) => emit(&task),
                None => anyhow::bail!("Task not created: blank title or no todo lane"),
            }
        }
        TasksCommand::Update {
            task_id,
            title,
            description,
            priority,
        } => {
            let patch = UpdateTaskRequest {
                title: title.map(|value| value.trim().to_string()),
                description: description.map(|value| value.trim().to_string()),
                priority,
            };
            emit(
                &client
                    .update_task(&task_id, &patch)
                    .await
                    .context("Failed to update task")?,
            )
        }
        TasksCommand::Move { task_id, status } => {
            let mut kanban = KanbanBoard::load(client)
                .await
                .context("Failed to load board")?;
            match kanban
                .move_task(client, &task_id, status)
                .await
                .context("Failed to move task")?
            {
                Some(task) => emit(&task),
                None => anyhow::bail!("The active board has no {status} lane"),
            }
        }
        TasksCommand::History { task_id } => emit(
            &client
                .task_history(&task_id)
                .await
                .context("Failed to load task history")?,
        ),
        TasksCommand::Compose { title, fields } => {
            match compose_task(client, draft(title, fields))
                .await
                .context("Failed to create task")?
            {
                Some(task) => emit(&task),
                None => anyhow::bail!("Task title is required"),
            }
        }
    }
}

fn draft(title: String, fields: TaskFields) -> TaskDraft {
    TaskDraft {
        title,
        description: fields.description,
        priority: fields.priority,
    }
}

async fn run_chat(command: ChatCommand, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        ChatCommand::Sessions => emit(
            &client
                .list_chat_sessions()
                .await
                .context("Failed to load sessions")?,
        ),
        ChatCommand::New => {
            let mut sessions = ChatSessions {
                sessions: client
                    .list_chat_sessions()
                    .await
                    .context("Failed to load sessions")?,
                active_session_id: None,
            };
            emit(
                &sessions
                    .create_session(client)
                    .await
                    .context("Failed to create session")?,
            )
        }
        ChatCommand::Send { message, session } => {
            let mut conversation = ChatConversation::open(client, session.as_deref(), true)
                .await
                .context("Failed to open chat session")?;
            let sent = conversation
                .send(client, &message, |state| {
                    tracing::debug!(?state, "chat activity");
                })
                .await
                .context("Failed to send message")?;
            if !sent {
                anyhow::bail!("Message is empty");
            }
            emit(&conversation.messages)
        }
        ChatCommand::Messages { session_id } => emit(
            &client
                .list_chat_messages(&session_id)
                .await
                .context("Failed to load messages")?,
        ),
    }
}

async fn run_memory(command: MemoryCommand, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        MemoryCommand::Ingest { title, content } => {
            match memory::ingest_document(client, &title, &content)
                .await
                .context("Failed to ingest document")?
            {
                Some(document) => emit(&document),
                None => anyhow::bail!("Title and content are required"),
            }
        }
        MemoryCommand::Search { query, limit: None } => {
            match memory::search(client, &query)
                .await
                .context("Search failed")?
            {
                Some(results) => emit(&results),
                None => anyhow::bail!("Search query is required"),
            }
        }
        MemoryCommand::Search {
            query,
            limit: Some(limit),
        } => {
            let query = query.trim();
            if query.is_empty() {
                anyhow::bail!("Search query is required");
            }
            emit(
                &client
                    .search_memory(query, Some(limit))
                    .await
                    .context("Search failed")?,
            )
        }
        MemoryCommand::Show { document_id } => emit(
            &client
                .get_memory_document(&document_id)
                .await
                .context("Failed to load document")?,
        ),
    }
}

fn emit<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").context("Failed to write output")?;
    Ok(())
}
