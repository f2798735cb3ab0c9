use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::client::{TaskClient, TaskStore};
use taskboard::config::{self, ServerConfig, DEFAULT_LOG_FILTER, DEFAULT_SERVER_URL};
use taskboard::models::{CreateTaskInput, ListParams, TaskQuery, TaskStatus, UpdateTaskInput};
use taskboard::{api, format};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Task management with soft delete, filtering and sorting")]
struct Cli {
    /// Server URL for client commands
    #[arg(long, global = true, env = "TASKBOARD_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Taskboard server
    Serve(ServerConfig),
    /// Check server status
    Status,
    /// List live tasks
    List {
        /// Only tasks with this status (pending, in_progress, completed, all)
        #[arg(long)]
        status: Option<String>,
        /// created_at, updated_at or title
        #[arg(long)]
        sort_by: Option<String>,
        /// asc or desc
        #[arg(long)]
        sort_order: Option<String>,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_parser = config::parse_status)]
        status: Option<TaskStatus>,
    },
    /// Change fields of a task
    Update {
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        #[arg(short, long, value_parser = config::parse_status)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = || TaskStore::new(TaskClient::new(&cli.server));

    match cli.command {
        Some(Commands::Serve(config)) => serve(config).await?,
        None => serve(ServerConfig::from_env()?).await?,
        Some(Commands::Status) => {
            let store = store();
            let health = store.client().health().await?;
            println!(
                "Taskboard server at {} is {} (version {})",
                store.client().base_url(),
                health.status,
                health.version
            );
        }
        Some(Commands::List {
            status,
            sort_by,
            sort_order,
        }) => {
            let query = TaskQuery::from_params(&ListParams {
                status,
                sort_by,
                sort_order,
            });
            let tasks = store().list(&query).await?;
            println!("{}", format::format_task_list(&query, &tasks));
        }
        Some(Commands::Add {
            title,
            description,
            status,
        }) => {
            let input = CreateTaskInput {
                title: Some(title),
                description,
                status,
            };
            let task = store().create(&TaskQuery::default(), input).await?;
            println!("Task created successfully!\n{}", format::format_task(&task));
        }
        Some(Commands::Update {
            id,
            title,
            description,
            clear_description,
            status,
        }) => {
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            let input = UpdateTaskInput {
                title,
                description,
                status,
            };
            let task = store().update(&TaskQuery::default(), id, input).await?;
            println!("{}", format::format_task(&task));
        }
        Some(Commands::Delete { id }) => {
            let response = store().delete(&TaskQuery::default(), id).await?;
            println!("{}", response.message);
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Taskboard server on {}", config.addr());

    let db = config.open_database()?;
    api::serve(&config, db).await
}
