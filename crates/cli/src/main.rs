//! Meili CLI - Command-line client for Meilisearch
//! Mutating commands print the enqueued task; `--wait` blocks until it is applied.

mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use meili_sdk::{
    AuthScheme, ClientConfig, DocumentsQuery, MeiliClient, PollOptions, SearchQuery, Settings,
    Task,
};
use output::{task_line, IndexRow, TaskRow};
use std::path::PathBuf;
use std::time::Duration;
use tabled::Table;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "meili=info";

#[derive(Parser)]
#[command(name = "meili")]
#[command(about = "Meilisearch CLI with task waiting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine URL (overrides the config file)
    #[arg(long, env = "MEILI_URL", global = true)]
    url: Option<String>,

    /// API key (overrides the config file)
    #[arg(long, env = "MEILI_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Send the key as `X-Meili-API-Key` instead of a bearer token
    #[arg(long, global = true)]
    legacy_auth: bool,

    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args, Clone, Copy)]
struct WaitArgs {
    /// Block until the task is processed or failed
    #[arg(long)]
    wait: bool,

    /// Max wait in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Pause between status checks in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

impl WaitArgs {
    fn poll_options(&self, defaults: PollOptions) -> PollOptions {
        let mut options = defaults;
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.interval_ms {
            options = options.with_interval(Duration::from_millis(ms));
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List indexes
    Indexes,

    /// Create an index
    CreateIndex {
        uid: String,

        #[arg(short, long)]
        primary_key: Option<String>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete an index
    DeleteIndex {
        uid: String,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Add documents from a JSON array file
    AddDocuments {
        uid: String,

        /// File holding a JSON array of objects
        file: PathBuf,

        #[arg(short, long)]
        primary_key: Option<String>,

        /// Merge into existing documents instead of replacing them
        #[arg(long)]
        update: bool,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// List documents
    Documents {
        uid: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Show or change index settings
    Settings {
        uid: String,

        /// Comma-separated filterable attributes
        #[arg(long, value_delimiter = ',')]
        filterable: Option<Vec<String>>,

        /// Comma-separated sortable attributes
        #[arg(long, value_delimiter = ',')]
        sortable: Option<Vec<String>>,

        /// Comma-separated searchable attributes
        #[arg(long, value_delimiter = ',')]
        searchable: Option<Vec<String>>,

        /// Restore engine defaults
        #[arg(long, conflicts_with_all = ["filterable", "sortable", "searchable"])]
        reset: bool,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Show one task
    Task { uid: String, task_id: u64 },

    /// List tasks (all indexes, or one)
    Tasks {
        #[arg(short, long)]
        index: Option<String>,
    },

    /// Wait for a task to finish
    Wait {
        uid: String,
        task_id: u64,

        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Search an index
    Search {
        uid: String,

        #[arg(default_value = "")]
        query: String,

        #[arg(short, long)]
        filter: Option<String>,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn init_tracing() -> Result<()> {
    let log_format = std::env::var("MEILI_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if cli.legacy_auth {
        config.auth_scheme = AuthScheme::LegacyApiKey;
    }
    Ok(config)
}

/// Print the enqueued task, optionally wait for it, and fail on a failed task
async fn report(client: &MeiliClient, task: Task, wait: WaitArgs) -> Result<()> {
    println!("{} {}", "✓ Enqueued".green().bold(), task_line(&task));
    if !wait.wait {
        return Ok(());
    }

    let index_uid = task.index_label().to_string();
    let options = wait.poll_options(client.poller().defaults());
    let done = client
        .wait_for_task(&index_uid, task.id, Some(options))
        .await
        .with_context(|| format!("Waiting for task {} failed", task.id))?;
    println!("{}", task_line(&done));
    done.into_result()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(url = %config.url, auth_scheme = ?config.auth_scheme, "Configuration loaded");
    let client = MeiliClient::new(&config).context("Failed to build client")?;

    match cli.command {
        Commands::Indexes => {
            let indexes = client
                .list_indexes()
                .await
                .context("Failed to list indexes")?;
            if indexes.is_empty() {
                println!("{}", "No indexes".yellow());
            } else {
                let rows: Vec<IndexRow> = indexes.iter().map(IndexRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::CreateIndex {
            uid,
            primary_key,
            wait,
        } => {
            let task = client.create_index(&uid, primary_key.as_deref()).await?;
            report(&client, task, wait).await?;
        }

        Commands::DeleteIndex { uid, wait } => {
            let task = client.delete_index(&uid).await?;
            report(&client, task, wait).await?;
        }

        Commands::AddDocuments {
            uid,
            file,
            primary_key,
            update,
            wait,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let documents: Vec<serde_json::Value> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array", file.display()))?;

            let index = client.index(&uid);
            let task = if update {
                index.update_documents(&documents, primary_key.as_deref()).await?
            } else {
                index.add_documents(&documents, primary_key.as_deref()).await?
            };
            println!("  {} {} documents", "•".bold(), documents.len());
            report(&client, task, wait).await?;
        }

        Commands::Documents { uid, limit, offset } => {
            let documents: Vec<serde_json::Value> = client
                .index(&uid)
                .get_documents(DocumentsQuery::new().with_limit(limit).with_offset(offset))
                .await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }

        Commands::Settings {
            uid,
            filterable,
            sortable,
            searchable,
            reset,
            wait,
        } => {
            let index = client.index(&uid);
            if reset {
                let task = index.reset_settings().await?;
                report(&client, task, wait).await?;
            } else if filterable.is_none() && sortable.is_none() && searchable.is_none() {
                let settings = index.get_settings().await?;
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                let settings = Settings {
                    filterable_attributes: filterable,
                    sortable_attributes: sortable,
                    searchable_attributes: searchable,
                    ..Settings::default()
                };
                let task = index.update_settings(&settings).await?;
                report(&client, task, wait).await?;
            }
        }

        Commands::Task { uid, task_id } => {
            let task = client.get_task(&uid, task_id).await?;
            println!("{}", Table::new(vec![TaskRow::from(&task)]));
        }

        Commands::Tasks { index } => {
            let tasks = match index {
                Some(uid) => client.index(uid).get_tasks().await?,
                None => client.get_tasks().await?,
            };
            if tasks.is_empty() {
                println!("{}", "No tasks".yellow());
            } else {
                let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Wait {
            uid,
            task_id,
            timeout_ms,
            interval_ms,
        } => {
            let wait = WaitArgs {
                wait: true,
                timeout_ms,
                interval_ms,
            };
            let options = wait.poll_options(client.poller().defaults());
            let task = client.wait_for_task(&uid, task_id, Some(options)).await?;
            println!("{}", task_line(&task));
            if let Some(error) = &task.error {
                println!("  {} {}", "Error:".bold(), error.message);
            }
            task.into_result()?;
        }

        Commands::Search {
            uid,
            query,
            filter,
            limit,
        } => {
            let mut search = SearchQuery::new(query).with_limit(limit);
            if let Some(filter) = filter {
                search = search.with_filter(filter);
            }
            let results = client
                .index(&uid)
                .search::<serde_json::Value>(&search)
                .await?;
            println!(
                "{} {} hits in {} ms",
                "✓".green(),
                results.hits.len(),
                results.processing_time_ms
            );
            println!("{}", serde_json::to_string_pretty(&results.hits)?);
        }
    }

    Ok(())
}
