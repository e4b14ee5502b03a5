//! socialdesk CLI - Command-line access to the socialdesk console API

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use serde_json::Value;
use socialdesk_lib::resources::{
    Account, BrowserContext, Category, Content, ExecutorJob, JobStatus, NewJob, Proxy,
    WatchlistAccount,
};
use socialdesk_lib::{
    ApiClient, ApiConfig, FileSessionStore, JobClient, ListQuery, RecordId, Resource,
    ResourceClient, SessionOwner, Toaster,
};
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "socialdesk")]
#[command(about = "Command-line access to the socialdesk console API", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Exchange the refresh token for a new session
    Refresh,

    /// List records of a resource
    List {
        #[arg(value_enum)]
        resource: ResourceKind,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,

        /// Extra query filters (repeatable: --filter status=active)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },

    /// Show one record
    Get {
        #[arg(value_enum)]
        resource: ResourceKind,

        id: String,
    },

    /// Delete one record
    Delete {
        #[arg(value_enum)]
        resource: ResourceKind,

        id: String,
    },

    /// Work with the executor job queue
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
}

#[derive(Subcommand)]
enum JobsCommand {
    /// List jobs in a status (PENDING, PROCESSING, SUCCESS, FAILED, TIMEOUT)
    List {
        status: JobStatus,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one job
    Get { id: String },

    /// Queue a job
    Create {
        platform: String,

        action: String,

        /// JSON payload for the executor
        #[arg(long, default_value = "{}")]
        payload: String,
    },

    /// Move a job to a new status
    SetStatus { id: String, status: JobStatus },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResourceKind {
    Accounts,
    Proxies,
    Categories,
    Contents,
    BrowserContexts,
    Watchlist,
}

/// Prints notices to stderr.
struct StderrToaster;

impl Toaster for StderrToaster {
    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Initialize tracing subscriber based on verbosity and output format
fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,socialdesk_lib=info".to_string(),
            2 => "info,socialdesk_lib=debug".to_string(),
            _ => "debug,socialdesk_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_query(page: Option<u32>, limit: Option<u32>, filters: &[String]) -> Result<ListQuery> {
    let mut query = ListQuery {
        page,
        limit,
        ..ListQuery::default()
    };
    for filter in filters {
        let (key, value) = filter
            .split_once('=')
            .ok_or_else(|| eyre!("Filter '{filter}' must look like KEY=VALUE"))?;
        query = query.filter(key, value);
    }
    Ok(query)
}

async fn list<R>(client: &ApiClient, query: &ListQuery) -> Result<()>
where
    R: Resource + serde::Serialize,
{
    let page = ResourceClient::<R>::new(client).list(query).await?;
    print_json(&page)
}

async fn get<R>(client: &ApiClient, id: &RecordId) -> Result<()>
where
    R: Resource + serde::Serialize,
{
    let record = ResourceClient::<R>::new(client).get(id).await?;
    print_json(&record)
}

async fn delete<R: Resource>(client: &ApiClient, id: &RecordId) -> Result<()> {
    ResourceClient::<R>::new(client).delete(id).await?;
    eprintln!("Deleted {} {id}", R::NAME);
    Ok(())
}

async fn run_jobs(client: &ApiClient, command: JobsCommand) -> Result<()> {
    let jobs = JobClient::new(client);
    match command {
        JobsCommand::List {
            status,
            page,
            limit,
        } => {
            let query = list_query(page, limit, &[])?;
            print_json(&jobs.list_by_status(status, &query).await?)
        }
        JobsCommand::Get { id } => print_json(&jobs.get(&RecordId::new(id)).await?),
        JobsCommand::Create {
            platform,
            action,
            payload,
        } => {
            let payload: Value =
                serde_json::from_str(&payload).wrap_err("Invalid JSON in --payload argument")?;
            let job = NewJob::new(platform, action).payload(payload);
            print_json(&jobs.create(&job).await?)
        }
        JobsCommand::SetStatus { id, status } => {
            let job: ExecutorJob = jobs.get(&RecordId::new(id)).await?;
            print_json(&jobs.update_status(&job, status).await?)
        }
    }
}

async fn run(command: Commands, owner: &SessionOwner) -> Result<()> {
    let client = owner.client();
    match command {
        Commands::Login { email, password } => {
            let user = owner.login(&email, &password).await?;
            eprintln!("Signed in as {}", user.display_name());
            Ok(())
        }
        Commands::Logout => {
            owner.logout().await?;
            eprintln!("Signed out");
            Ok(())
        }
        Commands::Whoami => match owner.verify().await? {
            Some(user) => print_json(&user),
            None => Err(eyre!("Not signed in. Run `socialdesk login` first.")),
        },
        Commands::Refresh => {
            let session = owner.refresh().await?;
            match session.token_expires {
                Some(expires) => eprintln!("Session refreshed, expires at {expires}"),
                None => eprintln!("Session refreshed"),
            }
            Ok(())
        }
        Commands::List {
            resource,
            page,
            limit,
            filters,
        } => {
            let query = list_query(page, limit, &filters)?;
            match resource {
                ResourceKind::Accounts => list::<Account>(client, &query).await,
                ResourceKind::Proxies => list::<Proxy>(client, &query).await,
                ResourceKind::Categories => list::<Category>(client, &query).await,
                ResourceKind::Contents => list::<Content>(client, &query).await,
                ResourceKind::BrowserContexts => list::<BrowserContext>(client, &query).await,
                ResourceKind::Watchlist => list::<WatchlistAccount>(client, &query).await,
            }
        }
        Commands::Get { resource, id } => {
            let id = RecordId::new(id);
            match resource {
                ResourceKind::Accounts => get::<Account>(client, &id).await,
                ResourceKind::Proxies => get::<Proxy>(client, &id).await,
                ResourceKind::Categories => get::<Category>(client, &id).await,
                ResourceKind::Contents => get::<Content>(client, &id).await,
                ResourceKind::BrowserContexts => get::<BrowserContext>(client, &id).await,
                ResourceKind::Watchlist => get::<WatchlistAccount>(client, &id).await,
            }
        }
        Commands::Delete { resource, id } => {
            let id = RecordId::new(id);
            match resource {
                ResourceKind::Accounts => delete::<Account>(client, &id).await,
                ResourceKind::Proxies => delete::<Proxy>(client, &id).await,
                ResourceKind::Categories => delete::<Category>(client, &id).await,
                ResourceKind::Contents => delete::<Content>(client, &id).await,
                ResourceKind::BrowserContexts => delete::<BrowserContext>(client, &id).await,
                ResourceKind::Watchlist => delete::<WatchlistAccount>(client, &id).await,
            }
        }
        Commands::Jobs { command } => run_jobs(client, command).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json);

    let config = ApiConfig::from_env();
    let store = Arc::new(
        FileSessionStore::for_config(&config).wrap_err("Failed to locate the session file")?,
    );
    debug!(path = %store.path().display(), "using session file");

    let client = ApiClient::builder(config)
        .store(store)
        .toaster(Arc::new(StderrToaster))
        .build()
        .wrap_err("Failed to configure the API client")?;

    let owner = SessionOwner::with_sign_out_hook(client, |event| {
        let message = event.message.as_deref().unwrap_or("You have been signed out.");
        eprintln!("{message} Run `socialdesk login` to sign in again.");
    });

    run(cli.command, &owner).await
}
