use dotenvy::dotenv;
use recurring_income::{
    config::{self, Settings},
    core::runner::{Job, run_job},
    errors::{Error, Result},
    notify::LogNotifier,
    server::{self, AppState},
};
use sea_orm::DatabaseConnection;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: recurring-income [serve | run <materialize|reconcile|budget-guard|cleanup>]";

/// What the process was asked to do
enum Command {
    Serve,
    Run(Job),
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Serve),
        [cmd] if cmd == "serve" => Ok(Command::Serve),
        [cmd, job] if cmd == "run" => Ok(Command::Run(Job::parse(job)?)),
        _ => Err(Error::Config {
            message: USAGE.to_string(),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    info!("Attempted to load .env file.");

    let args: Vec<String> = env::args().skip(1).collect();
    let command = parse_command(&args).inspect_err(|e| error!("{}", e))?;

    // 3. Load settings
    let settings = config::load_default_settings()
        .inspect_err(|e| error!("Critical error loading settings: {}", e))?;

    // 4. Connect and bring the schema up to date
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::run_migrations(&db)
        .await
        .inspect_err(|e| error!("Failed to run migrations: {}", e))?;

    match command {
        Command::Run(job) => run_once(&db, &settings, job).await,
        Command::Serve => {
            // CRON_SECRET is loaded here, directly before use, not stored in Settings
            let cron_secret = config::cron_secret()
                .inspect_err(|e| error!("CRON_SECRET not usable: {}", e))?;
            let bind_addr = settings.server.bind_addr.clone();
            let state = AppState {
                db,
                settings: Arc::new(settings),
                notifier: Arc::new(LogNotifier),
                cron_secret: Arc::from(cron_secret),
            };
            server::serve(state, &bind_addr).await
        }
    }
}

async fn run_once(db: &DatabaseConnection, settings: &Settings, job: Job) -> Result<()> {
    let summary = run_job(db, settings, &LogNotifier, job, chrono::Utc::now())
        .await
        .inspect_err(|e| error!("Job {} failed: {}", job, e))?;
    print!("{}", summary.format());
    Ok(())
}
