use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use statuswatch::api::{configure_routes, ApiState};
use statuswatch::config::Config;
use statuswatch::reconciler::Reconciler;
use statuswatch::store::StatusStore;

#[derive(Parser)]
#[command(name = "statuswatch")]
#[command(about = "Provider incident dashboard fed by a shared notification mailbox")]
#[command(version = "0.1.0")]
struct Args {
    /// Validate the configuration without connecting, then exit
    #[arg(long)]
    check_config: bool,

    /// Run a single reconciliation cycle and exit, without the HTTP server
    #[arg(long)]
    once: bool,

    /// Override the SQLite database path
    #[arg(short = 'd', long)]
    database: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load the .env file if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    info!("Starting statuswatch");

    let mut config = Config::new()?;

    if let Some(database) = args.database {
        config.database_path = database;
    }

    if args.check_config {
        println!("Configuration valid!");
        println!("Mailbox: {} @ {}:{}", config.mailbox.address, config.mailbox.server, config.mailbox.port);
        println!("Refresh interval: {}s", config.refresh_interval);
        println!("Database: {}", config.database_path);
        println!("Providers ({}):", config.providers.len());
        for provider in &config.providers {
            println!("  {} <{}>", provider.name, provider.mail_address);
        }
        return Ok(());
    }

    if config.providers.is_empty() {
        warn!("No provider slots configured, the dashboard will be empty");
    }

    // The seeded table is what makes every provider visible from the first
    // read, so failing here is fatal.
    let store = StatusStore::open(&config.database_path).await?;
    store
        .initialize(&config.providers)
        .await
        .context("Unable to seed the status table")?;

    let reconciler = Reconciler::new(config.clone(), store.clone());

    if args.once {
        info!("Running a single reconciliation cycle");
        reconciler.run_cycle().await;
        return Ok(());
    }

    tokio::spawn(reconciler.run());

    let state = web::Data::new(ApiState {
        store,
        refresh_interval: config.refresh_interval,
    });

    info!("Serving dashboard on http://{}:{}", config.http.bind, config.http.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind((config.http.bind.as_str(), config.http.port))
    .with_context(|| format!("Unable to bind {}:{}", config.http.bind, config.http.port))?
    .run()
    .await?;

    Ok(())
}
