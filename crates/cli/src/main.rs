use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use readinglist_app::{modules, BookStore, PgBookStore};
use readinglist_kernel::{
    settings::{Environment, Settings},
    InitCtx, ModuleRegistry,
};

#[derive(Debug, Parser)]
#[command(name = "readinglist", version, about = "Reading list API and web front end")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON books API
    Api(ApiArgs),
    /// Serve the HTML front end backed by the API
    Web(WebArgs),
}

#[derive(Debug, Args)]
struct ApiArgs {
    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long)]
    env: Option<Environment>,

    /// PostgreSQL DSN
    #[arg(long = "db-dsn", env = "READINGLIST_DB_DSN", hide_env_values = true)]
    db_dsn: Option<String>,
}

impl ApiArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(env) = self.env {
            settings.environment = env;
        }
        if let Some(dsn) = self.db_dsn {
            settings.db.dsn = dsn;
        }
    }
}

#[derive(Debug, Args)]
struct WebArgs {
    /// Web server port
    #[arg(long)]
    port: Option<u16>,

    /// Books collection endpoint of the API, e.g. http://localhost:4000/v1/books
    #[arg(long = "api-endpoint")]
    api_endpoint: Option<String>,
}

impl WebArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.web.port = port;
        }
        if let Some(endpoint) = self.api_endpoint {
            settings.web.api_endpoint = endpoint;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load reading list settings")?;

    match cli.command {
        Command::Api(args) => {
            args.apply(&mut settings);
            readinglist_telemetry::init(&settings.telemetry)?;
            run_api(settings).await
        }
        Command::Web(args) => {
            args.apply(&mut settings);
            readinglist_telemetry::init(&settings.telemetry)?;
            readinglist_web::start_server(&settings).await
        }
    }
}

async fn run_api(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(env = %settings.environment, "readinglist api bootstrap starting");

    let pool = readinglist_db::connect(&settings.db).await?;
    let store: Arc<dyn BookStore> = Arc::new(PgBookStore::new(pool));

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings, store)?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = readinglist_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}
